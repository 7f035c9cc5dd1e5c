//! Marker segment parsers.
//!
//! Each function here consumes one segment's payload, starting at its two
//! byte length field. Declared lengths are checked against the bytes that
//! actually remain before anything is read, so a truncated stream fails
//! with `MalformedSegment` instead of running off the end.
//!
//! A good guide on markers can be found [here](http://vip.sugovica.hu/Sardi/kepnezo/JPEG%20File%20Layout%20and%20Format.htm)
use std::io::Cursor;

use crate::components::Components;
use crate::decoder::{Decoder, MAX_TABLES};
use crate::errors::{DecodeErrors, UnsupportedSchemes};
use crate::huffman::HuffmanTable;
use crate::misc::{read_u16_be, read_u8, remaining, skip_bytes, UN_ZIGZAG};

/// Read a segment's length field and check the payload it promises is
/// actually present.
///
/// Returns the payload length, the declared length minus the two bytes of
/// the field itself.
fn read_segment_length(buf: &mut Cursor<Vec<u8>>) -> Result<usize, DecodeErrors> {
    let length = usize::from(read_u16_be(buf)?);

    if length < 2 {
        return Err(DecodeErrors::MalformedSegment(format!(
            "invalid segment length {}, must be at least 2",
            length
        )));
    }

    if length - 2 > remaining(buf) {
        return Err(DecodeErrors::MalformedSegment(format!(
            "segment length {} exceeds the {} bytes left in the stream",
            length,
            remaining(buf) + 2
        )));
    }

    Ok(length - 2)
}

/// **B.2.4.2 Huffman table-specification syntax**
/// ----------------------------------------------
///
/// Parse a DHT segment.
///
/// |Field                      |Size          |Description
/// ----------------------------|--------------|-------------------------------------------------
/// |Marker Identifier          |2 bytes       |0xff, 0xc4 to identify DHT marker
/// |Length                     |2 bytes       |Length of the Huffman table
/// |HT information             |1 byte        |bit 0..3 : table slot (0..3, otherwise error)
/// |                           |              |bit 4    : type of HT, 0 = DC table, 1 = AC table
/// |                           |              |bit 5..7 : not used, must be 0
/// |Number of Symbols          |16 bytes      |Number of symbols with codes of length 1..16,
/// |                           |              |the sum of these bytes is the total number of codes,
/// |                           |              |which must be <= 256
/// |Symbols                    |n bytes       |Table containing the symbols in order of increasing
/// |                           |              |code length ( n = total number of codes ).
///
/// A single DHT segment may carry several tables; a table stored into an
/// occupied slot replaces the previous one.
pub(crate) fn parse_huffman(
    decoder: &mut Decoder, buf: &mut Cursor<Vec<u8>>,
) -> Result<(), DecodeErrors> {
    let mut length = read_segment_length(buf)?;

    while length > 0 {
        if length < 17 {
            return Err(DecodeErrors::MalformedSegment(format!(
                "DHT segment has {} stray bytes, too short for a table",
                length
            )));
        }

        let ht_info = read_u8(buf)?;

        if (ht_info >> 5) != 0 {
            return Err(DecodeErrors::MalformedSegment(format!(
                "reserved bits set in DHT table information byte {:#04X}",
                ht_info
            )));
        }

        // Bit 4 picks DC or AC, the low nibble the slot.
        let is_ac = (ht_info >> 4) & 1 == 1;
        let index = usize::from(ht_info & 0x0F);

        if index >= MAX_TABLES {
            return Err(DecodeErrors::MalformedSegment(format!(
                "Huffman table slot {} is outside 0..=3",
                index
            )));
        }

        let mut counts = [0_u8; 16];

        for count in &mut counts {
            *count = read_u8(buf)?;
        }

        let symbol_count: usize = counts.iter().map(|c| usize::from(*c)).sum();

        if symbol_count > 256 {
            return Err(DecodeErrors::HuffmanDecode(
                "encountered Huffman table with excessive length in DHT".to_string(),
            ));
        }

        if length < 17 + symbol_count {
            return Err(DecodeErrors::MalformedSegment(format!(
                "DHT table wants {} symbols but its segment has {} bytes left",
                symbol_count,
                length - 17
            )));
        }

        let mut symbols = vec![0_u8; symbol_count];

        for symbol in &mut symbols {
            *symbol = read_u8(buf)?;
        }

        debug!(
            "Parsed {} Huffman table, slot {}, {} symbols",
            if is_ac { "AC" } else { "DC" },
            index,
            symbol_count
        );

        let table = HuffmanTable::new(&counts, symbols);

        if is_ac {
            decoder.ac_huffman_tables[index] = Some(table);
        } else {
            decoder.dc_huffman_tables[index] = Some(table);
        }

        length -= 17 + symbol_count;
    }

    Ok(())
}

/// **B.2.4.1 Quantization table-specification syntax**
/// --------------------------------------------------
///
/// Parse a DQT segment, un zig-zagging each table into natural order on
/// the way in.
///
/// |Field               |Size                   |Description
/// ---------------------|-----------------------|-------------------------
/// |Marker Identifier   |2 bytes                |0xff, 0xdb identifies DQT
/// |Length              |2 bytes                |This gives the length of QT.
/// | QT information     |1 byte                 |bit 0..3: table slot (0..3, otherwise error)
/// |                    |                       |bit 4..7: precision of QT, 0 = 8 bit, otherwise 16 bit
/// | Bytes              |n bytes                |This gives QT values, n = 64*(precision+1)
///
/// A single DQT segment may contain several tables, each with its own
/// information byte; for 16 bit precision values are stored high byte
/// first.
pub(crate) fn parse_dqt(
    decoder: &mut Decoder, buf: &mut Cursor<Vec<u8>>,
) -> Result<(), DecodeErrors> {
    let mut length = read_segment_length(buf)?;

    while length > 0 {
        let qt_info = read_u8(buf)?;

        let precision = usize::from(qt_info >> 4);
        let table_position = usize::from(qt_info & 0x0F);

        if table_position >= MAX_TABLES {
            return Err(DecodeErrors::MalformedSegment(format!(
                "quantization table slot {} is outside 0..=3",
                table_position
            )));
        }

        let table_bytes = 64 * (precision + 1);

        if length < 1 + table_bytes {
            return Err(DecodeErrors::MalformedSegment(format!(
                "DQT table wants {} bytes but its segment has {} left",
                table_bytes,
                length - 1
            )));
        }

        let mut table = [0_i32; 64];

        match precision {
            0 => {
                for i in 0..64 {
                    table[UN_ZIGZAG[i]] = i32::from(read_u8(buf)?);
                }
            }
            1 => {
                for i in 0..64 {
                    table[UN_ZIGZAG[i]] = i32::from(read_u16_be(buf)?);
                }
            }
            _ => {
                return Err(DecodeErrors::MalformedSegment(format!(
                    "expected quantization table precision of 0 or 1, found {}",
                    precision
                )));
            }
        }

        debug!(
            "Parsed {} bit quantization table, slot {}",
            8 * (precision + 1),
            table_position
        );

        decoder.qt_tables[table_position] = Some(table);

        length -= 1 + table_bytes;
    }

    Ok(())
}

/// Section: `B.2.2 Frame header syntax`
/// --------------------------------------
///
/// Parse a START OF FRAME 0 segment.
///
/// | Field              |Size        |Description
/// ---------------------|------------|-----------------
/// | Marker Identifier  |2 bytes     |0xff, 0xc0 to identify SOF0 marker
/// | Length             |2 bytes     |This value equals 8 + components*3
/// | Data precision     |1 byte      |This is in bits/sample, usually 8
/// |Image height        |2 bytes     |This must be > 0
/// |Image Width         |2 bytes     |This must be > 0
/// |Number of components|1 byte      |1 = grayscale, 3 = YCbCr, 4 = CMYK
/// |Each component      |3 bytes     |component id, sampling factors
/// |                    |            |(bit 0-3 vertical, 4-7 horizontal),
/// |                    |            |quantization table number
///
/// Only 8 bit, 3 component YCbCr frames pass; anything else is rejected
/// before the scan starts.
pub(crate) fn parse_start_of_frame(
    buf: &mut Cursor<Vec<u8>>, decoder: &mut Decoder,
) -> Result<(), DecodeErrors> {
    let length = read_segment_length(buf)?;

    let precision = read_u8(buf)?;

    if precision != 8 {
        return Err(DecodeErrors::MalformedSegment(format!(
            "the library can only parse 8 bit images, the image has {} bits of precision",
            precision
        )));
    }

    let height = read_u16_be(buf)?;
    let width = read_u16_be(buf)?;

    if width == 0 || height == 0 {
        return Err(DecodeErrors::MalformedSegment(
            "image width and height must both be non zero".to_string(),
        ));
    }

    let num_components = read_u8(buf)?;

    match num_components {
        3 => (),
        1 => return Err(DecodeErrors::Unsupported(UnsupportedSchemes::GrayScale)),
        4 => return Err(DecodeErrors::Unsupported(UnsupportedSchemes::Cmyk)),
        n => {
            return Err(DecodeErrors::MalformedSegment(format!(
                "invalid component count {} in frame header",
                n
            )))
        }
    }

    if length != usize::from(8 + 3 * num_components) - 2 {
        return Err(DecodeErrors::MalformedSegment(format!(
            "length of start of frame differs from expected {}, value is {}",
            8 + 3 * num_components,
            length + 2
        )));
    }

    info!("Image dimensions {} x {}", width, height);

    decoder.info.width = width;
    decoder.info.height = height;
    decoder.info.pixel_density = precision;
    decoder.info.components = num_components;

    let mut components = Vec::with_capacity(usize::from(num_components));
    let mut temp = [0_u8; 3];

    for position in 0..usize::from(num_components) {
        for byte in &mut temp {
            *byte = read_u8(buf)?;
        }
        components.push(Components::from(temp, position)?);
    }

    decoder.components = components;
    decoder.set_mcu_dimensions();

    Ok(())
}

/// Parse a start of scan segment.
///
/// |Field                       |Size       |Description
/// -----------------------------|-----------|-------------
/// Marker Identifier            |2 bytes    |0xff, 0xda identify SOS marker
/// Length                       |2 bytes    |This must be equal to 6+2*(number of components in scan).
/// Number of components in scan |1 byte     |Must match the frame header
/// Each component               |2 bytes    |component id, then huffman table slots:
/// |                            |           |bit 0..3 : AC table (0..3)
/// |                            |           |bit 4..7 : DC table (0..3)
/// |Spectral selection          |3 bytes    |Ss, Se, Ah/Al, fixed for baseline
///
/// The table slots recorded here stay valid until the next SOS.
pub(crate) fn parse_sos(
    buf: &mut Cursor<Vec<u8>>, decoder: &mut Decoder,
) -> Result<(), DecodeErrors> {
    let length = read_segment_length(buf)?;

    let num_scan_components = read_u8(buf)?;

    if length != usize::from(6 + 2 * num_scan_components) - 2 {
        return Err(DecodeErrors::MalformedSegment(
            "bad SOS length, corrupt JPEG".to_string(),
        ));
    }

    if usize::from(num_scan_components) != decoder.components.len() {
        return Err(DecodeErrors::MalformedSegment(format!(
            "scan has {} components, frame declared {}",
            num_scan_components,
            decoder.components.len()
        )));
    }

    for _ in 0..num_scan_components {
        let id = read_u8(buf)?;
        let tables = read_u8(buf)?;

        let dc_table = usize::from(tables >> 4);
        let ac_table = usize::from(tables & 0x0F);

        if dc_table >= MAX_TABLES || ac_table >= MAX_TABLES {
            return Err(DecodeErrors::MalformedSegment(format!(
                "scan component {} references Huffman table slots ({}, {}) outside 0..=3",
                id, dc_table, ac_table
            )));
        }

        let component = decoder
            .components
            .iter_mut()
            .find(|c| c.component_id as u8 == id)
            .ok_or_else(|| {
                DecodeErrors::MalformedSegment(format!(
                    "scan references component id {} which the frame does not declare",
                    id
                ))
            })?;

        component.dc_huff_table = dc_table;
        component.ac_huff_table = ac_table;
    }

    // Ss, Se and Ah/Al; fixed values for baseline so nothing to keep.
    skip_bytes(buf, 3)?;

    Ok(())
}

/// Parse an APP0 segment holding JFIF metadata.
///
/// The pixel densities and version end up in the decoder's `ImageInfo`;
/// if the segment embeds a thumbnail its raw RGB bytes are stored too.
/// Non JFIF APP0 segments (JFXX and friends) are skipped whole.
pub(crate) fn parse_app0(
    buf: &mut Cursor<Vec<u8>>, decoder: &mut Decoder,
) -> Result<(), DecodeErrors> {
    let length = read_segment_length(buf)?;

    if length < 14 {
        warn!("APP0 segment too short for JFIF metadata, skipping");
        return skip_bytes(buf, length);
    }

    let mut identifier = [0_u8; 5];

    for byte in &mut identifier {
        *byte = read_u8(buf)?;
    }

    if &identifier != b"JFIF\0" {
        debug!("APP0 segment is not JFIF, skipping");
        return skip_bytes(buf, length - 5);
    }

    decoder.info.version_major = read_u8(buf)?;
    decoder.info.version_minor = read_u8(buf)?;
    decoder.info.density_unit = read_u8(buf)?;
    decoder.info.x_density = read_u16_be(buf)?;
    decoder.info.y_density = read_u16_be(buf)?;

    let thumb_width = usize::from(read_u8(buf)?);
    let thumb_height = usize::from(read_u8(buf)?);

    let mut consumed = 14;

    if thumb_width > 0 && thumb_height > 0 {
        let thumb_bytes = 3 * thumb_width * thumb_height;

        if length - consumed < thumb_bytes {
            return Err(DecodeErrors::MalformedSegment(format!(
                "JFIF thumbnail of {} x {} does not fit its APP0 segment",
                thumb_width, thumb_height
            )));
        }

        let mut thumbnail = vec![0_u8; thumb_bytes];

        for byte in &mut thumbnail {
            *byte = read_u8(buf)?;
        }

        debug!("Read {} x {} JFIF thumbnail", thumb_width, thumb_height);
        decoder.thumbnail = Some(thumbnail);
        consumed += thumb_bytes;
    }

    skip_bytes(buf, length - consumed)
}

/// Parse a DRI segment.
///
/// The interval is the number of MCUs between restart markers; zero turns
/// restarts off again.
pub(crate) fn parse_dri(
    buf: &mut Cursor<Vec<u8>>, decoder: &mut Decoder,
) -> Result<(), DecodeErrors> {
    if read_segment_length(buf)? != 2 {
        return Err(DecodeErrors::MalformedSegment(
            "bad DRI length, corrupt JPEG".to_string(),
        ));
    }

    decoder.restart_interval = usize::from(read_u16_be(buf)?);
    info!("Restart interval: {} MCUs", decoder.restart_interval);

    Ok(())
}

/// Parse a COM segment, keeping the payload byte for byte.
pub(crate) fn parse_com(
    buf: &mut Cursor<Vec<u8>>, decoder: &mut Decoder,
) -> Result<(), DecodeErrors> {
    let length = read_segment_length(buf)?;

    let mut comment = vec![0_u8; length];

    for byte in &mut comment {
        *byte = read_u8(buf)?;
    }

    decoder.comment = Some(comment);

    Ok(())
}
