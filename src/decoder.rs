//! Main decoder logic.
#![allow(clippy::doc_markdown)]

use std::fs::read;
use std::io::Cursor;
use std::path::Path;

use crate::color_convert::choose_ycbcr_to_rgb_convert_func;
use crate::components::Components;
use crate::errors::{DecodeErrors, UnsupportedSchemes};
use crate::headers::{
    parse_app0, parse_com, parse_dqt, parse_dri, parse_huffman, parse_sos, parse_start_of_frame,
};
use crate::huffman::HuffmanTable;
use crate::marker::Marker;
use crate::misc::{read_u16_be, read_u8, skip_bytes, ColorSpace};

/// Slots available for Huffman and quantization tables.
///
/// The table id domain is bounded, class 0 or 1 and id 0 to 3, so tables
/// live in fixed arrays indexed by id instead of a keyed map.
pub(crate) const MAX_TABLES: usize = 4;

/// Color conversion function operating on one scanline of YCbCr samples.
///
/// The three `&[f32]` rows share a length; the `&mut [u8]` receives that
/// many packed pixels.
pub(crate) type ColorConvertPtr = fn(&[f32], &[f32], &[f32], &mut [u8]);

/// A decoder instance.
///
/// Holds the tables and component state accumulated while parsing headers
/// and drives the scan decode. An instance that returned an error must be
/// replaced, not reused; partially parsed state is not rewound.
pub struct Decoder {
    /// Image information from the headers
    pub(crate) info: ImageInfo,
    /// Quantization tables, moved into `components` before the scan
    pub(crate) qt_tables: [Option<[i32; 64]>; MAX_TABLES],
    /// DC Huffman tables, indexed by table slot
    pub(crate) dc_huffman_tables: [Option<HuffmanTable>; MAX_TABLES],
    /// AC Huffman tables, indexed by table slot
    pub(crate) ac_huffman_tables: [Option<HuffmanTable>; MAX_TABLES],
    /// Image components, in frame header order
    pub(crate) components: Vec<Components>,

    /// Maximum horizontal sampling factor of all components
    pub(crate) h_max: usize,
    /// Maximum vertical sampling factor of all components
    pub(crate) v_max: usize,
    /// Number of MCUs across
    pub(crate) mcu_x: usize,
    /// Number of MCUs down
    pub(crate) mcu_y: usize,

    /// MCUs between restart markers, zero when restarts are off
    pub(crate) restart_interval: usize,

    /// COM segment payload, verbatim
    pub(crate) comment: Option<Vec<u8>>,
    /// Raw RGB bytes of the JFIF embedded thumbnail, if APP0 carried one
    pub(crate) thumbnail: Option<Vec<u8>>,

    /// What the pixels should be converted to on the way out
    pub(crate) output_colorspace: ColorSpace,
    pub(crate) color_convert: ColorConvertPtr,

    /// Worker threads for post processing, `None` means one per CPU
    pub(crate) num_threads: Option<usize>,
}

impl Default for Decoder {
    fn default() -> Self {
        // RGB always has a conversion function.
        let color_convert = choose_ycbcr_to_rgb_convert_func(ColorSpace::RGB).unwrap();

        Decoder {
            info: ImageInfo::default(),
            qt_tables: [None, None, None, None],
            dc_huffman_tables: [None, None, None, None],
            ac_huffman_tables: [None, None, None, None],
            components: vec![],

            h_max: 1,
            v_max: 1,
            mcu_x: 0,
            mcu_y: 0,

            restart_interval: 0,

            comment: None,
            thumbnail: None,

            output_colorspace: ColorSpace::RGB,
            color_convert,

            num_threads: None,
        }
    }
}

impl Decoder {
    /// Create a new decoder instance.
    #[must_use]
    pub fn new() -> Decoder {
        Decoder::default()
    }

    /// Decode a buffer already in memory.
    ///
    /// The buffer should be a valid JPEG stream, perhaps created by
    /// `std::fs::read()` or downloaded from the internet. Returns tightly
    /// packed pixel scanlines in the configured output colorspace, RGB
    /// unless changed.
    ///
    /// # Errors
    /// If the buffer is not a valid baseline JPEG; see
    /// [`DecodeErrors`](crate::errors::DecodeErrors) for the taxonomy. No
    /// pixels are returned for a failed decode, partial images are not a
    /// thing.
    pub fn decode_buffer(&mut self, buf: &[u8]) -> Result<Vec<u8>, DecodeErrors> {
        self.decode_internal(Cursor::new(buf.to_vec()))
    }

    /// Decode a JPEG file.
    ///
    /// # Errors
    /// As [`decode_buffer`](Self::decode_buffer), plus I/O errors from
    /// reading the file.
    pub fn decode_file<P>(&mut self, file: P) -> Result<Vec<u8>, DecodeErrors>
    where
        P: AsRef<Path>,
    {
        let buffer = read(file)?;
        info!("File size: {} bytes", buffer.len());

        self.decode_internal(Cursor::new(buffer))
    }

    /// Read only the headers from a JPEG buffer.
    ///
    /// This parses everything up to and including the start of scan
    /// without touching the entropy coded data, which is how you get
    /// dimensions and metadata cheaply.
    ///
    /// # Examples
    /// ```no_run
    /// use ferrite_jpeg::Decoder;
    /// let mut decoder = Decoder::new();
    /// let data = std::fs::read("a_valid.jpeg").unwrap();
    /// decoder.read_headers(&data).unwrap();
    ///
    /// println!("{} x {}", decoder.width(), decoder.height());
    /// ```
    ///
    /// # Errors
    /// If the headers are malformed or announce an unsupported scheme.
    pub fn read_headers(&mut self, buf: &[u8]) -> Result<(), DecodeErrors> {
        let mut cursor = Cursor::new(buf.to_vec());

        self.decode_headers_internal(&mut cursor)
    }

    /// Returns the image information.
    ///
    /// This **must** be called after a successful `decode_buffer`,
    /// `decode_file` or `read_headers` call, otherwise it returns `None`.
    #[must_use]
    pub fn info(&self) -> Option<ImageInfo> {
        // Width can never be zero after a successful header parse, so a
        // default info means no parse happened.
        if self.info == ImageInfo::default() {
            return None;
        }

        return Some(self.info.clone());
    }

    /// Get the width of the image, between 1 and 65535.
    ///
    /// Zero until headers have been parsed.
    #[must_use]
    pub fn width(&self) -> u16 {
        self.info.width
    }

    /// Get the height of the image, between 1 and 65535.
    ///
    /// Zero until headers have been parsed.
    #[must_use]
    pub fn height(&self) -> u16 {
        self.info.height
    }

    /// Number of color components in the image, always 3 for the images
    /// this decoder accepts.
    ///
    /// Zero until headers have been parsed.
    #[must_use]
    pub fn component_count(&self) -> u8 {
        self.info.components
    }

    /// The COM segment payload, byte for byte, if the image had one.
    #[must_use]
    pub fn comment(&self) -> Option<&[u8]> {
        self.comment.as_deref()
    }

    /// Raw RGB bytes of the embedded JFIF thumbnail, if the APP0 segment
    /// carried one.
    #[must_use]
    pub fn thumbnail(&self) -> Option<&[u8]> {
        self.thumbnail.as_deref()
    }

    /// Get the colorspace pixels will be converted to on the way out.
    #[must_use]
    pub fn get_output_colorspace(&self) -> ColorSpace {
        return self.output_colorspace;
    }

    /// Set the output colorspace.
    ///
    /// # Values which currently work
    /// - `ColorSpace::RGB`: the default, three bytes per pixel.
    /// - `ColorSpace::RGBA`: four bytes per pixel with a constant 255
    ///   alpha, useful when feeding the pixels to something that wants
    ///   four channels.
    ///
    /// Anything else is ignored.
    pub fn set_output_colorspace(&mut self, colorspace: ColorSpace) {
        if self.output_colorspace == colorspace {
            return;
        }

        if let Some(func) = choose_ycbcr_to_rgb_convert_func(colorspace) {
            self.output_colorspace = colorspace;
            self.color_convert = func;
        } else {
            warn!("{:?} is not an output colorspace, ignoring", colorspace);
        }
    }

    /// Set the output colorspace to RGBA, equivalent of calling
    /// ```rust
    /// use ferrite_jpeg::{ColorSpace, Decoder};
    /// Decoder::new().set_output_colorspace(ColorSpace::RGBA);
    /// ```
    pub fn rgba(&mut self) {
        self.set_output_colorspace(ColorSpace::RGBA);
    }

    /// Set the number of threads used for post processing.
    ///
    /// Defaults to one per CPU. Entropy decoding is sequential either way,
    /// the threads split the dequantize/IDCT/up-sample/color convert work
    /// per MCU row.
    ///
    /// # Errors
    /// When `threads` is zero.
    pub fn set_num_threads(&mut self, threads: usize) -> Result<(), DecodeErrors> {
        if threads == 0 {
            return Err(DecodeErrors::MalformedSegment(
                "cannot decode with zero threads".to_string(),
            ));
        }
        self.num_threads = Some(threads);

        Ok(())
    }

    /// Decode the headers of an image.
    ///
    /// # Supported headers
    ///  - APP(0) -> JFIF metadata
    ///  - SOF(0) -> baseline frame header
    ///  - DQT -> quantization tables
    ///  - DHT -> Huffman tables
    ///  - SOS -> start of scan
    ///  - DRI, COM
    /// # Unsupported headers
    ///  - SOF(n != 0) -> progressive, lossless and arithmetic schemes
    ///  - DAC, DNL
    fn decode_headers_internal(
        &mut self, buf: &mut Cursor<Vec<u8>>,
    ) -> Result<(), DecodeErrors> {
        // Parsing a second image on the same instance starts from scratch.
        self.info = ImageInfo::default();
        self.components.clear();
        self.restart_interval = 0;
        self.comment = None;
        self.thumbnail = None;

        // First two bytes should be the start of image marker.
        let magic_bytes = read_u16_be(buf)
            .map_err(|_| DecodeErrors::IllegalMagicBytes(0))?;

        if magic_bytes != 0xFFD8 {
            return Err(DecodeErrors::IllegalMagicBytes(magic_bytes));
        }

        let mut last_byte = 0;

        loop {
            let m = read_u8(buf).map_err(|_| {
                DecodeErrors::MalformedSegment(
                    "stream ended before the start of scan".to_string(),
                )
            })?;

            // Markers look like 0xFF followed by anything that is not 0x00
            // or another fill 0xFF.
            if last_byte == 0xFF && m != 0xFF && m != 0x00 {
                if let Some(marker) = Marker::from_u8(m) {
                    if self.parse_marker_inner(marker, buf)? {
                        return Ok(());
                    }
                    last_byte = 0;
                    continue;
                }

                error!("Marker 0xFF{:02X} not known", m);

                let length = read_u16_be(buf)?;

                if length < 2 {
                    return Err(DecodeErrors::MalformedSegment(format!(
                        "found a marker with invalid length {}",
                        length
                    )));
                }

                warn!("Skipping {} bytes", length - 2);
                skip_bytes(buf, usize::from(length) - 2)?;
            }
            last_byte = m;
        }
    }

    /// Dispatch a single marker. Returns `true` once the start of scan has
    /// been parsed, which is where header parsing stops.
    fn parse_marker_inner(
        &mut self, marker: Marker, buf: &mut Cursor<Vec<u8>>,
    ) -> Result<bool, DecodeErrors> {
        match marker {
            Marker::SOF(0) => {
                info!("Image encoding scheme: baseline DCT");
                parse_start_of_frame(buf, self)?;
            }
            // Progressive, lossless and arithmetic frames are not
            // supported, say so by name where we can.
            Marker::SOF(v) => {
                return match UnsupportedSchemes::from_int(v) {
                    Some(scheme) => Err(DecodeErrors::Unsupported(scheme)),
                    None => Err(DecodeErrors::MalformedSegment(format!(
                        "unsupported start of frame marker SOF{}",
                        v
                    ))),
                };
            }
            Marker::APP(0) => {
                parse_app0(buf, self)?;
            }
            Marker::DQT => {
                parse_dqt(self, buf)?;
            }
            Marker::DHT => {
                parse_huffman(self, buf)?;
            }
            Marker::SOS => {
                if self.components.is_empty() {
                    return Err(DecodeErrors::MalformedSegment(
                        "start of scan appeared before the frame header".to_string(),
                    ));
                }
                parse_sos(buf, self)?;

                // What follows is the entropy coded data.
                return Ok(true);
            }
            Marker::DRI => {
                parse_dri(buf, self)?;
            }
            Marker::COM => {
                parse_com(buf, self)?;
            }
            Marker::EOI => {
                return Err(DecodeErrors::MalformedSegment(
                    "premature end of image".to_string(),
                ));
            }
            Marker::RST(n) => {
                return Err(DecodeErrors::MalformedSegment(format!(
                    "restart marker RST{} outside the entropy coded data",
                    n
                )));
            }
            Marker::DAC | Marker::DNL => {
                return Err(DecodeErrors::MalformedSegment(format!(
                    "parsing of the {:?} header is not supported, cannot continue",
                    marker
                )));
            }
            Marker::SOI | Marker::TEM => {
                warn!("Stray standalone {:?} marker, ignoring", marker);
            }
            _ => {
                warn!("Capabilities for processing marker {:?} not implemented", marker);

                let length = read_u16_be(buf)?;

                if length < 2 {
                    return Err(DecodeErrors::MalformedSegment(format!(
                        "found a marker with invalid length {}",
                        length
                    )));
                }
                warn!("Skipping {} bytes", length - 2);
                skip_bytes(buf, usize::from(length) - 2)?;
            }
        }

        Ok(false)
    }

    fn decode_internal(&mut self, mut buf: Cursor<Vec<u8>>) -> Result<Vec<u8>, DecodeErrors> {
        self.decode_headers_internal(&mut buf)?;

        self.decode_mcu_ycbcr_baseline(&mut buf)
    }

    /// Derive the MCU grid from the parsed components.
    ///
    /// Called at the end of the frame header parse, once sampling factors
    /// are known.
    pub(crate) fn set_mcu_dimensions(&mut self) {
        self.h_max = self
            .components
            .iter()
            .map(|c| c.horizontal_sample)
            .max()
            .unwrap_or(1);
        self.v_max = self
            .components
            .iter()
            .map(|c| c.vertical_sample)
            .max()
            .unwrap_or(1);

        // Each MCU covers an (h_max * 8) x (v_max * 8) pixel footprint;
        // the edges get padding MCUs that are cropped at assembly.
        self.mcu_x = (usize::from(self.info.width) + self.h_max * 8 - 1) / (self.h_max * 8);
        self.mcu_y = (usize::from(self.info.height) + self.v_max * 8 - 1) / (self.v_max * 8);

        info!(
            "MCU grid {} x {}, sampling {}:{}",
            self.mcu_x, self.mcu_y, self.h_max, self.v_max
        );
    }

    /// Set up-sampling routines in case an image is down sampled.
    ///
    /// # Errors
    /// When a component's sampling factor does not divide the maximum, in
    /// which case replication cannot reach the MCU footprint.
    pub(crate) fn set_upsampling(&mut self) -> Result<(), DecodeErrors> {
        for component in &mut self.components {
            if self.h_max % component.horizontal_sample != 0
                || self.v_max % component.vertical_sample != 0
            {
                return Err(DecodeErrors::MalformedSegment(format!(
                    "sampling factors ({}, {}) of component {:?} do not divide the maximum ({}, {})",
                    component.horizontal_sample,
                    component.vertical_sample,
                    component.component_id,
                    self.h_max,
                    self.v_max
                )));
            }

            let h_scale = self.h_max / component.horizontal_sample;
            let v_scale = self.v_max / component.vertical_sample;

            component.up_sampler = crate::upsampler::choose_upsampler(h_scale, v_scale);
        }

        Ok(())
    }
}

/// A struct representing image information.
#[derive(Default, Clone, Eq, PartialEq)]
pub struct ImageInfo {
    /// Width of the image
    pub width: u16,
    /// Height of the image
    pub height: u16,
    /// Sample precision in bits, always 8 for supported images
    pub pixel_density: u8,
    /// Number of components
    pub components: u8,
    /// JFIF major version from APP0
    pub version_major: u8,
    /// JFIF minor version from APP0
    pub version_minor: u8,
    /// Density unit from APP0, 0 none, 1 dots per inch, 2 dots per cm
    pub density_unit: u8,
    /// Horizontal pixel density
    pub x_density: u16,
    /// Vertical pixel density
    pub y_density: u16,
}
