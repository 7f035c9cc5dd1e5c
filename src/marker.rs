//! Marker byte classification.
//!
//! Markers are two byte codes, `0xFF` followed by anything that is neither
//! `0x00` nor another `0xFF`. The second byte is what this module maps to a
//! type.

/// Markers that can appear in a JPEG stream.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub(crate) enum Marker {
    /// Temporary private use in arithmetic coding
    TEM,
    /// Start of frame, the argument is the frame type (0 = baseline DCT)
    SOF(u8),
    /// Define Huffman tables
    DHT,
    /// Define arithmetic coding conditioning
    DAC,
    /// Restart marker, argument is the index modulo 8
    RST(u8),
    /// Start of image
    SOI,
    /// End of image
    EOI,
    /// Start of scan
    SOS,
    /// Define quantization tables
    DQT,
    /// Define number of lines
    DNL,
    /// Define restart interval
    DRI,
    /// Application segment, `0xFFE0..=0xFFEF`
    APP(u8),
    /// Comment
    COM,
}

impl Marker {
    /// Classify the byte following a `0xFF` in the stream.
    ///
    /// Returns `None` for bytes that do not identify a marker this decoder
    /// knows about, including reserved codes.
    pub fn from_u8(n: u8) -> Option<Marker> {
        match n {
            0x01 => Some(Marker::TEM),
            // 0xC4, 0xC8 and 0xCC sit inside the SOF range but are not
            // frame markers.
            0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF => Some(Marker::SOF(n - 0xC0)),
            0xC4 => Some(Marker::DHT),
            0xCC => Some(Marker::DAC),
            0xD0..=0xD7 => Some(Marker::RST(n - 0xD0)),
            0xD8 => Some(Marker::SOI),
            0xD9 => Some(Marker::EOI),
            0xDA => Some(Marker::SOS),
            0xDB => Some(Marker::DQT),
            0xDC => Some(Marker::DNL),
            0xDD => Some(Marker::DRI),
            0xE0..=0xEF => Some(Marker::APP(n - 0xE0)),
            0xFE => Some(Marker::COM),
            _ => None,
        }
    }
}
