//! Small shared helpers: zig-zag permutation, colorspaces and byte readers.
use std::io::Cursor;

use crate::errors::DecodeErrors;

/// Un zig-zag a coefficient index.
///
/// This is used as an index mechanism, i.e. `UN_ZIGZAG[5]` gives you 2,
/// which means the value at zig-zag position 5 belongs at natural
/// position 2.
#[rustfmt::skip]
pub const UN_ZIGZAG: [usize; 64] = [
    0,  1,  8,  16, 9,  2,  3, 10,
    17, 24, 32, 25, 18, 11, 4,  5,
    12, 19, 26, 33, 40, 48, 41, 34,
    27, 20, 13, 6,  7,  14, 21, 28,
    35, 42, 49, 56, 57, 50, 43, 36,
    29, 22, 15, 23, 30, 37, 44, 51,
    58, 59, 52, 45, 38, 31, 39, 46,
    53, 60, 61, 54, 47, 55, 62, 63,
];

/// Image colorspaces.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum ColorSpace {
    /// Red, green, blue
    RGB,
    /// Red, green, blue and a constant 255 alpha channel
    RGBA,
    /// Luma and two chroma channels, the input colorspace of the images
    /// this decoder accepts
    YCbCr,
}

impl ColorSpace {
    /// Number of channels this colorspace carries per pixel.
    #[must_use]
    pub const fn num_components(self) -> usize {
        match self {
            ColorSpace::RGB | ColorSpace::YCbCr => 3,
            ColorSpace::RGBA => 4,
        }
    }
}

/// Read a single byte from the stream.
///
/// # Errors
/// Fails with `MalformedSegment` if the stream is exhausted, since every
/// caller is in the middle of a structure the stream promised to contain.
#[inline]
pub(crate) fn read_u8(reader: &mut Cursor<Vec<u8>>) -> Result<u8, DecodeErrors> {
    let pos = reader.position() as usize;

    let byte = *reader
        .get_ref()
        .get(pos)
        .ok_or_else(|| DecodeErrors::MalformedSegment("unexpected end of stream".to_string()))?;

    reader.set_position(pos as u64 + 1);
    Ok(byte)
}

/// Read a big-endian u16 from the stream.
///
/// # Errors
/// See [`read_u8`].
#[inline]
pub(crate) fn read_u16_be(reader: &mut Cursor<Vec<u8>>) -> Result<u16, DecodeErrors> {
    let msb = read_u8(reader)?;
    let lsb = read_u8(reader)?;

    Ok(u16::from(msb) << 8 | u16::from(lsb))
}

/// Number of unread bytes left in the stream.
#[inline]
pub(crate) fn remaining(reader: &Cursor<Vec<u8>>) -> usize {
    let pos = reader.position() as usize;

    reader.get_ref().len().saturating_sub(pos)
}

/// Skip `n` bytes without looking at them.
///
/// # Errors
/// Fails with `MalformedSegment` when fewer than `n` bytes remain.
#[inline]
pub(crate) fn skip_bytes(reader: &mut Cursor<Vec<u8>>, n: usize) -> Result<(), DecodeErrors> {
    if remaining(reader) < n {
        return Err(DecodeErrors::MalformedSegment(format!(
            "cannot skip {} bytes, stream has fewer left",
            n
        )));
    }
    reader.set_position(reader.position() + n as u64);

    Ok(())
}
