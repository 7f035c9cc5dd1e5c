//! Contains most common errors that may be encountered in decoding a JPEG
//! image.
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

/// Common decode errors.
///
/// Every variant is fatal to the decode call that raised it. There is no
/// local recovery, since the format promises byte exact structure and this
/// decoder never returns a partial image.
#[allow(clippy::module_name_repetitions)]
pub enum DecodeErrors {
    /// The stream does not begin with the `0xFFD8` start of image marker
    IllegalMagicBytes(u16),
    /// The image uses an encoding scheme this decoder does not implement
    Unsupported(UnsupportedSchemes),
    /// A marker segment is structurally broken, e.g. its declared length
    /// exceeds the remaining bytes or its fields contradict one another
    MalformedSegment(String),
    /// Problems with the Huffman coded entropy data in a JPEG file
    HuffmanDecode(String),
    /// A scan or component references a table id that was never defined
    TableReference(String),
    /// An underlying I/O error while reading the file
    Io(std::io::Error),
}

impl Debug for DecodeErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for DecodeErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self {
            Self::IllegalMagicBytes(bytes) => {
                write!(f, "Error parsing image. Illegal start bytes:{:#06X}", bytes)
            }
            Self::Unsupported(ref scheme) => write!(f, "{:?}", scheme),
            Self::MalformedSegment(ref reason) => {
                write!(f, "Error parsing marker segment. Reason:{}", reason)
            }
            Self::HuffmanDecode(ref reason) => {
                write!(f, "Error decoding huffman coded data.Reason:{}", reason)
            }
            Self::TableReference(ref reason) => {
                write!(f, "Reference to an undefined table. Reason:{}", reason)
            }
            Self::Io(ref err) => write!(f, "I/O error:{}", err),
        }
    }
}

impl Error for DecodeErrors {}

impl From<std::io::Error> for DecodeErrors {
    fn from(err: std::io::Error) -> DecodeErrors {
        DecodeErrors::Io(err)
    }
}

/// Contains unsupported/yet-to-be supported JPEG image encoding types.
#[derive(Eq, PartialEq, Copy, Clone)]
pub enum UnsupportedSchemes {
    /// SOF_1 Extended sequential DCT, Huffman coding
    ExtendedSequentialHuffman,
    /// Progressive DCT, Huffman coding
    ProgressiveDctHuffman,
    /// Lossless (sequential), Huffman coding
    LosslessHuffman,
    /// Extended sequential DCT, arithmetic coding
    ExtendedSequentialDctArithmetic,
    /// Progressive DCT, arithmetic coding
    ProgressiveDctArithmetic,
    /// Lossless (sequential), arithmetic coding
    LosslessArithmetic,
    /// A single component (grayscale) image
    GrayScale,
    /// A four component (CMYK or YCCK) image
    Cmyk,
}

impl Debug for UnsupportedSchemes {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self {
            Self::ExtendedSequentialHuffman => {
                write!(f, "The library cannot decode images encoded using the Extended Sequential Huffman encoding scheme.")
            }
            Self::ProgressiveDctHuffman => {
                write!(f, "The library cannot decode images encoded using the Progressive Huffman encoding scheme.")
            }
            Self::LosslessHuffman => {
                write!(f, "The library cannot decode images encoded with the Lossless Huffman encoding scheme.")
            }
            Self::ExtendedSequentialDctArithmetic => {
                write!(f, "The library cannot decode images encoded with the Extended Sequential DCT Arithmetic scheme.")
            }
            Self::ProgressiveDctArithmetic => {
                write!(f, "The library cannot decode images encoded with the Progressive DCT Arithmetic scheme.")
            }
            Self::LosslessArithmetic => {
                write!(f, "The library cannot decode images encoded with the Lossless Arithmetic encoding scheme.")
            }
            Self::GrayScale => {
                write!(f, "The library only decodes 3 component YCbCr images, this image is grayscale.")
            }
            Self::Cmyk => {
                write!(f, "The library only decodes 3 component YCbCr images, this image has 4 components.")
            }
        }
    }
}

impl UnsupportedSchemes {
    /// Map a start of frame number (the `n` in `SOFn`) to the scheme it
    /// announces.
    #[must_use]
    pub fn from_int(sof: u8) -> Option<UnsupportedSchemes> {
        match sof {
            1 => Some(Self::ExtendedSequentialHuffman),
            2 => Some(Self::ProgressiveDctHuffman),
            3 => Some(Self::LosslessHuffman),
            9 => Some(Self::ExtendedSequentialDctArithmetic),
            10 => Some(Self::ProgressiveDctArithmetic),
            11 => Some(Self::LosslessArithmetic),
            _ => None,
        }
    }
}
