//! Per-component state: sampling factors, table assignments and the
//! running DC predictor.
use crate::errors::DecodeErrors;
use crate::upsampler::upsample_no_op;

/// An up-sampling routine, chosen per component once the sampling factors
/// are known.
///
/// Takes the component's sample plane, its width and height, and the
/// horizontal and vertical replication factors; returns the plane scaled
/// to the full MCU footprint.
pub(crate) type UpSampler = fn(&[f32], usize, usize, usize, usize) -> Vec<f32>;

/// Component data from the start of frame.
#[derive(Clone)]
pub(crate) struct Components {
    pub component_id: ComponentID,
    /// Horizontal sampling factor, 1 to 4, high nibble in the frame header
    pub horizontal_sample: usize,
    /// Vertical sampling factor, 1 to 4, low nibble in the frame header
    pub vertical_sample: usize,
    /// Quantization table slot this component dequantizes against
    pub quantization_table_number: u8,
    /// The table itself, moved here from the decoder before the scan
    pub quantization_table: [i32; 64],
    /// DC Huffman table slot, set by the scan header
    pub dc_huff_table: usize,
    /// AC Huffman table slot, set by the scan header
    pub ac_huff_table: usize,
    /// Running DC predictor, reset at scan start and at restart markers
    pub dc_pred: i32,
    pub up_sampler: UpSampler,
}

impl Components {
    /// Create a new instance from the three bytes a frame header carries
    /// per component.
    pub fn from(a: [u8; 3], position: usize) -> Result<Components, DecodeErrors> {
        let component_id = match a[0] {
            1 => ComponentID::Y,
            2 => ComponentID::Cb,
            3 => ComponentID::Cr,
            id => {
                return Err(DecodeErrors::MalformedSegment(format!(
                    "unknown component id {}, expected a value between 1 and 3",
                    id
                )))
            }
        };

        if component_id as usize != position + 1 {
            return Err(DecodeErrors::MalformedSegment(format!(
                "component {:?} appears at frame position {}, expected Y, Cb, Cr order",
                component_id, position
            )));
        }

        // High nibble horizontal, low nibble vertical, B.2.2.
        let horizontal_sample = usize::from(a[1] >> 4);
        let vertical_sample = usize::from(a[1] & 0x0F);

        if !(1..=4).contains(&horizontal_sample) || !(1..=4).contains(&vertical_sample) {
            return Err(DecodeErrors::MalformedSegment(format!(
                "sampling factors ({}, {}) for component {:?} are outside 1..=4",
                horizontal_sample, vertical_sample, component_id
            )));
        }

        let quantization_table_number = a[2];

        if quantization_table_number > 3 {
            return Err(DecodeErrors::MalformedSegment(format!(
                "quantization table id {} for component {:?} is outside 0..=3",
                quantization_table_number, component_id
            )));
        }

        debug!(
            "Component ID:{:?}, Horizontal Sample:{}, Vertical Sample:{}, Quantization table:{}",
            component_id, horizontal_sample, vertical_sample, quantization_table_number
        );

        Ok(Components {
            component_id,
            horizontal_sample,
            vertical_sample,
            quantization_table_number,
            quantization_table: [0; 64],
            dc_huff_table: 0,
            ac_huff_table: 0,
            dc_pred: 0,
            up_sampler: upsample_no_op,
        })
    }
}

/// Component IDs for the colorspace this decoder handles.
#[derive(Copy, Debug, Clone, PartialEq, Eq)]
pub enum ComponentID {
    /// Luma
    Y = 1,
    /// Blue difference chroma
    Cb = 2,
    /// Red difference chroma
    Cr = 3,
}
