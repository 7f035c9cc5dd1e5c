//! Post processing of decoded MCU rows.
//!
//! Everything after entropy decoding is independent per MCU row, so it
//! runs here, usually on a worker thread: dequantize and inverse
//! transform each component's blocks, scatter them into a sample plane,
//! replicate sub-sampled planes up to the MCU footprint and convert the
//! result to the output colorspace, cropping the horizontal padding as
//! scanlines are written.
use crate::components::Components;
use crate::decoder::ColorConvertPtr;
use crate::idct::dequantize_and_idct;

/// Turn one MCU row of coefficients into pixels.
///
/// `row_coefficients` holds one buffer per component with blocks in MCU
/// order. `output` is this row's slice of the image, `width * channels`
/// bytes per scanline; when the image height is not a multiple of the MCU
/// footprint the slice is short and the bottom padding scanlines are
/// simply never produced.
#[allow(clippy::too_many_arguments)]
pub(crate) fn post_process(
    row_coefficients: &[Vec<i16>], components: &[Components], h_max: usize, v_max: usize,
    mcus_in_row: usize, width: usize, color_convert: ColorConvertPtr, out_channels: usize,
    output: &mut [u8],
) {
    let full_width = mcus_in_row * h_max * 8;

    let planes: Vec<Vec<f32>> = row_coefficients
        .iter()
        .zip(components.iter())
        .map(|(coefficients, component)| {
            let samples = dequantize_and_idct(coefficients, &component.quantization_table);

            let plane = assemble_plane(&samples, component, mcus_in_row);

            let h_scale = h_max / component.horizontal_sample;
            let v_scale = v_max / component.vertical_sample;

            if h_scale == 1 && v_scale == 1 {
                plane
            } else {
                (component.up_sampler)(
                    &plane,
                    mcus_in_row * component.horizontal_sample * 8,
                    component.vertical_sample * 8,
                    h_scale,
                    v_scale,
                )
            }
        })
        .collect();

    // The row plane is full_width wide; only `width` samples of each
    // scanline are real, the rest is MCU padding and stays behind.
    for (scanline, out_row) in output.chunks_exact_mut(width * out_channels).enumerate() {
        let start = scanline * full_width;

        color_convert(
            &planes[0][start..start + width],
            &planes[1][start..start + width],
            &planes[2][start..start + width],
            out_row,
        );
    }
}

/// Scatter a component's IDCT output blocks into a contiguous sample
/// plane for this MCU row.
///
/// Block `(v, h)` of MCU `m` covers the 8x8 square whose top left corner
/// is `((m * h_samp + h) * 8, v * 8)`.
fn assemble_plane(samples: &[f32], component: &Components, mcus_in_row: usize) -> Vec<f32> {
    let h_samp = component.horizontal_sample;
    let v_samp = component.vertical_sample;
    let blocks_per_mcu = h_samp * v_samp;

    let plane_width = mcus_in_row * h_samp * 8;
    let mut plane = vec![0_f32; plane_width * v_samp * 8];

    for (block_index, block) in samples.chunks_exact(64).enumerate() {
        let mcu = block_index / blocks_per_mcu;
        let in_mcu = block_index % blocks_per_mcu;

        let block_v = in_mcu / h_samp;
        let block_h = in_mcu % h_samp;

        let x0 = (mcu * h_samp + block_h) * 8;
        let y0 = block_v * 8;

        for (row_index, block_row) in block.chunks_exact(8).enumerate() {
            let offset = (y0 + row_index) * plane_width + x0;

            plane[offset..offset + 8].copy_from_slice(block_row);
        }
    }

    plane
}
