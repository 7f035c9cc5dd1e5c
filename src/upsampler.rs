//! Up-sampling routines.
//!
//! Components stored at a lower resolution than the luma plane are brought
//! back to the full MCU footprint by nearest neighbor replication: every
//! decoded sample is repeated `hmax / h` times across and `vmax / v` times
//! down. Replication never reads outside the sample's own block, so chroma
//! cannot bleed across an MCU boundary.
use crate::components::UpSampler;

/// Pick the replication routine for a component's scale factors.
///
/// The common factors get a dedicated routine, anything else (the 4x
/// ratios) falls through to the generic one.
pub(crate) fn choose_upsampler(h_scale: usize, v_scale: usize) -> UpSampler {
    match (h_scale, v_scale) {
        (1, 1) => upsample_no_op,
        (2, 1) => upsample_horizontal,
        (1, 2) => upsample_vertical,
        (2, 2) => upsample_hv,
        (_, _) => upsample_generic,
    }
}

/// Up-sample nothing, the component is already at full resolution.
pub(crate) fn upsample_no_op(
    input: &[f32], _width: usize, _height: usize, _h_scale: usize, _v_scale: usize,
) -> Vec<f32> {
    input.to_vec()
}

/// Double every sample horizontally.
pub(crate) fn upsample_horizontal(
    input: &[f32], width: usize, _height: usize, _h_scale: usize, _v_scale: usize,
) -> Vec<f32> {
    let mut out = vec![0_f32; input.len() * 2];

    for (out_row, in_row) in out.chunks_exact_mut(width * 2).zip(input.chunks_exact(width)) {
        for (pair, sample) in out_row.chunks_exact_mut(2).zip(in_row.iter()) {
            pair[0] = *sample;
            pair[1] = *sample;
        }
    }

    out
}

/// Double every row vertically.
pub(crate) fn upsample_vertical(
    input: &[f32], width: usize, _height: usize, _h_scale: usize, _v_scale: usize,
) -> Vec<f32> {
    let mut out = vec![0_f32; input.len() * 2];

    for (out_rows, in_row) in out.chunks_exact_mut(width * 2).zip(input.chunks_exact(width)) {
        out_rows[..width].copy_from_slice(in_row);
        out_rows[width..].copy_from_slice(in_row);
    }

    out
}

/// Double in both directions, the 4:2:0 case.
pub(crate) fn upsample_hv(
    input: &[f32], width: usize, height: usize, _h_scale: usize, _v_scale: usize,
) -> Vec<f32> {
    let widened = upsample_horizontal(input, width, height, 2, 1);

    upsample_vertical(&widened, width * 2, height, 1, 2)
}

/// Replicate by arbitrary integral factors.
pub(crate) fn upsample_generic(
    input: &[f32], width: usize, height: usize, h_scale: usize, v_scale: usize,
) -> Vec<f32> {
    let out_width = width * h_scale;
    let mut out = vec![0_f32; input.len() * h_scale * v_scale];

    for y in 0..height * v_scale {
        let in_row = &input[(y / v_scale) * width..][..width];
        let out_row = &mut out[y * out_width..][..out_width];

        for (x, sample) in out_row.iter_mut().enumerate() {
            *sample = in_row[x / h_scale];
        }
    }

    out
}

//---------------------------------------------
// TEST
//----------------------------------------------
#[test]
fn hv_replication_geometry() {
    // One 2x2 plane blown up to 4x4; each input sample must own a 2x2
    // pixel block.
    let input = [1.0, 2.0, 3.0, 4.0];

    let out = upsample_hv(&input, 2, 2, 2, 2);

    #[rustfmt::skip]
    let expected = [
        1.0, 1.0, 2.0, 2.0,
        1.0, 1.0, 2.0, 2.0,
        3.0, 3.0, 4.0, 4.0,
        3.0, 3.0, 4.0, 4.0,
    ];
    assert_eq!(out, expected);
}

#[test]
fn generic_matches_the_specialised_kernels() {
    let input: Vec<f32> = (0..32).map(|v| v as f32).collect();

    assert_eq!(
        upsample_generic(&input, 8, 4, 2, 1),
        upsample_horizontal(&input, 8, 4, 2, 1),
        "Algorithms do not match"
    );
    assert_eq!(
        upsample_generic(&input, 8, 4, 1, 2),
        upsample_vertical(&input, 8, 4, 1, 2),
        "Algorithms do not match"
    );
    assert_eq!(
        upsample_generic(&input, 8, 4, 2, 2),
        upsample_hv(&input, 8, 4, 2, 2)
    );
}
