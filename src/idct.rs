//! Dequantization and the inverse DCT.
//!
//! The transform is the separable 2D type-III DCT: a 1D pass over the
//! rows, then the same pass over the columns, each built from the 8 point
//! cosine basis (angles `k * pi / 16`). The even/odd factorisation below
//! is algebraically identical to the direct matrix multiply, just with the
//! shared products hoisted.
//!
//! Everything stays in `f32` from here on. Samples are level shifted by
//! +128 on the way out and are not rounded; the final clamp happens in
//! color conversion.
#![allow(clippy::excessive_precision, clippy::unreadable_literal)]

// cos(k * pi / 16) for k = 1..=7.
const C1: f32 = 0.9807852804032304;
const C2: f32 = 0.9238795325112867;
const C3: f32 = 0.8314696123025452;
const C4: f32 = 0.7071067811865476;
const C5: f32 = 0.5555702330196022;
const C6: f32 = 0.3826834323650898;
const C7: f32 = 0.1950903220161283;

/// Dequantize and inverse transform a row of coefficient blocks.
///
/// `coefficients` holds whole 8x8 blocks in natural order, 64 values each;
/// every block is multiplied against `qt_table` and transformed in place
/// into spatial samples, level shifted to the 0..255 range. Returns one
/// `f32` sample per coefficient, blocks kept in their input order.
pub(crate) fn dequantize_and_idct(coefficients: &[i16], qt_table: &[i32; 64]) -> Vec<f32> {
    let mut samples = vec![0_f32; coefficients.len()];

    for (coeff_block, sample_block) in coefficients
        .chunks_exact(64)
        .zip(samples.chunks_exact_mut(64))
    {
        for ((sample, coeff), quant) in sample_block
            .iter_mut()
            .zip(coeff_block.iter())
            .zip(qt_table.iter())
        {
            *sample = (i32::from(*coeff) * *quant) as f32;
        }

        idct_8x8(sample_block);
    }

    samples
}

/// Transform one dequantized 8x8 block to spatial samples, in place.
fn idct_8x8(block: &mut [f32]) {
    // row pass
    for row in block.chunks_exact_mut(8) {
        idct_1d(row, 1);
    }
    // column pass
    for column in 0..8 {
        idct_1d(&mut block[column..], 8);
    }
    // level shift
    for sample in block.iter_mut() {
        *sample += 128.0;
    }
}

/// One 8 point type-III pass over `data` at the given stride.
///
/// The even half reconstructs from coefficients 0, 2, 4, 6 and the odd
/// half from 1, 3, 5, 7; output k and 7 - k share all their products.
fn idct_1d(data: &mut [f32], stride: usize) {
    let s0 = data[0];
    let s1 = data[stride];
    let s2 = data[2 * stride];
    let s3 = data[3 * stride];
    let s4 = data[4 * stride];
    let s5 = data[5 * stride];
    let s6 = data[6 * stride];
    let s7 = data[7 * stride];

    let even0 = (s0 * C4 + s2 * C2 + s4 * C4 + s6 * C6) * 0.5;
    let even1 = (s0 * C4 + s2 * C6 - s4 * C4 - s6 * C2) * 0.5;
    let even2 = (s0 * C4 - s2 * C6 - s4 * C4 + s6 * C2) * 0.5;
    let even3 = (s0 * C4 - s2 * C2 + s4 * C4 - s6 * C6) * 0.5;

    let odd0 = (s1 * C7 - s3 * C5 + s5 * C3 - s7 * C1) * 0.5;
    let odd1 = (s1 * C5 - s3 * C1 + s5 * C7 + s7 * C3) * 0.5;
    let odd2 = (s1 * C3 - s3 * C7 - s5 * C1 - s7 * C5) * 0.5;
    let odd3 = (s1 * C1 + s3 * C3 + s5 * C5 + s7 * C7) * 0.5;

    data[0] = even0 + odd3;
    data[stride] = even1 + odd2;
    data[2 * stride] = even2 + odd1;
    data[3 * stride] = even3 + odd0;
    data[4 * stride] = even3 - odd0;
    data[5 * stride] = even2 - odd1;
    data[6 * stride] = even1 - odd2;
    data[7 * stride] = even0 - odd3;
}
