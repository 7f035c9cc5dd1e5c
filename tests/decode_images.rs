//! End to end decode tests on synthetic streams with exactly known pixel
//! values.
//!
//! All images here are DC-only: the IDCT of a lone DC coefficient `c`
//! against an identity quantization table is a flat block of `c / 8 + 128`,
//! so a block with DC 256 decodes to luma 160, DC 0 to 128 and so on.
//! Pixel comparisons allow one count of slack for the clamp-then-truncate
//! rounding at the end of the pipeline.
mod common;

use common::JpegBuilder;
use ferrite_jpeg::Decoder;

fn assert_close(actual: u8, expected: u8, context: &str) {
    assert!(
        i16::from(actual).abs_diff(i16::from(expected)) <= 1,
        "{}: got {}, expected {} +- 1",
        context,
        actual,
        expected
    );
}

fn assert_flat_rgb(pixels: &[u8], value: u8) {
    for (index, byte) in pixels.iter().enumerate() {
        assert_close(*byte, value, &format!("byte {}", index));
    }
}

#[test]
fn uniform_single_mcu_444() {
    // One 8x8 MCU, Y DC 256 -> luma 160, neutral chroma.
    let data = JpegBuilder::new(8, 8).build_uniform([256, 0, 0]);

    let mut decoder = Decoder::new();
    let pixels = decoder.decode_buffer(&data).unwrap();

    assert_eq!(decoder.width(), 8);
    assert_eq!(decoder.height(), 8);
    assert_eq!(decoder.component_count(), 3);
    assert_eq!(pixels.len(), 8 * 8 * 3);
    assert_flat_rgb(&pixels, 160);
}

#[test]
fn chroma_420_sampling_geometry() {
    // A single 16x16 MCU sampled 4:2:0: four luma blocks with distinct DC
    // values and one block per chroma plane. Each luma block must own its
    // own 8x8 quadrant, and the neutral chroma must reach every pixel.
    let mut builder = JpegBuilder::new(16, 16);
    builder.sampling = [(2, 2), (1, 1), (1, 1)];

    let data = builder.build(&[
        // raster order within the sampling grid
        vec![0, 256, -256, 512],
        vec![0],
        vec![0],
    ]);

    let mut decoder = Decoder::new();
    let pixels = decoder.decode_buffer(&data).unwrap();

    assert_eq!(pixels.len(), 16 * 16 * 3);

    let pixel = |x: usize, y: usize| {
        let offset = (y * 16 + x) * 3;
        [pixels[offset], pixels[offset + 1], pixels[offset + 2]]
    };

    // Quadrant luma values: 128, 160 over 96, 192; neutral chroma means
    // r = g = b everywhere.
    for (x, y, expected) in [
        (0, 0, 128),
        (7, 7, 128),
        (8, 0, 160),
        (15, 7, 160),
        (0, 8, 96),
        (7, 15, 96),
        (8, 8, 192),
        (15, 15, 192),
    ] {
        for channel in pixel(x, y) {
            assert_close(channel, expected, &format!("pixel ({}, {})", x, y));
        }
    }
}

#[test]
fn dc_predictors_reset_at_restart_markers() {
    // Two MCUs with a restart interval of one. Both encode the same
    // absolute DC, so the second MCU's difference is encoded against a
    // fresh predictor; a decoder that leaks the predictor across the
    // restart marker would double it and brighten the right half.
    let mut builder = JpegBuilder::new(16, 8);
    builder.restart_interval = 1;

    let data = builder.build(&[vec![256, 256], vec![0, 0], vec![0, 0]]);

    let mut decoder = Decoder::new();
    let pixels = decoder.decode_buffer(&data).unwrap();

    assert_eq!(pixels.len(), 16 * 8 * 3);
    assert_flat_rgb(&pixels, 160);
}

#[test]
fn restart_markers_across_mcu_rows() {
    // A 4 MCU tall strip with a restart after every MCU, crossing row
    // boundaries; every segment re-encodes the same DC.
    let mut builder = JpegBuilder::new(8, 32);
    builder.restart_interval = 1;

    let data = builder.build_uniform([256, 0, 0]);

    let mut decoder = Decoder::new();
    let pixels = decoder.decode_buffer(&data).unwrap();

    assert_flat_rgb(&pixels, 160);
}

#[test]
fn crops_mcu_padding_outside_declared_dimensions() {
    // 10x6 forces two MCU columns with 6 padding columns and 2 padding
    // rows; the output must be exactly 10 * 6 pixels with the right MCU
    // visible at the right edge.
    let data = JpegBuilder::new(10, 6).build(&[
        vec![256, 512],
        vec![0, 0],
        vec![0, 0],
    ]);

    let mut decoder = Decoder::new();
    let pixels = decoder.decode_buffer(&data).unwrap();

    assert_eq!(pixels.len(), 10 * 6 * 3);

    let pixel = |x: usize, y: usize| pixels[(y * 10 + x) * 3];

    // Columns 0..8 come from the first MCU, columns 8 and 9 from the
    // second.
    assert_close(pixel(0, 0), 160, "top left");
    assert_close(pixel(7, 5), 160, "bottom of first MCU");
    assert_close(pixel(8, 0), 192, "top of second MCU");
    assert_close(pixel(9, 5), 192, "bottom right");
}

#[test]
fn stuffed_ff_bytes_in_the_entropy_stream() {
    // A DC table whose category 0 code is eight 1 bits, so every block
    // starts with a literal 0xFF byte that must be written stuffed and
    // read back unstuffed.
    let mut builder = JpegBuilder::new(8, 8);
    builder.dc_counts = [1, 1, 1, 1, 1, 1, 1, 2, 0, 0, 0, 0, 0, 0, 0, 0];
    builder.dc_symbols = vec![1, 2, 3, 4, 5, 6, 7, 8, 0];

    let data = builder.build_uniform([0, 0, 0]);

    // The stream really does exercise stuffing.
    assert!(
        data.windows(2).any(|w| w == [0xFF, 0x00]),
        "expected a stuffed byte in the entropy data"
    );

    let mut decoder = Decoder::new();
    let pixels = decoder.decode_buffer(&data).unwrap();

    assert_flat_rgb(&pixels, 128);
}

#[test]
fn sixteen_bit_quantization_tables() {
    let mut builder = JpegBuilder::new(8, 8);
    builder.qt_16bit = true;

    let data = builder.build_uniform([256, 0, 0]);

    let mut decoder = Decoder::new();
    let pixels = decoder.decode_buffer(&data).unwrap();

    assert_flat_rgb(&pixels, 160);
}

#[test]
fn rgba_output() {
    let data = JpegBuilder::new(8, 8).build_uniform([256, 0, 0]);

    let mut decoder = Decoder::new();
    decoder.rgba();

    let pixels = decoder.decode_buffer(&data).unwrap();

    assert_eq!(pixels.len(), 8 * 8 * 4);
    for pixel in pixels.chunks_exact(4) {
        assert_close(pixel[0], 160, "red");
        assert_close(pixel[1], 160, "green");
        assert_close(pixel[2], 160, "blue");
        assert_eq!(pixel[3], 255);
    }
}

#[test]
fn single_worker_thread_matches_default() {
    let mut builder = JpegBuilder::new(32, 24);
    builder.sampling = [(2, 2), (1, 1), (1, 1)];

    let blocks: Vec<i32> = (0..builder.blocks_for(0))
        .map(|i| i as i32 * 64 - 256)
        .collect();
    let data = builder.build(&[
        blocks,
        vec![32; builder.blocks_for(1)],
        vec![-32; builder.blocks_for(2)],
    ]);

    let mut single = Decoder::new();
    single.set_num_threads(1).unwrap();

    let mut parallel = Decoder::new();
    parallel.set_num_threads(4).unwrap();

    assert_eq!(
        single.decode_buffer(&data).unwrap(),
        parallel.decode_buffer(&data).unwrap()
    );
}

#[test]
fn colored_image_converts_chroma() {
    // Cb DC 256 puts every chroma sample at 160, 32 above neutral, which
    // lowers green and raises blue; expected values follow the clamp then
    // truncate rule.
    let data = JpegBuilder::new(8, 8).build_uniform([256, 256, 0]);

    let mut decoder = Decoder::new();
    let pixels = decoder.decode_buffer(&data).unwrap();

    let g = (160.0_f32 - 0.34414 * 32.0) as u8;
    let b = (160.0_f32 + 1.772 * 32.0) as u8;

    for pixel in pixels.chunks_exact(3) {
        assert_close(pixel[0], 160, "red");
        assert_close(pixel[1], g, "green");
        assert_close(pixel[2], b, "blue");
    }
}

#[test]
fn horizontal_subsampling_422() {
    // 4:2:2, two luma blocks side by side per MCU, chroma stretched
    // across both.
    let mut builder = JpegBuilder::new(16, 8);
    builder.sampling = [(2, 1), (1, 1), (1, 1)];

    let data = builder.build(&[vec![256, 512], vec![0], vec![0]]);

    let mut decoder = Decoder::new();
    let pixels = decoder.decode_buffer(&data).unwrap();

    let pixel = |x: usize, y: usize| pixels[(y * 16 + x) * 3];

    assert_close(pixel(0, 0), 160, "left luma block");
    assert_close(pixel(7, 7), 160, "left luma block");
    assert_close(pixel(8, 0), 192, "right luma block");
    assert_close(pixel(15, 7), 192, "right luma block");
}
