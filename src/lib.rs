//! A baseline JPEG decoder written from scratch
//!
//! This crate parses a JPEG byte stream directly into pixels, with no help
//! from platform codecs. The whole baseline pipeline is here: marker
//! scanning, canonical Huffman tables, entropy decoding, dequantization,
//! a floating point inverse DCT, chroma upsampling by sample replication
//! and YCbCr to RGB conversion.
//!
//! # Supported images
//! - Baseline (sequential DCT, Huffman coded) images only.
//! - 3 component YCbCr images. Grayscale and CMYK inputs are rejected.
//! - 8 and 16 bit quantization tables, restart markers, JFIF APP0
//!   metadata including the embedded thumbnail, and verbatim comments.
//!
//! Progressive images, arithmetic coding and the encode path are out of
//! scope, and the decoder will tell you so with a typed error instead of
//! guessing.
//!
//! # Usage
//! ```no_run
//! use ferrite_jpeg::Decoder;
//!
//! let mut decoder = Decoder::new();
//! let pixels = decoder.decode_file("image.jpg").unwrap();
//!
//! println!("{} x {}", decoder.width(), decoder.height());
//! ```
//!
//! # Accuracy
//! Sample data stays in floating point from the inverse DCT until the
//! final clamp in color conversion, so pixel values track the reference
//! transform closely. The YCbCr to RGB step clamps to `[0, 255]` and then
//! truncates toward zero.
//!
//! # Multithreading
//! Entropy decoding is sequential (the DC predictors force it to be), but
//! everything after it is per MCU row work. Those rows are handed to a
//! scoped thread pool, each worker writing its own disjoint slice of the
//! output, and the pool is joined before the decode call returns.

#![allow(
    clippy::needless_return,
    clippy::similar_names,
    clippy::inline_always,
    clippy::doc_markdown
)]
#![warn(
    clippy::correctness,
    clippy::perf,
    clippy::pedantic,
    clippy::missing_errors_doc,
    clippy::panic
)]
#![deny(missing_docs)]

#[macro_use]
extern crate log;

pub use crate::decoder::{Decoder, ImageInfo};
pub use crate::misc::ColorSpace;
pub use crate::probe::probe;

mod bitstream;
mod color_convert;
mod components;
mod decoder;
pub mod errors;
mod headers;
mod huffman;
mod idct;
mod marker;
mod mcu;
mod misc;
mod probe;
mod upsampler;
mod worker;
