//! A small synthetic JPEG writer for the tests.
//!
//! Builds minimal but fully valid baseline streams: identity quantization
//! tables, a configurable DC Huffman table, an AC table that only knows
//! end-of-block, and DC-only coefficient data. That is enough to produce
//! images with exactly known pixel values without checking binary
//! fixtures into the repository.
#![allow(dead_code)]

use std::collections::HashMap;

/// MSB-first bit writer with JPEG byte stuffing.
pub struct BitWriter {
    out: Vec<u8>,
    acc: u32,
    nbits: u8,
}

impl BitWriter {
    pub fn new() -> BitWriter {
        BitWriter {
            out: vec![],
            acc: 0,
            nbits: 0,
        }
    }

    pub fn put_bits(&mut self, value: u32, count: u8) {
        for i in (0..count).rev() {
            self.acc = (self.acc << 1) | ((value >> i) & 1);
            self.nbits += 1;

            if self.nbits == 8 {
                let byte = self.acc as u8;
                self.out.push(byte);
                // A literal 0xFF data byte is always followed by a
                // stuffed 0x00.
                if byte == 0xFF {
                    self.out.push(0x00);
                }
                self.acc = 0;
                self.nbits = 0;
            }
        }
    }

    /// Pad to a byte boundary with 1 bits.
    pub fn pad_to_byte(&mut self) {
        while self.nbits != 0 {
            self.put_bits(1, 1);
        }
    }

    /// Emit marker bytes directly, bypassing stuffing.
    pub fn raw(&mut self, bytes: &[u8]) {
        self.out.extend_from_slice(bytes);
    }

    pub fn finish(self) -> Vec<u8> {
        self.out
    }
}

/// Assign canonical codes to `symbols` given the 16 per-length counts,
/// the same rule the decoder reconstructs tables with.
pub fn canonical_codes(counts: &[u8; 16], symbols: &[u8]) -> HashMap<u8, (u16, u8)> {
    let mut codes = HashMap::new();
    let mut code: u16 = 0;
    let mut k = 0;

    for length in 1..=16 {
        for _ in 0..counts[length - 1] {
            codes.insert(symbols[k], (code, length as u8));
            code += 1;
            k += 1;
        }
        code <<= 1;
    }

    codes
}

/// Magnitude category of a coefficient value, the bit count of |v|.
pub fn category(v: i32) -> u8 {
    (32 - v.unsigned_abs().leading_zeros()) as u8
}

/// The raw magnitude bits for a value of the given category.
pub fn magnitude_bits(v: i32, category: u8) -> u32 {
    if v >= 0 {
        v as u32
    } else {
        (v + (1 << category) - 1) as u32
    }
}

pub struct JpegBuilder {
    pub width: u16,
    pub height: u16,
    /// (horizontal, vertical) sampling factors for Y, Cb, Cr.
    pub sampling: [(usize, usize); 3],
    /// MCUs between restart markers, 0 for none.
    pub restart_interval: u16,
    pub dc_counts: [u8; 16],
    pub dc_symbols: Vec<u8>,
    /// Write the quantization table with 16 bit precision.
    pub qt_16bit: bool,
    pub app0: bool,
    /// (width, height, rgb bytes) of a JFIF thumbnail.
    pub thumbnail: Option<(u8, u8, Vec<u8>)>,
    pub comment: Option<Vec<u8>>,
    /// DC Huffman table slot the scan header references.
    pub sos_dc_slot: u8,
}

impl JpegBuilder {
    pub fn new(width: u16, height: u16) -> JpegBuilder {
        // 12 codes of length 4 mapping category k to code k.
        let mut dc_counts = [0_u8; 16];
        dc_counts[3] = 12;

        JpegBuilder {
            width,
            height,
            sampling: [(1, 1); 3],
            restart_interval: 0,
            dc_counts,
            dc_symbols: (0..12).collect(),
            qt_16bit: false,
            app0: false,
            thumbnail: None,
            comment: None,
            sos_dc_slot: 0,
        }
    }

    pub fn mcu_grid(&self) -> (usize, usize) {
        let h_max = self.sampling.iter().map(|s| s.0).max().unwrap();
        let v_max = self.sampling.iter().map(|s| s.1).max().unwrap();

        (
            (usize::from(self.width) + h_max * 8 - 1) / (h_max * 8),
            (usize::from(self.height) + v_max * 8 - 1) / (v_max * 8),
        )
    }

    /// Data units component `comp` contributes to the whole image.
    pub fn blocks_for(&self, comp: usize) -> usize {
        let (mcu_x, mcu_y) = self.mcu_grid();

        mcu_x * mcu_y * self.sampling[comp].0 * self.sampling[comp].1
    }

    /// Build a stream where every block of a component has the same DC
    /// coefficient.
    pub fn build_uniform(&self, dc: [i32; 3]) -> Vec<u8> {
        let values = [
            vec![dc[0]; self.blocks_for(0)],
            vec![dc[1]; self.blocks_for(1)],
            vec![dc[2]; self.blocks_for(2)],
        ];

        self.build(&values)
    }

    /// Build the stream. `dc_values` holds, per component, the absolute
    /// DC coefficient of each of its blocks in decode order; all AC
    /// coefficients are zero.
    pub fn build(&self, dc_values: &[Vec<i32>; 3]) -> Vec<u8> {
        let mut out = vec![0xFF, 0xD8];

        if self.app0 {
            let (tw, th, thumb) = match &self.thumbnail {
                Some((w, h, data)) => (*w, *h, data.clone()),
                None => (0, 0, vec![]),
            };

            out.extend([0xFF, 0xE0]);
            push_u16(&mut out, 16 + thumb.len() as u16);
            out.extend(b"JFIF\0");
            out.extend([1, 1]); // version
            out.push(0); // density unit
            push_u16(&mut out, 96);
            push_u16(&mut out, 96);
            out.extend([tw, th]);
            out.extend(thumb);
        }

        if let Some(comment) = &self.comment {
            out.extend([0xFF, 0xFE]);
            push_u16(&mut out, comment.len() as u16 + 2);
            out.extend(comment);
        }

        // Identity quantization table in slot 0.
        out.extend([0xFF, 0xDB]);
        if self.qt_16bit {
            push_u16(&mut out, 2 + 1 + 128);
            out.push(0x10);
            for _ in 0..64 {
                out.extend([0, 1]);
            }
        } else {
            push_u16(&mut out, 2 + 1 + 64);
            out.push(0x00);
            out.extend([1_u8; 64]);
        }

        // Baseline frame header.
        out.extend([0xFF, 0xC0]);
        push_u16(&mut out, 8 + 9);
        out.push(8);
        push_u16(&mut out, self.height);
        push_u16(&mut out, self.width);
        out.push(3);
        for (index, (h, v)) in self.sampling.iter().enumerate() {
            out.push(index as u8 + 1);
            out.push(((h << 4) | v) as u8);
            out.push(0);
        }

        // DC table in slot 0.
        out.extend([0xFF, 0xC4]);
        push_u16(&mut out, 2 + 1 + 16 + self.dc_symbols.len() as u16);
        out.push(0x00);
        out.extend(self.dc_counts);
        out.extend(&self.dc_symbols);

        // AC table in slot 0: a single length 1 code for end-of-block.
        let mut ac_counts = [0_u8; 16];
        ac_counts[0] = 1;
        out.extend([0xFF, 0xC4]);
        push_u16(&mut out, 2 + 1 + 16 + 1);
        out.push(0x10);
        out.extend(ac_counts);
        out.push(0x00);

        if self.restart_interval > 0 {
            out.extend([0xFF, 0xDD, 0x00, 0x04]);
            push_u16(&mut out, self.restart_interval);
        }

        // Scan header.
        out.extend([0xFF, 0xDA]);
        push_u16(&mut out, 6 + 2 * 3);
        out.push(3);
        for index in 0..3 {
            out.push(index + 1);
            out.push(self.sos_dc_slot << 4);
        }
        out.extend([0, 63, 0]);

        // Entropy coded data.
        let dc_codes = canonical_codes(&self.dc_counts, &self.dc_symbols);
        let ac_codes = canonical_codes(&ac_counts, &[0x00]);
        let eob = ac_codes[&0x00];

        let (mcu_x, mcu_y) = self.mcu_grid();
        let interval = usize::from(self.restart_interval);

        let mut writer = BitWriter::new();
        let mut predictors = [0_i32; 3];
        let mut block_index = [0_usize; 3];
        let mut restart_index = 0_u8;

        for mcu in 0..mcu_x * mcu_y {
            if interval > 0 && mcu > 0 && mcu % interval == 0 {
                writer.pad_to_byte();
                writer.raw(&[0xFF, 0xD0 + restart_index]);
                restart_index = (restart_index + 1) % 8;
                predictors = [0; 3];
            }

            for comp in 0..3 {
                let (h, v) = self.sampling[comp];

                for _ in 0..h * v {
                    let dc = dc_values[comp][block_index[comp]];
                    block_index[comp] += 1;

                    let diff = dc - predictors[comp];
                    predictors[comp] = dc;

                    let cat = category(diff);
                    let (code, length) = dc_codes[&cat];
                    writer.put_bits(u32::from(code), length);
                    if cat > 0 {
                        writer.put_bits(magnitude_bits(diff, cat), cat);
                    }

                    writer.put_bits(u32::from(eob.0), eob.1);
                }
            }
        }

        writer.pad_to_byte();
        out.extend(writer.finish());
        out.extend([0xFF, 0xD9]);

        out
    }
}

fn push_u16(out: &mut Vec<u8>, value: u16) {
    out.extend(value.to_be_bytes());
}
