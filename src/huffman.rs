//! Canonical Huffman table construction.
//!
//! A DHT segment carries 16 per-length code counts and a flat symbol list;
//! the codes themselves are never stored. They are reconstructed here with
//! the canonical assignment of ITU T.81 Annex C: codes of each length are
//! handed out consecutively, and the first code of length `L + 1` is the
//! successor of the last code of length `L`, shifted left by one bit. The
//! entropy stream was encoded against exactly this assignment, so the
//! rebuild has to be bit for bit identical.
#![allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]

/// Longest code the format allows, in bits.
pub(crate) const MAX_CODE_LENGTH: usize = 16;

/// A canonical Huffman decode table for one (class, id) slot.
///
/// `maxcode[l]` is the largest valid code of length `l` (or -1 when the
/// length is unused) and `values[code + delta[l]]` is the symbol a code of
/// length `l` maps to. That pair is all the bit-serial decoder in
/// [`crate::bitstream`] needs.
#[allow(clippy::module_name_repetitions)]
pub(crate) struct HuffmanTable {
    pub(crate) maxcode: [i32; MAX_CODE_LENGTH + 1],
    pub(crate) delta: [i32; MAX_CODE_LENGTH + 1],
    pub(crate) values: Vec<u8>,
}

impl HuffmanTable {
    /// Build a decode table from the 16 per-length counts and the symbol
    /// list of a DHT segment, symbols in order of increasing code length.
    pub fn new(counts: &[u8; 16], values: Vec<u8>) -> HuffmanTable {
        let mut maxcode = [-1_i32; MAX_CODE_LENGTH + 1];
        let mut delta = [0_i32; MAX_CODE_LENGTH + 1];

        // Generate the canonical code for each length, Figure C.2.
        let mut code = 0_i32;
        let mut k = 0_i32;

        for length in 1..=MAX_CODE_LENGTH {
            // `code + delta[length]` indexes into `values` for codes of
            // this length.
            delta[length] = k - code;

            let count = i32::from(counts[length - 1]);

            if count > 0 {
                k += count;
                code += count;
                maxcode[length] = code - 1;
            }
            // First code of the next length, one bit wider.
            code <<= 1;
        }

        HuffmanTable {
            maxcode,
            delta,
            values,
        }
    }
}
