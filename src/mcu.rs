//! The baseline MCU decode loop.
//!
//! This is the hot path. MCUs are pulled off the entropy coded stream in
//! raster order, one row of MCUs at a time; as soon as a row's
//! coefficients are in, the row is handed to a worker thread for
//! dequantization, IDCT, up-sampling and color conversion while the main
//! thread keeps feeding the bit stream. Entropy decoding itself cannot be
//! split, the DC predictors chain every block to the one before it, but
//! each finished row owns a disjoint slice of the output buffer so the
//! workers need no locks. The pool is joined before this returns.

use std::io::Cursor;
use std::sync::Arc;

use scoped_threadpool::Pool;

use crate::bitstream::BitStream;
use crate::decoder::Decoder;
use crate::errors::DecodeErrors;
use crate::marker::Marker;
use crate::worker::post_process;

/// Coefficients in one data unit.
pub const DCT_BLOCK: usize = 64;

impl Decoder {
    /// Decode the entropy coded data of a baseline scan into pixels.
    ///
    /// Expects every header up to and including SOS to have been parsed.
    #[allow(clippy::too_many_lines)]
    pub(crate) fn decode_mcu_ycbcr_baseline(
        &mut self, reader: &mut Cursor<Vec<u8>>,
    ) -> Result<Vec<u8>, DecodeErrors> {
        self.set_upsampling()?;
        self.check_tables()?;

        let width = usize::from(self.info.width);
        let height = usize::from(self.info.height);
        let out_channels = self.output_colorspace.num_components();

        let (mcu_x, mcu_y) = (self.mcu_x, self.mcu_y);
        let (h_max, v_max) = (self.h_max, self.v_max);

        // One MCU row covers v_max * 8 scanlines; the last chunk comes out
        // short when the height is not a multiple, which crops the bottom
        // padding for free.
        let chunk_size = width * out_channels * v_max * 8;
        let mut pixels = vec![0_u8; width * height * out_channels];

        let mut stream = BitStream::new();

        // Snapshot of the components for the workers. They need sampling
        // factors and quantization tables, not the DC predictors the main
        // thread keeps mutating.
        let components = Arc::new(self.components.clone());
        let color_convert = self.color_convert;

        let threads = self.num_threads.unwrap_or_else(num_cpus::get).max(1);
        let mut pool = Pool::new(threads as u32);

        debug!("Decoding {} MCU rows over {} threads", mcu_y, threads);

        pool.scoped(|scope| -> Result<(), DecodeErrors> {
            let mut chunks = pixels.chunks_mut(chunk_size);
            let mut mcus_done = 0;

            for _ in 0..mcu_y {
                let mut row_coefficients = Vec::with_capacity(self.components.len());

                for component in &self.components {
                    let blocks = component.horizontal_sample * component.vertical_sample;
                    row_coefficients.push(vec![0_i16; mcu_x * blocks * DCT_BLOCK]);
                }

                self.decode_mcu_row(reader, &mut stream, &mut row_coefficients, &mut mcus_done)?;

                let chunk = chunks.next().ok_or_else(|| {
                    DecodeErrors::MalformedSegment(
                        "MCU rows exceed the output buffer".to_string(),
                    )
                })?;

                let components = components.clone();

                scope.execute(move || {
                    post_process(
                        &row_coefficients,
                        &components,
                        h_max,
                        v_max,
                        mcu_x,
                        width,
                        color_convert,
                        out_channels,
                        chunk,
                    );
                });
            }

            Ok(())
        })?;

        debug!("Finished decoding image");

        Ok(pixels)
    }

    /// Decode one row of MCUs into per-component coefficient buffers.
    ///
    /// Blocks land in MCU order: all of an MCU's data units for component
    /// 1, then component 2, then component 3, each component's units in
    /// raster order within its sampling grid.
    fn decode_mcu_row(
        &mut self, reader: &mut Cursor<Vec<u8>>, stream: &mut BitStream,
        row_coefficients: &mut [Vec<i16>], mcus_done: &mut usize,
    ) -> Result<(), DecodeErrors> {
        let total_mcus = self.mcu_x * self.mcu_y;

        for mcu_col in 0..self.mcu_x {
            if stream.seen_eoi {
                // Truncated scan; the rest of the row stays zero and comes
                // out as flat gray.
                return Ok(());
            }

            for position in 0..self.components.len() {
                let (dc_index, ac_index, h_samp, v_samp) = {
                    let component = &self.components[position];
                    (
                        component.dc_huff_table,
                        component.ac_huff_table,
                        component.horizontal_sample,
                        component.vertical_sample,
                    )
                };

                let dc_table = self.dc_huffman_tables[dc_index].as_ref().ok_or_else(|| {
                    DecodeErrors::TableReference(format!(
                        "no DC Huffman table in slot {}",
                        dc_index
                    ))
                })?;
                let ac_table = self.ac_huffman_tables[ac_index].as_ref().ok_or_else(|| {
                    DecodeErrors::TableReference(format!(
                        "no AC Huffman table in slot {}",
                        ac_index
                    ))
                })?;

                let component = &mut self.components[position];
                let blocks_per_mcu = h_samp * v_samp;

                for block_v in 0..v_samp {
                    for block_h in 0..h_samp {
                        let mut block = [0_i16; DCT_BLOCK];

                        stream.decode_block(
                            reader,
                            dc_table,
                            ac_table,
                            &mut block,
                            &mut component.dc_pred,
                        )?;

                        let offset =
                            (mcu_col * blocks_per_mcu + block_v * h_samp + block_h) * DCT_BLOCK;

                        row_coefficients[position][offset..offset + DCT_BLOCK]
                            .copy_from_slice(&block);
                    }
                }
            }

            *mcus_done += 1;

            if self.restart_interval != 0
                && *mcus_done % self.restart_interval == 0
                && *mcus_done < total_mcus
            {
                self.handle_restart(reader, stream)?;
            } else {
                let marker = stream.marker;
                match marker {
                    // A restart marker with no interval declared. Reset
                    // anyway, the encoder clearly meant it.
                    Some(Marker::RST(n)) => {
                        warn!("RST{} marker without a restart interval", n);
                        self.reset_predictors(stream);
                    }
                    Some(Marker::EOI) => {
                        if *mcus_done < total_mcus {
                            warn!(
                                "EOI marker after {} of {} MCUs, image is truncated",
                                mcus_done, total_mcus
                            );
                        }
                        stream.seen_eoi = true;
                    }
                    _ => {}
                }
            }
        }

        Ok(())
    }

    /// Consume the restart marker that must sit at this MCU boundary and
    /// reset the entropy state.
    fn handle_restart(
        &mut self, reader: &mut Cursor<Vec<u8>>, stream: &mut BitStream,
    ) -> Result<(), DecodeErrors> {
        if stream.marker.is_none() {
            // The marker has not been hit during refills yet; it can only
            // be padding bits away, so force a read up to it.
            stream.refill(reader, 56);
        }

        let marker = stream.marker;
        match marker {
            Some(Marker::RST(_)) => {
                self.reset_predictors(stream);
                Ok(())
            }
            Some(Marker::EOI) => {
                warn!("EOI where a restart marker was expected, image is truncated");
                stream.seen_eoi = true;
                Ok(())
            }
            Some(marker) => Err(DecodeErrors::MalformedSegment(format!(
                "found {:?} where a restart marker was expected",
                marker
            ))),
            None => Err(DecodeErrors::MalformedSegment(
                "expected a restart marker, found entropy data".to_string(),
            )),
        }
    }

    /// Restart boundary: drop pad bits, forget the marker and zero every
    /// component's DC predictor.
    fn reset_predictors(&mut self, stream: &mut BitStream) {
        stream.reset();
        self.components.iter_mut().for_each(|c| c.dc_pred = 0);
    }

    /// Check that every table the scan references actually arrived, and
    /// move each component's quantization table into it.
    fn check_tables(&mut self) -> Result<(), DecodeErrors> {
        for component in &mut self.components {
            let qt_index = usize::from(component.quantization_table_number);

            component.quantization_table =
                self.qt_tables[qt_index].ok_or_else(|| {
                    DecodeErrors::TableReference(format!(
                        "component {:?} references undefined quantization table {}",
                        component.component_id, qt_index
                    ))
                })?;

            if self.dc_huffman_tables[component.dc_huff_table].is_none() {
                return Err(DecodeErrors::TableReference(format!(
                    "component {:?} references undefined DC Huffman table {}",
                    component.component_id, component.dc_huff_table
                )));
            }

            if self.ac_huffman_tables[component.ac_huff_table].is_none() {
                return Err(DecodeErrors::TableReference(format!(
                    "component {:?} references undefined AC Huffman table {}",
                    component.component_id, component.ac_huff_table
                )));
            }
        }

        Ok(())
    }
}
