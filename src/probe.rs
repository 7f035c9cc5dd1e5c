use crate::Decoder;

/// Probe a buffer and return whether it looks like a JPEG image this
/// decoder can handle.
///
/// This parses the headers without doing the entropy decoding and post
/// processing stages, so it is cheap enough to run on candidate buffers.
#[must_use]
pub fn probe(buffer: &[u8]) -> bool {
    let mut decoder = Decoder::new();

    decoder.read_headers(buffer).is_ok()
}
