//! Incremental decoding of the raw completion byte stream.

/// Pure incremental decoder: a running byte buffer plus the accumulated
/// reply text.
///
/// Each read's bytes are decoded as far as they go; an incomplete trailing
/// UTF-8 sequence is carried over and re-attempted when more bytes arrive,
/// and invalid sequences decode to U+FFFD. The decoder performs no I/O and
/// holds no cancellation or retry logic.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    pending: Vec<u8>,
    text: String,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one read's bytes and return the total decoded text so far.
    pub fn push(&mut self, bytes: &[u8]) -> &str {
        self.pending.extend_from_slice(bytes);

        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(valid) => {
                    self.text.push_str(valid);
                    self.pending.clear();
                    break;
                }
                Err(err) => {
                    let valid_up_to = err.valid_up_to();
                    if let Ok(valid) = std::str::from_utf8(&self.pending[..valid_up_to]) {
                        self.text.push_str(valid);
                    }
                    match err.error_len() {
                        // Sequence cut off at the end of this read: keep the
                        // tail for the next one
                        None => {
                            self.pending.drain(..valid_up_to);
                            break;
                        }
                        // Invalid bytes: substitute and keep decoding
                        Some(len) => {
                            self.text.push('\u{FFFD}');
                            self.pending.drain(..valid_up_to + len);
                        }
                    }
                }
            }
        }

        &self.text
    }

    /// The total decoded text so far.
    pub fn text(&self) -> &str {
        &self.text
    }
}
