//! Incremental UTF-8 decoding of byte chunks.

/// Longest UTF-8 sequence; a carried tail is always shorter than this.
const MAX_SEQUENCE: usize = 4;

/// Decodes a byte stream chunk by chunk.
///
/// A multi-byte character split across reads is carried over and completed
/// by the next chunk. Invalid bytes become U+FFFD rather than an error.
///
/// # Examples
///
/// ```
/// use busnotify_config::transport::Utf8Decoder;
///
/// let mut decoder = Utf8Decoder::new();
/// let bytes = "é".as_bytes();
/// assert_eq!(decoder.decode(&bytes[..1]), "");
/// assert_eq!(decoder.decode(&bytes[1..]), "é");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Utf8Decoder {
    tail: Vec<u8>,
}

impl Utf8Decoder {
    /// Creates a decoder with no carried bytes.
    #[must_use]
    pub const fn new() -> Self {
        Self { tail: Vec::new() }
    }

    /// Decodes the next chunk.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        let mut pending = std::mem::take(&mut self.tail);
        pending.extend_from_slice(bytes);

        let mut out = String::with_capacity(pending.len());
        let mut rest = pending.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    out.push_str(&String::from_utf8_lossy(valid));
                    match e.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[bad..];
                        }
                        None => {
                            // Incomplete sequence at the end: wait for more bytes.
                            self.tail = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        debug_assert!(self.tail.len() < MAX_SEQUENCE);
        out
    }

    /// Returns whatever is carried, lossily decoded, and clears it.
    pub fn finish(&mut self) -> String {
        let tail = std::mem::take(&mut self.tail);
        String::from_utf8_lossy(&tail).into_owned()
    }
}
