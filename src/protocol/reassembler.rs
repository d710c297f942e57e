//! Line reassembly over an arbitrarily chunked text stream.

/// Turns text chunks into complete newline-terminated lines.
///
/// Whatever follows the last newline of a chunk is carried over and
/// prefixed onto the next chunk, so chunk boundaries never change the
/// emitted lines.
///
/// # Examples
///
/// ```
/// use busnotify_config::protocol::StreamReassembler;
///
/// let mut reassembler = StreamReassembler::new();
/// assert!(reassembler.feed("BUSSTOP=83").is_empty());
/// assert_eq!(reassembler.feed("139\nSERV"), vec!["BUSSTOP=83139"]);
/// assert_eq!(reassembler.flush(), "SERV");
/// ```
#[derive(Debug, Clone, Default)]
pub struct StreamReassembler {
    /// Trailing fragment with no newline yet.
    carry: String,
}

impl StreamReassembler {
    /// Creates an empty reassembler.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            carry: String::new(),
        }
    }

    /// Feeds a chunk and returns the lines it completed, in arrival order.
    ///
    /// The newline itself is not part of the returned lines; a preceding
    /// `\r` is left in place for the consumer to trim.
    pub fn feed(&mut self, chunk: &str) -> Vec<String> {
        self.carry.push_str(chunk);
        if !chunk.contains('\n') {
            return Vec::new();
        }

        let mut pieces: Vec<&str> = self.carry.split('\n').collect();
        let rest = pieces.pop().unwrap_or_default().to_string();
        let lines = pieces.into_iter().map(str::to_string).collect();
        self.carry = rest;
        lines
    }

    /// Returns and clears the carried-over partial line.
    pub fn flush(&mut self) -> String {
        std::mem::take(&mut self.carry)
    }

    /// Returns the carried-over partial line without clearing it.
    #[must_use]
    pub fn pending(&self) -> &str {
        &self.carry
    }

    /// Returns `true` if no partial line is carried over.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.carry.is_empty()
    }
}
