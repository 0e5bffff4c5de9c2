//! Incremental decoder for blank-line delimited event frames.
//!
//! Upload progress arrives as one long-running response body:
//!
//! ```text
//! event: progress
//! data: {"message":"Parsing calendar"}
//!
//! event: done
//! data: {"busySlots":{},"participants":[]}
//!
//! ```
//!
//! Body chunks are cut at arbitrary byte offsets, so [`FrameDecoder`]
//! carries both incomplete UTF-8 sequences and incomplete blocks from one
//! [`FrameDecoder::feed`] call to the next. A block is complete once it is
//! followed by a blank line (`\n\n`).
//!
//! A trailing block that never receives its delimiter is dropped when the
//! stream ends. [`FrameDecoder::finish`] reports how much was dropped but
//! never turns it into a frame.

use tracing::debug;

const EVENT_PREFIX: &str = "event: ";
const DATA_PREFIX: &str = "data: ";

/// One decoded block: a type tag and its raw payload.
///
/// Repeated `event:` or `data:` lines overwrite each other; the last one
/// wins. A block without an `event:` line has an empty type.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EventFrame {
    pub event: String,
    pub data: String,
}

/// Frame types understood by the upload lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Progress,
    Done,
    Error,
    /// Anything else, including frames with no type. Consumers ignore these.
    Unrecognized,
}

impl EventFrame {
    pub fn new(event: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            data: data.into(),
        }
    }

    /// Parses a complete block (without its trailing blank line).
    pub fn parse(block: &str) -> Self {
        let mut frame = Self::default();
        for line in block.split('\n') {
            if let Some(event) = line.strip_prefix(EVENT_PREFIX) {
                frame.event = event.to_string();
            } else if let Some(data) = line.strip_prefix(DATA_PREFIX) {
                frame.data = data.to_string();
            }
        }
        frame
    }

    pub fn kind(&self) -> FrameKind {
        match self.event.as_str() {
            "progress" => FrameKind::Progress,
            "done" => FrameKind::Done,
            "error" => FrameKind::Error,
            _ => FrameKind::Unrecognized,
        }
    }
}

/// Where the tokenizer is relative to a block boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum ScanState {
    /// Inside a line, or at the start of a block.
    #[default]
    AwaitingLine,
    /// Just consumed a newline; another one ends the block.
    AwaitingBlank,
}

/// Turns arbitrarily split byte chunks into an ordered sequence of frames.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    /// Bytes of a UTF-8 sequence cut off by the previous chunk.
    carry: Vec<u8>,
    /// Text of the block being accumulated.
    block: String,
    state: ScanState,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes one chunk and returns every block it completed, in order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<EventFrame> {
        let text = self.decode(chunk);
        let mut frames = Vec::new();

        for ch in text.chars() {
            match (ch, self.state) {
                ('\n', ScanState::AwaitingBlank) => {
                    // Drop the newline that ended the block's last line.
                    self.block.pop();
                    let frame = EventFrame::parse(&self.block);
                    debug!(event = %frame.event, "decoded frame");
                    frames.push(frame);
                    self.block.clear();
                    self.state = ScanState::AwaitingLine;
                }
                ('\n', ScanState::AwaitingLine) => {
                    self.block.push('\n');
                    self.state = ScanState::AwaitingBlank;
                }
                (other, _) => {
                    self.block.push(other);
                    self.state = ScanState::AwaitingLine;
                }
            }
        }

        frames
    }

    /// Text received since the last complete block.
    pub fn pending(&self) -> &str {
        &self.block
    }

    /// Ends the stream, discarding any unterminated remainder.
    ///
    /// Returns the number of bytes dropped (pending text plus any dangling
    /// partial UTF-8 sequence). The decoder is reset and may be reused.
    pub fn finish(&mut self) -> usize {
        let dropped = self.block.len() + self.carry.len();
        self.block.clear();
        self.carry.clear();
        self.state = ScanState::AwaitingLine;
        dropped
    }

    /// Streaming UTF-8 decode: complete sequences become text, an incomplete
    /// sequence at the end of the chunk is held back for the next call, and
    /// invalid bytes become U+FFFD.
    fn decode(&mut self, chunk: &[u8]) -> String {
        let mut bytes = std::mem::take(&mut self.carry);
        bytes.extend_from_slice(chunk);

        let mut text = String::with_capacity(bytes.len());
        let mut rest: &[u8] = &bytes;
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    text.push_str(valid);
                    rest = &[];
                    break;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    text.push_str(&String::from_utf8_lossy(valid));
                    match err.error_len() {
                        Some(len) => {
                            text.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        None => {
                            rest = after;
                            break;
                        }
                    }
                }
            }
        }

        self.carry = rest.to_vec();
        text
    }
}
