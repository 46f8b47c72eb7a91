/// Text produced by one splitter step, already partitioned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitResult {
    /// Text outside any thinking span.
    pub visible_text: String,

    /// Text extracted from within thinking spans.
    pub thinking_text: String,
}

impl SplitResult {
    /// Append another result, preserving per-partition order.
    pub fn extend(&mut self, other: SplitResult) {
        self.visible_text.push_str(&other.visible_text);
        self.thinking_text.push_str(&other.thinking_text);
    }
}

/// Errors surfaced by the splitter.
#[derive(Debug, thiserror::Error)]
pub enum SplitError {
    #[error("buffer overflow: {0} bytes exceeds maximum")]
    BufferOverflow(usize),
}

/// Configuration for marker detection.
#[derive(Debug, Clone)]
pub struct SplitterConfig {
    /// Token that opens a thinking span.
    pub start_marker: String,

    /// Token that closes a thinking span.
    pub end_marker: String,

    /// Minimum number of bytes held back while streaming so a marker split
    /// across two fragments is never flushed in halves. Raised to the longer
    /// marker length if configured smaller.
    pub holdback: usize,

    /// Maximum bytes buffered before the stream is rejected.
    pub max_buffer_size: usize,

    /// Whether a turn starts inside a thinking span (implicit-start models).
    pub initial_in_thinking: bool,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            start_marker: "<think>".to_string(),
            end_marker: "</think>".to_string(),
            holdback: 10,
            max_buffer_size: 65536,
            initial_in_thinking: false,
        }
    }
}
