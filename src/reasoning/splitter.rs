// Incremental splitter for thinking spans in streamed bot output.
//
// Scanning is forward-only: the internal buffer holds nothing but the
// unconsumed tail, so already-flushed text is never revisited.

use crate::reasoning::traits::{SplitError, SplitResult, SplitterConfig};

/// Streaming splitter that partitions arriving text into thinking and
/// visible accumulations, tolerant of markers chopped across fragments.
#[derive(Debug, Clone)]
pub struct ThinkingSplitter {
    config: SplitterConfig,
    buffer: String,
    in_thinking: bool,
    holdback: usize,
}

impl ThinkingSplitter {
    pub fn new(config: SplitterConfig) -> Self {
        let holdback = config
            .holdback
            .max(config.start_marker.len())
            .max(config.end_marker.len());
        let in_thinking = config.initial_in_thinking;
        Self {
            config,
            buffer: String::new(),
            in_thinking,
            holdback,
        }
    }

    /// Feed one fragment and collect everything that can be attributed so
    /// far. A tail of up to `holdback` bytes stays buffered in case a marker
    /// arrives split across fragment boundaries.
    pub fn process_fragment(&mut self, fragment: &str) -> Result<SplitResult, SplitError> {
        if self.buffer.len() + fragment.len() > self.config.max_buffer_size {
            return Err(SplitError::BufferOverflow(
                self.buffer.len() + fragment.len(),
            ));
        }

        self.buffer.push_str(fragment);
        let mut result = self.consume_complete_markers();

        // Flush everything except the guarded tail.
        if self.buffer.len() > self.holdback {
            let mut cut = self.buffer.len() - self.holdback;
            while cut > 0 && !self.buffer.is_char_boundary(cut) {
                cut -= 1;
            }
            let flushed: String = self.buffer.drain(..cut).collect();
            self.attribute(&mut result, flushed);
        }

        Ok(result)
    }

    /// Flush the remaining buffer, strip any dangling truncated marker, and
    /// force the span state closed. Called exactly once per turn.
    pub fn finalize(&mut self) -> SplitResult {
        let mut result = self.consume_complete_markers();
        let remainder = std::mem::take(&mut self.buffer);
        self.attribute(&mut result, remainder);

        strip_truncated_marker(&mut result.visible_text, &self.config);
        strip_truncated_marker(&mut result.thinking_text, &self.config);
        self.in_thinking = false;

        result
    }

    /// One-shot split of a complete text; equivalent to streaming it as a
    /// single fragment and finalizing.
    pub fn detect_and_split(&mut self, text: &str) -> Result<SplitResult, SplitError> {
        self.reset();
        let mut result = self.process_fragment(text)?;
        result.extend(self.finalize());
        Ok(result)
    }

    /// Reset state so a pooled instance can serve the next turn.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.in_thinking = self.config.initial_in_thinking;
    }

    pub fn is_in_thinking(&self) -> bool {
        self.in_thinking
    }

    /// Repeatedly consume the earliest applicable marker, toggling the span
    /// state and attributing the text before it.
    fn consume_complete_markers(&mut self) -> SplitResult {
        let mut result = SplitResult::default();
        loop {
            let marker = if self.in_thinking {
                &self.config.end_marker
            } else {
                &self.config.start_marker
            };
            match self.buffer.find(marker.as_str()) {
                Some(idx) => {
                    let before = self.buffer[..idx].to_string();
                    self.buffer.drain(..idx + marker.len());
                    self.attribute(&mut result, before);
                    self.in_thinking = !self.in_thinking;
                }
                None => break,
            }
        }
        result
    }

    fn attribute(&self, result: &mut SplitResult, text: String) {
        if text.is_empty() {
            return;
        }
        if self.in_thinking {
            result.thinking_text.push_str(&text);
        } else {
            result.visible_text.push_str(&text);
        }
    }
}

impl Default for ThinkingSplitter {
    fn default() -> Self {
        Self::new(SplitterConfig::default())
    }
}

/// Remove one dangling marker fragment from the end of `text`.
///
/// The table of known truncation suffixes is every proper prefix of either
/// marker, checked longest first so "</thin" wins over "<".
fn strip_truncated_marker(text: &mut String, config: &SplitterConfig) {
    let markers = [&config.start_marker, &config.end_marker];
    let longest = markers.iter().map(|m| m.len()).max().unwrap_or(0);
    for len in (1..longest).rev() {
        for marker in markers {
            if len < marker.len() && text.ends_with(&marker[..len]) {
                text.truncate(text.len() - len);
                return;
            }
        }
    }
}
