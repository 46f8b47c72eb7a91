//! Separation of thinking-trace text from visible answer text.
//!
//! The upstream bot wraps its internal reasoning in marker tokens
//! (e.g. `<think>` / `</think>`) and streams the response in chunks with no
//! guaranteed alignment to marker boundaries. The splitter here consumes the
//! chunks in arrival order and partitions every consumed character into
//! exactly one of the two accumulators.

pub mod splitter;
pub mod traits;

pub use splitter::ThinkingSplitter;
pub use traits::{SplitError, SplitResult, SplitterConfig};
