//! Detection and extraction of the structured card envelope.
//!
//! A response is either plain prose or a single JSON object carrying the
//! display `content` plus an optional card directive. The decision between
//! the two is made once per turn, on the first non-whitespace character, and
//! never revisited.

pub mod extractor;
pub mod types;

pub use extractor::{detect_mode, extract_live_content, parse_envelope};
pub use types::{CardListItem, Envelope, ResponseMode};
