//! Stream-processing core for the housing-fund conversational assistant.
//!
//! Consumes the upstream bot service's SSE feed, splits thinking traces from
//! visible content, extracts the structured card envelope, and keeps the
//! workflow phase state in sync with what the renderer shows.

pub mod config;
pub mod correlation;
pub mod envelope;
pub mod logging;
pub mod phase;
pub mod reasoning;
pub mod server;
pub mod stream;
