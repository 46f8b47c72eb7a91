//! Transport-event decoding and per-turn stream orchestration.
//!
//! The upstream bot service speaks an SSE-style protocol: each non-blank line
//! is `data: {json}` carrying one typed event. The dispatcher pumps the raw
//! byte stream, routes each event into the splitter and envelope extractor,
//! and emits throttled display updates to the renderer channel.

pub mod dispatcher;
pub mod events;
pub mod state;

pub use dispatcher::{DispatcherConfig, StreamDispatcher};
pub use events::{BotEvent, EventKind};
pub use state::{DisplayUpdate, TurnOutcome, TurnState};

/// Shown when the upstream reports an error code mid-turn.
pub const SERVICE_ERROR_FALLBACK: &str = "抱歉，服务出现了一点问题，请稍后再试。";

/// Shown when a turn ends with no thinking text and no content at all.
pub const EMPTY_RESULT_FALLBACK: &str = "抱歉，我暂时无法处理您的请求。";
