use std::ops::Range;

use serde::Deserialize;

/// Prefix of an SSE data line. The space after the colon is optional on the
/// wire, so framing strips the prefix and trims.
pub const DATA_PREFIX: &str = "data:";

/// Codes reserved for transport-level failures reported in-band.
pub const TRANSPORT_ERROR_CODES: Range<i64> = 4000..5000;

/// Codes reserved for application-level failures from the bot service.
pub const APP_ERROR_CODES: Range<i64> = 7000..8000;

/// One decoded transport event.
#[derive(Debug, Clone, Deserialize)]
pub struct BotEvent {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Routing decision for one event, keyed by the `(code, message)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Incremental answer text, routed through the splitter.
    TextDelta,
    /// Voice transcript text, appended to visible output as-is.
    AudioTranscriptDelta,
    /// Workflow engine echo of the same content; ignored to avoid
    /// double-rendering.
    FlowOutput,
    /// End of the turn; triggers finalization.
    StreamEnd,
    /// Per-message metadata, observability only.
    MessageInfo,
    /// Token/cost accounting, observability only.
    Cost,
    /// In-band transport failure.
    TransportError,
    /// Bot-service failure.
    AppError,
    /// Anything else; skipped.
    Unknown,
}

impl BotEvent {
    pub fn kind(&self) -> EventKind {
        match (self.code, self.message.as_str()) {
            (1001, "text_delta") => EventKind::TextDelta,
            (1002, "audio_transcript_delta") => EventKind::AudioTranscriptDelta,
            (1003, "flow_output") => EventKind::FlowOutput,
            (2000, "stream_end") => EventKind::StreamEnd,
            (2001, "message_info") => EventKind::MessageInfo,
            (2002, "cost") => EventKind::Cost,
            (code, _) if TRANSPORT_ERROR_CODES.contains(&code) => EventKind::TransportError,
            (code, _) if APP_ERROR_CODES.contains(&code) => EventKind::AppError,
            _ => EventKind::Unknown,
        }
    }

    /// The event payload as text, for the delta-carrying kinds.
    pub fn text_payload(&self) -> Option<&str> {
        self.data.as_str()
    }
}

/// Strip SSE framing from one line, returning the JSON payload if this is a
/// data line.
pub fn frame_payload(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.strip_prefix(DATA_PREFIX).map(str::trim_start)
}
