// Pump for one upstream response stream.
//
// Owns the turn state, decodes SSE data lines into events, and fans
// throttled display updates out to the renderer channel. Processing is
// single-threaded per turn; suspension happens only at the transport read
// boundary.

use std::borrow::Cow;
use std::time::{Duration, Instant};

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::reasoning::SplitterConfig;
use crate::stream::events::{frame_payload, BotEvent, EventKind};
use crate::stream::state::{DisplayUpdate, TurnState};
use crate::stream::{EMPTY_RESULT_FALLBACK, SERVICE_ERROR_FALLBACK};

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Minimum interval between throttled emissions. The first and the final
    /// emission bypass the throttle.
    pub emit_interval: Duration,
    pub splitter: SplitterConfig,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            emit_interval: Duration::from_millis(50),
            splitter: SplitterConfig::default(),
        }
    }
}

/// Outcome of handling one event, used to drive the pump loop.
enum Flow {
    Continue,
    Finished,
}

pub struct StreamDispatcher {
    state: TurnState,
    tx: UnboundedSender<DisplayUpdate>,
    emit_interval: Duration,
    last_emit: Option<Instant>,
    pending: String,
    max_pending: usize,
    receiver_gone: bool,
}

impl StreamDispatcher {
    pub fn new(config: DispatcherConfig, tx: UnboundedSender<DisplayUpdate>) -> Self {
        let max_pending = config.splitter.max_buffer_size;
        Self {
            state: TurnState::new(config.splitter),
            tx,
            emit_interval: config.emit_interval,
            last_emit: None,
            pending: String::new(),
            max_pending,
            receiver_gone: false,
        }
    }

    /// Drive the whole turn from a byte stream. Consumes the dispatcher; a
    /// turn is never resumed.
    pub async fn run<S, E>(mut self, mut stream: S)
    where
        S: Stream<Item = Result<Bytes, E>> + Unpin,
        E: std::fmt::Display,
    {
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(bytes) => {
                    if let Flow::Finished = self.ingest_chunk(&bytes) {
                        return;
                    }
                    if self.receiver_gone {
                        // Consumer navigated away; tear down without further
                        // buffer mutation.
                        info!("renderer channel closed, abandoning turn");
                        return;
                    }
                }
                Err(err) => {
                    warn!("upstream stream failed mid-turn: {}", err);
                    self.fail_turn();
                    return;
                }
            }
        }
        // Upstream closed without an explicit stream-end event.
        self.finish_turn();
    }

    /// Decode one transport chunk into complete lines and handle each. The
    /// line buffer shares the splitter's cap; an upstream that never sends a
    /// newline aborts the turn instead of growing it without bound.
    fn ingest_chunk(&mut self, chunk: &[u8]) -> Flow {
        let text = match std::str::from_utf8(chunk) {
            Ok(text) => Cow::Borrowed(text),
            Err(_) => Cow::Owned(String::from_utf8_lossy(chunk).into_owned()),
        };
        let normalized = text.replace("\r\n", "\n");
        if self.pending.len() + normalized.len() > self.max_pending {
            warn!(
                size = self.pending.len() + normalized.len(),
                "line buffer overflow, aborting turn"
            );
            self.fail_turn();
            return Flow::Finished;
        }
        self.pending.push_str(&normalized);

        while let Some(pos) = self.pending.find('\n') {
            let line = self.pending[..pos].to_string();
            self.pending.drain(..pos + 1);
            if let Flow::Finished = self.handle_line(&line) {
                return Flow::Finished;
            }
        }
        Flow::Continue
    }

    fn handle_line(&mut self, line: &str) -> Flow {
        let Some(payload) = frame_payload(line) else {
            return Flow::Continue;
        };
        let event: BotEvent = match serde_json::from_str(payload) {
            Ok(event) => event,
            Err(_) => {
                // Keep-alives and partial lines are expected; skip silently.
                debug!("skipping malformed event line");
                return Flow::Continue;
            }
        };
        self.dispatch(event)
    }

    fn dispatch(&mut self, event: BotEvent) -> Flow {
        match event.kind() {
            EventKind::TextDelta => {
                if let Some(delta) = event.text_payload() {
                    if let Err(err) = self.state.ingest_text_delta(delta) {
                        warn!("text delta rejected: {}", err);
                        self.fail_turn();
                        return Flow::Finished;
                    }
                    self.maybe_emit();
                }
                Flow::Continue
            }
            EventKind::AudioTranscriptDelta => {
                if let Some(delta) = event.text_payload() {
                    self.state.ingest_transcript(delta);
                    self.maybe_emit();
                }
                Flow::Continue
            }
            EventKind::FlowOutput => {
                debug!("ignoring flow_output echo");
                Flow::Continue
            }
            EventKind::StreamEnd => {
                self.finish_turn();
                Flow::Finished
            }
            EventKind::MessageInfo => {
                debug!(code = event.code, "message info: {}", event.data);
                Flow::Continue
            }
            EventKind::Cost => {
                info!(code = event.code, "turn cost: {}", event.data);
                Flow::Continue
            }
            EventKind::TransportError | EventKind::AppError => {
                warn!(
                    code = event.code,
                    "upstream error event: {}", event.message
                );
                self.fail_turn();
                Flow::Finished
            }
            EventKind::Unknown => {
                debug!(
                    code = event.code,
                    message = %event.message,
                    "unknown event pair"
                );
                Flow::Continue
            }
        }
    }

    /// Normal termination: final flush, strict envelope parse, one forced
    /// emission.
    fn finish_turn(&mut self) {
        let outcome = self.state.finalize();
        let update = self.state.final_update(&outcome, EMPTY_RESULT_FALLBACK);
        self.emit(update);
    }

    /// Error termination: drop accumulated text and show the fixed fallback.
    fn fail_turn(&mut self) {
        let update = DisplayUpdate {
            content: SERVICE_ERROR_FALLBACK.to_string(),
            ..Default::default()
        };
        self.emit(update);
    }

    fn maybe_emit(&mut self) {
        let due = match self.last_emit {
            None => true,
            Some(at) => at.elapsed() >= self.emit_interval,
        };
        if due {
            self.emit(self.state.live_update());
        }
    }

    fn emit(&mut self, update: DisplayUpdate) {
        if self.tx.send(update).is_err() {
            self.receiver_gone = true;
        }
        self.last_emit = Some(Instant::now());
    }
}
