// Per-turn accumulation state, owned by the dispatcher for one in-flight
// response.

use serde::Serialize;

use crate::envelope::{self, CardListItem, Envelope, ResponseMode};
use crate::reasoning::{SplitError, SplitterConfig, ThinkingSplitter};

/// Incremental display state pushed to the renderer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DisplayUpdate {
    pub content: String,
    pub thinking: String,
    pub thinking_complete: bool,
    pub is_thinking: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list: Option<Vec<CardListItem>>,
}

/// How the turn resolved at stream end.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// Strict envelope parse succeeded.
    Envelope(Envelope),
    /// Prose response, or an envelope that failed the strict parse.
    Plain,
}

/// All mutable state for one response turn.
///
/// `thinking_text` and `visible_text` partition everything the splitter has
/// released; the JSON accumulator mirrors the visible partition and is only
/// consulted for envelope detection and extraction.
pub struct TurnState {
    splitter: ThinkingSplitter,
    mode: Option<ResponseMode>,
    thinking_text: String,
    visible_text: String,
    json_accumulator: String,
}

impl TurnState {
    pub fn new(splitter_config: SplitterConfig) -> Self {
        Self {
            splitter: ThinkingSplitter::new(splitter_config),
            mode: None,
            thinking_text: String::new(),
            visible_text: String::new(),
            json_accumulator: String::new(),
        }
    }

    /// Route one text delta through the splitter and update the mode once
    /// enough non-whitespace content has arrived.
    pub fn ingest_text_delta(&mut self, delta: &str) -> Result<(), SplitError> {
        let split = self.splitter.process_fragment(delta)?;
        self.thinking_text.push_str(&split.thinking_text);
        self.visible_text.push_str(&split.visible_text);
        self.json_accumulator.push_str(&split.visible_text);
        self.detect_mode_once();
        Ok(())
    }

    /// Transcript text bypasses marker and envelope handling entirely.
    pub fn ingest_transcript(&mut self, transcript: &str) {
        self.visible_text.push_str(transcript);
    }

    /// Final flush: close any open span, settle the mode, and attempt the
    /// strict envelope parse.
    pub fn finalize(&mut self) -> TurnOutcome {
        let tail = self.splitter.finalize();
        self.thinking_text.push_str(&tail.thinking_text);
        self.visible_text.push_str(&tail.visible_text);
        self.json_accumulator.push_str(&tail.visible_text);
        self.detect_mode_once();

        if self.mode == Some(ResponseMode::JsonEnvelope) {
            if let Some(envelope) = envelope::parse_envelope(&self.json_accumulator) {
                return TurnOutcome::Envelope(envelope);
            }
        }
        TurnOutcome::Plain
    }

    /// Build the update emitted while the stream is still open.
    pub fn live_update(&self) -> DisplayUpdate {
        let content = match self.mode {
            Some(ResponseMode::JsonEnvelope) => {
                envelope::extract_live_content(&self.json_accumulator).unwrap_or_default()
            }
            _ => self.visible_text.clone(),
        };
        let is_thinking = self.splitter.is_in_thinking();
        DisplayUpdate {
            content,
            thinking: self.thinking_text.clone(),
            thinking_complete: !self.thinking_text.is_empty() && !is_thinking,
            is_thinking,
            card_type: None,
            card_message: None,
            list: None,
        }
    }

    /// Build the one unthrottled final update for the given outcome.
    pub fn final_update(&self, outcome: &TurnOutcome, fallback_on_empty: &str) -> DisplayUpdate {
        let mut update = DisplayUpdate {
            thinking: self.thinking_text.clone(),
            thinking_complete: !self.thinking_text.is_empty(),
            is_thinking: false,
            ..Default::default()
        };
        match outcome {
            TurnOutcome::Envelope(envelope) => {
                update.content = envelope.content.clone();
                update.card_type = envelope.card_type.clone();
                update.card_message = Some(envelope.card_message.clone());
                update.list = envelope.list.clone();
            }
            TurnOutcome::Plain => {
                update.content = self.visible_text.clone();
            }
        }
        if update.content.is_empty() && update.thinking.is_empty() {
            update.content = fallback_on_empty.to_string();
        }
        update
    }

    pub fn mode(&self) -> Option<ResponseMode> {
        self.mode
    }

    pub fn is_empty(&self) -> bool {
        self.thinking_text.is_empty() && self.visible_text.is_empty()
    }

    /// Reset for reuse on a subsequent turn.
    pub fn reset(&mut self) {
        self.splitter.reset();
        self.mode = None;
        self.thinking_text.clear();
        self.visible_text.clear();
        self.json_accumulator.clear();
    }

    // Mode is decided exactly once and never revisited, even if later
    // content looks inconsistent with the choice.
    fn detect_mode_once(&mut self) {
        if self.mode.is_none() {
            self.mode = envelope::detect_mode(&self.json_accumulator);
        }
    }
}
