use serde::{Deserialize, Serialize};

/// Interpretation of one bot response, decided once per turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    /// Prose streamed straight to the display.
    PlainText,
    /// A single JSON object carrying content plus a card directive.
    JsonEnvelope,
}

/// Entry of an envelope's optional selection list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardListItem {
    pub id: String,
    pub name: String,
}

/// The fully parsed envelope, produced only at stream termination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Card directive for the renderer; absent for content-only envelopes.
    #[serde(default)]
    pub card_type: Option<String>,

    /// Short message shown on the card.
    #[serde(default)]
    pub card_message: String,

    /// Display text; its presence is what qualifies an object as an envelope.
    pub content: String,

    /// Selection list payload, kept only when non-empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list: Option<Vec<CardListItem>>,
}
