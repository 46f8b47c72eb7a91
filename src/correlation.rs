//! Conversation-to-message correlation store.
//!
//! The one piece of shared mutable state in the core: while a turn is in
//! flight, concurrent attribute-update requests need to reach the message the
//! conversation is currently producing. Entries are time-bounded and swept
//! periodically so the store can never grow without limit.

use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::debug;

pub const DEFAULT_TTL: Duration = Duration::from_secs(300);
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CorrelationError {
    /// A legitimate state, not a caller mistake: the mapping was simply never
    /// registered (or already expired).
    #[error("message not found: {0}")]
    MessageNotFound(String),

    #[error("no message registered for conversation: {0}")]
    ConversationNotFound(String),
}

/// Mutable attributes attached to one in-flight message.
#[derive(Debug, Clone, Serialize)]
pub struct MessageRecord {
    pub message_id: String,
    pub conversation_id: Option<String>,
    pub attributes: serde_json::Map<String, serde_json::Value>,
    #[serde(skip)]
    created_at: Instant,
}

pub struct CorrelationStore {
    messages: DashMap<String, MessageRecord>,
    by_conversation: DashMap<String, String>,
    ttl: Duration,
}

impl CorrelationStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            messages: DashMap::new(),
            by_conversation: DashMap::new(),
            ttl,
        }
    }

    /// Register a message, optionally binding its conversation to it. The
    /// conversation mapping is one-directional and overwrites any previous
    /// binding for the same conversation.
    pub fn register(&self, message_id: &str, conversation_id: Option<&str>) -> MessageRecord {
        let record = MessageRecord {
            message_id: message_id.to_string(),
            conversation_id: conversation_id.map(str::to_string),
            attributes: serde_json::Map::new(),
            created_at: Instant::now(),
        };
        self.messages
            .insert(message_id.to_string(), record.clone());
        if let Some(conversation_id) = conversation_id {
            self.by_conversation
                .insert(conversation_id.to_string(), message_id.to_string());
        }
        record
    }

    pub fn get_message(&self, message_id: &str) -> Result<MessageRecord, CorrelationError> {
        self.messages
            .get(message_id)
            .map(|entry| entry.clone())
            .ok_or_else(|| CorrelationError::MessageNotFound(message_id.to_string()))
    }

    pub fn get_by_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<MessageRecord, CorrelationError> {
        let message_id = self
            .by_conversation
            .get(conversation_id)
            .map(|entry| entry.clone())
            .ok_or_else(|| CorrelationError::ConversationNotFound(conversation_id.to_string()))?;
        self.get_message(&message_id)
    }

    /// Merge attributes into a message's record.
    pub fn update_message(
        &self,
        message_id: &str,
        patch: serde_json::Map<String, serde_json::Value>,
    ) -> Result<MessageRecord, CorrelationError> {
        let mut entry = self
            .messages
            .get_mut(message_id)
            .ok_or_else(|| CorrelationError::MessageNotFound(message_id.to_string()))?;
        entry.attributes.extend(patch);
        Ok(entry.clone())
    }

    /// Merge attributes into whatever message the conversation currently
    /// maps to; fails with not-found if no mapping was registered first.
    pub fn update_by_conversation(
        &self,
        conversation_id: &str,
        patch: serde_json::Map<String, serde_json::Value>,
    ) -> Result<MessageRecord, CorrelationError> {
        let message_id = self
            .by_conversation
            .get(conversation_id)
            .map(|entry| entry.clone())
            .ok_or_else(|| CorrelationError::ConversationNotFound(conversation_id.to_string()))?;
        self.update_message(&message_id, patch)
    }

    /// Drop entries older than the retention window, and any conversation
    /// bindings left pointing at them.
    pub fn sweep(&self) {
        let ttl = self.ttl;
        let before = self.messages.len();
        self.messages.retain(|_, record| record.created_at.elapsed() < ttl);
        self.by_conversation
            .retain(|_, message_id| self.messages.contains_key(message_id));
        let removed = before.saturating_sub(self.messages.len());
        if removed > 0 {
            debug!(removed, remaining = self.messages.len(), "correlation sweep");
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Background sweeper; stops on its own once the store is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let store: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match store.upgrade() {
                    Some(store) => store.sweep(),
                    None => break,
                }
            }
        })
    }
}
