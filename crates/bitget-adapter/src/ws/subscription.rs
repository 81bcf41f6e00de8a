/*
[INPUT]:  Topic triples and per-topic callback overrides
[OUTPUT]: Normalized registry state for dispatch and reconnect replay
[POS]:    WebSocket layer - subscription bookkeeping
[UPDATE]: When changing topic normalization or replay semantics
*/

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

/// Callback invoked with the raw text of a routed frame
pub type OnMessage = Arc<dyn Fn(&str) + Send + Sync>;

/// A push-channel topic: (instrument category, channel, instrument id).
///
/// Doubles as the wire-level topic argument. Equality, ordering, and hashing
/// are plain string comparisons, so keys must be normalized before they are
/// stored or looked up.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Topic {
    #[serde(rename = "instType")]
    pub inst_type: String,
    pub channel: String,
    #[serde(rename = "instId")]
    pub inst_id: String,
}

impl Topic {
    pub fn new(
        inst_type: impl Into<String>,
        channel: impl Into<String>,
        inst_id: impl Into<String>,
    ) -> Self {
        Self {
            inst_type: inst_type.into(),
            channel: channel.into(),
            inst_id: inst_id.into(),
        }
    }

    /// Canonical form: category upper-cased, channel lower-cased
    pub fn normalized(&self) -> Self {
        Self {
            inst_type: self.inst_type.to_uppercase(),
            channel: self.channel.to_lowercase(),
            inst_id: self.inst_id.clone(),
        }
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.inst_type, self.channel, self.inst_id)
    }
}

/// Active subscriptions and their callback overrides.
///
/// One map holds both facts: a key being present means the topic is active,
/// and its value is the callback override (`None` dispatches to the
/// process-default listener). The key set is the replay source of truth
/// across reconnects.
#[derive(Default)]
pub struct SubscriptionRegistry {
    entries: RwLock<HashMap<Topic, Option<OnMessage>>>,
}

impl SubscriptionRegistry {
    /// Register topics, all sharing the same optional callback override.
    /// Returns the normalized keys, in input order, for the wire request.
    pub fn insert(&self, topics: &[Topic], handler: Option<OnMessage>) -> Vec<Topic> {
        let normalized: Vec<Topic> = topics.iter().map(Topic::normalized).collect();
        let mut entries = self.write_entries();
        for topic in &normalized {
            entries.insert(topic.clone(), handler.clone());
        }
        normalized
    }

    /// Remove topics. Unknown keys are ignored. Returns the normalized keys
    /// that were actually removed, so no wire request goes out for the rest.
    pub fn remove(&self, topics: &[Topic]) -> Vec<Topic> {
        let mut entries = self.write_entries();
        topics
            .iter()
            .map(Topic::normalized)
            .filter(|topic| entries.remove(topic).is_some())
            .collect()
    }

    /// Callback override for a topic, if one was registered.
    ///
    /// The callback is cloned out so no lock is held while it runs.
    pub fn lookup(&self, topic: &Topic) -> Option<OnMessage> {
        let normalized = topic.normalized();
        self.read_entries().get(&normalized).cloned().flatten()
    }

    /// Whether a topic is active (with or without a callback override)
    pub fn is_active(&self, topic: &Topic) -> bool {
        self.read_entries().contains_key(&topic.normalized())
    }

    /// All active topics, sorted, for reconnect replay
    pub fn snapshot_active(&self) -> Vec<Topic> {
        let mut topics: Vec<Topic> = self.read_entries().keys().cloned().collect();
        topics.sort();
        topics
    }

    pub fn len(&self) -> usize {
        self.read_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_entries().is_empty()
    }

    fn read_entries(
        &self,
    ) -> std::sync::RwLockReadGuard<'_, HashMap<Topic, Option<OnMessage>>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_entries(
        &self,
    ) -> std::sync::RwLockWriteGuard<'_, HashMap<Topic, Option<OnMessage>>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionRegistry")
            .field("active", &self.len())
            .finish()
    }
}
