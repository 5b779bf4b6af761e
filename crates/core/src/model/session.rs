use std::collections::HashSet;
use std::sync::Arc;

use lanewise_protocol::SharedStr;
use serde::{Deserialize, Serialize};

use super::record::InteractionRecord;

/// Identifies one lane. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SharedStr,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub last_modified_at_ms: i64,
}

impl Session {
    pub fn new(id: impl Into<SharedStr>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            last_modified_at_ms: 0,
        }
    }
}

/// A git commit observed outside the transcript, used to corroborate
/// `git commit` tool invocations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitEvent {
    pub sha: String,
    pub timestamp_ms: i64,
    #[serde(default)]
    pub message: Option<String>,
}

/// One session's snapshot as delivered by the loader.
///
/// `records` is append-only from the board's point of view: a refresh
/// replaces the whole `Arc`, and a new `Arc` is what marks the snapshot as
/// changed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaneData {
    pub session: Session,
    pub records: Arc<[InteractionRecord]>,
    #[serde(default)]
    pub commits: Vec<CommitEvent>,
}

impl LaneData {
    pub fn new(session: Session, records: Vec<InteractionRecord>) -> Self {
        Self {
            session,
            records: records.into(),
            commits: Vec::new(),
        }
    }

    pub fn with_commits(mut self, commits: Vec<CommitEvent>) -> Self {
        self.commits = commits;
        self
    }

    pub fn id(&self) -> &SharedStr {
        &self.session.id
    }

    /// The first uuid that occurs more than once, if any. Lane lookups,
    /// selection and the tag cache assume uuids are unique per lane.
    pub fn duplicate_uuid(&self) -> Option<&SharedStr> {
        let mut seen = HashSet::with_capacity(self.records.len());
        self.records
            .iter()
            .map(|r| &r.uuid)
            .find(|uuid| !seen.insert(*uuid))
    }

    /// Whether `other` is the same snapshot (same allocation), not merely
    /// equal content.
    pub fn same_snapshot(&self, other: &LaneData) -> bool {
        Arc::ptr_eq(&self.records, &other.records)
    }

    /// Indices of content- or tool-bearing records, in record order.
    pub fn visible_indices(&self) -> Vec<usize> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_visible())
            .map(|(i, _)| i)
            .collect()
    }
}
