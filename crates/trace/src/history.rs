use chrono::{DateTime, Utc};
use mockproc_common::InvocationRequest;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// How a recorded invocation ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntryOutcome {
    /// Recorded at call entry, not yet resolved.
    Pending,
    Resolved { route: String, exit_code: i32 },
    NoRoute,
    GeneratorFailed { route: String, message: String },
}

impl EntryOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Resolved { .. } => "resolved",
            Self::NoRoute => "no_route",
            Self::GeneratorFailed { .. } => "generator_failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub seq: u64,
    pub ts: DateTime<Utc>,
    pub request: InvocationRequest,
    pub outcome: EntryOutcome,
}

#[derive(Debug, Default)]
struct Inner {
    next_seq: u64,
    entries: Vec<HistoryEntry>,
}

/// Append-only, call-ordered log of invocations.
///
/// Entries are appended at call entry under the lock, so concurrent callers
/// each get a distinct sequence number and none are dropped. The outcome is
/// filled in afterwards with [`History::finish`].
#[derive(Debug, Default)]
pub struct History {
    inner: Mutex<Inner>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `request` and return its sequence number.
    pub fn begin(&self, request: &InvocationRequest) -> u64 {
        let mut inner = self.inner.lock();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.entries.push(HistoryEntry {
            seq,
            ts: Utc::now(),
            request: request.clone(),
            outcome: EntryOutcome::Pending,
        });
        seq
    }

    /// Set the outcome of entry `seq`, returning a copy of the finished entry.
    ///
    /// Returns `None` if the entry was cleared in the meantime.
    pub fn finish(&self, seq: u64, outcome: EntryOutcome) -> Option<HistoryEntry> {
        let mut inner = self.inner.lock();
        // seq is strictly increasing, so entries stay sorted
        let idx = inner.entries.binary_search_by_key(&seq, |e| e.seq).ok()?;
        let entry = &mut inner.entries[idx];
        entry.outcome = outcome;
        Some(entry.clone())
    }

    pub fn requests(&self) -> Vec<InvocationRequest> {
        self.inner
            .lock()
            .entries
            .iter()
            .map(|e| e.request.clone())
            .collect()
    }

    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.inner.lock().entries.clone()
    }

    pub fn count_where<F>(&self, mut pred: F) -> usize
    where
        F: FnMut(&HistoryEntry) -> bool,
    {
        self.inner.lock().entries.iter().filter(|e| pred(e)).count()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all entries. Sequence numbers keep increasing.
    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }
}
