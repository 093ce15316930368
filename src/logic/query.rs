//! Query sequence numbers used to drop late search results.

use super::filter::normalize;

/// A search request tagged with its sequence number.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchQuery {
    /// Monotonically increasing id; larger is newer.
    pub seq: u64,
    /// Text as typed.
    pub raw: String,
    /// Trimmed, lowercased form.
    pub normalized: String,
}

/// What: Issues sequence numbers and answers "is this response still current?".
///
/// Details:
/// - Only the most recently issued sequence is current; every older response
///   is stale and must be discarded.
#[derive(Debug)]
pub struct QueryTracker {
    next_seq: u64,
    latest: u64,
}

impl Default for QueryTracker {
    fn default() -> Self {
        Self {
            next_seq: 1,
            latest: 0,
        }
    }
}

impl QueryTracker {
    /// Fresh tracker; nothing is current yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// What: Tag `raw` with a fresh sequence number and make it current.
    ///
    /// Output:
    /// - `SearchQuery` whose `seq` is greater than every previous one.
    pub fn issue(&mut self, raw: &str) -> SearchQuery {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.latest = seq;
        SearchQuery {
            seq,
            raw: raw.to_string(),
            normalized: normalize(raw),
        }
    }

    /// Make every outstanding query stale without issuing a new one.
    pub fn invalidate(&mut self) {
        self.latest = self.next_seq;
        self.next_seq += 1;
    }

    /// Whether a response tagged `seq` may still be applied.
    #[must_use]
    pub const fn is_current(&self, seq: u64) -> bool {
        seq == self.latest
    }

    /// Sequence number of the most recent query (0 before the first).
    #[must_use]
    pub const fn latest(&self) -> u64 {
        self.latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    /// What: Ensure `issue` increments identifiers and normalizes the text.
    ///
    /// Inputs:
    /// - Two queries, `" Hello "` then `"world"`.
    ///
    /// Output:
    /// - Sequence numbers 1 and 2; only the second is current.
    fn issue_increments_and_tracks_latest() {
        let mut tracker = QueryTracker::new();
        let q1 = tracker.issue(" Hello ");
        assert_eq!(q1.seq, 1);
        assert_eq!(q1.normalized, "hello");
        assert_eq!(q1.raw, " Hello ");
        let q2 = tracker.issue("world");
        assert_eq!(q2.seq, 2);
        assert_eq!(tracker.latest(), 2);
        assert!(!tracker.is_current(q1.seq));
        assert!(tracker.is_current(q2.seq));
    }

    #[test]
    /// What: Invalidation makes the last issued query stale and later queries still increase.
    fn invalidate_stales_outstanding_queries() {
        let mut tracker = QueryTracker::new();
        let q = tracker.issue("fire");
        tracker.invalidate();
        assert!(!tracker.is_current(q.seq));
        let next = tracker.issue("firefox");
        assert!(next.seq > q.seq);
        assert!(tracker.is_current(next.seq));
    }
}
