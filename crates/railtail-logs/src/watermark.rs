//! Staleness and duplicate filtering.
//!
//! Ordering across reconnects cannot be trusted, so a [`Watermark`] lives for
//! one connection epoch and starts empty.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::types::LogRecord;

/// Highest accepted record timestamp of the current epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Watermark {
    last: Option<DateTime<Utc>>,
}

impl Watermark {
    /// An empty watermark; the first record is always accepted.
    #[must_use]
    pub const fn new() -> Self {
        Self { last: None }
    }

    /// Last accepted timestamp.
    #[must_use]
    pub const fn last(&self) -> Option<DateTime<Utc>> {
        self.last
    }

    /// Accept `timestamp` if it is strictly after the watermark, advancing
    /// the watermark to it.
    pub fn admit(&mut self, timestamp: DateTime<Utc>) -> bool {
        match self.last {
            Some(last) if timestamp <= last => false,
            _ => {
                self.last = Some(timestamp);
                true
            }
        }
    }

    /// Keep the records that pass [`admit`](Self::admit), in delivery order.
    pub fn retain_fresh(&mut self, records: Vec<LogRecord>) -> Vec<LogRecord> {
        records
            .into_iter()
            .filter(|record| {
                let fresh = self.admit(record.timestamp);
                if !fresh {
                    debug!(timestamp = %record.timestamp, "skipping stale log record");
                }
                fresh
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_767_225_600 + secs, 0).unwrap()
    }

    fn record(secs: i64, message: &str) -> LogRecord {
        LogRecord {
            timestamp: at(secs),
            message: message.to_string(),
            severity: String::new(),
            tags: Default::default(),
            attributes: Vec::new(),
        }
    }

    #[test]
    fn first_record_always_admitted() {
        let mut watermark = Watermark::new();
        assert!(watermark.last().is_none());
        assert!(watermark.admit(at(0)));
        assert_eq!(watermark.last(), Some(at(0)));
    }

    #[test]
    fn equal_and_earlier_timestamps_rejected() {
        let mut watermark = Watermark::new();
        assert!(watermark.admit(at(10)));
        assert!(!watermark.admit(at(10)));
        assert!(!watermark.admit(at(9)));
        assert!(watermark.admit(at(11)));
        assert_eq!(watermark.last(), Some(at(11)));
    }

    #[test]
    fn duplicate_in_batch_is_dropped() {
        let mut watermark = Watermark::new();
        let batch = vec![record(1, "t1"), record(1, "t2"), record(3, "t3")];

        let fresh = watermark.retain_fresh(batch);

        let messages: Vec<_> = fresh.iter().map(|r| r.message.as_str()).collect();
        assert_eq!(messages, vec!["t1", "t3"]);
    }

    #[test]
    fn watermark_spans_batches_within_epoch() {
        let mut watermark = Watermark::new();
        assert_eq!(watermark.retain_fresh(vec![record(5, "a")]).len(), 1);
        assert!(watermark.retain_fresh(vec![record(4, "b"), record(5, "c")]).is_empty());
    }

    #[test]
    fn new_watermark_accepts_older_records_again() {
        let mut first = Watermark::new();
        assert!(first.admit(at(100)));

        let mut next = Watermark::new();
        assert!(next.admit(at(1)));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn accepted_timestamps_strictly_increase(offsets in prop::collection::vec(0i64..50, 0..64)) {
                let mut watermark = Watermark::new();
                let batch: Vec<_> = offsets.iter().map(|&s| record(s, "m")).collect();

                let fresh = watermark.retain_fresh(batch);

                for pair in fresh.windows(2) {
                    prop_assert!(pair[0].timestamp < pair[1].timestamp);
                }
            }

            #[test]
            fn watermark_never_decreases(offsets in prop::collection::vec(0i64..50, 1..64)) {
                let mut watermark = Watermark::new();
                let mut previous = None;
                for &s in &offsets {
                    watermark.admit(at(s));
                    prop_assert!(watermark.last() >= previous);
                    previous = watermark.last();
                }
                prop_assert_eq!(watermark.last(), offsets.iter().max().map(|&s| at(s)));
            }

            #[test]
            fn accepts_exactly_running_maxima(offsets in prop::collection::vec(0i64..50, 0..64)) {
                let mut watermark = Watermark::new();
                let mut expected = 0usize;
                let mut max = None;
                for &s in &offsets {
                    if max.is_none_or(|m| s > m) {
                        expected += 1;
                        max = Some(s);
                    }
                }

                let fresh = watermark.retain_fresh(offsets.iter().map(|&s| record(s, "m")).collect());
                prop_assert_eq!(fresh.len(), expected);
            }
        }
    }
}
