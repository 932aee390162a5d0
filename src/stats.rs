use chrono::Local;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::{Mutex, PoisonError};

use crate::snapshot::{SnapshotRow, SnapshotWriter};

/// Running classification totals. `total == mutants + non_mutants` always holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub mutants: u64,
    pub non_mutants: u64,
    pub total: u64,
}

impl Counters {
    pub fn mutant_percentage(&self) -> Percentage {
        Percentage::of(self.mutants, self.total)
    }

    pub fn non_mutant_percentage(&self) -> Percentage {
        Percentage::of(self.non_mutants, self.total)
    }
}

/// Share of samples in one category, reported as `"<value>%"`, or the bare
/// number `0` before any sample exists.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Percentage {
    NoSamples,
    Value(f64),
}

impl Percentage {
    fn of(count: u64, total: u64) -> Self {
        if total == 0 {
            Percentage::NoSamples
        } else {
            Percentage::Value((count as f64 / total as f64) * 100.0)
        }
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Percentage::NoSamples => write!(f, "0"),
            Percentage::Value(value) => write!(f, "{}%", value),
        }
    }
}

impl Serialize for Percentage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Percentage::NoSamples => serializer.serialize_u8(0),
            Percentage::Value(_) => serializer.collect_str(self),
        }
    }
}

/// Body of `GET /stats`.
#[derive(Debug, Serialize)]
pub struct StatsReport {
    #[serde(rename = "mutantes")]
    pub mutants: u64,
    #[serde(rename = "noMutantes")]
    pub non_mutants: u64,
    #[serde(rename = "totalDeMuestras")]
    pub total: u64,
    #[serde(rename = "porcentajeDeMutantes")]
    pub mutant_percentage: Percentage,
    #[serde(rename = "porcentajeNoMutantes")]
    pub non_mutant_percentage: Percentage,
}

impl From<Counters> for StatsReport {
    fn from(counters: Counters) -> Self {
        Self {
            mutants: counters.mutants,
            non_mutants: counters.non_mutants,
            total: counters.total,
            mutant_percentage: counters.mutant_percentage(),
            non_mutant_percentage: counters.non_mutant_percentage(),
        }
    }
}

/// Process-wide classification counters.
#[derive(Debug, Default)]
pub struct StatsTracker {
    counters: Mutex<Counters>,
}

impl StatsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, is_mutant: bool) {
        let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        if is_mutant {
            counters.mutants += 1;
        } else {
            counters.non_mutants += 1;
        }
        counters.total += 1;
    }

    pub fn counters(&self) -> Counters {
        *self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn mutant_percentage(&self) -> Percentage {
        self.counters().mutant_percentage()
    }

    pub fn non_mutant_percentage(&self) -> Percentage {
        self.counters().non_mutant_percentage()
    }

    /// Queues a log row for the current counters without waiting for the
    /// write, and returns the counters that row captured.
    pub fn snapshot(&self, writer: &SnapshotWriter) -> Counters {
        let counters = self.counters();
        writer.submit(SnapshotRow::capture(&counters, Local::now()));
        counters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::SnapshotLog;
    use std::fs;
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    #[test]
    fn starts_empty_with_zero_sentinel() {
        let tracker = StatsTracker::new();
        assert_eq!(tracker.counters(), Counters::default());
        assert_eq!(tracker.mutant_percentage(), Percentage::NoSamples);
        assert_eq!(tracker.non_mutant_percentage(), Percentage::NoSamples);
        assert_eq!(serde_json::to_value(tracker.mutant_percentage()).unwrap(), serde_json::json!(0));
    }

    #[test]
    fn record_updates_one_category_and_total() {
        let tracker = StatsTracker::new();
        tracker.record(true);
        tracker.record(false);
        tracker.record(false);

        let counters = tracker.counters();
        assert_eq!(counters.mutants, 1);
        assert_eq!(counters.non_mutants, 2);
        assert_eq!(counters.total, 3);
    }

    #[test]
    fn percentages_render_like_the_stats_endpoint() {
        let tracker = StatsTracker::new();
        tracker.record(true);
        assert_eq!(tracker.mutant_percentage().to_string(), "100%");
        assert_eq!(tracker.non_mutant_percentage().to_string(), "0%");

        tracker.record(false);
        tracker.record(false);
        assert_eq!(tracker.mutant_percentage().to_string(), "33.33333333333333%");
        assert_eq!(tracker.non_mutant_percentage().to_string(), "66.66666666666666%");
    }

    #[test]
    fn report_uses_response_field_names() {
        let tracker = StatsTracker::new();
        tracker.record(true);
        tracker.record(false);

        let value = serde_json::to_value(StatsReport::from(tracker.counters())).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "mutantes": 1,
                "noMutantes": 1,
                "totalDeMuestras": 2,
                "porcentajeDeMutantes": "50%",
                "porcentajeNoMutantes": "50%",
            })
        );
    }

    #[test]
    fn concurrent_records_are_not_lost() {
        let tracker = Arc::new(StatsTracker::new());
        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let tracker = Arc::clone(&tracker);
                thread::spawn(move || {
                    for i in 0..500 {
                        tracker.record(worker % 2 == 0 && i % 5 == 0);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let counters = tracker.counters();
        assert_eq!(counters.mutants, 4 * 100);
        assert_eq!(counters.non_mutants, 4000 - 400);
        assert_eq!(counters.total, 4000);
    }

    #[tokio::test]
    async fn first_snapshot_writes_header_and_counters() {
        let dir = TempDir::new().unwrap();
        let log = Arc::new(SnapshotLog::new(dir.path().join("Stats.csv")));
        let writer = SnapshotWriter::spawn(Arc::clone(&log));

        let tracker = StatsTracker::new();
        tracker.record(true);
        let captured = tracker.snapshot(&writer);
        writer.flush().await;

        assert_eq!(captured, tracker.counters());
        let content = fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "FechaActual,mutantes,noMutantes,porcentajeDeMutantes,porcentajeDeNoMutantes"
        );
        assert!(lines[1].ends_with(",1,0,1.000000,0.000000"));
    }

    #[tokio::test]
    async fn repeated_snapshots_append_one_row_each() {
        let dir = TempDir::new().unwrap();
        let log = Arc::new(SnapshotLog::new(dir.path().join("Stats.csv")));
        let writer = SnapshotWriter::spawn(Arc::clone(&log));

        let tracker = StatsTracker::new();
        for is_mutant in [true, false, false, true] {
            tracker.record(is_mutant);
            tracker.snapshot(&writer);
        }
        writer.flush().await;

        let rows = log.read_rows().unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[3]["mutantes"], "2");
        assert_eq!(rows[3]["porcentajeDeMutantes"], "0.500000");
        let content = fs::read_to_string(log.path()).unwrap();
        assert_eq!(content.matches("FechaActual").count(), 1);
    }
}
