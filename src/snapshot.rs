use chrono::{DateTime, Local};
use serde_json::{Map, Value};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, warn};

use crate::error::{MutantError, Result};
use crate::stats::Counters;

pub const HEADER: [&str; 5] = [
    "FechaActual",
    "mutantes",
    "noMutantes",
    "porcentajeDeMutantes",
    "porcentajeDeNoMutantes",
];

/// en-US style `M/D/YYYY h:mm:ss AM`.
const TIMESTAMP_FORMAT: &str = "%-m/%-d/%Y %-I:%M:%S %p";

/// One line of the stats log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRow {
    pub timestamp: String,
    pub mutants: u64,
    pub non_mutants: u64,
}

impl SnapshotRow {
    pub fn capture(counters: &Counters, at: DateTime<Local>) -> Self {
        Self {
            timestamp: at.format(TIMESTAMP_FORMAT).to_string(),
            mutants: counters.mutants,
            non_mutants: counters.non_mutants,
        }
    }

    pub fn to_record(&self) -> [String; 5] {
        let total = self.mutants + self.non_mutants;
        [
            self.timestamp.clone(),
            self.mutants.to_string(),
            self.non_mutants.to_string(),
            fixed_fraction(self.mutants, total),
            fixed_fraction(self.non_mutants, total),
        ]
    }
}

/// `count / total` with six decimals, ties rounded up. Zero when `total` is zero.
fn fixed_fraction(count: u64, total: u64) -> String {
    if total == 0 {
        return "0.000000".to_string();
    }

    let scaled = u128::from(count) * 1_000_000;
    let total = u128::from(total);
    let mut micros = scaled / total;
    if 2 * (scaled % total) >= total {
        micros += 1;
    }
    format!("{}.{:06}", micros / 1_000_000, micros % 1_000_000)
}

/// Append-only CSV log of stats snapshots.
#[derive(Debug)]
pub struct SnapshotLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl SnapshotLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `row`, writing the header first when the file is new or empty.
    pub fn append(&self, row: &SnapshotRow) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let write_err = |source| MutantError::PersistenceWrite {
            path: self.path.clone(),
            source,
        };
        let csv_err = |source| MutantError::PersistenceCsv {
            path: self.path.clone(),
            source,
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(write_err)?;
        let is_new = file.metadata().map_err(write_err)?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if is_new {
            writer.write_record(HEADER).map_err(csv_err)?;
        }
        writer.write_record(row.to_record()).map_err(csv_err)?;
        writer.flush().map_err(write_err)?;

        Ok(())
    }

    /// Reads every data row back as a JSON object keyed by header name.
    /// A log that does not exist yet reads as empty.
    pub fn read_rows(&self) -> Result<Vec<Value>> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let csv_err = |source| MutantError::PersistenceCsv {
            path: self.path.clone(),
            source,
        };

        let mut reader = csv::Reader::from_path(&self.path).map_err(csv_err)?;
        let headers = reader
            .headers()
            .map_err(csv_err)?
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(csv_err)?;
            let mut obj = Map::new();
            for (idx, field) in record.iter().enumerate() {
                if let Some(header) = headers.get(idx) {
                    obj.insert(header.clone(), Value::String(field.to_string()));
                }
            }
            rows.push(Value::Object(obj));
        }
        Ok(rows)
    }
}

enum Command {
    Append(SnapshotRow),
    Flush(oneshot::Sender<()>),
}

/// Queue in front of a [`SnapshotLog`]. Appends are performed in submission
/// order by a single background task; callers never wait on them.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    tx: mpsc::UnboundedSender<Command>,
}

impl SnapshotWriter {
    /// Must be called from within a tokio runtime.
    pub fn spawn(log: Arc<SnapshotLog>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(log, rx));
        Self { tx }
    }

    pub fn submit(&self, row: SnapshotRow) {
        if self.tx.send(Command::Append(row)).is_err() {
            warn!(action = "submit", component = "snapshot_writer", "Snapshot writer has stopped, row dropped");
        }
    }

    /// Resolves once every row submitted before this call has been handled.
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.tx.send(Command::Flush(ack)).is_ok() {
            let _ = done.await;
        }
    }
}

async fn run_writer(log: Arc<SnapshotLog>, mut rx: mpsc::UnboundedReceiver<Command>) {
    while let Some(command) = rx.recv().await {
        match command {
            Command::Append(row) => {
                let start_time = Instant::now();
                let task_log = Arc::clone(&log);
                match tokio::task::spawn_blocking(move || task_log.append(&row)).await {
                    Ok(Ok(())) => info!(
                        action = "append",
                        component = "snapshot_log",
                        file_path = ?log.path(),
                        duration_ms = start_time.elapsed().as_millis(),
                        "Stats snapshot saved"
                    ),
                    Ok(Err(e)) => error!(action = "append", component = "snapshot_log", error = %e, "Failed to save stats snapshot"),
                    Err(e) => error!(action = "append", component = "snapshot_log", error = %e, "Snapshot append task failed"),
                }
            }
            Command::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
}
