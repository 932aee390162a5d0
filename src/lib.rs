pub mod args;
pub mod detector;
pub mod error;
pub mod grid;
pub mod server;
pub mod snapshot;
pub mod stats;
pub mod utils;

pub use args::Args;
pub use detector::is_mutant;
pub use error::{ApiError, MutantError};
pub use grid::{Grid, GridRow};
pub use snapshot::{SnapshotLog, SnapshotRow, SnapshotWriter};
pub use stats::{Counters, Percentage, StatsReport, StatsTracker};
