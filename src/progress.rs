//! Progress-callback trait for per-stage conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionOptionsBuilder::progress_callback`] to observe
//! a run as it moves through the pipeline. The CLI uses it to drive a
//! spinner and to print notices as soon as they are raised.
//!
//! # Example
//!
//! ```rust
//! use tabconv::{ConversionOptions, ConversionProgressCallback, Stage};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct StageCounter(AtomicUsize);
//!
//! impl ConversionProgressCallback for StageCounter {
//!     fn on_stage_complete(&self, _stage: Stage, _rows: usize) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//!
//! let options = ConversionOptions::builder()
//!     .progress_callback(Arc::new(StageCounter(AtomicUsize::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use crate::output::{ConversionStats, Notice};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Parse,
    DropMissing,
    DropDuplicates,
    SelectColumns,
    Chart,
    Serialize,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Parse => "parsing",
            Stage::DropMissing => "removing missing values",
            Stage::DropDuplicates => "removing duplicates",
            Stage::SelectColumns => "selecting columns",
            Stage::Chart => "rendering chart",
            Stage::Serialize => "writing output",
        })
    }
}

/// Called by the pipeline as it runs.
///
/// Implementations must be `Send + Sync` because the path-based entry points
/// run the pipeline on tokio's blocking pool. All methods default to no-ops.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called before a stage runs. Skipped stages produce no events.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called after a stage succeeds.
    ///
    /// # Arguments
    /// * `stage`: the stage that finished
    /// * `rows` : row count of the table after the stage
    fn on_stage_complete(&self, stage: Stage, rows: usize) {
        let _ = (stage, rows);
    }

    /// Called as soon as a notice is raised.
    fn on_notice(&self, notice: &Notice) {
        let _ = notice;
    }

    /// Called once after an artifact has been produced.
    fn on_conversion_complete(&self, stats: &ConversionStats) {
        let _ = stats;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionOptions`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
