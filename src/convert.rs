//! Conversion entry points.
//!
//! [`convert`] is the pipeline itself: synchronous, in memory, one upload in,
//! at most one artifact out. [`convert_file`] and [`convert_to_file`] read the
//! upload from disk and run the same pipeline on tokio's blocking pool.
//! [`inspect`] stops after parsing.

use crate::config::{ConversionOptions, Direction, DEFAULT_PREVIEW_ROWS};
use crate::dataset::Dataset;
use crate::error::ConvertError;
use crate::output::{
    ColumnSummary, ConversionOutput, ConversionStats, DatasetSummary, Notice, OutputArtifact,
};
use crate::pipeline::input::{self, UploadedFile};
use crate::pipeline::{chart, clean, parse, select, serialize};
use crate::progress::{ProgressCallback, Stage};
use std::io::Write;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Run one upload through the pipeline.
///
/// # Returns
/// - `Ok(Some(output))` with the artifact, preview, chart and notices
/// - `Ok(None)` when the file name does not match the direction's input
///   extension and `strict_extension` is off; nothing is parsed
///
/// # Errors
/// Any failing stage aborts the run and no artifact is produced:
/// parse errors, invalid column selections, chart requests naming a missing
/// or non-numeric column, and serialization failures.
pub fn convert(
    file: &UploadedFile,
    options: &ConversionOptions,
) -> Result<Option<ConversionOutput>, ConvertError> {
    let start = Instant::now();
    let direction = options.direction;
    info!(
        "Starting conversion: {} ({:.2} KB, {})",
        file.name(),
        file.size_kb(),
        direction
    );

    // ── Step 1: Format dispatch ──────────────────────────────────────────
    let Some(format) = input::dispatch(file, direction, options.strict_extension)? else {
        return Ok(None);
    };
    let mut run = Run::new(options.progress_callback.as_ref());

    // ── Step 2: Parse ────────────────────────────────────────────────────
    run.start(Stage::Parse);
    let mut ds = parse::parse(file.bytes(), format)?;
    run.complete(Stage::Parse, &ds);
    let input_rows = ds.row_count();
    let input_columns = ds.column_count();
    info!("Parsed {} rows × {} columns", input_rows, input_columns);

    // ── Step 3: Preview (before any cleaning) ────────────────────────────
    let preview = ds.head(options.preview_rows);

    // ── Step 4: Remove missing values ────────────────────────────────────
    let mut missing_rows_removed = 0;
    if options.drop_missing {
        match direction {
            Direction::ExcelToCsv => {
                run.start(Stage::DropMissing);
                missing_rows_removed = clean::drop_missing(&mut ds);
                run.complete(Stage::DropMissing, &ds);
            }
            Direction::CsvToExcel => run.notice(Notice::warning(
                "Removing missing values is only available for Excel to CSV; option ignored.",
            )),
        }
    }

    // ── Step 5: Remove duplicates ────────────────────────────────────────
    let mut duplicate_rows_removed = 0;
    if options.drop_duplicates {
        run.start(Stage::DropDuplicates);
        duplicate_rows_removed = clean::drop_duplicates(&mut ds);
        run.complete(Stage::DropDuplicates, &ds);
        if direction == Direction::CsvToExcel {
            run.notice(match duplicate_rows_removed {
                0 => Notice::info("No duplicate rows found!"),
                n => Notice::success(format!("{n} duplicate rows removed successfully!")),
            });
        }
    }

    // ── Step 6: Column selection ─────────────────────────────────────────
    if let Some(ref columns) = options.columns {
        run.start(Stage::SelectColumns);
        ds = select::select_columns(ds, Some(columns.as_slice()))?;
        run.complete(Stage::SelectColumns, &ds);
    }

    // ── Step 7: Visualization ────────────────────────────────────────────
    let mut preview_chart = None;
    if let Some(ref request) = options.chart {
        match chart::resolve_column(&ds, request)? {
            Some(column) => {
                run.start(Stage::Chart);
                preview_chart = Some(chart::render_chart(column, request.kind, options.chart_size)?);
                run.complete(Stage::Chart, &ds);
            }
            None => run.notice(Notice::info(
                "No numeric columns available for visualization; chart skipped.",
            )),
        }
    }

    // ── Step 8: Serialize ────────────────────────────────────────────────
    run.start(Stage::Serialize);
    let artifact = serialize::serialize(&ds, direction.output_format())?;
    run.complete(Stage::Serialize, &ds);

    // ── Step 9: Stats ────────────────────────────────────────────────────
    let stats = ConversionStats {
        input_rows,
        input_columns,
        missing_rows_removed,
        duplicate_rows_removed,
        output_rows: ds.row_count(),
        output_columns: ds.column_count(),
        output_bytes: artifact.len(),
        duration_ms: start.elapsed().as_millis() as u64,
    };
    info!(
        "Conversion complete: {} rows → {} ({} bytes, {}ms)",
        input_rows, artifact.filename, stats.output_bytes, stats.duration_ms
    );
    if let Some(cb) = run.callback {
        cb.on_conversion_complete(&stats);
    }

    Ok(Some(ConversionOutput {
        direction,
        preview,
        dataset: ds,
        chart: preview_chart,
        notices: run.notices,
        artifact,
        stats,
    }))
}

/// Read `path` and convert it.
///
/// The upload name is the file name of `path`, so dispatch follows its
/// extension exactly as it would for an in-memory upload.
pub async fn convert_file(
    path: impl AsRef<Path>,
    options: &ConversionOptions,
) -> Result<Option<ConversionOutput>, ConvertError> {
    let file = UploadedFile::read(path).await?;
    let options = options.clone();
    tokio::task::spawn_blocking(move || convert(&file, &options))
        .await
        .map_err(|e| ConvertError::Internal(format!("conversion task failed: {e}")))?
}

/// Convert `path` and write the artifact to `output_path`.
///
/// Uses atomic write (temp file in the destination directory + rename) so a
/// failed run never leaves a partial file behind. Returns `Ok(None)` without
/// touching `output_path` on a silent extension mismatch.
pub async fn convert_to_file(
    path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    options: &ConversionOptions,
) -> Result<Option<ConversionStats>, ConvertError> {
    let Some(output) = convert_file(path, options).await? else {
        return Ok(None);
    };
    write_artifact(&output.artifact, output_path).await?;
    Ok(Some(output.stats))
}

/// Write an artifact to `path`, creating parent directories as needed.
///
/// Uses atomic write (temp file in the destination directory + rename).
pub async fn write_artifact(
    artifact: &OutputArtifact,
    path: impl AsRef<Path>,
) -> Result<(), ConvertError> {
    let dest = path.as_ref().to_path_buf();

    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ConvertError::OutputWriteFailed {
                path: dest.clone(),
                source: e,
            })?;
    }

    let bytes = artifact.bytes.clone();
    let written = dest.clone();
    tokio::task::spawn_blocking(move || write_atomic(&written, &bytes))
        .await
        .map_err(|e| ConvertError::Internal(format!("write task failed: {e}")))??;

    debug!("Wrote {} bytes to {}", artifact.len(), dest.display());
    Ok(())
}

/// Parse an upload without converting it.
///
/// Returns `Ok(None)` on an extension mismatch, like [`convert`], or
/// [`ConvertError::ExtensionMismatch`] when `strict` is set.
pub fn inspect(
    file: &UploadedFile,
    direction: Direction,
    strict: bool,
) -> Result<Option<DatasetSummary>, ConvertError> {
    let Some(format) = input::dispatch(file, direction, strict)? else {
        return Ok(None);
    };
    let ds = parse::parse(file.bytes(), format)?;

    let columns = ds
        .columns()
        .iter()
        .map(|c| ColumnSummary {
            name: c.name().to_string(),
            kind: c.kind(),
            missing: c.cells().iter().filter(|cell| cell.is_missing()).count(),
        })
        .collect();

    Ok(Some(DatasetSummary {
        filename: file.name().to_string(),
        size_bytes: file.size(),
        format,
        rows: ds.row_count(),
        columns,
        preview: ds.head(DEFAULT_PREVIEW_ROWS),
    }))
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Notices collected during a run, forwarded to the callback as raised.
struct Run<'a> {
    callback: Option<&'a ProgressCallback>,
    notices: Vec<Notice>,
}

impl<'a> Run<'a> {
    fn new(callback: Option<&'a ProgressCallback>) -> Self {
        Self {
            callback,
            notices: Vec::new(),
        }
    }

    fn start(&self, stage: Stage) {
        debug!("Stage: {}", stage);
        if let Some(cb) = self.callback {
            cb.on_stage_start(stage);
        }
    }

    fn complete(&self, stage: Stage, ds: &Dataset) {
        if let Some(cb) = self.callback {
            cb.on_stage_complete(stage, ds.row_count());
        }
    }

    fn notice(&mut self, notice: Notice) {
        info!("{}", notice.message);
        if let Some(cb) = self.callback {
            cb.on_notice(&notice);
        }
        self.notices.push(notice);
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ConvertError> {
    let fail = |source: std::io::Error| ConvertError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(fail)?;
    tmp.write_all(bytes).map_err(fail)?;
    tmp.persist(path).map_err(|e| fail(e.error))?;
    Ok(())
}
