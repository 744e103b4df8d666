//! CLI binary for tabconv.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionOptions`, prints the preview and notices, and saves the
//! converted file.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tabconv::{
    convert, inspect, write_artifact, ChartKind, ConversionOptions, ConversionOutput,
    ConversionProgressCallback, ConversionStats, ConvertError, DatasetSummary, Direction,
    NoticeLevel, ProgressCallback, Stage, UploadedFile,
};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner that names the running stage and logs each finished one.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Converting");
        bar.set_message("reading upload…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage) {
        self.bar.set_message(format!("{stage}…"));
    }

    fn on_stage_complete(&self, stage: Stage, rows: usize) {
        self.bar.println(format!(
            "  {} {:<24} {}",
            green("✓"),
            stage.to_string(),
            dim(&format!("{rows} rows"))
        ));
    }

    fn on_conversion_complete(&self, _stats: &ConversionStats) {
        self.finish();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Excel to CSV (writes ./converted.csv)
  tabconv report.xlsx

  # CSV to Excel, removing duplicate rows
  tabconv -d csv-to-excel --drop-duplicates data.csv -o cleaned.xlsx

  # Keep two columns and drop rows with missing cells
  tabconv --drop-missing --columns name,price report.xlsx

  # Histogram of a numeric column, saved as SVG
  tabconv --chart histogram --chart-column price --chart-output price.svg report.xlsx

  # Describe the upload without converting
  tabconv --inspect-only data.csv -d csv-to-excel

  # Structured output
  tabconv --json report.xlsx > result.json

NOTES:
  The input extension must match the direction: .xlsx for excel-to-csv,
  .csv for csv-to-excel. Any other file is skipped without output; pass
  --strict to turn that into an error.

  --drop-missing applies to excel-to-csv only.

ENVIRONMENT VARIABLES:
  Every flag can also be set as TABCONV_<FLAG>, e.g. TABCONV_DIRECTION,
  TABCONV_DROP_DUPLICATES=true, TABCONV_COLUMNS=name,price.
  RUST_LOG overrides the log filter.
"#;

/// Convert tabular files between Excel and CSV.
#[derive(Parser, Debug)]
#[command(
    name = "tabconv",
    version,
    about = "Convert tabular files between Excel (.xlsx) and CSV",
    long_about = "Convert tabular files between Excel (.xlsx) and CSV, with optional removal of \
rows containing missing values, removal of duplicate rows, column selection, and a bar, line or \
histogram chart of one numeric column.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// File to convert (.xlsx or .csv).
    input: PathBuf,

    /// Conversion direction.
    #[arg(short, long, env = "TABCONV_DIRECTION", value_enum, default_value = "excel-to-csv")]
    direction: DirectionArg,

    /// Drop rows that contain any missing value (excel-to-csv only).
    #[arg(long, env = "TABCONV_DROP_MISSING")]
    drop_missing: bool,

    /// Drop rows that repeat an earlier row.
    #[arg(long, env = "TABCONV_DROP_DUPLICATES")]
    drop_duplicates: bool,

    /// Columns to keep, in output order (comma-separated). Default: all.
    #[arg(long, env = "TABCONV_COLUMNS", value_delimiter = ',')]
    columns: Option<Vec<String>>,

    /// Render a chart of one numeric column.
    #[arg(long, env = "TABCONV_CHART", value_enum)]
    chart: Option<ChartArg>,

    /// Column to chart. Default: first numeric column.
    #[arg(long, env = "TABCONV_CHART_COLUMN", requires = "chart")]
    chart_column: Option<String>,

    /// Where to save the chart SVG.
    #[arg(long, env = "TABCONV_CHART_OUTPUT", default_value = "chart.svg")]
    chart_output: PathBuf,

    /// Where to save the converted file. Default: converted.csv / converted.xlsx.
    #[arg(short, long, env = "TABCONV_OUTPUT")]
    output: Option<PathBuf>,

    /// Fail when the file extension does not match the direction.
    #[arg(long, env = "TABCONV_STRICT")]
    strict: bool,

    /// Print structured JSON instead of the preview and notices.
    #[arg(long, env = "TABCONV_JSON")]
    json: bool,

    /// Describe the upload only; nothing is written.
    #[arg(long)]
    inspect_only: bool,

    /// Do not print the preview table.
    #[arg(long, env = "TABCONV_NO_PREVIEW")]
    no_preview: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "TABCONV_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "TABCONV_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum DirectionArg {
    ExcelToCsv,
    CsvToExcel,
}

impl From<DirectionArg> for Direction {
    fn from(v: DirectionArg) -> Self {
        match v {
            DirectionArg::ExcelToCsv => Direction::ExcelToCsv,
            DirectionArg::CsvToExcel => Direction::CsvToExcel,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ChartArg {
    Bar,
    Line,
    Histogram,
}

impl From<ChartArg> for ChartKind {
    fn from(v: ChartArg) -> Self {
        match v {
            ChartArg::Bar => ChartKind::Bar,
            ChartArg::Line => ChartKind::Line,
            ChartArg::Histogram => ChartKind::Histogram,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives the feedback that matters; INFO logs would fight it.
    let show_progress = !cli.quiet && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match run(&cli, show_progress).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let message = match err.downcast_ref::<ConvertError>() {
                Some(e) => e.user_message(),
                None => format!("⚠️ Error: {err:#}"),
            };
            eprintln!("{}", red(&message));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli, show_progress: bool) -> Result<()> {
    let direction = Direction::from(cli.direction);
    let file = UploadedFile::read(&cli.input).await?;

    if !cli.quiet && !cli.json {
        println!("📄 {} {}", bold("File Name:"), file.name());
        println!("📊 {} {:.2} KB", bold("File Size:"), file.size_kb());
    }

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        if let Some(summary) = inspect(&file, direction, cli.strict)? {
            print_summary(cli, &summary)?;
        }
        return Ok(());
    }

    // ── Build options ────────────────────────────────────────────────────
    let spinner = show_progress.then(CliProgressCallback::new);
    let options = build_options(cli, spinner.clone().map(|cb| cb as ProgressCallback))?;

    // ── Run conversion ───────────────────────────────────────────────────
    let result = tokio::task::spawn_blocking(move || convert(&file, &options))
        .await
        .context("Conversion task failed")?;
    if let Some(ref cb) = spinner {
        cb.finish();
    }
    let Some(output) = result? else {
        return Ok(());
    };

    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&output.artifact.filename));
    write_artifact(&output.artifact, &output_path).await?;

    let chart_path = match output.chart {
        Some(ref chart) => {
            write_chart(&cli.chart_output, &chart.svg).await?;
            Some(cli.chart_output.as_path())
        }
        None => None,
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if !cli.quiet {
        print_report(cli, &output, &output_path, chart_path);
    }

    Ok(())
}

/// Map CLI args to `ConversionOptions`.
fn build_options(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionOptions> {
    let mut builder = ConversionOptions::builder()
        .direction(cli.direction.into())
        .drop_missing(cli.drop_missing)
        .drop_duplicates(cli.drop_duplicates)
        .strict_extension(cli.strict);

    if let Some(ref columns) = cli.columns {
        builder = builder.columns(columns.iter().map(|c| c.trim().to_string()));
    }
    if let Some(kind) = cli.chart {
        builder = builder.chart(kind.into(), cli.chart_column.as_deref());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    Ok(builder.build()?)
}

async fn write_chart(path: &Path, svg: &str) -> Result<()> {
    tokio::fs::write(path, svg)
        .await
        .with_context(|| format!("Failed to write chart to {}", path.display()))
}

fn print_summary(cli: &Cli, summary: &DatasetSummary) -> Result<()> {
    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(summary).context("Failed to serialise summary")?
        );
        return Ok(());
    }
    if cli.quiet {
        return Ok(());
    }

    println!("Format:   {}", summary.format);
    println!("Rows:     {}", summary.rows);
    println!("Columns:  {}", summary.columns.len());
    for column in &summary.columns {
        println!(
            "  {:<24} {:<8} {}",
            column.name,
            column.kind.to_string(),
            dim(&format!("{} missing", column.missing))
        );
    }
    if !cli.no_preview {
        println!("\n{}\n{}", bold("👀 Data Preview"), summary.preview);
    }
    Ok(())
}

fn print_report(cli: &Cli, output: &ConversionOutput, output_path: &Path, chart: Option<&Path>) {
    if !cli.no_preview {
        println!("\n{}\n{}", bold("👀 Data Preview"), output.preview);
    }

    for notice in &output.notices {
        let line = notice.to_string();
        println!(
            "{}",
            match notice.level {
                NoticeLevel::Info => line,
                NoticeLevel::Success => green(&line),
                NoticeLevel::Warning => yellow(&line),
            }
        );
    }

    if let Some(path) = chart {
        println!("📈 Chart saved to {}", bold(&path.display().to_string()));
    }

    println!(
        "{}  {}",
        green(&output.success_message()),
        dim(&format!("→ {}", output_path.display()))
    );
}
