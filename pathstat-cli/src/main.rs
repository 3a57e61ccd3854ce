// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  pathstat: per-route latency statistics from request logs
//
//  Sources:  exported event pages (JSON) / plain-text log files / stdin
//  Output:   JSON on stdout, structured logs on stderr
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use anyhow::{Context, bail};
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use pathstat_core::analyzer::{AnalysisResult, Analyzer, write_detailed_json, write_json};
use pathstat_core::config::PathstatConfig;
use pathstat_core::entry::TimeWindow;
use pathstat_store::{ExportSource, LogQuery, LogSource, TextSource};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};

/// Layout of `--start` / `--end`.
const WINDOW_LAYOUT: &str = "%Y-%m-%dT%H:%M:%S";

/// `--input` value that reads standard input.
const STDIN_INPUT: &str = "-";

#[derive(Parser, Debug)]
#[command(name = "pathstat", version, about = "Per-route latency statistics from request logs")]
struct Cli {
    /// Log level, overridden by RUST_LOG
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Pair request start/completion lines and report per-route timings
    Analyze(AnalyzeArgs),
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Window start, e.g. 2023-01-01T00:00:00 (configured timezone)
    #[arg(long)]
    start: String,

    /// Window end, inclusive
    #[arg(long)]
    end: String,

    /// Log input: a page file, a directory of page files, a text log, or `-` for stdin
    #[arg(short, long = "input", required = true)]
    inputs: Vec<String>,

    #[arg(long, value_enum, default_value_t = InputFormat::Auto)]
    format: InputFormat,

    /// Exclusions file, replaces the configured file and the directory search
    #[arg(long)]
    exclusions: Option<PathBuf>,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Emit the full analysis result instead of the summary list
    #[arg(long)]
    detailed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum InputFormat {
    /// Directories and `.json` files are exports, everything else is text
    Auto,
    Export,
    Text,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── Tracing ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .with_target(false)
        .json()
        .with_writer(std::io::stderr)
        .init();

    let outcome = match &cli.command {
        Command::Analyze(args) => analyze(args, std::io::stdout().lock()),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let chain = format!("{e:#}");
            error!(error = %chain, "pathstat failed");
            ExitCode::FAILURE
        }
    }
}

fn analyze<W: Write>(args: &AnalyzeArgs, mut out: W) -> anyhow::Result<()> {
    if args.inputs.iter().filter(|input| input.as_str() == STDIN_INPUT).count() > 1 {
        bail!("standard input can only be given once as --input");
    }

    // ── Config ──
    let config = match &args.config {
        Some(path) => {
            if !path.exists() {
                bail!("config file not found: {}", path.display());
            }
            info!(path = %path.display(), "Loading config file");
            PathstatConfig::load(path)?
        }
        None => PathstatConfig::from_env()?,
    };

    // ── Window ──
    let offset = config.offset()?;
    let window = TimeWindow::new(
        parse_window_bound(&args.start, offset).context("invalid --start")?,
        parse_window_bound(&args.end, offset).context("invalid --end")?,
    )?;
    info!(start = %window.start, end = %window.end, timezone = %config.timezone, "Analysis window");

    // ── Exclusions ──
    let excluder = config.build_excluder(args.exclusions.as_deref())?;
    info!(rules = excluder.len(), "Exclusion rules loaded");

    let analyzer = Analyzer::with_filter(excluder);
    let query = LogQuery::new(window, config.source.keywords.clone());

    // ── Inputs, one thread each ──
    let result = std::thread::scope(|scope| {
        let handles: Vec<_> = args
            .inputs
            .iter()
            .map(|input| {
                let (analyzer, query) = (&analyzer, &query);
                scope.spawn(move || run_input(input, args.format, query, analyzer))
            })
            .collect();

        let mut merged: Option<AnalysisResult> = None;
        for handle in handles {
            let result = match handle.join() {
                Ok(result) => result?,
                Err(_) => bail!("input worker panicked"),
            };
            match merged.as_mut() {
                Some(m) => m.merge(result),
                None => merged = Some(result),
            }
        }
        merged.context("no input given")
    })?;

    // ── Output ──
    if args.detailed || config.output.detailed {
        write_detailed_json(&result, &mut out)?;
    } else {
        write_json(&result, &mut out)?;
    }
    out.flush()?;
    Ok(())
}

fn run_input(
    input: &str,
    format: InputFormat,
    query: &LogQuery,
    analyzer: &Analyzer,
) -> anyhow::Result<AnalysisResult> {
    let source = open_source(input, format)?;
    let records = source
        .fetch_all(query)
        .with_context(|| format!("failed to read {}", source.name()))?;
    Ok(analyzer.run(&records, query.window))
}

fn open_source(input: &str, format: InputFormat) -> anyhow::Result<Box<dyn LogSource>> {
    if input == STDIN_INPUT {
        if format == InputFormat::Export {
            bail!("standard input can only be read as text");
        }
        return Ok(Box::new(TextSource::stdin()));
    }

    let path = Path::new(input);
    match resolve_format(path, format) {
        InputFormat::Text => Ok(Box::new(TextSource::from_path(path))),
        _ => Ok(Box::new(ExportSource::open(path)?)),
    }
}

/// Settle `auto` into `export` or `text` for a filesystem input.
fn resolve_format(path: &Path, format: InputFormat) -> InputFormat {
    match format {
        InputFormat::Auto => {
            let is_json = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
            if path.is_dir() || is_json {
                InputFormat::Export
            } else {
                InputFormat::Text
            }
        }
        explicit => explicit,
    }
}

/// Read a `YYYY-MM-DDTHH:MM:SS` wall-clock time in `offset` as a UTC instant.
fn parse_window_bound(value: &str, offset: FixedOffset) -> anyhow::Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(value.trim(), WINDOW_LAYOUT)
        .with_context(|| format!("expected {WINDOW_LAYOUT}, got {value:?}"))?;
    let local = offset
        .from_local_datetime(&naive)
        .single()
        .with_context(|| format!("ambiguous local time {value:?}"))?;
    Ok(local.with_timezone(&Utc))
}
