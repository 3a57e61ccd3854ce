use crate::aggregator::{self, PairingStats, RouteMetrics, RouteMetricsMap};
use crate::entry::{Entry, RawRecord, TimeWindow};
use crate::exclusion::{PathExcluder, PathFilter};
use crate::normalizer::RouteNormalizer;
use crate::parser::EntryParser;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::io::Write;
use tracing::{debug, info};

/// Outcome of one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    /// Every record handed in, parsed or not
    pub total_input_records: usize,
    /// Records that produced an entry
    pub parsed_entries: usize,
    pub pairing: PairingStats,
    #[serde(serialize_with = "serialize_routes_sorted")]
    pub metrics_by_route: RouteMetricsMap,
}

fn serialize_routes_sorted<S: Serializer>(routes: &RouteMetricsMap, serializer: S) -> Result<S::Ok, S::Error> {
    routes.iter().collect::<BTreeMap<_, _>>().serialize(serializer)
}

/// Flat per-route record of the summary output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSummary {
    pub path: String,
    pub count: u64,
    pub max_time_ms: u64,
    pub min_time_ms: u64,
    pub avg_time_ms: String,
}

impl From<&RouteMetrics> for PathSummary {
    fn from(metrics: &RouteMetrics) -> Self {
        Self {
            path: metrics.route.clone(),
            count: metrics.count,
            max_time_ms: metrics.max_ms,
            min_time_ms: metrics.min_ms,
            avg_time_ms: format!("{:.0}", metrics.mean_ms),
        }
    }
}

/// Runs parse → normalize → pair/aggregate over a batch of raw records.
pub struct Analyzer<F: PathFilter = PathExcluder> {
    parser: EntryParser,
    normalizer: RouteNormalizer,
    filter: F,
}

impl Analyzer<PathExcluder> {
    /// Analyzer with the built-in default exclusions.
    pub fn new() -> Self {
        Self::with_filter(PathExcluder::default())
    }
}

impl Default for Analyzer<PathExcluder> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: PathFilter> Analyzer<F> {
    pub fn with_filter(filter: F) -> Self {
        Self {
            parser: EntryParser::new(),
            normalizer: RouteNormalizer::new(),
            filter,
        }
    }

    /// Analyze one batch of records covering `window`.
    pub fn run(&self, records: &[RawRecord], window: TimeWindow) -> AnalysisResult {
        let entries = self.parse_records(records);
        let parsed_entries = entries.len();

        let (metrics_by_route, pairing) =
            aggregator::aggregate_with_stats(&entries, &self.normalizer, &self.filter);

        info!(
            records = records.len(),
            entries = parsed_entries,
            pairs = pairing.pairs,
            excluded = pairing.excluded,
            unpaired_completions = pairing.unpaired_completions,
            orphaned_starts = pairing.orphaned_starts,
            routes = metrics_by_route.len(),
            "Analysis finished"
        );

        AnalysisResult {
            window_start: window.start,
            window_end: window.end,
            total_input_records: records.len(),
            parsed_entries,
            pairing,
            metrics_by_route,
        }
    }

    /// Parse every record, dropping the ones that are not request-lifecycle lines.
    pub fn parse_records(&self, records: &[RawRecord]) -> Vec<Entry> {
        records
            .iter()
            .filter_map(|record| match self.parser.parse(&record.text) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    debug!(id = %record.identifier, kind = e.kind(), error = %e, "Skipping log record");
                    None
                }
            })
            .collect()
    }
}

impl AnalysisResult {
    /// Fold another run's result into this one. Windows widen to cover both.
    pub fn merge(&mut self, other: AnalysisResult) {
        self.window_start = self.window_start.min(other.window_start);
        self.window_end = self.window_end.max(other.window_end);
        self.total_input_records += other.total_input_records;
        self.parsed_entries += other.parsed_entries;
        self.pairing.pairs += other.pairing.pairs;
        self.pairing.excluded += other.pairing.excluded;
        self.pairing.unpaired_completions += other.pairing.unpaired_completions;
        self.pairing.orphaned_starts += other.pairing.orphaned_starts;
        self.pairing.replaced_starts += other.pairing.replaced_starts;
        aggregator::merge_metrics(&mut self.metrics_by_route, other.metrics_by_route);
    }

    /// Per-route summaries, busiest route first; equal counts are ordered by path.
    pub fn summaries(&self) -> Vec<PathSummary> {
        let mut summaries: Vec<PathSummary> =
            self.metrics_by_route.values().map(PathSummary::from).collect();
        summaries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.path.cmp(&b.path)));
        summaries
    }
}

/// Write the summary list as a JSON array indented with four spaces.
pub fn write_json<W: Write>(result: &AnalysisResult, writer: W) -> Result<(), crate::PathstatError> {
    write_pretty(&result.summaries(), writer)
}

/// Write the whole result, per-route breakdowns included.
pub fn write_detailed_json<W: Write>(
    result: &AnalysisResult,
    writer: W,
) -> Result<(), crate::PathstatError> {
    write_pretty(result, writer)
}

fn write_pretty<T: Serialize + ?Sized, W: Write>(
    value: &T,
    mut writer: W,
) -> Result<(), crate::PathstatError> {
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut writer, formatter);
    value.serialize(&mut ser)?;
    writer.write_all(b"\n").map_err(serde_json::Error::io)?;
    Ok(())
}
