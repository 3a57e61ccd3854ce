use crate::entry::{CompletionEntry, Entry, StartEntry};
use crate::exclusion::PathFilter;
use crate::normalizer::RouteNormalizer;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Route template → running statistics.
pub type RouteMetricsMap = HashMap<String, RouteMetrics>;

/// A Start matched with the Completion that shares its session token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RequestPair<'a> {
    pub start: &'a StartEntry,
    pub completion: &'a CompletionEntry,
}

/// Running statistics for one route template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteMetrics {
    pub route: String,
    pub count: u64,
    pub min_ms: u64,
    pub max_ms: u64,
    pub mean_ms: f64,
    pub status_counts: BTreeMap<u16, u64>,
    pub method_counts: BTreeMap<String, u64>,
    pub total_view_ms: f64,
    pub total_db_ms: f64,
}

impl RouteMetrics {
    pub fn new(route: impl Into<String>) -> Self {
        Self {
            route: route.into(),
            count: 0,
            min_ms: 0,
            max_ms: 0,
            mean_ms: 0.0,
            status_counts: BTreeMap::new(),
            method_counts: BTreeMap::new(),
            total_view_ms: 0.0,
            total_db_ms: 0.0,
        }
    }

    /// Fold one completed request into the statistics.
    pub fn record(&mut self, pair: &RequestPair<'_>) {
        self.record_duration(pair.completion.duration_ms);

        *self.status_counts.entry(pair.completion.status_code).or_insert(0) += 1;
        *self.method_counts.entry(pair.start.method.clone()).or_insert(0) += 1;

        // sub-timings absent from the line parse as 0.0
        if pair.completion.view_ms > 0.0 {
            self.total_view_ms += pair.completion.view_ms;
        }
        if pair.completion.db_ms > 0.0 {
            self.total_db_ms += pair.completion.db_ms;
        }
    }

    fn record_duration(&mut self, duration_ms: u64) {
        self.count += 1;
        if self.count == 1 {
            self.min_ms = duration_ms;
            self.max_ms = duration_ms;
            self.mean_ms = duration_ms as f64;
            return;
        }
        self.min_ms = self.min_ms.min(duration_ms);
        self.max_ms = self.max_ms.max(duration_ms);
        self.mean_ms += (duration_ms as f64 - self.mean_ms) / self.count as f64;
    }

    /// Combine statistics gathered independently for the same route.
    pub fn merge(&mut self, other: &RouteMetrics) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            let route = std::mem::take(&mut self.route);
            *self = other.clone();
            self.route = route;
            return;
        }

        let total = self.count + other.count;
        self.mean_ms = (self.mean_ms * self.count as f64 + other.mean_ms * other.count as f64)
            / total as f64;
        self.count = total;
        self.min_ms = self.min_ms.min(other.min_ms);
        self.max_ms = self.max_ms.max(other.max_ms);

        for (status, n) in &other.status_counts {
            *self.status_counts.entry(*status).or_insert(0) += n;
        }
        for (method, n) in &other.method_counts {
            *self.method_counts.entry(method.clone()).or_insert(0) += n;
        }
        self.total_view_ms += other.total_view_ms;
        self.total_db_ms += other.total_db_ms;
    }
}

/// Merge `other` into `into`, route by route.
pub fn merge_metrics(into: &mut RouteMetricsMap, other: RouteMetricsMap) {
    for (route, metrics) in other {
        match into.get_mut(&route) {
            Some(existing) => existing.merge(&metrics),
            None => {
                into.insert(route, metrics);
            }
        }
    }
}

/// Counters describing how the entries of one run were paired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingStats {
    /// Pairs formed, excluded ones included
    pub pairs: u64,
    /// Pairs dropped by the path filter
    pub excluded: u64,
    /// Completions with no token or no pending Start
    pub unpaired_completions: u64,
    /// Starts still pending at the end of the pass
    pub orphaned_starts: u64,
    /// Pending Starts replaced by a later Start with the same token
    pub replaced_starts: u64,
}

/// Pending-Start table keyed by session token.
///
/// Holds at most one Start per token. A second Start with the same token
/// replaces the first; a Completion consumes the pending Start.
#[derive(Default)]
pub struct PendingSessions<'a> {
    pending: HashMap<&'a str, &'a StartEntry>,
    stats: PairingStats,
}

impl<'a> PendingSessions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next entry; returns a pair when it completes one.
    pub fn observe(&mut self, entry: &'a Entry) -> Option<RequestPair<'a>> {
        match entry {
            Entry::Start(start) => {
                if !start.session_token.is_empty()
                    && self.pending.insert(start.session_token.as_str(), start).is_some()
                {
                    self.stats.replaced_starts += 1;
                }
                None
            }
            Entry::Completion(completion) => {
                let start = (!completion.session_token.is_empty())
                    .then(|| self.pending.remove(completion.session_token.as_str()))
                    .flatten();
                match start {
                    Some(start) => {
                        self.stats.pairs += 1;
                        Some(RequestPair { start, completion })
                    }
                    None => {
                        self.stats.unpaired_completions += 1;
                        None
                    }
                }
            }
        }
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Final counters; whatever is still pending is orphaned.
    pub fn finish(mut self) -> PairingStats {
        self.stats.orphaned_starts = self.pending.len() as u64;
        self.stats
    }
}

/// Match Start and Completion entries by session token, in input order.
pub fn match_pairs(entries: &[Entry]) -> Vec<RequestPair<'_>> {
    let mut sessions = PendingSessions::new();
    entries.iter().filter_map(|entry| sessions.observe(entry)).collect()
}

/// Pair entries and fold every non-excluded pair into per-route metrics.
pub fn aggregate<F: PathFilter + ?Sized>(
    entries: &[Entry],
    normalizer: &RouteNormalizer,
    filter: &F,
) -> RouteMetricsMap {
    aggregate_with_stats(entries, normalizer, filter).0
}

/// Like [`aggregate`], also returning the pairing counters.
pub fn aggregate_with_stats<F: PathFilter + ?Sized>(
    entries: &[Entry],
    normalizer: &RouteNormalizer,
    filter: &F,
) -> (RouteMetricsMap, PairingStats) {
    let mut metrics = RouteMetricsMap::new();
    let mut sessions = PendingSessions::new();
    let mut excluded = 0u64;

    for entry in entries {
        let Some(pair) = sessions.observe(entry) else {
            continue;
        };

        if filter.should_exclude(&pair.start.path) {
            excluded += 1;
            continue;
        }

        let route = normalizer.normalize(&pair.start.path);
        metrics
            .entry(route)
            .or_insert_with_key(|route| RouteMetrics::new(route.clone()))
            .record(&pair);
    }

    let mut stats = sessions.finish();
    stats.excluded = excluded;
    (metrics, stats)
}
