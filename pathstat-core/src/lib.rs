pub mod aggregator;
pub mod analyzer;
pub mod config;
pub mod entry;
pub mod error;
pub mod exclusion;
pub mod normalizer;
pub mod parser;

pub use aggregator::{PairingStats, RequestPair, RouteMetrics, RouteMetricsMap};
pub use analyzer::{AnalysisResult, Analyzer, PathSummary};
pub use config::PathstatConfig;
pub use entry::{CompletionEntry, Entry, RawRecord, StartEntry, TimeWindow};
pub use error::{ParseError, PathstatError};
pub use exclusion::{PathExcluder, PathFilter};
pub use normalizer::RouteNormalizer;
pub use parser::EntryParser;
