//! # MRF Extractor
//!
//! Pulls file URLs out of Transparency-in-Coverage index files in a single streaming
//! pass.
//!
//! ## Pipeline
//!
//! ```text
//! ByteSource (.json.gz / .json / stdin)
//!     │
//!     ├──> TokenCursor (incremental tokenizer)
//!     │
//!     ├──> FieldLocator (scan for `in_network_files`)
//!     │      └─> RecordExtractor (decode one element at a time)
//!     │             └─> RecordFilter -> ResultSet (dedup by location)
//!     │
//!     └──> ResultSink (one URL per line)
//! ```
//!
//! Memory stays at one array element plus the set of accepted URLs, regardless of
//! how large the index is.
//!
//! ## Example
//!
//! ```no_run
//! use mrf_extractor::{ByteSource, ExtractConfig, Extractor, LineSink};
//!
//! fn main() -> mrf_extractor::Result<()> {
//!     let extractor = Extractor::new(ExtractConfig::default())?;
//!     let source = ByteSource::from_path("index.json.gz");
//!     let mut sink = LineSink::from_path("urls.txt");
//!     let summary = extractor.run(&source, &mut sink)?;
//!
//!     println!("{} records, {} unique URLs", summary.stats.records_processed, summary.urls_written);
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod extract;
mod filter;
mod locator;
mod pipeline;
mod progress;
mod record;
mod results;
mod sink;
mod source;
mod stats;

pub use config::{ExtractConfig, DEFAULT_PROGRESS_INTERVAL, DEFAULT_TARGET_KEY};
pub use error::{ExtractError, Result};
pub use extract::{ArrayOutcome, RecordExtractor};
pub use filter::{FilterConfig, NetworkPlanFilter, RecordFilter};
pub use locator::{FieldLocator, LocatorOutcome, LocatorState};
pub use pipeline::{Extraction, Extractor};
pub use progress::ProgressTracker;
pub use record::InNetworkFile;
pub use results::ResultSet;
pub use sink::{write_lines, LineSink, OutputTarget, ResultSink};
pub use source::{decode, ByteSource, Compression};
pub use stats::{ExtractStats, RunSummary};
