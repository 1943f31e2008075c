use crate::config::ExtractConfig;
use crate::error::{ExtractError, Result};
use crate::filter::{NetworkPlanFilter, RecordFilter};
use crate::locator::FieldLocator;
use crate::progress::ProgressTracker;
use crate::results::ResultSet;
use crate::sink::ResultSink;
use crate::source::ByteSource;
use crate::stats::{ExtractStats, RunSummary};
use mrf_json_stream::TokenCursor;
use std::io::BufRead;
use std::time::Instant;

/// Result set plus the statistics of the pass that produced it
#[derive(Debug, Clone)]
pub struct Extraction {
    pub results: ResultSet,
    pub stats: ExtractStats,
}

/// Wires source, tokenizer, locator and sink for one single-pass run
pub struct Extractor {
    config: ExtractConfig,
    filter: Box<dyn RecordFilter>,
}

impl Extractor {
    /// Build an extractor using the reference [`NetworkPlanFilter`]
    pub fn new(config: ExtractConfig) -> Result<Self> {
        config.validate().map_err(ExtractError::InvalidConfig)?;
        let filter = NetworkPlanFilter::new(&config.filter)?;
        Ok(Self {
            config,
            filter: Box::new(filter),
        })
    }

    /// Replace the filter predicate
    pub fn with_filter<F: RecordFilter + 'static>(mut self, filter: F) -> Self {
        self.filter = Box::new(filter);
        self
    }

    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    /// Run the traversal over already-decompressed JSON bytes
    pub fn extract_from_reader<R: BufRead>(&self, reader: R) -> Result<Extraction> {
        let started = Instant::now();
        let mut cursor = TokenCursor::new(reader).with_max_depth(self.config.max_depth);
        let mut results = ResultSet::new();
        let mut progress = ProgressTracker::new(self.config.progress_interval);

        let mut locator = FieldLocator::new(&self.config.target_key, &*self.filter);
        let outcome = locator.run(&mut cursor, &mut results, &mut progress)?;

        if outcome.arrays_found == 0 {
            log::warn!("No `{}` field found in input", self.config.target_key);
        }

        let stats = ExtractStats {
            arrays_found: outcome.arrays_found,
            records_processed: outcome.records_processed,
            records_accepted: outcome.records_accepted,
            unique_urls: results.len(),
            bytes_read: cursor.offset(),
            peak_record_bytes: cursor.peak_capture_bytes(),
            time_ms: started.elapsed().as_millis() as u64,
        };
        log::info!(
            "Total records processed: {}. Unique URLs: {}. Total processing time: {:.2?}",
            stats.records_processed,
            stats.unique_urls,
            started.elapsed()
        );

        Ok(Extraction { results, stats })
    }

    /// Open `source` and run the traversal over it
    pub fn extract(&self, source: &ByteSource) -> Result<Extraction> {
        let reader = source.open(self.config.compression)?;
        log::info!("Extracting `{}` from {}", self.config.target_key, source.name().display());
        self.extract_from_reader(reader)
    }

    /// Full run: extract, then hand the finished set to `sink`.
    ///
    /// The sink is only touched after the whole document was read successfully.
    pub fn run(&self, source: &ByteSource, sink: &mut dyn ResultSink) -> Result<RunSummary> {
        let started = Instant::now();
        let extraction = self.extract(source)?;
        let urls_written = sink.write(&extraction.results)?;
        log::info!(
            "URLs extracted and saved successfully. Total unique URLs: {}",
            urls_written
        );
        let total = started.elapsed();
        log::info!("Total execution time: {:.2?}", total);

        Ok(RunSummary {
            stats: extraction.stats,
            urls_written,
            total_ms: total.as_millis() as u64,
        })
    }
}
