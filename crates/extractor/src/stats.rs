use serde::{Deserialize, Serialize};

/// Statistics about one pass over an index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractStats {
    /// Target arrays found in the document
    pub arrays_found: u64,

    /// Array elements decoded, accepted or not
    pub records_processed: u64,

    /// Records the filter accepted (before deduplication)
    pub records_accepted: u64,

    /// Distinct accepted locations
    pub unique_urls: usize,

    /// Decompressed bytes read
    pub bytes_read: u64,

    /// Largest single record buffered while decoding
    pub peak_record_bytes: usize,

    /// Time taken in milliseconds
    pub time_ms: u64,
}

/// Outcome of a full run, after the results were written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    #[serde(flatten)]
    pub stats: ExtractStats,

    pub urls_written: usize,

    /// Total wall time including the write, in milliseconds
    pub total_ms: u64,
}
