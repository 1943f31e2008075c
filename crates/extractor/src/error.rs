use mrf_json_stream::JsonStreamError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExtractError>;

/// Terminal failures of an extraction run. Nothing is retried.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Cannot open input {path}: {source}")]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading the decompressed stream failed part way through (truncated or
    /// corrupt gzip data, a failing disk)
    #[error("Cannot read input at byte {offset}: {source}")]
    SourceCorrupt {
        offset: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed input: {0}")]
    MalformedInput(JsonStreamError),

    #[error("Malformed record #{index} in `{key}`: {source}")]
    MalformedRecord {
        key: String,
        index: u64,
        #[source]
        source: JsonStreamError,
    },

    #[error("Cannot write output {path}: {source}")]
    SinkUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Read failures belong to the source; everything else the cursor reports is a
/// problem with the document itself.
impl From<JsonStreamError> for ExtractError {
    fn from(err: JsonStreamError) -> Self {
        match err {
            JsonStreamError::Io { offset, source } => Self::SourceCorrupt { offset, source },
            other => Self::MalformedInput(other),
        }
    }
}

impl ExtractError {
    pub fn source_unavailable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::SourceUnavailable {
            path: path.into(),
            source,
        }
    }

    pub fn sink_unavailable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::SinkUnavailable {
            path: path.into(),
            source,
        }
    }

    /// Classify a failure while decoding element `index` of the `key` array
    pub fn in_record(key: &str, index: u64, err: JsonStreamError) -> Self {
        match err {
            io @ JsonStreamError::Io { .. } => io.into(),
            source => Self::MalformedRecord {
                key: key.to_string(),
                index,
                source,
            },
        }
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Structural problem in the document (as opposed to I/O on either end)
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            Self::MalformedInput(_) | Self::MalformedRecord { .. }
        )
    }
}
