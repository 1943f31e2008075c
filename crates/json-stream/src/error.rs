use thiserror::Error;

/// Result type for tokenizer operations
pub type Result<T> = std::result::Result<T, JsonStreamError>;

/// Errors raised while pulling tokens from a JSON byte stream.
///
/// Every variant carries the byte offset (in the decompressed stream) at which the
/// problem was detected. None of them are recoverable: once the cursor reports an
/// error its position is undefined.
#[derive(Error, Debug)]
pub enum JsonStreamError {
    /// The bytes at `offset` are not valid JSON
    #[error("Malformed JSON at byte {offset}: {message}")]
    Syntax { offset: u64, message: String },

    /// The underlying reader failed (including decompression errors)
    #[error("Read failed at byte {offset}: {source}")]
    Io {
        offset: u64,
        #[source]
        source: std::io::Error,
    },

    /// A value was lexically valid but did not fit the requested shape
    #[error("Value starting at byte {offset} does not match the expected shape: {source}")]
    Decode {
        offset: u64,
        #[source]
        source: serde_json::Error,
    },
}

impl JsonStreamError {
    /// Create a syntax error
    pub fn syntax(offset: u64, msg: impl Into<String>) -> Self {
        Self::Syntax {
            offset,
            message: msg.into(),
        }
    }

    /// Byte offset where the error was detected
    pub fn offset(&self) -> u64 {
        match self {
            Self::Syntax { offset, .. } | Self::Io { offset, .. } | Self::Decode { offset, .. } => {
                *offset
            }
        }
    }
}
