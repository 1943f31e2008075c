use crate::error::{ExtractError, Result};
use crate::filter::RecordFilter;
use crate::progress::ProgressTracker;
use crate::record::InNetworkFile;
use crate::results::ResultSet;
use mrf_json_stream::{JsonStreamError, Token, TokenCursor};
use std::io::BufRead;

/// Counts for one drained array
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ArrayOutcome {
    pub processed: u64,
    pub accepted: u64,
}

/// Drains one array of [`InNetworkFile`] records into a [`ResultSet`].
///
/// Decoding is strict: the first element that does not decode aborts the run, since
/// the rest of the document can no longer be trusted to have the expected shape.
pub struct RecordExtractor<'a> {
    key: &'a str,
    filter: &'a dyn RecordFilter,
}

impl<'a> RecordExtractor<'a> {
    pub fn new(key: &'a str, filter: &'a dyn RecordFilter) -> Self {
        Self { key, filter }
    }

    /// Consume the array the cursor is in, up to and including its closing bracket.
    ///
    /// The cursor must be positioned right after the array's opening bracket.
    pub fn drain<R: BufRead>(
        &self,
        cursor: &mut TokenCursor<R>,
        results: &mut ResultSet,
        progress: &mut ProgressTracker,
    ) -> Result<ArrayOutcome> {
        let mut outcome = ArrayOutcome::default();

        while cursor.more()? {
            let file: InNetworkFile = cursor
                .decode_value()
                .map_err(|err| ExtractError::in_record(self.key, outcome.processed, err))?;
            outcome.processed += 1;
            progress.record();

            if self.filter.accepts(&file.location, &file.description) {
                outcome.accepted += 1;
                results.insert(file.location);
            }
        }

        match cursor.next_token()? {
            Some(Token::EndArray) => Ok(outcome),
            other => {
                let found = other.map_or_else(|| "end of input".to_string(), |t| t.to_string());
                Err(JsonStreamError::syntax(
                    cursor.offset(),
                    format!("expected end of `{}` array, found {found}", self.key),
                )
                .into())
            }
        }
    }
}
