use crate::error::Result;
use crate::extract::RecordExtractor;
use crate::filter::RecordFilter;
use crate::progress::ProgressTracker;
use crate::results::ResultSet;
use mrf_json_stream::{JsonStreamError, Token, TokenCursor};
use std::io::BufRead;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocatorState {
    Scanning,
    InTargetArray,
    Done,
}

/// Totals over every target array found in one document
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LocatorOutcome {
    pub arrays_found: u64,
    pub records_processed: u64,
    pub records_accepted: u64,
}

/// Scans the token stream for a field name and hands each matching array to a
/// [`RecordExtractor`].
///
/// Everything else in the document is pulled through without interpretation. The
/// field may occur any number of times, at any depth. A top-level occurrence must
/// hold an array; a nested one that does not is ignored.
pub struct FieldLocator<'a> {
    target_key: &'a str,
    extractor: RecordExtractor<'a>,
    state: LocatorState,
}

impl<'a> FieldLocator<'a> {
    pub fn new(target_key: &'a str, filter: &'a dyn RecordFilter) -> Self {
        Self {
            target_key,
            extractor: RecordExtractor::new(target_key, filter),
            state: LocatorState::Scanning,
        }
    }

    pub fn state(&self) -> LocatorState {
        self.state
    }

    /// Drive the cursor to the end of the document
    pub fn run<R: BufRead>(
        &mut self,
        cursor: &mut TokenCursor<R>,
        results: &mut ResultSet,
        progress: &mut ProgressTracker,
    ) -> Result<LocatorOutcome> {
        let mut outcome = LocatorOutcome::default();

        loop {
            match self.state {
                LocatorState::Scanning => match cursor.next_token()? {
                    None => self.state = LocatorState::Done,
                    Some(token) if token.is_field_name(self.target_key) => {
                        if self.enter_array(cursor)? {
                            outcome.arrays_found += 1;
                            log::debug!(
                                "Found `{}` array #{} at byte {}",
                                self.target_key,
                                outcome.arrays_found,
                                cursor.offset()
                            );
                        }
                    }
                    Some(_) => {}
                },
                LocatorState::InTargetArray => {
                    let array = self.extractor.drain(cursor, results, progress)?;
                    outcome.records_processed += array.processed;
                    outcome.records_accepted += array.accepted;
                    log::debug!(
                        "Finished `{}` array: {} records, {} accepted",
                        self.target_key,
                        array.processed,
                        array.accepted
                    );
                    self.state = LocatorState::Scanning;
                }
                LocatorState::Done => return Ok(outcome),
            }
        }
    }

    /// Step into the value of a matched field. Returns `false` for a nested field
    /// whose value is not an array; its first token has been consumed and scanning
    /// carries on inside it.
    fn enter_array<R: BufRead>(&mut self, cursor: &mut TokenCursor<R>) -> Result<bool> {
        let top_level = cursor.depth() == 1;
        match cursor.next_token()? {
            Some(Token::StartArray) => {
                self.state = LocatorState::InTargetArray;
                Ok(true)
            }
            Some(other) if !top_level => {
                log::debug!(
                    "Ignoring nested `{}` holding {} at byte {}",
                    self.target_key,
                    other,
                    cursor.offset()
                );
                Ok(false)
            }
            other => {
                let found = other.map_or_else(|| "end of input".to_string(), |t| t.to_string());
                Err(JsonStreamError::syntax(
                    cursor.offset(),
                    format!("expected an array after `{}`, found {found}", self.target_key),
                )
                .into())
            }
        }
    }
}
