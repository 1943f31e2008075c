//! # MRF JSON Stream
//!
//! Incremental JSON tokenizer for documents that do not fit in memory.
//!
//! ## Model
//!
//! ```text
//! BufRead (decompressed bytes)
//!     │
//!     └──> TokenCursor
//!            ├─> next_token()     object/array delimiters, field names, scalars
//!            ├─> more()           "does the current container have another member?"
//!            ├─> decode_value()   one value -> T: Deserialize (buffers only that value)
//!            └─> skip_value()     one value, discarded without buffering
//! ```
//!
//! The cursor never builds a document tree. Memory is the reader's buffer, the
//! container stack, and at most one captured value at a time.
//!
//! ## Example
//!
//! ```rust
//! use mrf_json_stream::{Token, TokenCursor};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Item {
//!     id: u32,
//! }
//!
//! let mut cursor = TokenCursor::new(r#"{"items": [{"id": 1}, {"id": 2}]}"#.as_bytes());
//! while let Some(token) = cursor.next_token().unwrap() {
//!     if token.is_field_name("items") {
//!         assert_eq!(cursor.next_token().unwrap(), Some(Token::StartArray));
//!         while cursor.more().unwrap() {
//!             let item: Item = cursor.decode_value().unwrap();
//!             println!("item {}", item.id);
//!         }
//!     }
//! }
//! ```

mod cursor;
mod error;
mod token;

pub use cursor::{TokenCursor, DEFAULT_MAX_DEPTH};
pub use error::{JsonStreamError, Result};
pub use token::{Scalar, Token};
