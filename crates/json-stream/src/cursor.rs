use crate::error::{JsonStreamError, Result};
use crate::token::{Scalar, Token};
use serde::de::DeserializeOwned;
use std::io::BufRead;

/// Default nesting limit for [`TokenCursor`]
pub const DEFAULT_MAX_DEPTH: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    Object(Slot),
    Array(Slot),
}

/// What the innermost open container accepts next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    /// Just opened: first member or the closer
    First,
    /// After a comma: a member is mandatory
    Next,
    /// Objects only: name and colon consumed, value expected
    Value,
    /// Member complete: comma or the closer
    CommaOrEnd,
}

/// Pull-based tokenizer over a buffered byte stream.
///
/// The cursor reads the input exactly once, front to back, and never holds more than
/// the reader's buffer plus (while [`decode_value`](Self::decode_value) runs) the bytes
/// of a single value. Structure is validated as tokens are pulled: separators, closers,
/// literals, numbers and string escapes all have to be well formed.
///
/// ```
/// use mrf_json_stream::{Token, TokenCursor};
///
/// let mut cursor = TokenCursor::new(r#"{"a": [1, 2]}"#.as_bytes());
/// assert_eq!(cursor.next_token().unwrap(), Some(Token::StartObject));
/// assert!(cursor.next_token().unwrap().unwrap().is_field_name("a"));
/// ```
pub struct TokenCursor<R> {
    reader: R,
    offset: u64,
    stack: Vec<Frame>,
    root_started: bool,
    max_depth: usize,
    capturing: bool,
    scratch: Vec<u8>,
    peak_capture: usize,
}

impl<R: BufRead> TokenCursor<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            offset: 0,
            stack: Vec::new(),
            root_started: false,
            max_depth: DEFAULT_MAX_DEPTH,
            capturing: false,
            scratch: Vec::new(),
            peak_capture: 0,
        }
    }

    /// Override the nesting limit (containers deeper than this are rejected)
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    /// Bytes consumed from the reader so far
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Number of currently open containers
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Largest single value buffered by [`decode_value`](Self::decode_value) so far.
    ///
    /// This is the only document-dependent buffer the cursor keeps, so it doubles as a
    /// memory probe: it tracks the biggest decoded element, not the document size.
    pub fn peak_capture_bytes(&self) -> usize {
        self.peak_capture
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Pull the next token.
    ///
    /// Returns `Ok(None)` once the top-level value is complete and only whitespace
    /// remains. An input with no value at all also yields `Ok(None)`.
    pub fn next_token(&mut self) -> Result<Option<Token>> {
        self.advance(true)
    }

    /// Whether the innermost open container has another member.
    ///
    /// Consumes a pending `,` when there is one, so the cursor ends up positioned at the
    /// start of the next member. Returns `false` when the next significant byte is the
    /// container's closer (which is left for [`next_token`](Self::next_token)).
    pub fn more(&mut self) -> Result<bool> {
        self.skip_whitespace()?;
        let Some(frame) = self.stack.last().copied() else {
            return Ok(false);
        };
        let (closer, slot) = match frame {
            Frame::Object(slot) => (b'}', slot),
            Frame::Array(slot) => (b']', slot),
        };
        match slot {
            Slot::CommaOrEnd => match self.peek()? {
                Some(b',') => {
                    self.bump()?;
                    self.set_slot(Slot::Next);
                    Ok(true)
                }
                Some(byte) if byte == closer => Ok(false),
                Some(byte) => Err(self.unexpected(byte, &format!("',' or '{}'", closer as char))),
                None => Err(self.eof()),
            },
            Slot::First => match self.peek()? {
                Some(byte) => Ok(byte != closer),
                None => Err(self.eof()),
            },
            Slot::Next | Slot::Value => Ok(true),
        }
    }

    /// Consume exactly one value and deserialize it into `T`.
    ///
    /// Only the bytes of that value are buffered. Unknown fields and missing fields are
    /// handled by `T`'s `Deserialize` impl; a value of the wrong shape (a string where
    /// `T` expects an object, for instance) is a [`JsonStreamError::Decode`].
    pub fn decode_value<T: DeserializeOwned>(&mut self) -> Result<T> {
        self.settle_before_value()?;
        let start = self.offset;
        self.scratch.clear();
        self.capturing = true;
        let skipped = self.skip_value_inner();
        self.capturing = false;
        skipped?;

        self.peak_capture = self.peak_capture.max(self.scratch.len());
        serde_json::from_slice(&self.scratch)
            .map_err(|source| JsonStreamError::Decode { offset: start, source })
    }

    /// Consume exactly one value without buffering it
    pub fn skip_value(&mut self) -> Result<()> {
        self.settle_before_value()?;
        self.skip_value_inner()
    }

    fn settle_before_value(&mut self) -> Result<()> {
        self.skip_whitespace()?;
        if let Some(Frame::Array(Slot::CommaOrEnd)) = self.stack.last() {
            if self.peek()? == Some(b',') {
                self.bump()?;
                self.set_slot(Slot::Next);
                self.skip_whitespace()?;
            }
        }
        Ok(())
    }

    fn skip_value_inner(&mut self) -> Result<()> {
        let base = self.stack.len();
        let first = self.advance(false)?.ok_or_else(|| self.eof())?;
        match first {
            Token::StartObject | Token::StartArray => loop {
                let token = self.advance(false)?.ok_or_else(|| self.eof())?;
                let closes = matches!(token, Token::EndObject | Token::EndArray);
                if closes && self.stack.len() == base {
                    return Ok(());
                }
            },
            Token::Scalar(_) => Ok(()),
            other => Err(self.syntax(format!("expected a value, found {}", other.kind()))),
        }
    }

    fn advance(&mut self, keep_text: bool) -> Result<Option<Token>> {
        loop {
            self.skip_whitespace()?;
            let Some(frame) = self.stack.last().copied() else {
                return self.advance_root(keep_text);
            };

            match frame {
                Frame::Object(slot @ (Slot::First | Slot::Next)) => {
                    return match self.peek()? {
                        Some(b'}') if slot == Slot::First => {
                            self.bump()?;
                            Ok(Some(self.close()))
                        }
                        Some(b'"') => {
                            let name = self.read_key(keep_text)?;
                            Ok(Some(Token::FieldName(name)))
                        }
                        Some(b'}') => Err(self.syntax("trailing comma before '}'")),
                        Some(byte) => Err(self.unexpected(byte, "a field name")),
                        None => Err(self.eof()),
                    };
                }
                Frame::Object(Slot::Value) => return self.begin_value(keep_text).map(Some),
                Frame::Object(Slot::CommaOrEnd) => match self.peek()? {
                    Some(b',') => {
                        self.bump()?;
                        self.set_slot(Slot::Next);
                    }
                    Some(b'}') => {
                        self.bump()?;
                        return Ok(Some(self.close()));
                    }
                    Some(byte) => return Err(self.unexpected(byte, "',' or '}'")),
                    None => return Err(self.eof()),
                },
                Frame::Array(Slot::CommaOrEnd) => match self.peek()? {
                    Some(b',') => {
                        self.bump()?;
                        self.set_slot(Slot::Next);
                    }
                    Some(b']') => {
                        self.bump()?;
                        return Ok(Some(self.close()));
                    }
                    Some(byte) => return Err(self.unexpected(byte, "',' or ']'")),
                    None => return Err(self.eof()),
                },
                Frame::Array(slot) => {
                    if slot == Slot::First && self.peek()? == Some(b']') {
                        self.bump()?;
                        return Ok(Some(self.close()));
                    }
                    return self.begin_value(keep_text).map(Some);
                }
            }
        }
    }

    fn advance_root(&mut self, keep_text: bool) -> Result<Option<Token>> {
        match self.peek()? {
            None => Ok(None),
            Some(byte) if self.root_started => Err(self.unexpected(byte, "end of input")),
            Some(_) => {
                self.root_started = true;
                self.begin_value(keep_text).map(Some)
            }
        }
    }

    fn begin_value(&mut self, keep_text: bool) -> Result<Token> {
        let Some(byte) = self.peek()? else {
            return Err(self.eof());
        };
        let token = match byte {
            b'{' | b'[' => {
                if self.stack.len() >= self.max_depth {
                    return Err(self.syntax(format!(
                        "nesting deeper than {} levels",
                        self.max_depth
                    )));
                }
                self.set_slot(Slot::CommaOrEnd);
                self.bump()?;
                if byte == b'{' {
                    self.stack.push(Frame::Object(Slot::First));
                    Token::StartObject
                } else {
                    self.stack.push(Frame::Array(Slot::First));
                    Token::StartArray
                }
            }
            b'"' => {
                self.set_slot(Slot::CommaOrEnd);
                Token::Scalar(Scalar::String(self.read_string(keep_text)?))
            }
            b't' => {
                self.set_slot(Slot::CommaOrEnd);
                self.expect_literal(b"true")?;
                Token::Scalar(Scalar::Bool(true))
            }
            b'f' => {
                self.set_slot(Slot::CommaOrEnd);
                self.expect_literal(b"false")?;
                Token::Scalar(Scalar::Bool(false))
            }
            b'n' => {
                self.set_slot(Slot::CommaOrEnd);
                self.expect_literal(b"null")?;
                Token::Scalar(Scalar::Null)
            }
            b'-' | b'0'..=b'9' => {
                self.set_slot(Slot::CommaOrEnd);
                Token::Scalar(Scalar::Number(self.read_number(keep_text)?))
            }
            b']' | b'}' => return Err(self.syntax(format!("expected a value, found '{}'", byte as char))),
            other => return Err(self.unexpected(other, "a value")),
        };
        Ok(token)
    }

    fn close(&mut self) -> Token {
        match self.stack.pop() {
            Some(Frame::Object(_)) => Token::EndObject,
            _ => Token::EndArray,
        }
    }

    fn set_slot(&mut self, next: Slot) {
        if let Some(frame) = self.stack.last_mut() {
            match frame {
                Frame::Object(slot) | Frame::Array(slot) => *slot = next,
            }
        }
    }

    fn read_key(&mut self, keep_text: bool) -> Result<String> {
        let name = self.read_string(keep_text)?;
        self.skip_whitespace()?;
        match self.peek()? {
            Some(b':') => {
                self.bump()?;
                self.set_slot(Slot::Value);
                Ok(name)
            }
            Some(byte) => Err(self.unexpected(byte, "':'")),
            None => Err(self.eof()),
        }
    }

    fn read_string(&mut self, keep_text: bool) -> Result<String> {
        // opening quote
        self.bump()?;
        let mut text = Vec::new();
        let mut skipped = Utf8Tail::default();
        loop {
            let offset = self.offset;
            let available = self
                .reader
                .fill_buf()
                .map_err(|source| JsonStreamError::Io { offset, source })?;
            if available.is_empty() {
                return Err(self.syntax("unterminated string"));
            }
            let len = available.len();
            let run = available
                .iter()
                .position(|&b| b == b'"' || b == b'\\' || b < 0x20)
                .unwrap_or(len);
            let valid = if keep_text {
                text.extend_from_slice(&available[..run]);
                true
            } else {
                skipped.feed(&available[..run])
            };
            if self.capturing {
                self.scratch.extend_from_slice(&available[..run]);
            }
            self.reader.consume(run);
            self.offset += run as u64;
            if !valid {
                return Err(self.syntax("string is not valid UTF-8"));
            }
            if run == len {
                continue;
            }
            // A sequence cut short by a quote or an escape
            if !skipped.is_complete() {
                return Err(self.syntax("string is not valid UTF-8"));
            }

            match self.peek()? {
                Some(b'"') => {
                    self.bump()?;
                    break;
                }
                Some(b'\\') => {
                    self.bump()?;
                    self.read_escape(&mut text, keep_text)?;
                }
                Some(_) => return Err(self.syntax("control character in string")),
                None => return Err(self.syntax("unterminated string")),
            }
        }

        if !keep_text {
            return Ok(String::new());
        }
        String::from_utf8(text).map_err(|_| self.syntax("string is not valid UTF-8"))
    }

    fn read_escape(&mut self, text: &mut Vec<u8>, keep_text: bool) -> Result<()> {
        let Some(byte) = self.bump()? else {
            return Err(self.syntax("unterminated string"));
        };
        let ch = match byte {
            b'"' => '"',
            b'\\' => '\\',
            b'/' => '/',
            b'b' => '\u{8}',
            b'f' => '\u{c}',
            b'n' => '\n',
            b'r' => '\r',
            b't' => '\t',
            b'u' => self.read_unicode_escape()?,
            other => {
                return Err(self.syntax(format!("invalid escape '\\{}'", other as char)));
            }
        };
        if keep_text {
            let mut utf8 = [0u8; 4];
            text.extend_from_slice(ch.encode_utf8(&mut utf8).as_bytes());
        }
        Ok(())
    }

    fn read_unicode_escape(&mut self) -> Result<char> {
        let high = self.read_hex4()?;
        let code = match high {
            0xD800..=0xDBFF => {
                if self.bump()? != Some(b'\\') || self.bump()? != Some(b'u') {
                    return Err(self.syntax("unpaired surrogate in \\u escape"));
                }
                let low = self.read_hex4()?;
                if !(0xDC00..=0xDFFF).contains(&low) {
                    return Err(self.syntax("invalid low surrogate in \\u escape"));
                }
                0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
            }
            0xDC00..=0xDFFF => return Err(self.syntax("unpaired surrogate in \\u escape")),
            code => code,
        };
        char::from_u32(code).ok_or_else(|| self.syntax("invalid \\u escape"))
    }

    fn read_hex4(&mut self) -> Result<u32> {
        let mut value = 0u32;
        for _ in 0..4 {
            let digit = match self.bump()? {
                Some(byte) => (byte as char).to_digit(16),
                None => return Err(self.syntax("unterminated string")),
            };
            let Some(digit) = digit else {
                return Err(self.syntax("invalid hex digit in \\u escape"));
            };
            value = value * 16 + digit;
        }
        Ok(value)
    }

    fn read_number(&mut self, keep_text: bool) -> Result<String> {
        let mut text = String::new();
        if self.peek()? == Some(b'-') {
            self.take_into(&mut text, keep_text)?;
        }
        match self.peek()? {
            Some(b'0') => self.take_into(&mut text, keep_text)?,
            Some(b'1'..=b'9') => {
                self.take_digits(&mut text, keep_text)?;
            }
            _ => return Err(self.syntax("invalid number")),
        }
        if self.peek()? == Some(b'.') {
            self.take_into(&mut text, keep_text)?;
            if self.take_digits(&mut text, keep_text)? == 0 {
                return Err(self.syntax("expected digits after decimal point"));
            }
        }
        if matches!(self.peek()?, Some(b'e' | b'E')) {
            self.take_into(&mut text, keep_text)?;
            if matches!(self.peek()?, Some(b'+' | b'-')) {
                self.take_into(&mut text, keep_text)?;
            }
            if self.take_digits(&mut text, keep_text)? == 0 {
                return Err(self.syntax("expected digits in exponent"));
            }
        }
        Ok(text)
    }

    fn take_digits(&mut self, text: &mut String, keep_text: bool) -> Result<usize> {
        let mut count = 0;
        while matches!(self.peek()?, Some(b'0'..=b'9')) {
            self.take_into(text, keep_text)?;
            count += 1;
        }
        Ok(count)
    }

    fn take_into(&mut self, text: &mut String, keep_text: bool) -> Result<()> {
        if let Some(byte) = self.bump()? {
            if keep_text {
                text.push(byte as char);
            }
        }
        Ok(())
    }

    fn expect_literal(&mut self, literal: &[u8]) -> Result<()> {
        let start = self.offset;
        for &expected in literal {
            if self.bump()? != Some(expected) {
                return Err(JsonStreamError::syntax(
                    start,
                    format!("invalid literal, expected `{}`", String::from_utf8_lossy(literal)),
                ));
            }
        }
        Ok(())
    }

    fn skip_whitespace(&mut self) -> Result<()> {
        loop {
            let offset = self.offset;
            let available = self
                .reader
                .fill_buf()
                .map_err(|source| JsonStreamError::Io { offset, source })?;
            let len = available.len();
            if len == 0 {
                return Ok(());
            }
            let run = available
                .iter()
                .position(|b| !matches!(b, b' ' | b'\t' | b'\n' | b'\r'))
                .unwrap_or(len);
            if self.capturing {
                self.scratch.extend_from_slice(&available[..run]);
            }
            self.reader.consume(run);
            self.offset += run as u64;
            if run < len {
                return Ok(());
            }
        }
    }

    fn peek(&mut self) -> Result<Option<u8>> {
        let offset = self.offset;
        let available = self
            .reader
            .fill_buf()
            .map_err(|source| JsonStreamError::Io { offset, source })?;
        Ok(available.first().copied())
    }

    fn bump(&mut self) -> Result<Option<u8>> {
        let byte = self.peek()?;
        if let Some(byte) = byte {
            self.reader.consume(1);
            self.offset += 1;
            if self.capturing {
                self.scratch.push(byte);
            }
        }
        Ok(byte)
    }

    fn syntax(&self, msg: impl Into<String>) -> JsonStreamError {
        JsonStreamError::syntax(self.offset, msg)
    }

    fn unexpected(&self, byte: u8, expected: &str) -> JsonStreamError {
        let found = if byte.is_ascii_graphic() {
            format!("'{}'", byte as char)
        } else {
            format!("byte 0x{byte:02x}")
        };
        self.syntax(format!("expected {expected}, found {found}"))
    }

    fn eof(&self) -> JsonStreamError {
        self.syntax("unexpected end of input")
    }
}

/// Incremental UTF-8 check for strings whose text is not kept.
///
/// Holds at most the leading bytes of one multi-byte sequence split across reader
/// buffers.
#[derive(Default)]
struct Utf8Tail {
    bytes: [u8; 4],
    len: usize,
}

impl Utf8Tail {
    /// Feed the next run of raw string bytes; `false` once the input is invalid
    fn feed(&mut self, mut run: &[u8]) -> bool {
        while self.len > 0 {
            let Some((&byte, rest)) = run.split_first() else {
                return true;
            };
            self.bytes[self.len] = byte;
            self.len += 1;
            run = rest;
            match std::str::from_utf8(&self.bytes[..self.len]) {
                Ok(_) => self.len = 0,
                Err(err) if err.error_len().is_some() => return false,
                Err(_) => {}
            }
        }
        match std::str::from_utf8(run) {
            Ok(_) => true,
            Err(err) if err.error_len().is_some() => false,
            Err(err) => {
                let tail = &run[err.valid_up_to()..];
                self.bytes[..tail.len()].copy_from_slice(tail);
                self.len = tail.len();
                true
            }
        }
    }

    fn is_complete(&self) -> bool {
        self.len == 0
    }
}
