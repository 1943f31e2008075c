use std::fmt;

/// A lexical JSON token.
///
/// Separators (`,` and `:`) are validated by the cursor and never surface as tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    StartObject,
    EndObject,
    StartArray,
    EndArray,
    /// Object member name (already unescaped)
    FieldName(String),
    Scalar(Scalar),
}

/// Leaf value. Numbers keep their source text so no precision is lost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scalar {
    String(String),
    Number(String),
    Bool(bool),
    Null,
}

impl Token {
    /// Short human-readable name used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Token::StartObject => "object start",
            Token::EndObject => "object end",
            Token::StartArray => "array start",
            Token::EndArray => "array end",
            Token::FieldName(_) => "field name",
            Token::Scalar(Scalar::String(_)) => "string",
            Token::Scalar(Scalar::Number(_)) => "number",
            Token::Scalar(Scalar::Bool(_)) => "boolean",
            Token::Scalar(Scalar::Null) => "null",
        }
    }

    pub fn is_field_name(&self, name: &str) -> bool {
        matches!(self, Token::FieldName(field) if field == name)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::FieldName(name) => write!(f, "field name \"{name}\""),
            Token::Scalar(Scalar::String(value)) => write!(f, "string \"{value}\""),
            Token::Scalar(Scalar::Number(value)) => write!(f, "number {value}"),
            Token::Scalar(Scalar::Bool(value)) => write!(f, "boolean {value}"),
            other => f.write_str(other.kind()),
        }
    }
}
