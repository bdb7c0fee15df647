use crate::diagnostics::ErrorKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Location of a token or node in the original source.
///
/// Lines are 1-based, columns are 0-based and counted in chars. The end
/// position is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
}

impl Span {
    pub fn new(start_line: usize, start_col: usize, end_line: usize, end_col: usize) -> Self {
        debug_assert!((start_line, start_col) <= (end_line, end_col), "span must not run backwards");
        Self { start_line, start_col, end_line, end_col }
    }

    /// Zero-width span at a single position.
    pub fn point(line: usize, col: usize) -> Self {
        Self::new(line, col, line, col)
    }

    pub fn start(&self) -> (usize, usize) {
        (self.start_line, self.start_col)
    }

    pub fn end(&self) -> (usize, usize) {
        (self.end_line, self.end_col)
    }

    /// Smallest span covering both `self` and `other`.
    pub fn merge(self, other: Span) -> Span {
        let (start_line, start_col) = self.start().min(other.start());
        let (end_line, end_col) = self.end().max(other.end());
        Span { start_line, start_col, end_line, end_col }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})-({},{})", self.start_line, self.start_col, self.end_line, self.end_col)
    }
}

/// Token types produced by the tokenizer.
///
/// The five literal kinds are declared next to each other so that
/// [`Pattern::LITERAL`] can address them as a range.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumIter,
    strum_macros::EnumCount,
    strum_macros::AsRefStr,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenKind {
    // Trivia
    Comment,
    Whitespace,
    Continuation,

    // Structure
    Indent,
    Dedent,
    Newline,

    // Literals
    Number,
    String,
    True,
    False,
    None,

    // Punctuation
    Assign,    // =
    Semicolon, // ;
    Colon,     // :
    Comma,     // ,
    Lpar,      // (
    Rpar,      // )
    Lsqb,      // [
    Rsqb,      // ]
    Lbrace,    // {
    Rbrace,    // }

    Identifier,

    // Special
    Error,
    Eof,
}

impl TokenKind {
    /// Whitespace, comments and line continuations: matched, never parsed.
    pub fn is_trivia(self) -> bool {
        matches!(self, TokenKind::Comment | TokenKind::Whitespace | TokenKind::Continuation)
    }

    pub fn is_literal(self) -> bool {
        Pattern::LITERAL.matches(self)
    }
}

/// Payload carried by a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenValue {
    /// Matched source text.
    Text(String),
    /// Indentation width for INDENT/DEDENT.
    Level(usize),
    /// Lexical failure recorded where it happened.
    Error { kind: ErrorKind, message: String },
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub value: TokenValue,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, value: TokenValue, span: Span) -> Self {
        Self { kind, value, span }
    }

    pub fn text(kind: TokenKind, text: impl Into<String>, span: Span) -> Self {
        Self::new(kind, TokenValue::Text(text.into()), span)
    }

    pub fn level(kind: TokenKind, width: usize, span: Span) -> Self {
        Self::new(kind, TokenValue::Level(width), span)
    }

    pub fn error(kind: ErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self::new(TokenKind::Error, TokenValue::Error { kind, message: message.into() }, span)
    }

    pub fn eof(span: Span) -> Self {
        Self::new(TokenKind::Eof, TokenValue::Empty, span)
    }

    /// Source text of the token, empty for structural tokens.
    pub fn lexeme(&self) -> &str {
        match &self.value {
            TokenValue::Text(s) => s,
            _ => "",
        }
    }

    /// Indent width carried by INDENT/DEDENT.
    pub fn indent_width(&self) -> Option<usize> {
        match self.value {
            TokenValue::Level(width) => Some(width),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            TokenValue::Text(s) => write!(f, "{}({:?}) at {}", self.kind, s, self.span),
            TokenValue::Level(w) => write!(f, "{}({}) at {}", self.kind, w, self.span),
            TokenValue::Error { kind, message } => {
                write!(f, "{}({}: {}) at {}", self.kind, kind, message, self.span)
            }
            TokenValue::Empty => write!(f, "{} at {}", self.kind, self.span),
        }
    }
}

/// Shape of a token test used by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    Kind(TokenKind),
    AnyOf(&'static [TokenKind]),
    /// Inclusive range in declaration order.
    Range(TokenKind, TokenKind),
}

impl Pattern {
    pub const LITERAL: Pattern = Pattern::Range(TokenKind::Number, TokenKind::None);
    /// Tokens that may legally follow a complete statement.
    pub const STATEMENT_END: Pattern = Pattern::AnyOf(&[
        TokenKind::Newline,
        TokenKind::Semicolon,
        TokenKind::Eof,
        TokenKind::Dedent,
        TokenKind::Colon,
    ]);
    /// Tokens that close a single-line block.
    pub const LINE_END: Pattern =
        Pattern::AnyOf(&[TokenKind::Newline, TokenKind::Eof, TokenKind::Dedent]);

    pub fn matches(self, kind: TokenKind) -> bool {
        match self {
            Pattern::Kind(k) => k == kind,
            Pattern::AnyOf(kinds) => kinds.contains(&kind),
            Pattern::Range(lo, hi) => (lo as u8..=hi as u8).contains(&(kind as u8)),
        }
    }
}

impl From<TokenKind> for Pattern {
    fn from(kind: TokenKind) -> Self {
        Pattern::Kind(kind)
    }
}
