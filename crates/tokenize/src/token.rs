use serde::{Deserialize, Serialize};

/// Lexical class of a token.
///
/// The set is closed on purpose: every consumer (fingerprinting, unit
/// splitting, highlighting) matches on it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Keyword,
    Identifier,
    Number,
    String,
    Char,
    Operator,
    Punctuation,
    /// A character no lexer rule accepted. Kept so malformed input still
    /// produces a position-stable stream.
    Unknown,
}

impl TokenKind {
    /// Stable one-byte tag used when hashing tokens.
    pub const fn tag(self) -> u8 {
        match self {
            TokenKind::Keyword => 1,
            TokenKind::Identifier => 2,
            TokenKind::Number => 3,
            TokenKind::String => 4,
            TokenKind::Char => 5,
            TokenKind::Operator => 6,
            TokenKind::Punctuation => 7,
            TokenKind::Unknown => 8,
        }
    }

    /// Whether the value of this token is incidental to program structure
    /// (names and literal contents).
    pub const fn is_renamable(self) -> bool {
        match self {
            TokenKind::Identifier | TokenKind::Number | TokenKind::String | TokenKind::Char => true,
            TokenKind::Keyword
            | TokenKind::Operator
            | TokenKind::Punctuation
            | TokenKind::Unknown => false,
        }
    }
}

/// A token with its UTF-8 byte offsets in the submission text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text of the token, verbatim.
    pub value: String,
    /// Byte offset (inclusive) in the source text.
    pub position: usize,
    /// Length in bytes.
    pub length: usize,
    /// 1-based line of the first byte.
    pub line: usize,
    /// 0-based column (in chars) of the first byte.
    pub column: usize,
}

impl Token {
    /// Byte offset (exclusive) of the token end.
    pub fn end(&self) -> usize {
        self.position + self.length
    }

    pub(crate) fn is_punct(&self, value: &str) -> bool {
        self.kind == TokenKind::Punctuation && self.value == value
    }

    pub(crate) fn is_keyword(&self, value: &str) -> bool {
        self.kind == TokenKind::Keyword && self.value == value
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        self.value.as_str()
    }
}

/// Where an analyzed token sits in the source text, for highlighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPosition {
    /// Index in the submission's analyzed token sequence.
    pub token_index: usize,
    /// Byte offset of the token start.
    pub start: usize,
    /// Length in bytes.
    pub length: usize,
}
