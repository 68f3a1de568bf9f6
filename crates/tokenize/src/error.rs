use thiserror::Error;

/// Errors raised by the tokenizer layer.
///
/// Lexing itself never fails; the only rejection happens when a caller asks
/// for a language that has no lexer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenizeError {
    #[error("unsupported language: {0:?}")]
    UnsupportedLanguage(String),
}
