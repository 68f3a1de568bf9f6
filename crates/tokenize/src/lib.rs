//! Source tokenizer for the anti-plagiarism pipeline.
//!
//! Turns a submission's raw text into ordered [`CodeUnit`]s: named fragments
//! (`Program.Main`, `Stack.push`, `<module>`) each carrying its own token
//! list. Downstream stages fingerprint units independently, so a reordering
//! of methods does not hide copied code.
//!
//! ## Guarantees
//!
//! - Never fails on malformed input. Unterminated literals and comments,
//!   unbalanced brackets and unknown characters all still yield tokens.
//! - Deterministic: the same `(text, language)` produces the same tokens,
//!   byte offsets and unit split on any machine.
//! - Whitespace and comments are trivia and never become tokens.
//!
//! The only error is asking for a language without a lexer, which happens
//! while parsing a [`Language`] name, before any text is looked at.

mod error;
mod language;
mod lexer;
mod token;
mod units;

pub use crate::error::TokenizeError;
pub use crate::language::{BlockStyle, Language};
pub use crate::token::{Token, TokenKind, TokenPosition};
pub use crate::units::{CodeUnit, UnitPath};

/// Raw token stream of `text`, trivia dropped, before unit splitting.
pub fn tokenize(text: &str, language: Language) -> Vec<Token> {
    lexer::lex(text, language.syntax())
}

/// Split `text` into code units.
///
/// Container headers (`class Foo {`, `namespace Bar {`) and their closing
/// braces belong to no unit, so the analyzed token sequence is the
/// concatenation of unit token lists, not the full token stream.
pub fn extract_code_units(text: &str, language: Language) -> Vec<CodeUnit> {
    units::split_units(tokenize(text, language), language)
}

/// Number of analyzed tokens, the value stored on a submission.
pub fn tokens_count(text: &str, language: Language) -> usize {
    extract_code_units(text, language)
        .iter()
        .map(CodeUnit::len)
        .sum()
}

/// Source positions of every analyzed token, indexed like
/// [`CodeUnit::first_token_index`].
pub fn token_positions(text: &str, language: Language) -> Vec<TokenPosition> {
    positions_of(&extract_code_units(text, language))
}

/// Same as [`token_positions`] for units that were already extracted.
pub fn positions_of(units: &[CodeUnit]) -> Vec<TokenPosition> {
    units
        .iter()
        .flat_map(|unit| {
            unit.tokens
                .iter()
                .enumerate()
                .map(move |(offset, token)| TokenPosition {
                    token_index: unit.first_token_index + offset,
                    start: token.position,
                    length: token.length,
                })
        })
        .collect()
}
