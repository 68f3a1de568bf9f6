//! Table-driven lexer shared by all languages.
//!
//! The lexer never fails: unterminated strings and comments run to the end
//! of their line (or the input, for multi-line forms) and characters no rule
//! accepts come out as [`TokenKind::Unknown`]. Offsets are UTF-8 byte
//! offsets into the original text.

use crate::language::Syntax;
use crate::token::{Token, TokenKind};

pub(crate) struct Lexer<'a> {
    src: &'a str,
    syntax: &'static Syntax,
    pos: usize,
    line: usize,
    line_start: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str, syntax: &'static Syntax) -> Self {
        Self {
            src,
            syntax,
            pos: 0,
            line: 1,
            line_start: 0,
        }
    }

    pub fn next_token(&mut self) -> Option<Token> {
        self.skip_trivia();
        let first = self.peek()?;
        let start = self.pos;
        let line = self.line;
        let column = self.src[self.line_start..start].chars().count();
        let kind = self.lex(first, start);
        Some(Token {
            kind,
            value: self.src[start..self.pos].to_string(),
            position: start,
            length: self.pos - start,
            line,
            column,
        })
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn starts_with(&self, s: &str) -> bool {
        self.rest().starts_with(s)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.line_start = self.pos;
        }
        Some(c)
    }

    fn bump_str(&mut self, s: &str) {
        for _ in s.chars() {
            self.bump();
        }
    }

    fn bump_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.bump();
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            let before = self.pos;
            self.bump_while(char::is_whitespace);
            self.skip_comment();
            if self.pos == before {
                break;
            }
        }
    }

    fn skip_comment(&mut self) {
        let syntax = self.syntax;
        if let Some(prefix) = syntax
            .line_comments
            .iter()
            .copied()
            .find(|prefix| self.starts_with(prefix))
        {
            self.bump_str(prefix);
            self.bump_while(|c| c != '\n');
            return;
        }
        if let Some((open, close)) = syntax.block_comment {
            if self.starts_with(open) {
                self.bump_str(open);
                while self.peek().is_some() && !self.starts_with(close) {
                    self.bump();
                }
                if self.starts_with(close) {
                    self.bump_str(close);
                }
            }
        }
    }

    fn lex(&mut self, first: char, start: usize) -> TokenKind {
        let syntax = self.syntax;
        if syntax.verbatim_strings {
            if self.starts_with("@\"") || self.starts_with("$@\"") || self.starts_with("@$\"") {
                self.bump_while(|c| c == '@' || c == '$');
                self.lex_verbatim();
                return TokenKind::String;
            }
            if self.starts_with("$\"") {
                self.bump();
                self.lex_quoted('"');
                return TokenKind::String;
            }
        }

        match first {
            '"' | '\'' => self.lex_string_or_char(first),
            '`' if syntax.template_strings => {
                self.bump();
                self.lex_until('`');
                TokenKind::String
            }
            c if c.is_ascii_digit() => {
                self.lex_number();
                TokenKind::Number
            }
            '.' if self.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) => {
                self.lex_number();
                TokenKind::Number
            }
            c if self.is_identifier_start(c) => self.lex_word(start),
            _ => self.lex_symbol(first),
        }
    }

    fn is_identifier_start(&self, c: char) -> bool {
        c.is_alphabetic() || c == '_' || self.syntax.identifier_extra.contains(&c)
    }

    fn lex_word(&mut self, start: usize) -> TokenKind {
        let extra = self.syntax.identifier_extra;
        self.bump_while(|c| c.is_alphanumeric() || c == '_' || extra.contains(&c));
        let word = &self.src[start..self.pos];

        if self.syntax.string_prefixes.contains(&word) {
            if let Some(quote @ ('"' | '\'')) = self.peek() {
                return self.lex_string_or_char(quote);
            }
        }
        if self.syntax.is_keyword(word) {
            TokenKind::Keyword
        } else {
            TokenKind::Identifier
        }
    }

    fn lex_string_or_char(&mut self, quote: char) -> TokenKind {
        if self.syntax.triple_quoted_strings {
            let triple = if quote == '"' { "\"\"\"" } else { "'''" };
            if self.starts_with(triple) {
                self.bump_str(triple);
                self.lex_until_str(triple);
                return TokenKind::String;
            }
        }
        self.lex_quoted(quote);
        if quote == '\'' && self.syntax.char_literals {
            TokenKind::Char
        } else {
            TokenKind::String
        }
    }

    /// Single-line quoted literal. An unescaped newline ends it unterminated.
    fn lex_quoted(&mut self, quote: char) {
        self.bump();
        loop {
            match self.peek() {
                None | Some('\n') => break,
                Some('\\') => {
                    self.bump();
                    self.bump();
                }
                Some(c) if c == quote => {
                    self.bump();
                    break;
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
    }

    /// Multi-line literal closed by `close`; backslash escapes apply.
    fn lex_until(&mut self, close: char) {
        loop {
            match self.bump() {
                None => break,
                Some('\\') => {
                    self.bump();
                }
                Some(c) if c == close => break,
                Some(_) => {}
            }
        }
    }

    fn lex_until_str(&mut self, close: &str) {
        loop {
            if self.starts_with(close) {
                self.bump_str(close);
                break;
            }
            match self.bump() {
                None => break,
                Some('\\') => {
                    self.bump();
                }
                Some(_) => {}
            }
        }
    }

    /// C# verbatim string: `""` is an escaped quote, newlines allowed.
    fn lex_verbatim(&mut self) {
        self.bump();
        loop {
            match self.peek() {
                None => break,
                Some('"') => {
                    self.bump();
                    if self.peek() == Some('"') {
                        self.bump();
                    } else {
                        break;
                    }
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
    }

    fn lex_number(&mut self) {
        let hex = self.starts_with("0x") || self.starts_with("0X");
        let mut prev = '\0';
        while let Some(c) = self.peek() {
            let exponent_sign = (c == '+' || c == '-') && (prev == 'e' || prev == 'E') && !hex;
            let fraction = c == '.' && self.peek_nth(1).is_some_and(|n| n.is_ascii_digit());
            if c.is_ascii_alphanumeric() || c == '_' || exponent_sign || fraction {
                self.bump();
                prev = c;
            } else {
                break;
            }
        }
    }

    fn lex_symbol(&mut self, first: char) -> TokenKind {
        let syntax = self.syntax;
        if let Some(op) = syntax
            .operators
            .iter()
            .copied()
            .find(|op| self.starts_with(op))
        {
            self.bump_str(op);
            return TokenKind::Operator;
        }

        self.bump();
        match first {
            '(' | ')' | '{' | '}' | '[' | ']' | ';' | ',' | '.' | ':' | '@' | '#' => {
                TokenKind::Punctuation
            }
            '+' | '-' | '*' | '/' | '%' | '=' | '<' | '>' | '!' | '&' | '|' | '^' | '~' | '?' => {
                TokenKind::Operator
            }
            _ => TokenKind::Unknown,
        }
    }
}

/// Lex `src` into its full token stream (trivia dropped).
pub(crate) fn lex(src: &str, syntax: &'static Syntax) -> Vec<Token> {
    let mut lexer = Lexer::new(src, syntax);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token() {
        tokens.push(token);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Language;

    fn kinds_and_values(src: &str, language: Language) -> Vec<(TokenKind, String)> {
        lex(src, language.syntax())
            .into_iter()
            .map(|t| (t.kind, t.value))
            .collect()
    }

    #[test]
    fn csharp_statement() {
        let tokens = kinds_and_values("var x = a >= 10 ? \"yes\" : 'n';", Language::CSharp);
        let expected = vec![
            (TokenKind::Keyword, "var"),
            (TokenKind::Identifier, "x"),
            (TokenKind::Operator, "="),
            (TokenKind::Identifier, "a"),
            (TokenKind::Operator, ">="),
            (TokenKind::Number, "10"),
            (TokenKind::Operator, "?"),
            (TokenKind::String, "\"yes\""),
            (TokenKind::Punctuation, ":"),
            (TokenKind::Char, "'n'"),
            (TokenKind::Punctuation, ";"),
        ];
        let expected: Vec<(TokenKind, String)> = expected
            .into_iter()
            .map(|(k, v)| (k, v.to_string()))
            .collect();
        assert_eq!(tokens, expected);
    }

    #[test]
    fn comments_are_trivia() {
        let src = "a // line\n/* block\n comment */ b # not a comment in C#";
        let tokens = kinds_and_values(src, Language::CSharp);
        let values: Vec<&str> = tokens.iter().map(|(_, v)| v.as_str()).collect();
        assert_eq!(values, vec!["a", "b", "#", "not", "a", "comment", "in", "C", "#"]);

        let py = kinds_and_values("x = 1  # trailing\ny", Language::Python);
        let values: Vec<&str> = py.iter().map(|(_, v)| v.as_str()).collect();
        assert_eq!(values, vec!["x", "=", "1", "y"]);
    }

    #[test]
    fn verbatim_and_interpolated_strings() {
        let tokens = kinds_and_values("@\"a \"\" b\" $\"{x}\"", Language::CSharp);
        assert_eq!(
            tokens,
            vec![
                (TokenKind::String, "@\"a \"\" b\"".to_string()),
                (TokenKind::String, "$\"{x}\"".to_string()),
            ]
        );
    }

    #[test]
    fn python_prefixed_and_triple_quoted_strings() {
        let src = "s = rb'\\d' + \"\"\"multi\nline\"\"\" + f\"{v}\"";
        let tokens = kinds_and_values(src, Language::Python);
        let strings: Vec<&str> = tokens
            .iter()
            .filter(|(k, _)| *k == TokenKind::String)
            .map(|(_, v)| v.as_str())
            .collect();
        assert_eq!(strings, vec!["rb'\\d'", "\"\"\"multi\nline\"\"\"", "f\"{v}\""]);
    }

    #[test]
    fn numbers_with_exponents_and_hex() {
        let tokens = kinds_and_values("1.5e-3 0xFF .5 10L", Language::Java);
        let values: Vec<&str> = tokens.iter().map(|(_, v)| v.as_str()).collect();
        assert_eq!(values, vec!["1.5e-3", "0xFF", ".5", "10L"]);
        assert!(tokens.iter().all(|(k, _)| *k == TokenKind::Number));
    }

    #[test]
    fn unterminated_string_stops_at_newline() {
        let tokens = kinds_and_values("s = \"open\nnext();", Language::JavaScript);
        let values: Vec<&str> = tokens.iter().map(|(_, v)| v.as_str()).collect();
        assert_eq!(values, vec!["s", "=", "\"open", "next", "(", ")", ";"]);
    }

    #[test]
    fn unterminated_block_comment_swallows_rest() {
        let tokens = kinds_and_values("int a; /* never closed\nint b;", Language::C);
        assert_eq!(tokens.len(), 3);
    }

    #[test]
    fn unknown_characters_are_kept() {
        let tokens = kinds_and_values("a ¤ b", Language::C);
        assert_eq!(tokens[1], (TokenKind::Unknown, "¤".to_string()));
    }

    #[test]
    fn positions_lines_and_columns() {
        let src = "int x;\n  y = 2;";
        let tokens = lex(src, Language::C.syntax());
        let y = &tokens[3];
        assert_eq!(y.value, "y");
        assert_eq!(y.position, 9);
        assert_eq!(y.line, 2);
        assert_eq!(y.column, 2);
        for token in &tokens {
            assert_eq!(&src[token.position..token.end()], token.value);
        }
        for pair in tokens.windows(2) {
            assert!(pair[0].position < pair[1].position);
        }
    }

    #[test]
    fn multibyte_offsets() {
        let src = "s = \"привет\"; t";
        let tokens = lex(src, Language::JavaScript.syntax());
        let t = tokens.last().unwrap();
        assert_eq!(&src[t.position..t.end()], "t");
        assert_eq!(t.column, 14);
    }

    #[test]
    fn template_strings_span_lines() {
        let tokens = kinds_and_values("const s = `a\n${b}`;", Language::JavaScript);
        assert_eq!(tokens[3], (TokenKind::String, "`a\n${b}`".to_string()));
        assert_eq!(tokens[4], (TokenKind::Punctuation, ";".to_string()));
    }
}
