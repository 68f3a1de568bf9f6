use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::language::{BlockStyle, Language, Syntax};
use crate::token::{Token, TokenKind};

const ANONYMOUS: &str = "<anonymous>";
const MODULE: &str = "<module>";

/// Dotted location of a code unit, e.g. `Program.Main`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct UnitPath(pub Vec<String>);

impl fmt::Display for UnitPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

/// An independently analyzable fragment of a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeUnit {
    pub path: UnitPath,
    /// Index of the first token within the submission's analyzed sequence
    /// (the concatenation of all unit token lists).
    pub first_token_index: usize,
    pub tokens: Vec<Token>,
}

impl CodeUnit {
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

struct RawUnit {
    path: Vec<String>,
    range: Range<usize>,
}

pub(crate) fn split_units(tokens: Vec<Token>, language: Language) -> Vec<CodeUnit> {
    let mut raw = Vec::new();
    if !tokens.is_empty() {
        match language.block_style() {
            BlockStyle::Braces => {
                split_braces(&tokens, 0..tokens.len(), &[], language.syntax(), &mut raw)
            }
            BlockStyle::Indentation => split_indented(&tokens, 0..tokens.len(), &[], &mut raw),
        }
    }

    let mut next = 0;
    raw.into_iter()
        .filter(|unit| !unit.range.is_empty())
        .map(|unit| {
            let tokens = tokens[unit.range].to_vec();
            let code_unit = CodeUnit {
                path: UnitPath(unit.path),
                first_token_index: next,
                tokens,
            };
            next += code_unit.len();
            code_unit
        })
        .collect()
}

fn split_braces(
    tokens: &[Token],
    range: Range<usize>,
    path: &[String],
    syntax: &Syntax,
    out: &mut Vec<RawUnit>,
) {
    let hi = range.end;
    let mut start = range.start;
    let mut depth = 0usize;
    let mut parens = 0usize;
    let mut open_brace = None;
    let mut i = range.start;

    while i < hi {
        let token = &tokens[i];
        if token.kind == TokenKind::Punctuation {
            match token.value.as_str() {
                "(" | "[" => parens += 1,
                ")" | "]" => parens = parens.saturating_sub(1),
                "{" => {
                    if depth == 0 && open_brace.is_none() {
                        open_brace = Some(i);
                    }
                    depth += 1;
                }
                "}" if depth == 0 => {
                    // Stray closer: end the segment here.
                    emit_segment(tokens, start..i + 1, None, path, syntax, out);
                    start = i + 1;
                    open_brace = None;
                    parens = 0;
                }
                "}" => {
                    depth -= 1;
                    if depth == 0 && parens == 0 {
                        let mut end = i + 1;
                        if end < hi && tokens[end].is_punct(";") {
                            end += 1;
                        }
                        let block = open_brace.map(|open| (open, i));
                        emit_segment(tokens, start..end, block, path, syntax, out);
                        start = end;
                        open_brace = None;
                        i = end;
                        continue;
                    }
                }
                ";" if depth == 0 && parens == 0 => {
                    emit_segment(tokens, start..i + 1, None, path, syntax, out);
                    start = i + 1;
                    open_brace = None;
                }
                _ => {}
            }
        }
        i += 1;
    }

    if start < hi {
        emit_segment(tokens, start..hi, None, path, syntax, out);
    }
}

/// `block` is the (open, close) index pair of a closed top-level brace block.
fn emit_segment(
    tokens: &[Token],
    segment: Range<usize>,
    block: Option<(usize, usize)>,
    path: &[String],
    syntax: &Syntax,
    out: &mut Vec<RawUnit>,
) {
    if segment.is_empty() {
        return;
    }

    let header_end = block.map_or(segment.end, |(open, _)| open);
    let header = &tokens[segment.start..header_end];

    if let Some((open, close)) = block {
        let before_params = header
            .iter()
            .position(|t| t.is_punct("("))
            .unwrap_or(header.len());
        let container = header[..before_params]
            .iter()
            .position(|t| t.kind == TokenKind::Keyword && syntax.is_container(&t.value));
        if let Some(keyword) = container {
            let name = header[keyword + 1..]
                .iter()
                .find(|t| t.kind == TokenKind::Identifier)
                .map_or(ANONYMOUS, |t| t.value.as_str());
            let child = child_path(path, name);
            split_braces(tokens, open + 1..close, &child, syntax, out);
            return;
        }
    }

    out.push(RawUnit {
        path: child_path(path, member_name(header)),
        range: segment,
    });
}

/// Identifier right before the parameter list (generic arguments skipped),
/// else the last identifier ahead of an initializer.
fn member_name(header: &[Token]) -> &str {
    let stop = header
        .iter()
        .position(|t| t.is_punct("(") || is_operator(t, "="))
        .unwrap_or(header.len());
    let mut prefix = &header[..stop];
    if prefix.last().is_some_and(|t| is_operator(t, ">") || is_operator(t, ">>")) {
        let mut depth = 0usize;
        while let Some((last, rest)) = prefix.split_last() {
            prefix = rest;
            if last.kind == TokenKind::Operator {
                match last.value.as_str() {
                    ">" => depth += 1,
                    ">>" => depth += 2,
                    "<" => depth = depth.saturating_sub(1),
                    _ => {}
                }
            }
            if depth == 0 {
                break;
            }
        }
    }
    prefix
        .iter()
        .rev()
        .find(|t| t.kind == TokenKind::Identifier)
        .map_or(ANONYMOUS, |t| t.value.as_str())
}

fn is_operator(token: &Token, value: &str) -> bool {
    token.kind == TokenKind::Operator && token.value == value
}

fn child_path(path: &[String], name: &str) -> Vec<String> {
    let mut child = path.to_vec();
    child.push(name.to_string());
    child
}

fn end_line(token: &Token) -> usize {
    token.line + token.value.matches('\n').count()
}

fn starts_line(tokens: &[Token], i: usize) -> bool {
    i == 0 || tokens[i].line > end_line(&tokens[i - 1])
}

/// Logical statements of an indented block: each begins on a fresh line at
/// or left of the block's first column, outside any bracket.
fn indented_statements(tokens: &[Token], range: Range<usize>) -> Vec<Range<usize>> {
    let base = tokens[range.start].column;
    let mut starts = vec![range.start];
    let mut depth = 0usize;

    for i in range.clone() {
        if i > range.start && depth == 0 && starts_line(tokens, i) && tokens[i].column <= base {
            starts.push(i);
        }
        let token = &tokens[i];
        if token.kind == TokenKind::Punctuation {
            match token.value.as_str() {
                "(" | "[" | "{" => depth += 1,
                ")" | "]" | "}" => depth = depth.saturating_sub(1),
                _ => {}
            }
        }
    }

    let mut statements: Vec<Range<usize>> = starts
        .windows(2)
        .map(|pair| pair[0]..pair[1])
        .collect();
    if let Some(&last) = starts.last() {
        statements.push(last..range.end);
    }
    statements
}

fn split_indented(tokens: &[Token], range: Range<usize>, path: &[String], out: &mut Vec<RawUnit>) {
    if range.is_empty() {
        return;
    }

    let end = range.end;
    let run_path = if path.is_empty() {
        vec![MODULE.to_string()]
    } else {
        path.to_vec()
    };
    let mut decorators: Option<usize> = None;
    let mut run: Option<Range<usize>> = None;

    let flush = |run: &mut Option<Range<usize>>, out: &mut Vec<RawUnit>| {
        if let Some(range) = run.take() {
            out.push(RawUnit {
                path: run_path.clone(),
                range,
            });
        }
    };

    for statement in indented_statements(tokens, range) {
        let head = &tokens[statement.start];
        if head.is_punct("@") {
            flush(&mut run, out);
            decorators.get_or_insert(statement.start);
            continue;
        }

        let keyword = if head.is_keyword("async") {
            statement.start + 1
        } else {
            statement.start
        };
        let is_def = keyword < statement.end && tokens[keyword].is_keyword("def");
        let is_class = keyword < statement.end && tokens[keyword].is_keyword("class");

        if !is_def && !is_class {
            let start = decorators.take().unwrap_or(statement.start);
            run = Some(run.map_or(start..statement.end, |r| r.start..statement.end));
            continue;
        }

        flush(&mut run, out);
        let start = decorators.take().unwrap_or(statement.start);
        let name = tokens
            .get(keyword + 1)
            .filter(|t| t.kind == TokenKind::Identifier)
            .map_or(ANONYMOUS, |t| t.value.as_str());
        let child = child_path(path, name);

        if is_def {
            out.push(RawUnit {
                path: child,
                range: start..statement.end,
            });
            continue;
        }

        let body = header_colon(tokens, keyword..statement.end)
            .map(|colon| colon + 1)
            .filter(|&body| body < statement.end && starts_line(tokens, body));
        match body {
            Some(body) => {
                out.push(RawUnit {
                    path: child.clone(),
                    range: start..body,
                });
                split_indented(tokens, body..statement.end, &child, out);
            }
            None => out.push(RawUnit {
                path: child,
                range: start..statement.end,
            }),
        }
    }

    flush(&mut run, out);
    if let Some(start) = decorators {
        // Decorators with nothing left to decorate.
        out.push(RawUnit {
            path: run_path.clone(),
            range: start..end,
        });
    }
}

/// The `:` closing a block header, outside brackets.
fn header_colon(tokens: &[Token], range: Range<usize>) -> Option<usize> {
    let mut depth = 0usize;
    for i in range {
        let token = &tokens[i];
        if token.kind != TokenKind::Punctuation {
            continue;
        }
        match token.value.as_str() {
            "(" | "[" | "{" => depth += 1,
            ")" | "]" | "}" => depth = depth.saturating_sub(1),
            ":" if depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}
