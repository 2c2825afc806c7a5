//! Human-readable rendering of grammars and errors.

use std::fmt::Write as _;
use std::io::{self, Write};

use crate::ast::{Grammar, Node, StorageMode};
use crate::error::{GrammarError, Position};

/// ANSI escape used to highlight the offending span.
pub const HIGHLIGHT: &str = "\x1b[31m";
/// ANSI escape that ends a highlight.
pub const RESET: &str = "\x1b[0m";

/// Print `msg`, then `source` with bytes `start..stop` wrapped in `color`.
///
/// The span is clamped to the source and to character boundaries; an empty
/// span prints the source without highlighting.
pub fn print_parsing_message<W: Write>(
    stream: &mut W,
    msg: &str,
    source: &str,
    color: &str,
    start: usize,
    stop: usize,
) -> io::Result<()> {
    writeln!(stream, "{}", msg)?;
    let start = floor_char_boundary(source, start);
    let stop = floor_char_boundary(source, stop.max(start));
    if start == stop {
        return writeln!(stream, "{}", source);
    }
    writeln!(
        stream,
        "{}{}{}{}{}",
        &source[..start],
        color,
        &source[start..stop],
        RESET,
        &source[stop..]
    )
}

fn floor_char_boundary(s: &str, index: usize) -> usize {
    let mut index = index.min(s.len());
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Render the line holding `begin`, underlined from `begin` to `end`, followed
/// by `message`:
///
/// ```text
/// entry -> value:token ??
///                      ^_
/// Modifier '?' given twice
/// ```
pub fn render_error(source: &str, begin: Position, end: Position, message: &str) -> String {
    let line_text = source.lines().nth(begin.line).unwrap_or("");

    let start_col = begin.column;
    let end_col = if begin.line == end.line && end.column > begin.column {
        end.column
    } else if start_col < line_text.len() {
        // Point error or spans multiple lines: underline to end of line
        line_text.len()
    } else {
        start_col + 1
    };

    let mut out = String::new();
    out.push_str(line_text);
    out.push('\n');
    out.push_str(&" ".repeat(start_col));
    out.push('^');
    if end_col > start_col + 1 {
        out.push_str(&"_".repeat(end_col - start_col - 1));
    }
    out.push('\n');
    out.push_str(message);
    out
}

/// Render `error` against the text it refers to: the failing rule definition
/// for compile errors, the parsed input for parse errors.
pub fn render_grammar_error(error: &GrammarError, source: &str) -> String {
    match error {
        GrammarError::Compile { index, error } => {
            let header = format!("ERROR IN RULE {}:", index + 1);
            let body = render_error(source, error.begin, error.end, &error.to_string());
            format!("{}\n{}", header, body)
        }
        GrammarError::NoMatch { position, .. } | GrammarError::TrailingInput { position, .. } => {
            let at = Position::in_text(source, *position);
            format!(
                "ERROR AT LINE {}:\n{}",
                at.line + 1,
                render_error(source, at, at, &error.to_string())
            )
        }
        _ => error.to_string(),
    }
}

/// Describe a grammar entry by entry, one element per line.
pub fn format_grammar(grammar: &Grammar) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Grammar with {} entries:", grammar.len());
    for entry in grammar.entries() {
        let mode = match entry.storage_mode() {
            StorageMode::Flatten => "string",
            StorageMode::Object => "object",
            StorageMode::Unset => "unset",
        };
        let _ = writeln!(
            out,
            "{} -> ({}) {} elements:",
            entry.name,
            mode,
            entry.elements().len()
        );
        for node in entry.elements() {
            match node {
                Node::Regular(rule) => {
                    let _ = writeln!(out, "  {}", rule);
                }
                Node::Alternation(alternatives) => {
                    let _ = writeln!(out, "  alternatives:");
                    for (i, rule) in alternatives.iter().enumerate() {
                        let sep = if i + 1 < alternatives.len() { " |" } else { "" };
                        let _ = writeln!(out, "    {}{}", rule, sep);
                    }
                }
            }
        }
    }
    out
}
