use crate::ast::*;
use crate::error::{Position, SyntaxError};

/// Cursor over a single rule definition such as `token -> char[] | digit[]`.
///
/// Every primitive either succeeds and leaves the cursor after what it
/// consumed, or fails and leaves the cursor where it was.
#[derive(Debug, Clone)]
pub struct RuleCursor<'a> {
    input: &'a str,
    pos: usize,
}

/// Compile one rule definition into an entry.
///
/// The whole definition must be consumed: trailing text that does not form
/// another element (an unterminated literal, a stray modifier, ...) is an error.
pub fn compile_grammar_entry(definition: &str) -> Result<Entry, SyntaxError> {
    let mut cursor = RuleCursor::new(definition);

    cursor.parse_whitespace();
    let name_start = cursor.pos;
    let name = cursor
        .parse_identifier()
        .ok_or_else(|| cursor.error_point("Expected a rule name"))?;
    let attach = |err: SyntaxError| err.in_rule(&name);

    cursor.parse_whitespace();
    if !cursor.eat_str("->") {
        return Err(attach(cursor.error_span(
            format!("Expected '->' after rule name '{}'", name),
            name_start,
        )));
    }
    cursor.parse_whitespace();

    let mut elements = Vec::new();
    while let Some(node) = cursor.compile_rule_node().map_err(attach)? {
        elements.push(node);
    }
    cursor.parse_whitespace();

    if elements.is_empty() && cursor.at_end() {
        return Err(attach(cursor.error_point(format!(
            "Rule '{}' has no elements",
            name
        ))));
    }
    if !cursor.at_end() {
        return Err(attach(cursor.unexpected()));
    }

    Ok(Entry::new(name, elements))
}

impl<'a> RuleCursor<'a> {
    pub fn new(input: &'a str) -> Self {
        RuleCursor { input, pos: 0 }
    }

    /// Current byte offset.
    pub fn offset(&self) -> usize {
        self.pos
    }

    /// Unconsumed text.
    pub fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    // ── Helpers ──────────────────────────────────────────────────────

    fn peek_char(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn advance(&mut self, n: usize) {
        self.pos += n;
    }

    fn mark(&self) -> usize {
        self.pos
    }

    fn reset(&mut self, mark: usize) {
        self.pos = mark;
    }

    fn eat_char(&mut self, ch: char) -> bool {
        if self.peek_char() == Some(ch) {
            self.advance(ch.len_utf8());
            true
        } else {
            false
        }
    }

    fn eat_str(&mut self, s: &str) -> bool {
        if self.remaining().starts_with(s) {
            self.advance(s.len());
            true
        } else {
            false
        }
    }

    fn position_of(&self, offset: usize) -> Position {
        Position::in_text(self.input, offset)
    }

    /// Create an error at the current position.
    fn error_point(&self, message: impl Into<String>) -> SyntaxError {
        let here = self.position_of(self.pos);
        SyntaxError::new(message, here, here)
    }

    /// Create an error spanning from `begin` to the current position.
    fn error_span(&self, message: impl Into<String>, begin: usize) -> SyntaxError {
        SyntaxError::new(message, self.position_of(begin), self.position_of(self.pos))
    }

    /// Describe whatever sits at the cursor and cannot start an element.
    fn unexpected(&self) -> SyntaxError {
        let begin = self.pos;
        let end = self.input.len();
        let message = match self.peek_char() {
            Some('\'') => "Unterminated literal".to_string(),
            Some('|') => "Expected an element before '|'".to_string(),
            Some(ch @ ('?' | '[' | ']')) => format!("Misplaced modifier '{}'", ch),
            Some(ch) => format!("Unexpected character '{}'", ch),
            None => "Unexpected end of rule".to_string(),
        };
        SyntaxError::new(message, self.position_of(begin), self.position_of(end))
    }

    // ── Lexical primitives ──────────────────────────────────────────

    /// Skip whitespace. Returns whether at least one character was consumed.
    pub fn parse_whitespace(&mut self) -> bool {
        let start = self.mark();
        while let Some(ch) = self.peek_char() {
            if !ch.is_ascii_whitespace() {
                break;
            }
            self.advance(ch.len_utf8());
        }
        self.pos > start
    }

    /// `(alpha | "_") (alnum | "_")*`
    pub fn parse_identifier(&mut self) -> Option<String> {
        let start = self.mark();
        match self.peek_char() {
            Some(ch) if ch.is_ascii_alphabetic() || ch == '_' => self.advance(1),
            _ => return None,
        }
        while let Some(ch) = self.peek_char() {
            if !(ch.is_ascii_alphanumeric() || ch == '_') {
                break;
            }
            self.advance(1);
        }
        Some(self.input[start..self.pos].to_string())
    }

    /// `'...'` with `\` escaping the next character verbatim.
    pub fn parse_literal(&mut self) -> Option<String> {
        let start = self.mark();
        if !self.eat_char('\'') {
            return None;
        }
        let mut text = String::new();
        loop {
            match self.peek_char() {
                None => {
                    self.reset(start);
                    return None;
                }
                Some('\'') => {
                    self.advance(1);
                    return Some(text);
                }
                Some('\\') => {
                    self.advance(1);
                    if let Some(escaped) = self.peek_char() {
                        text.push(escaped);
                        self.advance(escaped.len_utf8());
                    }
                }
                Some(ch) => {
                    text.push(ch);
                    self.advance(ch.len_utf8());
                }
            }
        }
    }

    /// Parse an optional `?` / `[]` suffix in either order.
    ///
    /// Returns `Modifier::None` without consuming anything when no modifier
    /// follows. A repeated or unbalanced modifier is an error, and the cursor
    /// is left where it was.
    pub fn parse_type_modifier(&mut self) -> Result<Modifier, SyntaxError> {
        let start = self.mark();
        self.parse_whitespace();
        let modifier_start = self.mark();

        let mut saw_optional = false;
        let mut saw_array = false;
        let mut bracket_depth = 0usize;

        loop {
            let ch = self.peek_char();
            let fault = match ch {
                Some('?') if saw_optional => Some("Modifier '?' given twice"),
                Some('?') => {
                    saw_optional = true;
                    None
                }
                Some('[') if bracket_depth > 0 => Some("Nested '[' in modifier"),
                Some('[') if saw_array => Some("Modifier '[]' given twice"),
                Some('[') => {
                    bracket_depth += 1;
                    None
                }
                Some(']') if bracket_depth != 1 => Some("Unmatched ']' in modifier"),
                Some(']') => {
                    bracket_depth -= 1;
                    saw_array = true;
                    None
                }
                _ => break,
            };
            self.advance(1);
            if let Some(message) = fault {
                let err = self.error_span(message, modifier_start);
                self.reset(start);
                return Err(err);
            }
        }

        if bracket_depth != 0 {
            let err = self.error_span("Unclosed '[' in modifier", modifier_start);
            self.reset(start);
            return Err(err);
        }
        if !saw_optional && !saw_array {
            self.reset(start);
        }
        Ok(Modifier::from_bits(saw_array, saw_optional))
    }

    /// `ws? ":" ws?` between a storage key and its target.
    pub fn parse_separator(&mut self) -> bool {
        self.parse_delimiter(':')
    }

    /// `ws? "|" ws?` between alternatives.
    pub fn is_followed_by_alternative(&mut self) -> bool {
        self.parse_delimiter('|')
    }

    fn parse_delimiter(&mut self, delimiter: char) -> bool {
        let start = self.mark();
        self.parse_whitespace();
        if !self.eat_char(delimiter) {
            self.reset(start);
            return false;
        }
        self.parse_whitespace();
        true
    }

    // ── Grammar elements ────────────────────────────────────────────

    /// Parse `[key:] (literal | name) modifier?`.
    ///
    /// `Ok(None)` means nothing that could start a rule sits at the cursor.
    pub fn compile_rule(&mut self) -> Result<Option<Rule>, SyntaxError> {
        let start = self.mark();
        self.parse_whitespace();

        if let Some(literal) = self.parse_literal() {
            let mut rule = Rule::literal(literal);
            rule.modifier = self.parse_type_modifier()?;
            return Ok(Some(rule));
        }

        let Some(identifier) = self.parse_identifier() else {
            self.reset(start);
            return Ok(None);
        };

        let mut rule = if self.parse_separator() {
            let target_start = self.mark();
            let mut target = if let Some(literal) = self.parse_literal() {
                Rule::literal(literal)
            } else if let Some(name) = self.parse_identifier() {
                Rule::reference(name)
            } else {
                return Err(self.error_span(
                    format!(
                        "Expected a rule name or literal after storage key '{}'",
                        identifier
                    ),
                    target_start,
                ));
            };
            target.storage_key = Some(identifier);
            target
        } else {
            Rule::reference(identifier)
        };
        rule.modifier = self.parse_type_modifier()?;
        Ok(Some(rule))
    }

    /// Parse one rule, or several separated by `|` into an alternation.
    pub fn compile_rule_node(&mut self) -> Result<Option<Node>, SyntaxError> {
        let Some(first) = self.compile_rule()? else {
            return Ok(None);
        };

        if !self.is_followed_by_alternative() {
            return Ok(Some(Node::Regular(first)));
        }

        let mut alternatives = vec![first];
        loop {
            match self.compile_rule()? {
                Some(rule) => alternatives.push(rule),
                None if self.at_end() => {
                    return Err(self.error_point("Expected an alternative after '|'"))
                }
                None => return Err(self.unexpected()),
            }
            if !self.is_followed_by_alternative() {
                break;
            }
        }
        Ok(Some(Node::Alternation(alternatives)))
    }
}
