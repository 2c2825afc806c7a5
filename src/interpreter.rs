use crate::ast::*;
use crate::value::{Object, Value};

/// Outcome of running one entry against an input.
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    /// The matched value, or `None` when the entry did not match.
    pub value: Option<Value>,
    /// Byte offset of the cursor after the attempt.
    ///
    /// A failed sequence is not rolled back, so this may lie past the
    /// starting offset even when `value` is `None`.
    pub position: usize,
}

/// Run `entry` of a linked grammar against `input`, starting at offset 0.
///
/// # Panics
///
/// Panics if a reference reached during execution was never linked; check
/// [`Grammar::is_linked`] first.
pub fn execute(grammar: &Grammar, entry: EntryId, input: &str) -> Execution {
    execute_from(grammar, entry, input, 0)
}

/// Run `entry` of a linked grammar against `input`, starting at `offset`.
pub fn execute_from(grammar: &Grammar, entry: EntryId, input: &str, offset: usize) -> Execution {
    let mut interpreter = Interpreter {
        grammar,
        cursor: Cursor {
            input: input.as_bytes(),
            pos: offset.min(input.len()),
        },
    };
    let value = interpreter.execute_grammar_entry(grammar.entry(entry));
    Execution {
        value,
        position: interpreter.cursor.pos,
    }
}

/// Byte cursor over the input. Choice points take a `mark` before an
/// attempt and `restore` it when the attempt fails.
struct Cursor<'i> {
    input: &'i [u8],
    pos: usize,
}

impl Cursor<'_> {
    fn mark(&self) -> usize {
        self.pos
    }

    fn restore(&mut self, mark: usize) {
        self.pos = mark;
    }

    /// Consume `literal` if the input continues with exactly its bytes.
    fn eat_literal(&mut self, literal: &str) -> bool {
        if self.input[self.pos..].starts_with(literal.as_bytes()) {
            self.pos += literal.len();
            true
        } else {
            false
        }
    }
}

struct Interpreter<'g, 'i> {
    grammar: &'g Grammar,
    cursor: Cursor<'i>,
}

impl<'g> Interpreter<'g, '_> {
    /// Run every element in sequence. If one fails the entry fails, and
    /// whatever earlier elements consumed stays consumed.
    fn execute_grammar_entry(&mut self, entry: &'g Entry) -> Option<Value> {
        match entry.storage_mode() {
            StorageMode::Object => {
                let mut object = Object::new();
                for node in entry.elements() {
                    let (rule, value) = self.execute_rule_node(node)?;
                    if let Some(key) = &rule.storage_key {
                        object.insert(key.clone(), value);
                    }
                }
                Some(Value::Object(object))
            }
            StorageMode::Flatten | StorageMode::Unset => {
                let mut text = String::new();
                for node in entry.elements() {
                    let (_, value) = self.execute_rule_node(node)?;
                    value.flatten_into(&mut text);
                }
                Some(Value::Text(text))
            }
        }
    }

    /// Returns the rule that matched (the winning alternative for an
    /// alternation) together with its value.
    fn execute_rule_node(&mut self, node: &'g Node) -> Option<(&'g Rule, Value)> {
        match node {
            Node::Regular(rule) => self.execute_rule(rule).map(|value| (rule, value)),
            Node::Alternation(alternatives) => {
                let mark = self.cursor.mark();
                for rule in alternatives {
                    if let Some(value) = self.execute_rule(rule) {
                        return Some((rule, value));
                    }
                    self.cursor.restore(mark);
                }
                None
            }
        }
    }

    fn execute_rule(&mut self, rule: &'g Rule) -> Option<Value> {
        match rule.modifier {
            Modifier::None => self.execute_content(&rule.content),
            // The array bit takes precedence: `[]?` still needs one match.
            Modifier::Array | Modifier::Both => self.execute_repeated(&rule.content),
            Modifier::Optional => {
                let mark = self.cursor.mark();
                self.execute_content(&rule.content).or_else(|| {
                    self.cursor.restore(mark);
                    Some(Value::Null)
                })
            }
        }
    }

    /// One or more matches, greedily. Accepted repetitions are never given
    /// back; a repetition that matches without consuming input ends the loop.
    fn execute_repeated(&mut self, content: &'g Content) -> Option<Value> {
        let mut items = vec![self.execute_content(content)?];
        loop {
            let mark = self.cursor.mark();
            match self.execute_content(content) {
                Some(value) if self.cursor.pos > mark => items.push(value),
                _ => {
                    self.cursor.restore(mark);
                    break;
                }
            }
        }
        Some(Value::Array(items))
    }

    fn execute_content(&mut self, content: &'g Content) -> Option<Value> {
        match content {
            Content::Literal(text) => self
                .cursor
                .eat_literal(text)
                .then(|| Value::Text(text.clone())),
            Content::Reference { name, link } => match link {
                Some(target) => {
                    let grammar = self.grammar;
                    self.execute_grammar_entry(grammar.entry(*target))
                }
                None => unreachable!("reference to '{}' executed before linking", name),
            },
        }
    }
}
