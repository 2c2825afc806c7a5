//! A small PEG-style grammar engine: compile rule definitions such as
//! `entry -> key:token ':' value:token`, link them, and run them against
//! text to build strings, arrays and objects.

pub mod ast;
pub mod diagnostics;
pub mod error;
pub mod grammar;
pub mod interpreter;
pub mod json;
pub mod linker;
pub mod parser;
pub mod value;

use ast::Grammar;
use error::GrammarError;
use value::{Object, Value};

pub use grammar::compile_grammar;
pub use linker::link_grammar;

// ── Core API ───────────────────────────────────────────────────────

/// Knobs for [`parse_into_object_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Treat unconsumed trailing input as a failure instead of a warning.
    pub strict: bool,
}

/// The result of driving a grammar over an input.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseResult {
    /// The caller's object, augmented on success and untouched on failure.
    pub value: Object,
    /// Bytes of input consumed by the start rule.
    pub consumed: usize,
    pub errors: Vec<GrammarError>,
}

impl ParseResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Compile and link rule definitions in one step.
pub fn compile_and_link<S: AsRef<str>>(definitions: &[S]) -> Result<Grammar, GrammarError> {
    let mut grammar = compile_grammar(definitions)?;
    link_grammar(&mut grammar)?;
    Ok(grammar)
}

/// Run `start_rule` over `input` and merge the outcome into `output`.
///
/// An object result has its pairs spliced into `output`; any other result is
/// stored under the start rule's name. Input left over after a successful
/// match only produces a warning.
pub fn parse_into_object(
    output: Object,
    input: &str,
    grammar: &Grammar,
    start_rule: &str,
) -> ParseResult {
    parse_into_object_with(output, input, grammar, start_rule, &ParseOptions::default())
}

/// [`parse_into_object`] with explicit options.
pub fn parse_into_object_with(
    mut output: Object,
    input: &str,
    grammar: &Grammar,
    start_rule: &str,
    options: &ParseOptions,
) -> ParseResult {
    let fail = |value: Object, consumed: usize, err: GrammarError| {
        tracing::error!(code = err.code(), "{}", err);
        ParseResult {
            value,
            consumed,
            errors: vec![err],
        }
    };

    if !grammar.is_linked() {
        return fail(output, 0, GrammarError::NotLinked);
    }
    let Some(start) = grammar.find(start_rule) else {
        return fail(output, 0, GrammarError::StartRuleNotFound(start_rule.to_string()));
    };

    let execution = interpreter::execute(grammar, start, input);
    let Some(result) = execution.value else {
        let err = GrammarError::NoMatch {
            start_rule: start_rule.to_string(),
            position: execution.position,
        };
        return fail(output, execution.position, err);
    };

    let remaining = input.len() - execution.position;
    if remaining > 0 {
        if options.strict {
            let err = GrammarError::TrailingInput {
                position: execution.position,
                remaining,
            };
            return fail(output, execution.position, err);
        }
        tracing::warn!(
            position = execution.position,
            remaining, "parsing succeeded but input remains"
        );
    }

    match result {
        Value::Object(object) => {
            for (key, value) in object {
                output.insert(key, value);
            }
        }
        other => {
            output.insert(start_rule, other);
        }
    }

    ParseResult {
        value: output,
        consumed: execution.position,
        errors: Vec::new(),
    }
}
