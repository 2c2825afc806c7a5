use tracing::debug;

use crate::ast::{EntryId, Grammar};
use crate::error::GrammarError;
use crate::parser::compile_grammar_entry;

/// Compile rule definitions, in order, into an unlinked grammar.
///
/// Stops at the first definition that fails to compile; nothing of the
/// partially built grammar is returned in that case.
pub fn compile_grammar<S: AsRef<str>>(definitions: &[S]) -> Result<Grammar, GrammarError> {
    let mut grammar = Grammar::new();
    for (index, definition) in definitions.iter().enumerate() {
        let entry = compile_grammar_entry(definition.as_ref())
            .map_err(|error| GrammarError::Compile { index, error })?;
        debug!(
            index,
            rule = %entry.name,
            mode = ?entry.storage_mode(),
            elements = entry.elements().len(),
            "compiled rule"
        );
        grammar.push(entry);
    }
    Ok(grammar)
}

/// First entry named `name`, by linear scan.
pub fn find_grammar_entry(grammar: &Grammar, name: &str) -> Option<EntryId> {
    grammar
        .entries()
        .iter()
        .position(|entry| entry.name == name)
        .map(EntryId)
}

impl Grammar {
    /// See [`compile_grammar`].
    pub fn compile<S: AsRef<str>>(definitions: &[S]) -> Result<Grammar, GrammarError> {
        compile_grammar(definitions)
    }

    /// Compile a grammar file holding one rule definition per line.
    /// Blank lines are skipped; error indices count the remaining lines.
    pub fn from_source(source: &str) -> Result<Grammar, GrammarError> {
        let definitions: Vec<&str> = source
            .lines()
            .filter(|line| !line.trim().is_empty())
            .collect();
        compile_grammar(&definitions)
    }

    /// See [`find_grammar_entry`].
    pub fn find(&self, name: &str) -> Option<EntryId> {
        find_grammar_entry(self, name)
    }

    /// See [`crate::linker::link_grammar`].
    pub fn link(&mut self) -> Result<(), GrammarError> {
        crate::linker::link_grammar(self)
    }
}
