use tracing::debug;

use crate::ast::{Content, Grammar, Node};
use crate::error::GrammarError;
use crate::grammar::find_grammar_entry;

/// Resolve every rule reference in `grammar` to the entry it names.
///
/// References may point forward, backward or at their own entry. On the first
/// name that matches no entry this fails and the grammar stays unlinked; it
/// must not be executed until a later call succeeds.
pub fn link_grammar(grammar: &mut Grammar) -> Result<(), GrammarError> {
    grammar.set_linked(false);

    for index in 0..grammar.len() {
        // Detach the elements so the rest of the grammar can be searched
        // while this entry's rules are updated.
        let mut elements = std::mem::take(grammar.entries_mut()[index].elements_mut());
        let result = link_elements(&mut elements, grammar, index);
        *grammar.entries_mut()[index].elements_mut() = elements;
        result?;
    }

    grammar.set_linked(true);
    Ok(())
}

fn link_elements(
    elements: &mut [Node],
    grammar: &Grammar,
    index: usize,
) -> Result<(), GrammarError> {
    for node in elements.iter_mut() {
        for rule in node.rules_mut() {
            if let Content::Reference { name, link } = &mut rule.content {
                let entry_name = &grammar.entries()[index].name;
                match find_grammar_entry(grammar, name) {
                    Some(target) => {
                        debug!(
                            rule = %entry_name,
                            reference = %name,
                            target = target.index(),
                            "linked reference"
                        );
                        *link = Some(target);
                    }
                    None => {
                        return Err(GrammarError::UnresolvedReference {
                            entry: entry_name.clone(),
                            reference: name.clone(),
                        });
                    }
                }
            }
        }
    }
    Ok(())
}
