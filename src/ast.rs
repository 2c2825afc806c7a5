//! Compiled grammar representation produced by the rule-text parser
//! and consumed by the linker and interpreter.

use std::fmt;

/// Stable handle of an entry inside its [`Grammar`].
///
/// Entries are only ever appended, never moved or removed, so an id handed out
/// by a grammar stays valid for that grammar's whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(pub(crate) usize);

impl EntryId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// How an entry assembles the values of its elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageMode {
    /// Not derived yet.
    #[default]
    Unset,
    /// No element carries a storage key: results are concatenated into text.
    Flatten,
    /// At least one element carries a storage key: results build an object.
    Object,
}

/// `?` and `[]` suffixes. The two bits are independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Modifier {
    #[default]
    None,
    /// `[]`: one or more.
    Array,
    /// `?`: zero or one.
    Optional,
    /// `[]?` or `?[]`: executes exactly like `Array`.
    Both,
}

impl Modifier {
    pub fn is_array(self) -> bool {
        matches!(self, Modifier::Array | Modifier::Both)
    }

    pub fn is_optional(self) -> bool {
        matches!(self, Modifier::Optional | Modifier::Both)
    }

    pub(crate) fn from_bits(array: bool, optional: bool) -> Self {
        match (array, optional) {
            (false, false) => Modifier::None,
            (true, false) => Modifier::Array,
            (false, true) => Modifier::Optional,
            (true, true) => Modifier::Both,
        }
    }
}

/// What a rule matches.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    /// Exact text.
    Literal(String),
    /// Another entry, by name. `link` is filled in by the linker.
    Reference { name: String, link: Option<EntryId> },
}

/// A single grammar element: `key:target?[]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub modifier: Modifier,
    /// When present, the matched value is stored under this key.
    pub storage_key: Option<String>,
    pub content: Content,
}

impl Rule {
    pub fn literal(text: impl Into<String>) -> Self {
        Rule {
            modifier: Modifier::None,
            storage_key: None,
            content: Content::Literal(text.into()),
        }
    }

    pub fn reference(name: impl Into<String>) -> Self {
        Rule {
            modifier: Modifier::None,
            storage_key: None,
            content: Content::Reference {
                name: name.into(),
                link: None,
            },
        }
    }
}

/// One position in an entry's element sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Regular(Rule),
    /// Ordered choice; never empty. The first alternative that matches wins.
    Alternation(Vec<Rule>),
}

impl Node {
    /// The rules of this node in priority order.
    pub fn rules(&self) -> &[Rule] {
        match self {
            Node::Regular(rule) => std::slice::from_ref(rule),
            Node::Alternation(alternatives) => alternatives,
        }
    }

    pub(crate) fn rules_mut(&mut self) -> &mut [Rule] {
        match self {
            Node::Regular(rule) => std::slice::from_mut(rule),
            Node::Alternation(alternatives) => alternatives,
        }
    }

    pub fn has_storage_key(&self) -> bool {
        self.rules().iter().any(|r| r.storage_key.is_some())
    }
}

/// A named grammar rule: `name -> node node ...`.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub name: String,
    storage_mode: StorageMode,
    elements: Vec<Node>,
}

impl Entry {
    /// Build an entry, deriving its storage mode from the elements.
    pub fn new(name: impl Into<String>, elements: Vec<Node>) -> Self {
        let storage_mode = if elements.iter().any(Node::has_storage_key) {
            StorageMode::Object
        } else {
            StorageMode::Flatten
        };
        Entry {
            name: name.into(),
            storage_mode,
            elements,
        }
    }

    pub fn storage_mode(&self) -> StorageMode {
        self.storage_mode
    }

    pub fn elements(&self) -> &[Node] {
        &self.elements
    }

    pub(crate) fn elements_mut(&mut self) -> &mut Vec<Node> {
        &mut self.elements
    }
}

/// An ordered set of entries. Order only matters for diagnostics and for
/// which entry wins when two share a name (the first one).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Grammar {
    entries: Vec<Entry>,
    linked: bool,
}

impl Grammar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. Any previous link result is invalidated.
    pub fn push(&mut self, entry: Entry) -> EntryId {
        self.entries.push(entry);
        self.linked = false;
        EntryId(self.entries.len() - 1)
    }

    pub fn entry(&self, id: EntryId) -> &Entry {
        &self.entries[id.0]
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the last call to [`crate::linker::link_grammar`] succeeded.
    pub fn is_linked(&self) -> bool {
        self.linked
    }

    pub(crate) fn entries_mut(&mut self) -> &mut [Entry] {
        &mut self.entries
    }

    pub(crate) fn set_linked(&mut self, linked: bool) {
        self.linked = linked;
    }
}

// ── Rule-text rendering ─────────────────────────────────────────────

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modifier::None => Ok(()),
            Modifier::Array => f.write_str("[]"),
            Modifier::Optional => f.write_str("?"),
            Modifier::Both => f.write_str("[]?"),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(key) = &self.storage_key {
            write!(f, "{}:", key)?;
        }
        match &self.content {
            Content::Literal(text) => {
                f.write_str("'")?;
                for ch in text.chars() {
                    if ch == '\'' || ch == '\\' {
                        f.write_str("\\")?;
                    }
                    write!(f, "{}", ch)?;
                }
                f.write_str("'")?;
            }
            Content::Reference { name, .. } => f.write_str(name)?,
        }
        write!(f, "{}", self.modifier)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, rule) in self.rules().iter().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            write!(f, "{}", rule)?;
        }
        Ok(())
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ->", self.name)?;
        for node in &self.elements {
            write!(f, " {}", node)?;
        }
        Ok(())
    }
}
