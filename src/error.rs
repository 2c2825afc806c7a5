use thiserror::Error;

/// A 0-based position in a rule definition or input text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// 0-based line number
    pub line: usize,
    /// 0-based column (byte offset within the line)
    pub column: usize,
    /// 0-based absolute byte offset from the start of the text
    pub offset: usize,
}

impl Position {
    /// Locate byte `offset` within `text`.
    pub fn in_text(text: &str, offset: usize) -> Self {
        let offset = offset.min(text.len());
        let consumed = &text.as_bytes()[..offset];
        let line = consumed.iter().filter(|&&b| b == b'\n').count();
        let line_start = consumed
            .iter()
            .rposition(|&b| b == b'\n')
            .map(|i| i + 1)
            .unwrap_or(0);
        Position {
            line,
            column: offset - line_start,
            offset,
        }
    }
}

/// A malformed rule definition, with the span of the offending text.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{}{}: {message}", rule_prefix(.rule), span_text(.begin, .end))]
pub struct SyntaxError {
    /// Name of the rule being defined, if it got far enough to be read.
    pub rule: Option<String>,
    pub message: String,
    /// Start of the offending region
    pub begin: Position,
    /// End of the offending region (exclusive)
    pub end: Position,
}

impl SyntaxError {
    pub(crate) fn new(message: impl Into<String>, begin: Position, end: Position) -> Self {
        SyntaxError {
            rule: None,
            message: message.into(),
            begin,
            end,
        }
    }

    pub(crate) fn in_rule(mut self, name: &str) -> Self {
        self.rule = Some(name.to_string());
        self
    }
}

fn rule_prefix(rule: &Option<String>) -> String {
    match rule {
        Some(rule) => format!("in rule `{}`: ", rule),
        None => String::new(),
    }
}

fn span_text(begin: &Position, end: &Position) -> String {
    if begin == end {
        format!("{}:{}", begin.line, begin.column)
    } else {
        format!("{}:{}-{}:{}", begin.line, begin.column, end.line, end.column)
    }
}

/// Everything that can go wrong while compiling, linking or driving a grammar.
///
/// A rule that simply does not match is not an error; the interpreter reports
/// that as `None` and only the top-level driver turns it into [`GrammarError::NoMatch`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GrammarError {
    #[error("failed to compile rule definition {index}: {error}")]
    Compile {
        /// Index of the offending definition in the compiled list.
        index: usize,
        #[source]
        error: SyntaxError,
    },

    #[error("unknown rule `{reference}` referenced from `{entry}`")]
    UnresolvedReference { entry: String, reference: String },

    #[error("grammar has not been linked")]
    NotLinked,

    #[error("start rule `{0}` not found in grammar")]
    StartRuleNotFound(String),

    #[error("input does not match rule `{start_rule}` (stopped at offset {position})")]
    NoMatch { start_rule: String, position: usize },

    #[error("parsing stopped at offset {position} with {remaining} bytes of input left")]
    TrailingInput { position: usize, remaining: usize },
}

impl GrammarError {
    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            GrammarError::Compile { .. } => "rule-syntax-error",
            GrammarError::UnresolvedReference { .. } => "unresolved-reference",
            GrammarError::NotLinked => "grammar-not-linked",
            GrammarError::StartRuleNotFound(_) => "start-rule-not-found",
            GrammarError::NoMatch { .. } => "no-match",
            GrammarError::TrailingInput { .. } => "trailing-input",
        }
    }
}
