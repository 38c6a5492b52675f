//! Layout and quoting options for the text form.
use elysianbt::{options::DEFAULT_MAX_DEPTH, NbtOptions};
use serde::{Deserialize, Serialize};

/// How a name or string payload is quoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum QuotePolicy {
    /// Double quotes, unless the content holds a double quote and no single
    /// quote.
    #[default]
    Default,

    /// No quotes at all when the content is a valid bare word, otherwise as
    /// `Default`. String payloads are only left bare when they would not read
    /// back as a number or boolean.
    DefaultWithNoQuote,

    /// Whichever quote character occurs less often in the content.
    Shorter,
    ForceSingle,
    ForceDouble,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct StringOptions {
    /// Whether the document starts with `name:`.
    pub has_root_name: bool,
    pub max_depth: usize,

    /// Copies of `indent_unit` per level of nesting.
    pub indent: usize,
    pub indent_unit: String,

    /// Written before every entry and closing bracket. Empty keeps the whole
    /// document on one line.
    pub new_line: String,
    pub colon_space: bool,

    /// Only applies while not breaking lines.
    pub comma_space: bool,
    pub name_quotes: QuotePolicy,
    pub payload_quotes: QuotePolicy,
}

impl StringOptions {
    /// Everything on one line with no optional spaces.
    pub fn minimal() -> Self {
        Self::default()
    }

    /// One entry per line, indented by four spaces.
    pub fn pretty() -> Self {
        Self {
            indent: 4,
            new_line: "\n".to_owned(),
            colon_space: true,
            comma_space: true,
            ..Self::default()
        }
    }

    pub fn generic(&self) -> NbtOptions {
        NbtOptions {
            has_root_name: self.has_root_name,
            max_depth: self.max_depth,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_root_name(mut self, has_root_name: bool) -> Self {
        self.has_root_name = has_root_name;
        self
    }

    pub(crate) fn is_multiline(&self) -> bool {
        !self.new_line.is_empty()
    }
}

impl Default for StringOptions {
    fn default() -> Self {
        Self {
            has_root_name: false,
            max_depth: DEFAULT_MAX_DEPTH,
            indent: 0,
            indent_unit: " ".to_owned(),
            new_line: String::new(),
            colon_space: false,
            comma_space: false,
            name_quotes: QuotePolicy::DefaultWithNoQuote,
            payload_quotes: QuotePolicy::Default,
        }
    }
}
