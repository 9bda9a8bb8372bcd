//! Parsed template representation

use std::fmt;

use crate::error::Result;

use super::parser;

/// Opening delimiter of a substitution expression
pub const OPEN: &str = "{{";

/// Closing delimiter of a substitution expression
pub const CLOSE: &str = "}}";

/// A reference to a plugin function or a variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Plugin name, `None` for variable references
    pub plugin: Option<String>,
    /// Function name, or variable name when `plugin` is `None`
    pub name: String,
    /// Text between the delimiters, untrimmed
    raw: String,
}

impl Reference {
    /// Reference to `plugin.function`
    pub fn function(plugin: impl Into<String>, function: impl Into<String>) -> Self {
        let plugin = plugin.into();
        let name = function.into();
        let raw = format!("{}.{}", plugin, name);
        Self {
            plugin: Some(plugin),
            name,
            raw,
        }
    }

    /// Reference to a variable in the argument set
    pub fn variable(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            plugin: None,
            raw: name.clone(),
            name,
        }
    }

    pub(crate) fn with_raw(plugin: Option<String>, name: String, raw: &str) -> Self {
        Self {
            plugin,
            name,
            raw: raw.to_string(),
        }
    }

    /// The original text between the delimiters
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Whether this reference names a variable rather than a plugin function
    pub fn is_variable(&self) -> bool {
        self.plugin.is_none()
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.plugin {
            Some(plugin) => write!(f, "{}.{}", plugin, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// A unit of a parsed template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Reference(Reference),
}

impl Segment {
    /// Literal segment
    pub fn literal(text: impl Into<String>) -> Self {
        Segment::Literal(text.into())
    }

    /// Source text of this segment, delimiters included for references
    pub fn source(&self) -> String {
        match self {
            Segment::Literal(text) => text.clone(),
            Segment::Reference(reference) => format!("{}{}{}", OPEN, reference.raw(), CLOSE),
        }
    }
}

/// An immutable, parsed template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parse template text into segments
    pub fn parse(text: impl Into<String>) -> Result<Self> {
        let source = text.into();
        let segments = parser::parse(&source)?;
        Ok(Self { source, segments })
    }

    /// The text this template was parsed from
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// All references, in template order
    pub fn references(&self) -> impl Iterator<Item = &Reference> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Reference(r) => Some(r),
            Segment::Literal(_) => None,
        })
    }

    /// Total length of literal text
    pub fn literal_len(&self) -> usize {
        self.segments
            .iter()
            .map(|s| match s {
                Segment::Literal(text) => text.len(),
                Segment::Reference(_) => 0,
            })
            .sum()
    }
}
