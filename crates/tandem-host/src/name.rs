//! Full declaration names.

use std::fmt;

/// A host declaration name: a base name plus, for functions, one argument
/// label per parameter. An empty label is written `_`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclName {
    base: String,
    arguments: Option<Vec<String>>,
}

impl DeclName {
    /// A name with no argument list (types, variables, constants).
    pub fn simple(base: impl Into<String>) -> Self {
        Self { base: base.into(), arguments: None }
    }

    /// A function-style name with argument labels.
    pub fn compound(base: impl Into<String>, arguments: Vec<String>) -> Self {
        Self { base: base.into(), arguments: Some(arguments) }
    }

    /// Parses `"base"` or `"base(label:_:)"`.
    ///
    /// Returns `None` for malformed text.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let Some(open) = text.find('(') else {
            return (!text.is_empty()).then(|| Self::simple(text));
        };
        let base = &text[..open];
        let inner = text[open + 1..].strip_suffix(')')?;
        if base.is_empty() {
            return None;
        }
        if inner.is_empty() {
            return Some(Self::compound(base, Vec::new()));
        }
        let inner = inner.strip_suffix(':')?;
        let labels = inner
            .split(':')
            .map(|label| if label == "_" { String::new() } else { label.to_string() })
            .collect();
        Some(Self::compound(base, labels))
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn arguments(&self) -> Option<&[String]> {
        self.arguments.as_deref()
    }

    pub fn is_compound(&self) -> bool {
        self.arguments.is_some()
    }

    /// `true` when no name could be formed.
    pub fn is_empty(&self) -> bool {
        self.base.is_empty()
    }
}

impl fmt::Display for DeclName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)?;
        if let Some(arguments) = &self.arguments {
            write!(f, "(")?;
            for label in arguments {
                if label.is_empty() {
                    write!(f, "_:")?;
                } else {
                    write!(f, "{}:", label)?;
                }
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}
