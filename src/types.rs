use serde::{Deserialize, Serialize};
use std::fmt;

/// Classifier family a tag belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TagKind {
    Industry, // Sector / industry classifier
    Universe, // Stock-pool classifier (index constituents etc.)
}

impl fmt::Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagKind::Industry => write!(f, "industry"),
            TagKind::Universe => write!(f, "universe"),
        }
    }
}

/// A single item of a candidate program.
///
/// Ordering is `(kind, name)`, which is the order candidate item lists are kept in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub kind: TagKind,
    pub name: String,
}

impl Tag {
    pub fn new(kind: TagKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    pub fn industry(name: impl Into<String>) -> Self {
        Self::new(TagKind::Industry, name)
    }

    pub fn universe(name: impl Into<String>) -> Self {
        Self::new(TagKind::Universe, name)
    }

    pub fn is_industry(&self) -> bool {
        self.kind == TagKind::Industry
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.name)
    }
}
