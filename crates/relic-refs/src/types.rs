//! Core reference types.
//!
//! References are named pointers into the object store. A target is either
//! direct (an object ID) or symbolic (the name of another reference, the
//! way `HEAD` names a branch).

use serde::{Deserialize, Serialize};

use relic_types::ObjectId;

/// What a reference points at.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefTarget {
    /// Points directly at an object.
    Direct(ObjectId),
    /// Points at another reference by name.
    Symbolic(String),
}

impl RefTarget {
    /// Returns `true` for a direct target.
    pub fn is_direct(&self) -> bool {
        matches!(self, Self::Direct(_))
    }

    /// Returns `true` for a symbolic target.
    pub fn is_symbolic(&self) -> bool {
        matches!(self, Self::Symbolic(_))
    }

    /// The object ID, for a direct target.
    pub fn object_id(&self) -> Option<&ObjectId> {
        match self {
            Self::Direct(id) => Some(id),
            Self::Symbolic(_) => None,
        }
    }

    /// The referent name, for a symbolic target.
    pub fn symbolic_name(&self) -> Option<&str> {
        match self {
            Self::Direct(_) => None,
            Self::Symbolic(name) => Some(name),
        }
    }
}

/// A named reference.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// Full reference name (e.g. "refs/heads/main").
    pub name: String,
    /// What the reference points at.
    pub target: RefTarget,
}

impl Reference {
    /// Create a direct reference.
    pub fn direct(name: impl Into<String>, id: ObjectId) -> Self {
        Self {
            name: name.into(),
            target: RefTarget::Direct(id),
        }
    }

    /// Create a symbolic reference.
    pub fn symbolic(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: RefTarget::Symbolic(target.into()),
        }
    }

    /// The short name (without the "refs/<kind>/" prefix, when present).
    pub fn short_name(&self) -> &str {
        for prefix in ["refs/heads/", "refs/tags/", "refs/remotes/"] {
            if let Some(rest) = self.name.strip_prefix(prefix) {
                return rest;
            }
        }
        &self.name
    }
}
