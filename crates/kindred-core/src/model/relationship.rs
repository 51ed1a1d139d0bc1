use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::person::PersonId;

/// Stable identifier of a relationship edge.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationshipId(String);

impl RelationshipId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RelationshipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RelationshipId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// The two supported relationship kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationshipKind {
    /// `source` is the parent, `target` the child.
    ParentChild,
    /// Symmetric; direction only records who issued the connection.
    Spouse,
}

impl RelationshipKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::ParentChild => "parent-child",
            Self::Spouse => "spouse",
        }
    }
}

/// What the *other* endpoint of an edge is to the person being inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Parent,
    Child,
    Spouse,
}

impl Role {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Parent => "parent",
            Self::Child => "child",
            Self::Spouse => "spouse",
        }
    }
}

/// How an existing person relates to a person being added.
///
/// `Child` means the existing person becomes a child of the new person;
/// `Parent` means the existing person becomes a parent of the new person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionRole {
    Spouse,
    Parent,
    Child,
}

impl ConnectionRole {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Spouse => "spouse",
            Self::Parent => "parent",
            Self::Child => "child",
        }
    }

    /// Relationship kind this role produces.
    #[must_use]
    pub const fn kind(self) -> RelationshipKind {
        match self {
            Self::Spouse => RelationshipKind::Spouse,
            Self::Parent | Self::Child => RelationshipKind::ParentChild,
        }
    }

    /// Order the endpoints as `(source, target)` for an edge between the
    /// new person and the existing one.
    #[must_use]
    pub fn orient<'a>(
        self,
        new_person: &'a PersonId,
        existing: &'a PersonId,
    ) -> (&'a PersonId, &'a PersonId) {
        match self {
            Self::Spouse | Self::Child => (new_person, existing),
            Self::Parent => (existing, new_person),
        }
    }
}

/// A typed, directed edge between two persons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: RelationshipId,
    pub source: PersonId,
    pub target: PersonId,
    pub kind: RelationshipKind,
}

impl Relationship {
    /// `true` if `person` is either endpoint.
    #[must_use]
    pub fn touches(&self, person: &PersonId) -> bool {
        &self.source == person || &self.target == person
    }

    /// The endpoint opposite `person`, or `None` if the edge does not touch it.
    #[must_use]
    pub fn other_endpoint(&self, person: &PersonId) -> Option<&PersonId> {
        if &self.source == person {
            Some(&self.target)
        } else if &self.target == person {
            Some(&self.source)
        } else {
            None
        }
    }

    /// Role of the opposite endpoint as seen from `person`.
    #[must_use]
    pub fn role_for(&self, person: &PersonId) -> Option<Role> {
        match self.kind {
            RelationshipKind::Spouse => self.touches(person).then_some(Role::Spouse),
            RelationshipKind::ParentChild => {
                if &self.source == person {
                    Some(Role::Child)
                } else if &self.target == person {
                    Some(Role::Parent)
                } else {
                    None
                }
            }
        }
    }

    /// `true` if this edge and a proposed `(source, target, kind)` edge are
    /// the same relationship under the uniqueness rules.
    #[must_use]
    pub fn is_equivalent(&self, source: &PersonId, target: &PersonId, kind: RelationshipKind) -> bool {
        if self.kind != kind {
            return false;
        }
        match kind {
            RelationshipKind::ParentChild => &self.source == source && &self.target == target,
            RelationshipKind::Spouse => {
                (&self.source == source && &self.target == target)
                    || (&self.source == target && &self.target == source)
            }
        }
    }
}

/// One incident edge annotated from a person's perspective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub relationship: Relationship,
    pub other: PersonId,
    pub role: Role,
}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ConnectionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn normalize(input: &str) -> String {
    input.trim().to_ascii_lowercase().replace('_', "-")
}

impl FromStr for RelationshipKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "parent-child" | "parentchild" | "parent" => Ok(Self::ParentChild),
            "spouse" => Ok(Self::Spouse),
            _ => Err(ParseEnumError {
                expected: "relationship kind",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for ConnectionRole {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "spouse" => Ok(Self::Spouse),
            "parent" => Ok(Self::Parent),
            "child" => Ok(Self::Child),
            _ => Err(ParseEnumError {
                expected: "connection role",
                got: s.to_string(),
            }),
        }
    }
}
