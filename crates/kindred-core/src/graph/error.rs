use crate::error::ErrorCode;
use crate::model::{PersonId, RelationshipId, RelationshipKind};

/// Rejections raised by [`FamilyGraph`](super::FamilyGraph) mutations.
///
/// Every variant is terminal for the call that produced it: nothing was
/// written to the graph.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    #[error("invalid person: {reason}")]
    InvalidPerson { reason: &'static str },

    #[error("unknown person '{0}'")]
    UnknownPerson(PersonId),

    #[error("'{person}' cannot have a {kind} relationship with themselves")]
    SelfRelationship {
        person: PersonId,
        kind: RelationshipKind,
    },

    #[error("{kind} relationship between '{from}' and '{to}' already exists as '{existing}'")]
    DuplicateRelationship {
        from: PersonId,
        to: PersonId,
        kind: RelationshipKind,
        existing: RelationshipId,
    },

    #[error(
        "'{parent}' cannot be a parent of '{child}': '{child}' is already their ancestor ({})",
        join_path(.path)
    )]
    Cycle {
        parent: PersonId,
        child: PersonId,
        /// Existing descent `child → … → parent` that the new edge would close.
        path: Vec<PersonId>,
    },

    #[error("{what} id '{id}' is used more than once")]
    DuplicateIdentifier { what: &'static str, id: String },

    #[error("position ({x}, {y}) for '{person}' is not finite")]
    InvalidPosition { person: PersonId, x: f64, y: f64 },
}

impl GraphError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidPerson { .. } => ErrorCode::InvalidPerson,
            Self::UnknownPerson(_) => ErrorCode::UnknownPerson,
            Self::SelfRelationship { .. } => ErrorCode::SelfRelationship,
            Self::DuplicateRelationship { .. } => ErrorCode::DuplicateRelationship,
            Self::Cycle { .. } => ErrorCode::CycleDetected,
            Self::DuplicateIdentifier { .. } => ErrorCode::DuplicateIdentifier,
            Self::InvalidPosition { .. } => ErrorCode::InvalidPosition,
        }
    }

    /// Optional remediation hint for the user.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

fn join_path(path: &[PersonId]) -> String {
    path.iter()
        .map(PersonId::as_str)
        .collect::<Vec<_>>()
        .join(" → ")
}
