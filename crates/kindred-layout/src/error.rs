use kindred_core::ErrorCode;
use kindred_core::model::{PersonId, RelationshipId};

/// Inputs the layout engine refuses to place.
///
/// Snapshots produced by [`FamilyGraph`](kindred_core::FamilyGraph) never
/// trigger these; hand-edited or imported data can.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("parent-child relationships form a cycle through '{person}'")]
    CyclicGraph { person: PersonId },

    #[error("relationship '{relationship}' references unknown person '{person}'")]
    UnknownEndpoint {
        relationship: RelationshipId,
        person: PersonId,
    },
}

impl LayoutError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::CyclicGraph { .. } => ErrorCode::CyclicLayout,
            Self::UnknownEndpoint { .. } => ErrorCode::DanglingRelationship,
        }
    }
}
