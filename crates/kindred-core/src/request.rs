//! Add-person batches: one new person plus connections to existing people.
//!
//! The batch is not atomic. The person is inserted first and each desired
//! connection is then attempted in order; the first failure stops the batch
//! and leaves the person (and any edges already made) in place. Callers that
//! want all-or-nothing behaviour remove the person on
//! [`AddPersonError::PartiallyConnected`].

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ErrorCode;
use crate::graph::{FamilyGraph, GraphError};
use crate::model::{Biography, ConnectionRole, Person, PersonId, Relationship};

/// A connection the new person should get to someone already in the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesiredConnection {
    pub person_id: PersonId,
    /// What the existing person is to the new one.
    pub role: ConnectionRole,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddPersonRequest {
    pub data: Biography,
    #[serde(default)]
    pub connections: Vec<DesiredConnection>,
}

impl AddPersonRequest {
    #[must_use]
    pub fn new(data: Biography) -> Self {
        Self {
            data,
            connections: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_connection(mut self, person_id: impl Into<PersonId>, role: ConnectionRole) -> Self {
        self.connections.push(DesiredConnection {
            person_id: person_id.into(),
            role,
        });
        self
    }
}

/// Successful outcome of [`FamilyGraph::apply_add_request`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddedPerson {
    pub person: Person,
    pub relationships: Vec<Relationship>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AddPersonError {
    /// The person itself was invalid; nothing changed.
    #[error(transparent)]
    Rejected(GraphError),

    /// The person was added but connection number `failed_at` failed.
    #[error("added '{}' but connection {} failed: {error}", .person.id, .failed_at + 1)]
    PartiallyConnected {
        person: Person,
        connected: Vec<Relationship>,
        failed_at: usize,
        #[source]
        error: GraphError,
    },
}

impl AddPersonError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Rejected(error) | Self::PartiallyConnected { error, .. } => error.code(),
        }
    }

    /// The underlying graph rejection.
    #[must_use]
    pub const fn graph_error(&self) -> &GraphError {
        match self {
            Self::Rejected(error) | Self::PartiallyConnected { error, .. } => error,
        }
    }
}

impl FamilyGraph {
    /// Insert `request.data` and create each desired connection in order.
    ///
    /// `Spouse` and `Child` connections are issued from the new person;
    /// `Parent` connections are issued from the existing person toward the
    /// new one.
    ///
    /// # Errors
    ///
    /// [`AddPersonError::Rejected`] if the person is invalid (graph
    /// unchanged), or [`AddPersonError::PartiallyConnected`] on the first
    /// connection failure (person and earlier edges kept).
    pub fn apply_add_request(&mut self, request: AddPersonRequest) -> Result<AddedPerson, AddPersonError> {
        let person = self.add_person(request.data).map_err(AddPersonError::Rejected)?;
        let mut connected = Vec::with_capacity(request.connections.len());

        for (index, desired) in request.connections.iter().enumerate() {
            let (source, target) = desired.role.orient(&person.id, &desired.person_id);
            match self.connect(source, target, desired.role.kind()) {
                Ok(rel) => connected.push(rel),
                Err(error) => {
                    warn!(
                        person = %person.id,
                        other = %desired.person_id,
                        role = %desired.role,
                        %error,
                        "add-person connection rejected"
                    );
                    return Err(AddPersonError::PartiallyConnected {
                        person,
                        connected,
                        failed_at: index,
                        error,
                    });
                }
            }
        }

        debug!(person = %person.id, connections = connected.len(), "applied add-person request");
        Ok(AddedPerson {
            person,
            relationships: connected,
        })
    }
}
