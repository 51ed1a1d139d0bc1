//! Plain data types exchanged across the core boundary.

pub mod person;
pub mod relationship;

pub use person::{Biography, Person, PersonId, Position};
pub use relationship::{
    Connection, ConnectionRole, ParseEnumError, Relationship, RelationshipId, RelationshipKind,
    Role,
};
