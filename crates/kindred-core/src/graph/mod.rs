//! Family relationship graph.
//!
//! - [`family`]: the [`FamilyGraph`] session type and its mutations.
//! - [`ancestry`]: parent-child reachability used for cycle rejection.
//! - [`error`]: [`GraphError`], the typed rejection for every mutation.

pub mod ancestry;
pub mod error;
pub mod family;

pub use ancestry::{Lineage, find_cycle, has_cycle, is_ancestor, would_create_cycle};
pub use error::GraphError;
pub use family::{FamilyGraph, validate_biography};
