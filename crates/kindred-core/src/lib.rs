//! kindred-core library.
//!
//! The family relationship graph ([`graph::FamilyGraph`]) and everything
//! the hosting application needs around it: the plain data model, owned
//! [`Snapshot`] values, add-person batches, seed data, configuration and the
//! on-disk [`store::TreeStore`].
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` enums exposing `code()`; `anyhow` only in
//!   configuration loading.
//! - **Logging**: `tracing` macros (`debug!` per mutation, `info!` per save).

pub mod config;
pub mod error;
pub mod graph;
pub mod lock;
pub mod model;
pub mod request;
pub mod seed;
pub mod snapshot;
pub mod store;

pub use error::ErrorCode;
pub use graph::{FamilyGraph, GraphError};
pub use request::{AddPersonError, AddPersonRequest, AddedPerson, DesiredConnection};
pub use snapshot::Snapshot;
