//! `warden-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod policy;

pub use error::{DomainError, DomainResult};
pub use id::{Action, PrincipalId, ResourcePattern, Role};
pub use policy::PolicyTuple;
