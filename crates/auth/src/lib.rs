//! `warden-auth` — pure authentication/authorization algorithms.
//!
//! This crate is intentionally decoupled from HTTP and storage: token
//! signing/verification, claim validation, role-closure computation and
//! resource matching are all deterministic and IO-free. Storage-backed
//! counterparts live in `warden-infra`.

pub mod claims;
pub mod graph;
pub mod matcher;
pub mod token;

pub use claims::{Claims, TokenValidationError, validate_claims};
pub use graph::{introduces_cycle, role_closure};
pub use matcher::resource_matches;
pub use token::{Hs256TokenCodec, TokenError, TokenVerifier};
