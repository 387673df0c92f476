//! `meridian-core`: shared building blocks for the services.
//!
//! Pure types only (no IO, no HTTP, no storage).

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{ProductId, UserId};
