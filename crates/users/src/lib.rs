//! Users domain module.
//!
//! Business rules for the user directory (service-a), implemented as plain
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod user;

pub use meridian_core::UserId;
pub use user::{CreateUser, Role, UpdateUser, User, seed_users, validate_email};
