//! Products domain module.
//!
//! This crate contains business rules for the product catalog (service-b),
//! implemented purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod product;

pub use meridian_core::ProductId;
pub use product::{CreateProduct, Product, UpdateProduct, same_category, seed_products};
