//! In-memory record storage used by the user directory and the product catalog.

pub mod record_store;

pub use record_store::{InMemoryRecordStore, RecordStore};
