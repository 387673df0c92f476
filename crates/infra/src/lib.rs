//! Infrastructure layer: configuration, in-memory stores, services and the
//! batch-processing job tracker.

pub mod config;
pub mod jobs;
pub mod read_model;
pub mod services;
