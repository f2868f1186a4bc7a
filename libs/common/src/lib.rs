//! Common library for the Joy Kunga application
//!
//! This crate provides the pieces shared by every service: the entity
//! models, the record store abstraction with its PostgreSQL and in-memory
//! backends, database connectivity, and storage error types.

pub mod database;
pub mod error;
pub mod models;
pub mod store;

pub use store::{RecordStore, SharedStore};
