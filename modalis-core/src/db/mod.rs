//! Database layer for modalis
//!
//! This module provides the storage layer using SQLite with:
//! - Schema migrations
//! - The append-only insight log
//! - The class roster table

pub mod repo;
pub mod schema;

pub use repo::Database;
