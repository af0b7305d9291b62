//! # modalis-core
//!
//! Core library for modalis - a learning-signal aggregation and activity
//! personalization engine for classroom tutoring chats.
//!
//! This library provides:
//! - Domain types for insights, rosters, profiles, and activity plans
//! - An append-only insight store on SQLite, plus in-memory substitutes
//! - Group profile aggregation and per-student personalization
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Architecture
//!
//! Data flows through three layers:
//! - **Signals:** chat sessions are classified elsewhere and appended as insights
//! - **Store:** the insight log and class roster (the only persisted state)
//! - **Derived:** group profiles and activity plans, recomputed on every request
//!
//! ## Example
//!
//! ```rust,no_run
//! use modalis_core::{Config, Database, LearningService, NewInsight, PlanRequest};
//! use std::sync::Arc;
//!
//! let config = Config::load().expect("failed to load config");
//!
//! let db = Arc::new(Database::open(&config.store.database_path()).expect("failed to open database"));
//! db.migrate().expect("failed to run migrations");
//!
//! let service = LearningService::new(db.clone(), db).with_plan_config(config.plan);
//! service.record_insight(NewInsight::new("class-1", "s1")).expect("failed to record");
//! let plan = service.generate_plan(&PlanRequest::for_class("class-1")).expect("failed to plan");
//! println!("{} plans", plan.stats.planes_creados);
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use db::Database;
pub use error::{Error, Result};
pub use service::{LearningService, RecordedInsight, Request, Response};
pub use store::{InsightStore, MemoryInsightStore, RosterProvider, StaticRoster};
pub use types::*;

// Public modules
pub mod analytics;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod service;
pub mod store;
pub mod types;
