//! Storage seams for the engine
//!
//! The engine never reaches for a global collection: it is handed an
//! [`InsightStore`] and a [`RosterProvider`]. [`crate::Database`] implements
//! both on SQLite; [`MemoryInsightStore`] and [`StaticRoster`] are in-memory
//! substitutes for tests and embedding.

use crate::error::Result;
use crate::types::{Insight, NewInsight, RosterEntry};
use chrono::{DateTime, Utc};
use std::sync::Mutex;

/// Append-only record store for learning signals.
///
/// Implementations must serialize appends so that none is lost and so that
/// appends for the same student keep their submission order.
pub trait InsightStore: Send + Sync {
    /// Assign `id` and `created_at`, persist, and return the stored record.
    fn append(&self, insight: NewInsight) -> Result<Insight>;

    /// All insights for a class in insertion order. Empty when none exist.
    fn list_by_class(&self, class_id: &str) -> Result<Vec<Insight>>;

    /// All insights for one student of a class in insertion order.
    fn list_by_student(&self, class_id: &str, student_id: &str) -> Result<Vec<Insight>> {
        Ok(self
            .list_by_class(class_id)?
            .into_iter()
            .filter(|i| i.student_id == student_id)
            .collect())
    }
}

/// Supplies the students of a class. Read-only to the engine.
pub trait RosterProvider: Send + Sync {
    fn list_roster(&self, class_id: &str) -> Result<Vec<RosterEntry>>;
}

impl<T: InsightStore + ?Sized> InsightStore for &T {
    fn append(&self, insight: NewInsight) -> Result<Insight> {
        (**self).append(insight)
    }

    fn list_by_class(&self, class_id: &str) -> Result<Vec<Insight>> {
        (**self).list_by_class(class_id)
    }

    fn list_by_student(&self, class_id: &str, student_id: &str) -> Result<Vec<Insight>> {
        (**self).list_by_student(class_id, student_id)
    }
}

impl<T: RosterProvider + ?Sized> RosterProvider for &T {
    fn list_roster(&self, class_id: &str) -> Result<Vec<RosterEntry>> {
        (**self).list_roster(class_id)
    }
}

impl<T: InsightStore + ?Sized> InsightStore for std::sync::Arc<T> {
    fn append(&self, insight: NewInsight) -> Result<Insight> {
        (**self).append(insight)
    }

    fn list_by_class(&self, class_id: &str) -> Result<Vec<Insight>> {
        (**self).list_by_class(class_id)
    }

    fn list_by_student(&self, class_id: &str, student_id: &str) -> Result<Vec<Insight>> {
        (**self).list_by_student(class_id, student_id)
    }
}

impl<T: RosterProvider + ?Sized> RosterProvider for std::sync::Arc<T> {
    fn list_roster(&self, class_id: &str) -> Result<Vec<RosterEntry>> {
        (**self).list_roster(class_id)
    }
}

/// Next `created_at` for a store whose last record was stamped `previous`.
///
/// Wall clocks can step backwards; the stamp never does.
pub fn monotonic_timestamp(previous: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = Utc::now();
    match previous {
        Some(prev) if prev > now => prev,
        _ => now,
    }
}

/// Generate a fresh insight id.
pub fn new_insight_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// The most recent insight for a student.
///
/// Ordered by `created_at`; among equal stamps the last inserted wins.
/// `insights` must be in insertion order.
pub fn latest_for_student<'a>(insights: &'a [Insight], student_id: &str) -> Option<&'a Insight> {
    // max_by returns the last of several equal maxima
    insights
        .iter()
        .filter(|i| i.student_id == student_id)
        .max_by(|a, b| a.created_at.cmp(&b.created_at))
}

// ============================================
// In-memory implementations
// ============================================

/// In-memory insight store. One lock guards the whole collection.
#[derive(Debug, Default)]
pub struct MemoryInsightStore {
    insights: Mutex<Vec<Insight>>,
}

impl MemoryInsightStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored insights across all classes.
    pub fn len(&self) -> usize {
        self.insights.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl InsightStore for MemoryInsightStore {
    fn append(&self, insight: NewInsight) -> Result<Insight> {
        let mut insights = self.insights.lock().unwrap();
        let created_at = monotonic_timestamp(insights.last().map(|i| i.created_at));
        let stored = insight.into_insight(new_insight_id(), created_at)?;
        insights.push(stored.clone());
        Ok(stored)
    }

    fn list_by_class(&self, class_id: &str) -> Result<Vec<Insight>> {
        let insights = self.insights.lock().unwrap();
        Ok(insights
            .iter()
            .filter(|i| i.class_id == class_id)
            .cloned()
            .collect())
    }
}

/// Fixed roster, useful for tests and single-file deployments.
#[derive(Debug, Clone, Default)]
pub struct StaticRoster {
    entries: Vec<RosterEntry>,
}

impl StaticRoster {
    pub fn new(entries: Vec<RosterEntry>) -> Self {
        Self { entries }
    }
}

impl RosterProvider for StaticRoster {
    fn list_roster(&self, class_id: &str) -> Result<Vec<RosterEntry>> {
        Ok(self
            .entries
            .iter()
            .filter(|e| e.class_id == class_id)
            .cloned()
            .collect())
    }
}
