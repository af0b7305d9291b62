//! Class-level learning-modality profile
//!
//! Reduces every insight of a class into per-modality counts and a single
//! dominant modality.

use crate::error::Result;
use crate::store::InsightStore;
use crate::types::{GroupProfile, Insight, Modality, ModalityCounts};
use std::collections::HashSet;

/// Reduce a class's insights into a [`GroupProfile`].
///
/// `total` counts distinct students, while `counts` counts insights: a student
/// with five visual insights contributes five to `visual`.
pub fn compute_group_profile(insights: &[Insight]) -> GroupProfile {
    let mut counts = ModalityCounts::default();
    let mut students = HashSet::new();

    for insight in insights {
        students.insert(insight.student_id.as_str());
        counts.increment(insight.modality);
    }

    GroupProfile {
        total: students.len(),
        counts,
        dominant: dominant_modality(&counts),
    }
}

/// Highest-count modality, or `mixed` when nothing was counted.
///
/// Ties go to the earliest entry of [`Modality::BUCKETS`]:
/// visual, then auditory, then reading, then kinesthetic.
pub fn dominant_modality(counts: &ModalityCounts) -> Modality {
    let mut best = Modality::Mixed;
    let mut best_count = 0;
    for modality in Modality::BUCKETS {
        let count = counts.get(modality);
        if count > best_count {
            best = modality;
            best_count = count;
        }
    }
    best
}

/// Fetch a class's insights and compute its profile.
pub fn group_profile<S: InsightStore + ?Sized>(store: &S, class_id: &str) -> Result<GroupProfile> {
    let insights = store.list_by_class(class_id)?;
    let profile = compute_group_profile(&insights);

    tracing::debug!(
        class_id,
        insights = insights.len(),
        students = profile.total,
        dominant = %profile.dominant,
        "Group profile computed"
    );

    Ok(profile)
}
