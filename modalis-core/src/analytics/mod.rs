//! Learning-signal analytics for modalis
//!
//! Pure reductions over already-fetched insights:
//! - Group profile (modality counts and dominant modality)
//! - Modality adaptation catalog
//! - Per-student personalization
//! - Activity plan building
//!
//! Only [`profile::group_profile`] and [`plan::build_plan`] touch a store;
//! everything else is a total function of its inputs.

pub mod catalog;
pub mod personalize;
pub mod plan;
pub mod profile;

pub use catalog::{adaptation_for, full_catalog, resources_for};
pub use personalize::{personalize, Personalization, Seed, FALLBACK_OBJECTIVE, METRIC_THRESHOLD};
pub use plan::{
    adaptations_for, base_steps, build_base, build_plan, count_by_style, parse_selector,
    plan_for_student,
};
pub use profile::{compute_group_profile, dominant_modality, group_profile};
