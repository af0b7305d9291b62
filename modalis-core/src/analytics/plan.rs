//! Activity plan builder
//!
//! Produces the class-wide base activity, the catalog adaptations for the
//! requested modality, per-style counts, and one personalized plan per
//! roster entry.
//!
//! Either collaborator failing aborts the whole build; a partial plan is
//! never returned.

use super::catalog;
use super::personalize::{personalize, Seed};
use crate::config::PlanConfig;
use crate::error::{Error, Result};
use crate::store::{latest_for_student, InsightStore, RosterProvider};
use crate::types::*;
use chrono::Utc;
use std::collections::BTreeMap;

/// The fixed three-step skeleton shared by every activity.
pub fn base_steps() -> Vec<Step> {
    vec![
        Step::new("Formular tesis", "Define una postura clara y delimitada."),
        Step::new(
            "Evidencias",
            "Selecciona 3 evidencias confiables con cita.",
        ),
        Step::new("Contraargumento", "Anticipa objeciones y respóndelas."),
    ]
}

/// Base activity; an empty `objective` falls back to a topic-derived one.
pub fn build_base(topic: &str, objective: &str) -> ActivityBase {
    let objetivo = if objective.is_empty() {
        format!("Desarrollar pensamiento crítico sobre {}", topic)
    } else {
        objective.to_string()
    };
    ActivityBase {
        objetivo,
        pasos: base_steps(),
    }
}

/// Catalog entries for a selector: all four for `mixed`, else just one.
pub fn adaptations_for(selector: Modality) -> BTreeMap<Modality, ModalityAdaptation> {
    match selector {
        Modality::Mixed => catalog::full_catalog(),
        single => BTreeMap::from([(single, catalog::adaptation_for(single))]),
    }
}

/// Parse a `perfil_aprendizaje` value; absent means `mixed`.
pub fn parse_selector(selector: Option<&str>) -> Result<Modality> {
    selector.unwrap_or("mixed").parse()
}

/// Count insights per normalized modality (`mixed` lands in `reading`).
///
/// Counts insights, not students. Modalities with no insight are absent.
pub fn count_by_style(insights: &[Insight]) -> BTreeMap<Modality, StyleCount> {
    let mut counts: BTreeMap<Modality, StyleCount> = BTreeMap::new();
    for insight in insights {
        counts
            .entry(normalize_for_bucket(insight.modality))
            .or_default()
            .estudiantes += 1;
    }
    counts
}

/// Personalized plan for one roster entry.
pub fn plan_for_student(entry: &RosterEntry, insights: &[Insight], topic: &str) -> PersonalizedPlan {
    let seed = Seed::from_latest(latest_for_student(insights, &entry.student_id));
    let p = personalize(&seed, topic);

    PersonalizedPlan {
        student_id: entry.student_id.clone(),
        nombre: entry.nombre.clone(),
        modalidad: p.modalidad,
        nivel: p.nivel,
        objetivos_personalizados: p.objetivos,
        pasos_personalizados: p.pasos,
        recursos: p.recursos,
    }
}

fn activity_id(class_id: &str) -> String {
    format!("act-{}-{}", class_id, Utc::now().timestamp_millis())
}

/// Build the full activity plan for a class.
pub fn build_plan<S, R>(
    store: &S,
    roster: &R,
    request: &PlanRequest,
    config: &PlanConfig,
) -> Result<ActivityPlan>
where
    S: InsightStore + ?Sized,
    R: RosterProvider + ?Sized,
{
    let class_id = request
        .class_id
        .as_deref()
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| Error::MissingParameter("classId".to_string()))?;
    let selector = parse_selector(request.perfil_aprendizaje.as_deref())?;

    let insights = store.list_by_class(class_id)?;
    let students = roster.list_roster(class_id)?;

    let base = build_base(
        request.titulo.as_deref().unwrap_or(config.default_topic.as_str()),
        request.objetivo.as_deref().unwrap_or(""),
    );
    let topic = request.titulo.as_deref().unwrap_or(config.fallback_topic.as_str());

    let por_estudiante: Vec<PersonalizedPlan> = students
        .iter()
        .map(|entry| plan_for_student(entry, &insights, topic))
        .collect();

    tracing::info!(
        class_id,
        selector = %selector,
        roster = students.len(),
        insights = insights.len(),
        "Activity plan built"
    );

    Ok(ActivityPlan {
        activity: ActivityRef {
            id_actividad: activity_id(class_id),
        },
        stats: PlanStats {
            estudiantes: students.len(),
            planes_creados: por_estudiante.len(),
        },
        por_estilo: count_by_style(&insights),
        base,
        adaptaciones: adaptations_for(selector),
        por_estudiante,
    })
}
