//! Per-student personalization
//!
//! Derives objectives, steps and resources for one student from their most
//! recent insight. Every rule only appends; none removes what another added.
//! Students without any insight get [`Seed::fallback`].

use super::catalog;
use super::plan::base_steps;
use crate::types::{Insight, Level, Metrics, Modality, Step};

/// Skill estimates strictly below this trigger a remediation objective.
pub const METRIC_THRESHOLD: f64 = 70.0;

/// Objective used when no rule produced one.
pub const FALLBACK_OBJECTIVE: &str = "Consolidar argumento con evidencias";

/// The subset of an insight that personalization reads.
#[derive(Debug, Clone, PartialEq)]
pub struct Seed {
    pub modality: Modality,
    pub level: Level,
    pub needs: Vec<String>,
    pub metrics: Option<Metrics>,
}

impl Seed {
    /// Seed for a student with no insight on record.
    ///
    /// Reading modality, intermediate level, a synthesis need, and metrics
    /// that leave only `sintesis` under the threshold.
    pub fn fallback() -> Self {
        Self {
            modality: Modality::Reading,
            level: Level::Intermedio,
            needs: vec!["síntesis".to_string()],
            metrics: Some(Metrics {
                analisis: 70.0,
                reflexion: 70.0,
                sintesis: 60.0,
            }),
        }
    }

    /// Seed from the student's latest insight, or the fallback when absent.
    pub fn from_latest(latest: Option<&Insight>) -> Self {
        latest.map(Seed::from).unwrap_or_else(Seed::fallback)
    }

    fn has_need(&self, need: &str) -> bool {
        self.needs.iter().any(|n| n == need)
    }
}

impl From<&Insight> for Seed {
    fn from(insight: &Insight) -> Self {
        Self {
            modality: insight.modality,
            level: insight.level,
            needs: insight.needs.clone(),
            metrics: insight.metrics,
        }
    }
}

/// Result of personalizing one seed.
#[derive(Debug, Clone, PartialEq)]
pub struct Personalization {
    pub objetivos: Vec<String>,
    pub pasos: Vec<Step>,
    pub recursos: Vec<String>,
    /// Raw modality of the seed, not the one used for resource lookup
    pub modalidad: Modality,
    pub nivel: Level,
}

/// Apply every derivation rule to `seed`, tying the final step to `topic`.
pub fn personalize(seed: &Seed, topic: &str) -> Personalization {
    let mut objetivos = Vec::new();
    let mut pasos = Vec::new();

    if seed.has_need("síntesis") || seed.has_need("sintesis") {
        objetivos.push("Mejorar la síntesis de información".to_string());
        pasos.push(Step::new(
            "Esquema 10-20-30",
            "Reduce a 10 ideas, 20 palabras, 30 segundos.",
        ));
    }
    if seed.has_need("contraargumentos") {
        objetivos.push("Fortalecer el manejo de contraargumentos".to_string());
        pasos.push(Step::new(
            "Tabla Objeción-Respuesta-Evidencia",
            "Completa O-R-E con fuentes.",
        ));
    }
    if let Some(metrics) = seed.metrics {
        if metrics.analisis < METRIC_THRESHOLD {
            objetivos.push("Profundizar en análisis de causas/efectos".to_string());
        }
        if metrics.reflexion < METRIC_THRESHOLD {
            objetivos.push("Elevar reflexión metacognitiva".to_string());
        }
        if metrics.sintesis < METRIC_THRESHOLD {
            objetivos.push("Mejorar síntesis".to_string());
        }
    }

    match seed.level {
        Level::Basico => pasos.push(Step::new(
            "Andamiaje básico",
            "Plantilla Causa–Evidencia–Conclusión.",
        )),
        Level::Avanzado => pasos.push(Step::new(
            "Indicadores",
            "Define 2 KPIs para evaluar tu propuesta.",
        )),
        Level::Intermedio => {}
    }

    pasos.push(Step::new(
        format!("Aplicación al contexto: {}", topic),
        "Conecta con un caso local.",
    ));

    if objetivos.is_empty() {
        objetivos.push(FALLBACK_OBJECTIVE.to_string());
    }
    if pasos.is_empty() {
        pasos = base_steps();
    }

    Personalization {
        objetivos,
        pasos,
        recursos: catalog::resources_for(seed.modality),
        modalidad: seed.modality,
        nivel: seed.level,
    }
}
