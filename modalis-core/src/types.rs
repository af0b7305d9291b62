//! Core domain types for modalis
//!
//! These types are the wire contract shared by the store, the engine and
//! every transport in front of it. Field names serialize exactly as the
//! existing dashboard consumers expect them.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Insight** | One inferred learning signal for a student in a class |
//! | **Modality** | Learning-style category, or `mixed` when undetermined |
//! | **Roster** | The students enrolled in a class, owned by an external provider |
//! | **Group profile** | Modality counts and dominant modality for a class |
//! | **Catalog** | Static default activities/resources per modality |
//! | **Personalized plan** | Objectives, steps and resources derived from a student's latest insight |

use crate::error::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================
// Modality
// ============================================

/// Learning-style preference inferred for an interaction.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Visual,
    Auditory,
    Reading,
    Kinesthetic,
    /// Undetermined or blended preference
    #[default]
    Mixed,
}

impl Modality {
    /// Every recognized modality, including `mixed`.
    pub const ALL: [Modality; 5] = [
        Modality::Visual,
        Modality::Auditory,
        Modality::Reading,
        Modality::Kinesthetic,
        Modality::Mixed,
    ];

    /// The four countable modalities, in dominant tie-break precedence order.
    pub const BUCKETS: [Modality; 4] = [
        Modality::Visual,
        Modality::Auditory,
        Modality::Reading,
        Modality::Kinesthetic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Visual => "visual",
            Modality::Auditory => "auditory",
            Modality::Reading => "reading",
            Modality::Kinesthetic => "kinesthetic",
            Modality::Mixed => "mixed",
        }
    }
}

impl std::fmt::Display for Modality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Modality {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "visual" => Ok(Modality::Visual),
            "auditory" => Ok(Modality::Auditory),
            "reading" => Ok(Modality::Reading),
            "kinesthetic" => Ok(Modality::Kinesthetic),
            "mixed" => Ok(Modality::Mixed),
            _ => Err(Error::InvalidModality(s.to_string())),
        }
    }
}

/// Collapse `mixed` into `reading` for catalog lookups and style buckets.
///
/// Both resource lookup and per-style counting go through here so the two
/// can never disagree.
pub fn normalize_for_bucket(modality: Modality) -> Modality {
    match modality {
        Modality::Mixed => Modality::Reading,
        other => other,
    }
}

// ============================================
// Level
// ============================================

/// Proficiency level attached to an insight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Basico,
    #[default]
    Intermedio,
    Avanzado,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Basico => "basico",
            Level::Intermedio => "intermedio",
            Level::Avanzado => "avanzado",
        }
    }
}

impl std::str::FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basico" => Ok(Level::Basico),
            "intermedio" => Ok(Level::Intermedio),
            "avanzado" => Ok(Level::Avanzado),
            _ => Err(Error::Validation(format!("unknown level: {}", s))),
        }
    }
}

// ============================================
// Insight
// ============================================

/// Cognitive-skill estimates at insight time, each in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub analisis: f64,
    pub reflexion: f64,
    pub sintesis: f64,
}

impl Metrics {
    /// Reject non-finite values and clamp the rest into [0, 100].
    pub fn sanitized(self) -> crate::Result<Self> {
        let clamp = |name: &str, v: f64| {
            if v.is_finite() {
                Ok(v.clamp(0.0, 100.0))
            } else {
                Err(Error::Validation(format!("metrics.{} must be a number", name)))
            }
        };
        Ok(Self {
            analisis: clamp("analisis", self.analisis)?,
            reflexion: clamp("reflexion", self.reflexion)?,
            sintesis: clamp("sintesis", self.sintesis)?,
        })
    }
}

/// Insight submission, as produced by the chat signal extractor.
///
/// Missing `classId`/`studentId` deserialize as empty strings so that the
/// store can report them as a validation error instead of a parse failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInsight {
    #[serde(default)]
    pub class_id: String,
    #[serde(default)]
    pub student_id: String,
    #[serde(default)]
    pub modality: Option<Modality>,
    #[serde(default)]
    pub level: Option<Level>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub needs: Vec<String>,
    #[serde(default)]
    pub recent_topic: Option<String>,
    #[serde(default)]
    pub metrics: Option<Metrics>,
}

impl NewInsight {
    /// Start a submission for the given class and student.
    pub fn new(class_id: impl Into<String>, student_id: impl Into<String>) -> Self {
        Self {
            class_id: class_id.into(),
            student_id: student_id.into(),
            ..Default::default()
        }
    }

    pub fn with_modality(mut self, modality: Modality) -> Self {
        self.modality = Some(modality);
        self
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = Some(level);
        self
    }

    pub fn with_needs<I, S>(mut self, needs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.needs = needs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_metrics(mut self, analisis: f64, reflexion: f64, sintesis: f64) -> Self {
        self.metrics = Some(Metrics {
            analisis,
            reflexion,
            sintesis,
        });
        self
    }

    /// Validate required fields and build the stored record.
    ///
    /// The caller supplies `id` and `created_at`; stores are responsible for
    /// keeping `created_at` monotonic.
    pub fn into_insight(self, id: String, created_at: DateTime<Utc>) -> crate::Result<Insight> {
        if self.class_id.trim().is_empty() {
            return Err(Error::Validation("classId is required".to_string()));
        }
        if self.student_id.trim().is_empty() {
            return Err(Error::Validation("studentId is required".to_string()));
        }
        let metrics = self.metrics.map(Metrics::sanitized).transpose()?;

        Ok(Insight {
            id,
            class_id: self.class_id,
            student_id: self.student_id,
            created_at,
            modality: self.modality.unwrap_or_default(),
            level: self.level.unwrap_or_default(),
            strengths: self.strengths,
            needs: self.needs,
            recent_topic: self.recent_topic,
            metrics,
        })
    }
}

/// A stored learning signal. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    pub id: String,
    pub class_id: String,
    pub student_id: String,
    pub created_at: DateTime<Utc>,
    pub modality: Modality,
    pub level: Level,
    pub strengths: Vec<String>,
    pub needs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent_topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Metrics>,
}

// ============================================
// Roster
// ============================================

/// A student enrolled in a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub student_id: String,
    pub nombre: String,
    pub class_id: String,
}

impl RosterEntry {
    pub fn new(
        class_id: impl Into<String>,
        student_id: impl Into<String>,
        nombre: impl Into<String>,
    ) -> Self {
        Self {
            student_id: student_id.into(),
            nombre: nombre.into(),
            class_id: class_id.into(),
        }
    }
}

// ============================================
// Group profile
// ============================================

/// Per-modality occurrence counts. `mixed` is never counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModalityCounts {
    pub visual: u32,
    pub auditory: u32,
    pub reading: u32,
    pub kinesthetic: u32,
}

impl ModalityCounts {
    pub fn get(&self, modality: Modality) -> u32 {
        match modality {
            Modality::Visual => self.visual,
            Modality::Auditory => self.auditory,
            Modality::Reading => self.reading,
            Modality::Kinesthetic => self.kinesthetic,
            Modality::Mixed => 0,
        }
    }

    /// Count one occurrence; `mixed` is ignored.
    pub fn increment(&mut self, modality: Modality) {
        match modality {
            Modality::Visual => self.visual += 1,
            Modality::Auditory => self.auditory += 1,
            Modality::Reading => self.reading += 1,
            Modality::Kinesthetic => self.kinesthetic += 1,
            Modality::Mixed => {}
        }
    }
}

/// Class-level learning-modality profile. Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupProfile {
    /// Distinct students with at least one insight
    pub total: usize,
    pub counts: ModalityCounts,
    pub dominant: Modality,
}

// ============================================
// Activity plan
// ============================================

/// One step of an activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub titulo: String,
    pub descripcion: String,
}

impl Step {
    pub fn new(titulo: impl Into<String>, descripcion: impl Into<String>) -> Self {
        Self {
            titulo: titulo.into(),
            descripcion: descripcion.into(),
        }
    }
}

/// Class-wide activity shared by every modality before personalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityBase {
    pub objetivo: String,
    pub pasos: Vec<Step>,
}

/// Catalog entry for one modality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModalityAdaptation {
    pub actividades: Vec<String>,
    pub recursos: Vec<String>,
}

/// Student-specific plan. Computed fresh on every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalizedPlan {
    #[serde(rename = "studentId")]
    pub student_id: String,
    pub nombre: String,
    pub modalidad: Modality,
    pub nivel: Level,
    pub objetivos_personalizados: Vec<String>,
    pub pasos_personalizados: Vec<Step>,
    pub recursos: Vec<String>,
}

/// Identifier of a generated activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRef {
    pub id_actividad: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStats {
    pub estudiantes: usize,
    pub planes_creados: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleCount {
    pub estudiantes: u32,
}

/// Full response of the activity plan builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityPlan {
    pub activity: ActivityRef,
    pub stats: PlanStats,
    pub por_estilo: BTreeMap<Modality, StyleCount>,
    pub base: ActivityBase,
    pub adaptaciones: BTreeMap<Modality, ModalityAdaptation>,
    pub por_estudiante: Vec<PersonalizedPlan>,
}

/// Activity plan request as submitted by a teacher.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRequest {
    #[serde(default, rename = "classId", alias = "id_clase")]
    pub class_id: Option<String>,
    #[serde(default)]
    pub titulo: Option<String>,
    #[serde(default)]
    pub objetivo: Option<String>,
    /// Modality selector; `mixed` when absent
    #[serde(default)]
    pub perfil_aprendizaje: Option<String>,
}

impl PlanRequest {
    pub fn for_class(class_id: impl Into<String>) -> Self {
        Self {
            class_id: Some(class_id.into()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modality_roundtrip_names() {
        for m in Modality::ALL {
            assert_eq!(m.as_str().parse::<Modality>().unwrap(), m);
        }
        let err = "olfactory".parse::<Modality>().unwrap_err();
        assert!(matches!(err, Error::InvalidModality(ref s) if s == "olfactory"));
    }

    #[test]
    fn test_normalize_for_bucket() {
        assert_eq!(normalize_for_bucket(Modality::Mixed), Modality::Reading);
        assert_eq!(normalize_for_bucket(Modality::Visual), Modality::Visual);
        assert_eq!(normalize_for_bucket(Modality::Reading), Modality::Reading);
    }

    #[test]
    fn test_new_insight_wire_names() {
        let json = r#"{
            "classId": "c1",
            "studentId": "s1",
            "modality": "visual",
            "level": "avanzado",
            "needs": ["síntesis"],
            "recentTopic": "Cambio climático",
            "metrics": {"analisis": 72, "reflexion": 68, "sintesis": 61}
        }"#;
        let input: NewInsight = serde_json::from_str(json).unwrap();
        assert_eq!(input.class_id, "c1");
        assert_eq!(input.modality, Some(Modality::Visual));
        assert_eq!(input.level, Some(Level::Avanzado));
        assert!(input.strengths.is_empty());
        assert_eq!(input.metrics.unwrap().sintesis, 61.0);
    }

    #[test]
    fn test_into_insight_requires_ids() {
        let err = NewInsight::new("", "s1")
            .into_insight("i".into(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let err = NewInsight::new("c1", "  ")
            .into_insight("i".into(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_into_insight_defaults() {
        let insight = NewInsight::new("c1", "s1")
            .into_insight("i".into(), Utc::now())
            .unwrap();
        assert_eq!(insight.modality, Modality::Mixed);
        assert_eq!(insight.level, Level::Intermedio);
        assert!(insight.metrics.is_none());
    }

    #[test]
    fn test_metrics_are_clamped() {
        let insight = NewInsight::new("c1", "s1")
            .with_metrics(-5.0, 120.0, 50.0)
            .into_insight("i".into(), Utc::now())
            .unwrap();
        let m = insight.metrics.unwrap();
        assert_eq!(m.analisis, 0.0);
        assert_eq!(m.reflexion, 100.0);
        assert_eq!(m.sintesis, 50.0);

        let err = NewInsight::new("c1", "s1")
            .with_metrics(f64::NAN, 1.0, 1.0)
            .into_insight("i".into(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_plan_request_accepts_legacy_class_key() {
        let req: PlanRequest = serde_json::from_str(r#"{"id_clase": "c9"}"#).unwrap();
        assert_eq!(req.class_id.as_deref(), Some("c9"));
        let req: PlanRequest = serde_json::from_str(r#"{"classId": "c8"}"#).unwrap();
        assert_eq!(req.class_id.as_deref(), Some("c8"));
    }

    #[test]
    fn test_modality_map_keys_serialize_as_names() {
        let mut map = BTreeMap::new();
        map.insert(Modality::Reading, StyleCount { estudiantes: 2 });
        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json["reading"]["estudiantes"], 2);
    }
}
