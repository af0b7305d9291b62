//! Default activities and resources per learning modality.
//!
//! Static configuration data; never changes at runtime. `mixed` has no entry
//! of its own and resolves through [`normalize_for_bucket`].

use crate::types::{normalize_for_bucket, Modality, ModalityAdaptation};
use std::collections::BTreeMap;

struct CatalogEntry {
    activities: &'static [&'static str],
    resources: &'static [&'static str],
}

static VISUAL: CatalogEntry = CatalogEntry {
    activities: &[
        "Mapa conceptual de causas/efectos",
        "Análisis de 2 infografías",
        "Línea de tiempo visual",
    ],
    resources: &["Diagramas de flujo", "Gráficos", "Videos cortos"],
};

static AUDITORY: CatalogEntry = CatalogEntry {
    activities: &[
        "Debate estructurado",
        "Podcast + resumen oral",
        "Pitch de 2 minutos",
    ],
    resources: &["Podcasts", "Grabaciones", "Rúbrica de debate"],
};

static READING: CatalogEntry = CatalogEntry {
    activities: &[
        "Ensayo breve (3 evidencias)",
        "Fichas de 2 artículos (APA)",
        "Glosario de conceptos",
    ],
    resources: &["Artículos", "Reportes", "Guía de citas"],
};

static KINESTHETIC: CatalogEntry = CatalogEntry {
    activities: &[
        "Experimento/medición local",
        "Plan de intervención",
        "Role-play de decisiones",
    ],
    resources: &["Kits/Materiales", "Plantillas de proyecto", "Checklists"],
};

fn entry(modality: Modality) -> &'static CatalogEntry {
    match normalize_for_bucket(modality) {
        Modality::Visual => &VISUAL,
        Modality::Auditory => &AUDITORY,
        Modality::Kinesthetic => &KINESTHETIC,
        Modality::Reading | Modality::Mixed => &READING,
    }
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Catalog entry for a modality (`mixed` resolves to `reading`).
pub fn adaptation_for(modality: Modality) -> ModalityAdaptation {
    let entry = entry(modality);
    ModalityAdaptation {
        actividades: owned(entry.activities),
        recursos: owned(entry.resources),
    }
}

/// Default resources for a modality (`mixed` resolves to `reading`).
pub fn resources_for(modality: Modality) -> Vec<String> {
    owned(entry(modality).resources)
}

/// The whole catalog, keyed by the four countable modalities.
pub fn full_catalog() -> BTreeMap<Modality, ModalityAdaptation> {
    Modality::BUCKETS
        .iter()
        .map(|m| (*m, adaptation_for(*m)))
        .collect()
}
