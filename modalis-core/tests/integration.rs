//! Integration tests for the insight store and the plan engine
//!
//! These run the SQLite-backed store and the in-memory substitutes through
//! the same scenarios the dashboard drives in production.

use modalis_core::analytics::{personalize, Seed};
use modalis_core::store::latest_for_student;
use modalis_core::{
    Database, Error, InsightStore, LearningService, Level, MemoryInsightStore, Modality,
    NewInsight, PlanRequest, RosterEntry, StaticRoster,
};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

fn migrated_db() -> Database {
    let db = Database::open_in_memory().expect("open in-memory db");
    db.migrate().expect("migrate");
    db
}

fn topic(n: usize) -> NewInsight {
    NewInsight {
        recent_topic: Some(n.to_string()),
        ..Default::default()
    }
}

// ============================================
// Insight store
// ============================================

fn assert_concurrent_appends_keep_order<S: InsightStore + 'static>(store: Arc<S>) {
    const WRITERS: usize = 8;
    const PER_WRITER: usize = 25;

    let handles: Vec<_> = (0..WRITERS)
        .map(|w| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for n in 0..PER_WRITER {
                    let insight = NewInsight {
                        class_id: "c1".to_string(),
                        student_id: format!("s{}", w),
                        ..topic(n)
                    };
                    store.append(insight).expect("append");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("writer panicked");
    }

    let all = store.list_by_class("c1").unwrap();
    assert_eq!(all.len(), WRITERS * PER_WRITER, "no append may be lost");

    for w in 0..WRITERS {
        let student = format!("s{}", w);
        let seen: Vec<String> = store
            .list_by_student("c1", &student)
            .unwrap()
            .into_iter()
            .filter_map(|i| i.recent_topic)
            .collect();
        let expected: Vec<String> = (0..PER_WRITER).map(|n| n.to_string()).collect();
        assert_eq!(seen, expected, "appends for {} out of order", student);

        let latest = latest_for_student(&all, &student).unwrap();
        assert_eq!(
            latest.recent_topic.as_deref(),
            Some((PER_WRITER - 1).to_string().as_str())
        );
    }

    for pair in all.windows(2) {
        assert!(pair[0].created_at <= pair[1].created_at);
    }
}

#[test]
fn test_concurrent_appends_sqlite() {
    assert_concurrent_appends_keep_order(Arc::new(migrated_db()));
}

#[test]
fn test_concurrent_appends_memory() {
    assert_concurrent_appends_keep_order(Arc::new(MemoryInsightStore::new()));
}

#[test]
fn test_concurrent_appends_across_connections() {
    const WRITERS: usize = 8;
    const PER_WRITER: usize = 50;

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data.db");
    let handles: Vec<Arc<Database>> = (0..2)
        .map(|_| {
            let db = Database::open(&path).unwrap();
            db.set_busy_timeout(Duration::from_secs(5)).unwrap();
            db.migrate().unwrap();
            Arc::new(db)
        })
        .collect();

    let writers: Vec<_> = (0..WRITERS)
        .map(|w| {
            let db = Arc::clone(&handles[w % handles.len()]);
            thread::spawn(move || {
                for n in 0..PER_WRITER {
                    let insight = NewInsight {
                        class_id: "c1".to_string(),
                        student_id: format!("s{}", w),
                        ..topic(n)
                    };
                    db.append(insight).expect("append");
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().expect("writer panicked");
    }

    let all = handles[0].list_by_class("c1").unwrap();
    assert_eq!(all.len(), WRITERS * PER_WRITER);
    for pair in all.windows(2) {
        assert!(pair[0].created_at <= pair[1].created_at);
    }
    for w in 0..WRITERS {
        let student = format!("s{}", w);
        let latest = handles[1].get_latest_insight("c1", &student).unwrap().unwrap();
        assert_eq!(
            latest.recent_topic.as_deref(),
            Some((PER_WRITER - 1).to_string().as_str())
        );
    }
}

#[test]
fn test_latest_insight_is_last_appended() {
    let db = migrated_db();
    db.append(NewInsight::new("c1", "s1").with_modality(Modality::Visual))
        .unwrap();
    let b = db
        .append(NewInsight::new("c1", "s1").with_modality(Modality::Auditory))
        .unwrap();

    let insights = db.list_by_class("c1").unwrap();
    assert_eq!(latest_for_student(&insights, "s1").unwrap().id, b.id);
    assert_eq!(db.get_latest_insight("c1", "s1").unwrap().unwrap().id, b.id);
}

#[test]
fn test_list_by_class_is_idempotent() {
    let db = migrated_db();
    for n in 0..3 {
        db.append(NewInsight {
            class_id: "c1".to_string(),
            student_id: "s1".to_string(),
            ..topic(n)
        })
        .unwrap();
    }
    assert_eq!(db.list_by_class("c1").unwrap(), db.list_by_class("c1").unwrap());
    assert!(db.list_by_class("empty").unwrap().is_empty());
}

#[test]
fn test_insights_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested/data.db");

    let id = {
        let db = Database::open(&path).unwrap();
        db.migrate().unwrap();
        db.append(
            NewInsight::new("c1", "s1")
                .with_level(Level::Avanzado)
                .with_metrics(10.0, 20.0, 30.0),
        )
        .unwrap()
        .id
    };

    let db = Database::open(&path).unwrap();
    db.migrate().unwrap();
    let insights = db.list_by_class("c1").unwrap();
    assert_eq!(insights.len(), 1);
    assert_eq!(insights[0].id, id);
    assert_eq!(insights[0].level, Level::Avanzado);
    assert_eq!(insights[0].metrics.unwrap().sintesis, 30.0);
}

#[test]
fn test_roster_membership_is_not_validated() {
    let db = migrated_db();
    db.upsert_roster_entry(&RosterEntry::new("c1", "s1", "Ana"))
        .unwrap();
    db.append(NewInsight::new("c1", "stranger")).unwrap();
    assert_eq!(db.list_by_class("c1").unwrap().len(), 1);
}

// ============================================
// Group profile
// ============================================

#[test]
fn test_group_profile_totals() {
    let db = Arc::new(migrated_db());
    let svc = LearningService::new(db.clone(), db.clone());
    for _ in 0..3 {
        svc.record_insight(NewInsight::new("c1", "s1").with_modality(Modality::Visual))
            .unwrap();
    }
    svc.record_insight(NewInsight::new("c1", "s2").with_modality(Modality::Auditory))
        .unwrap();
    svc.record_insight(NewInsight::new("c2", "s9").with_modality(Modality::Kinesthetic))
        .unwrap();

    let profile = svc.group_profile(Some("c1")).unwrap();
    assert_eq!(profile.total, 2);
    assert_eq!(profile.counts.visual, 3);
    assert_eq!(profile.counts.auditory, 1);
    assert_eq!(profile.counts.kinesthetic, 0);
    assert_eq!(profile.dominant, Modality::Visual);
}

#[test]
fn test_all_mixed_profile() {
    let svc = LearningService::new(MemoryInsightStore::new(), StaticRoster::default());
    for s in ["s1", "s2", "s3"] {
        svc.record_insight(NewInsight::new("c1", s).with_modality(Modality::Mixed))
            .unwrap();
    }
    let profile = svc.group_profile(Some("c1")).unwrap();
    assert_eq!(profile.counts.visual + profile.counts.auditory, 0);
    assert_eq!(profile.counts.reading + profile.counts.kinesthetic, 0);
    assert_eq!(profile.dominant, Modality::Mixed);
}

// ============================================
// Activity plan
// ============================================

#[test]
fn test_personalization_additivity() {
    let insight = MemoryInsightStore::new()
        .append(
            NewInsight::new("c1", "s1")
                .with_needs(["síntesis", "contraargumentos"])
                .with_metrics(50.0, 80.0, 40.0),
        )
        .unwrap();
    let p = personalize(&Seed::from(&insight), "Agua");

    assert!(p.objetivos.len() >= 3);
    assert!(p
        .objetivos
        .contains(&"Profundizar en análisis de causas/efectos".to_string()));
    assert!(!p.objetivos.contains(&"Elevar reflexión metacognitiva".to_string()));
    assert_eq!(p.pasos.last().unwrap().titulo, "Aplicación al contexto: Agua");
}

#[test]
fn test_full_plan_against_sqlite() {
    let db = Arc::new(migrated_db());
    for (id, name) in [("s1", "Ana"), ("s2", "Beto"), ("s3", "Carla")] {
        db.upsert_roster_entry(&RosterEntry::new("c1", id, name))
            .unwrap();
    }
    let svc = LearningService::new(db.clone(), db.clone());

    svc.record_insight(
        NewInsight::new("c1", "s1")
            .with_modality(Modality::Visual)
            .with_level(Level::Basico),
    )
    .unwrap();
    svc.record_insight(
        NewInsight::new("c1", "s1")
            .with_modality(Modality::Kinesthetic)
            .with_needs(["contraargumentos"]),
    )
    .unwrap();
    svc.record_insight(NewInsight::new("c1", "s2").with_modality(Modality::Mixed))
        .unwrap();

    let request = PlanRequest {
        titulo: Some("Movilidad urbana".to_string()),
        objetivo: Some("Proponer mejoras al transporte".to_string()),
        perfil_aprendizaje: Some("kinesthetic".to_string()),
        ..PlanRequest::for_class("c1")
    };
    let plan = svc.generate_plan(&request).unwrap();

    assert_eq!(plan.base.objetivo, "Proponer mejoras al transporte");
    assert_eq!(plan.adaptaciones.len(), 1);
    assert!(plan.adaptaciones.contains_key(&Modality::Kinesthetic));
    assert_eq!(plan.stats.estudiantes, 3);
    assert_eq!(plan.stats.planes_creados, 3);

    assert_eq!(plan.por_estilo[&Modality::Visual].estudiantes, 1);
    assert_eq!(plan.por_estilo[&Modality::Kinesthetic].estudiantes, 1);
    assert_eq!(plan.por_estilo[&Modality::Reading].estudiantes, 1);

    let ana = &plan.por_estudiante[0];
    assert_eq!(ana.student_id, "s1");
    assert_eq!(ana.modalidad, Modality::Kinesthetic);
    assert_eq!(ana.nivel, Level::Intermedio);
    assert_eq!(
        ana.objetivos_personalizados,
        vec!["Fortalecer el manejo de contraargumentos"]
    );

    let beto = &plan.por_estudiante[1];
    assert_eq!(beto.modalidad, Modality::Mixed);
    assert_eq!(beto.recursos, vec!["Artículos", "Reportes", "Guía de citas"]);
    assert_eq!(
        beto.objetivos_personalizados,
        vec!["Consolidar argumento con evidencias"]
    );

    let carla = &plan.por_estudiante[2];
    assert_eq!(carla.modalidad, Modality::Reading);
    assert_eq!(
        carla.pasos_personalizados.last().unwrap().titulo,
        "Aplicación al contexto: Movilidad urbana"
    );
}

#[test]
fn test_fallback_plan_is_deterministic() {
    let svc = LearningService::new(
        MemoryInsightStore::new(),
        StaticRoster::new(vec![RosterEntry::new("c1", "s1", "Ana")]),
    );
    let request = PlanRequest {
        titulo: Some("Test".to_string()),
        ..PlanRequest::for_class("c1")
    };
    let first = svc.generate_plan(&request).unwrap();
    let second = svc.generate_plan(&request).unwrap();
    assert_eq!(first.por_estudiante, second.por_estudiante);
    assert_eq!(first.base, second.base);
}

#[test]
fn test_empty_roster_plan() {
    let svc = LearningService::new(MemoryInsightStore::new(), StaticRoster::default());
    let plan = svc.generate_plan(&PlanRequest::for_class("c1")).unwrap();
    assert!(plan.por_estudiante.is_empty());
    assert_eq!(plan.stats.planes_creados, 0);
    assert_eq!(plan.stats.estudiantes, 0);
    assert_eq!(plan.adaptaciones.len(), 4);
}

#[test]
fn test_invalid_modality_plan() {
    let svc = LearningService::new(MemoryInsightStore::new(), StaticRoster::default());
    let request = PlanRequest {
        perfil_aprendizaje: Some("olfactory".to_string()),
        ..PlanRequest::for_class("c1")
    };
    assert!(matches!(
        svc.generate_plan(&request),
        Err(Error::InvalidModality(_))
    ));
}

#[test]
fn test_store_failure_aborts_plan() {
    // Never migrated: every query fails
    let db = Arc::new(Database::open_in_memory().unwrap());
    let svc = LearningService::new(db.clone(), db);
    let err = svc
        .generate_plan(&PlanRequest::for_class("c1"))
        .unwrap_err();
    assert!(matches!(err, Error::StoreUnavailable(_)));
    assert!(err.is_retryable());
}
