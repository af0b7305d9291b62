//! Request-level entry points
//!
//! [`LearningService`] owns an injected [`InsightStore`] and
//! [`RosterProvider`] and serves the four external operations: record an
//! insight, list a class's insights, compute the group profile, and generate
//! an activity plan. [`LearningService::handle`] wraps them behind a tagged
//! request/response pair so that any transport gets errors back as values.

use crate::analytics;
use crate::config::PlanConfig;
use crate::error::{Error, Result};
use crate::store::{InsightStore, RosterProvider};
use crate::types::*;
use serde::{Deserialize, Serialize};

/// Acknowledgement for a recorded insight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedInsight {
    pub ok: bool,
    pub id: String,
}

/// A single operation, tagged by `op`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    RecordInsight(NewInsight),
    ClassInsights {
        #[serde(default, rename = "classId")]
        class_id: Option<String>,
    },
    GroupProfile {
        #[serde(default, rename = "classId")]
        class_id: Option<String>,
    },
    ActivityPlan(PlanRequest),
}

/// Structured failure returned in place of a payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: &'static str,
    pub status: u16,
}

impl From<&Error> for ErrorBody {
    fn from(err: &Error) -> Self {
        Self {
            error: err.to_string(),
            kind: err.kind(),
            status: err.status(),
        }
    }
}

/// Outcome of a [`Request`], tagged by `result`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Response {
    Recorded(RecordedInsight),
    Insights { insights: Vec<Insight> },
    Profile(GroupProfile),
    Plan(ActivityPlan),
    Error(ErrorBody),
}

impl Response {
    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error(_))
    }
}

fn required<'a>(name: &str, value: Option<&'a str>) -> Result<&'a str> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| Error::MissingParameter(name.to_string()))
}

/// The learning-signal engine bound to its collaborators.
pub struct LearningService<S, R> {
    store: S,
    roster: R,
    plan: PlanConfig,
}

impl<S, R> LearningService<S, R>
where
    S: InsightStore,
    R: RosterProvider,
{
    pub fn new(store: S, roster: R) -> Self {
        Self {
            store,
            roster,
            plan: PlanConfig::default(),
        }
    }

    /// Override the topics used for untitled plan requests.
    pub fn with_plan_config(mut self, plan: PlanConfig) -> Self {
        self.plan = plan;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn roster(&self) -> &R {
        &self.roster
    }

    /// Record a chat-derived insight.
    pub fn record_insight(&self, insight: NewInsight) -> Result<RecordedInsight> {
        let stored = self.store.append(insight)?;
        Ok(RecordedInsight {
            ok: true,
            id: stored.id,
        })
    }

    /// Insights for a class, in insertion order.
    pub fn class_insights(&self, class_id: Option<&str>) -> Result<Vec<Insight>> {
        let class_id = required("classId", class_id)?;
        self.store.list_by_class(class_id)
    }

    /// Modality profile for a class.
    pub fn group_profile(&self, class_id: Option<&str>) -> Result<GroupProfile> {
        let class_id = required("classId", class_id)?;
        analytics::group_profile(&self.store, class_id)
    }

    /// Activity plan with per-student personalization.
    pub fn generate_plan(&self, request: &PlanRequest) -> Result<ActivityPlan> {
        analytics::build_plan(&self.store, &self.roster, request, &self.plan)
    }

    fn dispatch(&self, request: Request) -> Result<Response> {
        match request {
            Request::RecordInsight(insight) => self.record_insight(insight).map(Response::Recorded),
            Request::ClassInsights { class_id } => self
                .class_insights(class_id.as_deref())
                .map(|insights| Response::Insights { insights }),
            Request::GroupProfile { class_id } => self
                .group_profile(class_id.as_deref())
                .map(Response::Profile),
            Request::ActivityPlan(plan) => self.generate_plan(&plan).map(Response::Plan),
        }
    }

    /// Serve one request; failures come back as [`Response::Error`].
    pub fn handle(&self, request: Request) -> Response {
        match self.dispatch(request) {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(kind = err.kind(), error = %err, "Request failed");
                Response::Error(ErrorBody::from(&err))
            }
        }
    }

    /// Parse and serve a JSON-encoded request.
    pub fn handle_json(&self, line: &str) -> Response {
        match serde_json::from_str::<Request>(line) {
            Ok(request) => self.handle(request),
            Err(e) => {
                let err = Error::Validation(format!("invalid request: {}", e));
                Response::Error(ErrorBody::from(&err))
            }
        }
    }
}
