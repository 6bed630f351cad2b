use crate::infra::{parse_optional, parse_reference_time, AnalyticsState, AppState};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::Utc;
use lead_analytics::analytics::{
    DashboardReport, GroupBy, GroupFilter, GroupSeriesView, MonthlyQuery, MonthlyReport,
    PerformanceTable, SortColumn, SortDirection, TimeWindow, TrendMetric,
};
use lead_analytics::error::AppError;
use lead_analytics::feed::LeadFeed;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Deserialize)]
pub(crate) struct SummaryRequest {
    /// Raw CRM payload: an array, `{ "leads": [...] }`, or `{ "data": { "leads": [...] } }`.
    pub(crate) leads: Value,
    #[serde(default)]
    pub(crate) group_by: Option<String>,
    #[serde(default)]
    pub(crate) window: Option<String>,
    #[serde(default)]
    pub(crate) now: Option<String>,
    #[serde(default)]
    pub(crate) filter: Option<String>,
    #[serde(default)]
    pub(crate) sort: Option<String>,
    #[serde(default)]
    pub(crate) descending: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MonthlyRequest {
    pub(crate) leads: Value,
    #[serde(default)]
    pub(crate) year: Option<i32>,
    #[serde(default)]
    pub(crate) team: Option<String>,
    #[serde(default)]
    pub(crate) agent: Option<String>,
    #[serde(default)]
    pub(crate) metric: Option<String>,
    /// When set, one series per agent or team is returned alongside the totals.
    #[serde(default)]
    pub(crate) split_by: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct MonthlyResponse {
    #[serde(flatten)]
    pub(crate) report: MonthlyReport,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(crate) groups: Vec<GroupSeriesView>,
}

pub(crate) fn with_analytics_routes(state: Arc<AnalyticsState>) -> Router {
    Router::new()
        .route("/api/v1/leads/summary", post(summary_endpoint))
        .route("/api/v1/leads/monthly", post(monthly_endpoint))
        .with_state(state)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn summary_endpoint(
    State(state): State<Arc<AnalyticsState>>,
    Json(payload): Json<SummaryRequest>,
) -> Result<Json<DashboardReport>, AppError> {
    let SummaryRequest {
        leads,
        group_by,
        window,
        now,
        filter,
        sort,
        descending,
    } = payload;

    let now = match now {
        Some(raw) => parse_reference_time(&raw).map_err(AppError::InvalidRequest)?,
        None => Utc::now(),
    };
    let mut query = state.default_query(now);
    if let Some(group_by) = parse_optional::<GroupBy>(group_by.as_deref())? {
        query.group_by = group_by;
    }
    if let Some(window) = parse_optional::<TimeWindow>(window.as_deref())? {
        query.window = window;
    }
    let sort = parse_optional::<SortColumn>(sort.as_deref())?;

    let leads = LeadFeed::from_json_value(leads)?;
    debug!(leads = leads.len(), ?query, "building lead summary");

    let mut report = state.analytics.dashboard(&leads, &query);
    let mut table = PerformanceTable::new(report.rows);
    if let Some(filter) = filter.as_deref() {
        table = table.filter(filter);
    }
    if let Some(column) = sort {
        let direction = if descending {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        };
        table = table.sort_by(column, direction);
    }
    report.rows = table.into_rows();

    Ok(Json(report))
}

pub(crate) async fn monthly_endpoint(
    State(state): State<Arc<AnalyticsState>>,
    Json(payload): Json<MonthlyRequest>,
) -> Result<Json<MonthlyResponse>, AppError> {
    let MonthlyRequest {
        leads,
        year,
        team,
        agent,
        metric,
        split_by,
    } = payload;

    let group_filter = match (team, agent) {
        (Some(_), Some(_)) => {
            return Err(AppError::InvalidRequest(
                "filter by either team or agent, not both".to_string(),
            ))
        }
        (Some(team), None) => Some(GroupFilter::team(team)),
        (None, Some(agent)) => Some(GroupFilter::agent(agent)),
        (None, None) => None,
    };
    let metric = parse_optional::<TrendMetric>(metric.as_deref())?.unwrap_or_default();
    let split_by = parse_optional::<GroupBy>(split_by.as_deref())?;
    let year = year.unwrap_or_else(|| state.defaults.resolve_year(Utc::now()));

    let mut query = MonthlyQuery::new(year).with_metric(metric);
    if let Some(filter) = group_filter {
        query = query.with_filter(filter);
    }

    let leads = LeadFeed::from_json_value(leads)?;
    debug!(leads = leads.len(), year, ?metric, "building monthly lead report");

    let report = state.analytics.monthly(&leads, &query);
    let groups = match split_by {
        Some(group_by) => state
            .analytics
            .monthly_views_by_group(&leads, year, group_by, metric),
        None => Vec::new(),
    };

    Ok(Json(MonthlyResponse { report, groups }))
}
