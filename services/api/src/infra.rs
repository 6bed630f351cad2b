use chrono::{DateTime, NaiveDate, Utc};
use lead_analytics::analytics::{AnalyticsQuery, LeadAnalytics};
use lead_analytics::config::AnalyticsConfig;
use metrics_exporter_prometheus::PrometheusHandle;
use std::str::FromStr;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Deployment-wide analytics settings shared by every request.
#[derive(Debug, Clone, Default)]
pub(crate) struct AnalyticsState {
    pub(crate) analytics: LeadAnalytics,
    pub(crate) defaults: AnalyticsConfig,
}

impl AnalyticsState {
    pub(crate) fn from_config(config: AnalyticsConfig) -> Self {
        Self {
            analytics: LeadAnalytics::from_config(&config),
            defaults: config,
        }
    }

    pub(crate) fn default_query(&self, now: DateTime<Utc>) -> AnalyticsQuery {
        AnalyticsQuery::new(self.defaults.group_by, self.defaults.time_window, now)
    }
}

/// Accepts a full RFC 3339 timestamp or a bare `YYYY-MM-DD` (midnight UTC).
pub(crate) fn parse_reference_time(raw: &str) -> Result<DateTime<Utc>, String> {
    let trimmed = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("failed to parse '{raw}' as RFC 3339 or YYYY-MM-DD"))
}

/// Parses an optional textual option, passing `None` through.
pub(crate) fn parse_optional<T>(raw: Option<&str>) -> Result<Option<T>, T::Err>
where
    T: FromStr,
{
    raw.map(str::parse).transpose()
}
