use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Group label for leads without an owning agent.
pub const UNKNOWN_AGENT: &str = "Unknown";
/// Group label for leads without a team.
pub const UNKNOWN_TEAM: &str = "Unknown Team";
/// Label of the single group produced when no grouping key is selected.
pub const ALL_LEADS: &str = "All";

pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Canonical lead shape handed to the analytics core.
///
/// Every upstream field-name variant is resolved by the feed layer before a
/// record reaches this type; amounts are whole cents and never negative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub amount_cents: u64,
    pub agent: Option<String>,
    pub team: Option<String>,
    pub stage_label: Option<String>,
}

impl LeadRecord {
    pub fn agent_label(&self) -> &str {
        label_or(self.agent.as_deref(), UNKNOWN_AGENT)
    }

    pub fn team_label(&self) -> &str {
        label_or(self.team.as_deref(), UNKNOWN_TEAM)
    }
}

fn label_or<'a>(value: Option<&'a str>, fallback: &'static str) -> &'a str {
    match value.map(str::trim) {
        Some(label) if !label.is_empty() => label,
        _ => fallback,
    }
}

/// Raised when a textual option (window, grouping, metric, ...) is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct OptionParseError {
    pub kind: &'static str,
    pub value: String,
}

impl OptionParseError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    #[default]
    Agent,
    Team,
    #[serde(rename = "none")]
    Global,
}

impl GroupBy {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Agent => "Agent",
            Self::Team => "Team",
            Self::Global => "All Leads",
        }
    }

    /// Grouping key for `lead`, with absent labels mapped to their sentinel.
    pub fn key<'a>(self, lead: &'a LeadRecord) -> &'a str {
        match self {
            Self::Agent => lead.agent_label(),
            Self::Team => lead.team_label(),
            Self::Global => ALL_LEADS,
        }
    }
}

impl FromStr for GroupBy {
    type Err = OptionParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "agent" | "agents" | "sales_agent" => Ok(Self::Agent),
            "team" | "teams" => Ok(Self::Team),
            "none" | "all" | "global" => Ok(Self::Global),
            _ => Err(OptionParseError::new("grouping", value)),
        }
    }
}

/// Rolling or calendar window applied before non-monthly aggregation.
///
/// Leads without a creation date only pass the `Unrestricted` window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeWindow {
    #[serde(rename = "last_7_days")]
    Last7Days,
    #[serde(rename = "last_30_days")]
    Last30Days,
    #[serde(rename = "year_to_date")]
    YearToDate,
    #[default]
    #[serde(rename = "unrestricted")]
    Unrestricted,
}

impl TimeWindow {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Last7Days => "Last 7 days",
            Self::Last30Days => "Last 30 days",
            Self::YearToDate => "Year to date",
            Self::Unrestricted => "All time",
        }
    }

    pub fn contains(self, created_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        let created = match (self, created_at) {
            (Self::Unrestricted, _) => return true,
            (_, None) => return false,
            (_, Some(created)) => created,
        };

        match self {
            Self::Last7Days => now - created <= Duration::days(7),
            Self::Last30Days => now - created <= Duration::days(30),
            Self::YearToDate => created.year() == now.year(),
            Self::Unrestricted => true,
        }
    }
}

impl FromStr for TimeWindow {
    type Err = OptionParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "last_7_days" | "last_7" | "7d" => Ok(Self::Last7Days),
            "last_30_days" | "last_30" | "30d" => Ok(Self::Last30Days),
            "year_to_date" | "ytd" => Ok(Self::YearToDate),
            "unrestricted" | "all" | "all_time" => Ok(Self::Unrestricted),
            _ => Err(OptionParseError::new("time window", value)),
        }
    }
}

/// Series a trend is computed over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendMetric {
    Leads,
    #[default]
    Orders,
    Sales,
}

impl TrendMetric {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Leads => "Leads",
            Self::Orders => "Orders",
            Self::Sales => "Sales",
        }
    }
}

impl FromStr for TrendMetric {
    type Err = OptionParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "leads" => Ok(Self::Leads),
            "orders" => Ok(Self::Orders),
            "sales" => Ok(Self::Sales),
            _ => Err(OptionParseError::new("metric", value)),
        }
    }
}
