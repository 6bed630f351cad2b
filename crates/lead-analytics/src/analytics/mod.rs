//! Classification, grouping, and summary metrics over lead collections.
//!
//! Everything here is a pure function of the input leads and the filter
//! parameters; nothing is cached or persisted between calls.

mod aggregator;
mod classifier;
pub mod domain;
mod report;
mod summary;
pub mod table;
pub mod views;

pub use aggregator::{
    aggregate, aggregate_by_month, monthly_by_group, GroupEntry, GroupFilter, GroupSeries,
    GroupStat, GroupedStats, TimeSeries,
};
pub use classifier::{Classification, OrderPolicy, DEFAULT_COMPLETION_STAGE};
pub use domain::{
    GroupBy, LeadRecord, OptionParseError, TimeWindow, TrendMetric, ALL_LEADS, MONTH_LABELS,
    UNKNOWN_AGENT, UNKNOWN_TEAM,
};
pub use report::{AnalyticsQuery, LeadAnalytics, MonthlyQuery};
pub use summary::{
    percent_change, summarize, trend, Metrics, Summary, SummaryRow, Trend, TrendDirection,
};
pub use table::{PerformanceTable, SortColumn, SortDirection};
pub use views::{format_currency, DashboardReport, GroupSeriesView, MonthBucketView, MonthlyReport};
