use super::aggregator::{cents_to_units, GroupFilter, GroupStat};
use super::domain::{GroupBy, TimeWindow, TrendMetric};
use super::summary::{Metrics, SummaryRow, Trend};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    pub group_by: GroupBy,
    pub group_by_label: &'static str,
    pub window: TimeWindow,
    pub window_label: &'static str,
    pub rows: Vec<SummaryRow>,
    pub totals: Metrics,
    /// Labels available for the active grouping, in first-seen order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group_options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthBucketView {
    pub month_index: usize,
    pub month: &'static str,
    pub lead_count: u64,
    pub order_count: u64,
    pub sales_total_cents: u64,
    pub sales_total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyReport {
    pub year: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_filter: Option<GroupFilter>,
    pub metric: TrendMetric,
    pub buckets: Vec<MonthBucketView>,
    pub totals: Metrics,
    pub trend: Trend,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSeriesView {
    pub label: String,
    pub buckets: Vec<MonthBucketView>,
    pub trend: Trend,
}

/// Formats cents as a US-style currency string, e.g. `$1,234.56`.
pub fn format_currency(cents: u64) -> String {
    let units = cents / 100;
    let remainder = cents % 100;
    let digits = units.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (position, digit) in digits.chars().enumerate() {
        if position > 0 && (digits.len() - position) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    format!("${grouped}.{remainder:02}")
}

impl MonthBucketView {
    pub(crate) fn new(month_index: usize, month: &'static str, stat: &GroupStat) -> Self {
        Self {
            month_index,
            month,
            lead_count: stat.lead_count,
            order_count: stat.order_count,
            sales_total_cents: stat.sales_total_cents,
            sales_total: cents_to_units(stat.sales_total_cents),
        }
    }
}
