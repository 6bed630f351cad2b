use super::aggregator::{cents_to_units, GroupStat, GroupedStats, TimeSeries};
use super::domain::TrendMetric;
use serde::Serialize;

/// Counts plus derived ratios for one group or for the grand total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Metrics {
    pub lead_count: u64,
    pub order_count: u64,
    pub sales_total_cents: u64,
    pub sales_total: f64,
    pub conversion_rate: f64,
    pub average_order_value: f64,
}

impl Metrics {
    pub fn conversion_percent(&self) -> f64 {
        self.conversion_rate * 100.0
    }
}

impl From<&GroupStat> for Metrics {
    fn from(stat: &GroupStat) -> Self {
        Self {
            lead_count: stat.lead_count,
            order_count: stat.order_count,
            sales_total_cents: stat.sales_total_cents,
            sales_total: stat.sales_total(),
            conversion_rate: stat.conversion_rate(),
            average_order_value: stat.average_order_value(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub label: String,
    #[serde(flatten)]
    pub metrics: Metrics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub rows: Vec<SummaryRow>,
    pub totals: Metrics,
}

pub fn summarize(grouped: &GroupedStats) -> Summary {
    let rows = grouped
        .entries()
        .iter()
        .map(|entry| SummaryRow {
            label: entry.label.clone(),
            metrics: Metrics::from(&entry.stat),
        })
        .collect();

    Summary {
        rows,
        totals: Metrics::from(&grouped.totals()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Up,
    Down,
}

impl TrendDirection {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Trend {
    pub metric: TrendMetric,
    pub first: u64,
    pub last: u64,
    pub percent_change: f64,
    pub direction: TrendDirection,
}

impl Trend {
    /// `first`/`last` in display units: cents become currency for sales.
    pub fn endpoints(&self) -> (f64, f64) {
        match self.metric {
            TrendMetric::Sales => (cents_to_units(self.first), cents_to_units(self.last)),
            _ => (self.first as f64, self.last as f64),
        }
    }
}

/// Percent change from the first to the last non-zero bucket of `metric`.
pub fn trend(series: &TimeSeries, metric: TrendMetric) -> Trend {
    let values = series.values(metric);
    let first = values.iter().copied().find(|value| *value > 0).unwrap_or(0);
    let last = values.iter().copied().rev().find(|value| *value > 0).unwrap_or(0);
    let percent_change = percent_change(first, last);

    Trend {
        metric,
        first,
        last,
        percent_change,
        direction: if percent_change >= 0.0 {
            TrendDirection::Up
        } else {
            TrendDirection::Down
        },
    }
}

/// `(last - first) / first * 100`, or 0 when `first` is zero.
pub fn percent_change(first: u64, last: u64) -> f64 {
    if first == 0 {
        return 0.0;
    }
    (last as f64 - first as f64) / first as f64 * 100.0
}
