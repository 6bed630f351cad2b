use super::aggregator::{
    aggregate, aggregate_by_month, monthly_by_group, GroupFilter, GroupSeries, GroupedStats,
    TimeSeries,
};
use super::classifier::{Classification, OrderPolicy};
use super::domain::{GroupBy, LeadRecord, TimeWindow, TrendMetric};
use super::summary::{summarize, trend, Metrics};
use super::views::{DashboardReport, GroupSeriesView, MonthBucketView, MonthlyReport};
use crate::config::AnalyticsConfig;
use crate::feed::group_options;
use chrono::{DateTime, Utc};

/// Filter selection for grouped (non-monthly) views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyticsQuery {
    pub group_by: GroupBy,
    pub window: TimeWindow,
    pub now: DateTime<Utc>,
}

impl AnalyticsQuery {
    pub fn new(group_by: GroupBy, window: TimeWindow, now: DateTime<Utc>) -> Self {
        Self {
            group_by,
            window,
            now,
        }
    }
}

/// Filter selection for the twelve-month views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyQuery {
    pub year: i32,
    pub group_filter: Option<GroupFilter>,
    pub metric: TrendMetric,
}

impl MonthlyQuery {
    pub fn new(year: i32) -> Self {
        Self {
            year,
            group_filter: None,
            metric: TrendMetric::default(),
        }
    }

    pub fn with_filter(mut self, filter: GroupFilter) -> Self {
        self.group_filter = Some(filter);
        self
    }

    pub fn with_metric(mut self, metric: TrendMetric) -> Self {
        self.metric = metric;
        self
    }
}

/// Entry point for dashboards: binds one order policy to every aggregation.
#[derive(Debug, Clone, Default)]
pub struct LeadAnalytics {
    policy: OrderPolicy,
}

impl LeadAnalytics {
    pub fn new(policy: OrderPolicy) -> Self {
        Self { policy }
    }

    pub fn from_config(config: &AnalyticsConfig) -> Self {
        Self::new(config.order_policy())
    }

    pub fn policy(&self) -> &OrderPolicy {
        &self.policy
    }

    pub fn classify(&self, lead: &LeadRecord) -> Classification {
        self.policy.classify(lead)
    }

    pub fn aggregate(&self, leads: &[LeadRecord], query: &AnalyticsQuery) -> GroupedStats {
        aggregate(leads, &self.policy, query.group_by, query.window, query.now)
    }

    pub fn aggregate_by_month(&self, leads: &[LeadRecord], query: &MonthlyQuery) -> TimeSeries {
        aggregate_by_month(leads, &self.policy, query.year, query.group_filter.as_ref())
    }

    pub fn monthly_by_group(
        &self,
        leads: &[LeadRecord],
        year: i32,
        group_by: GroupBy,
    ) -> Vec<GroupSeries> {
        monthly_by_group(leads, &self.policy, year, group_by)
    }

    pub fn dashboard(&self, leads: &[LeadRecord], query: &AnalyticsQuery) -> DashboardReport {
        let summary = summarize(&self.aggregate(leads, query));

        DashboardReport {
            group_by: query.group_by,
            group_by_label: query.group_by.label(),
            window: query.window,
            window_label: query.window.label(),
            rows: summary.rows,
            totals: summary.totals,
            group_options: group_options(leads, query.group_by),
        }
    }

    pub fn monthly(&self, leads: &[LeadRecord], query: &MonthlyQuery) -> MonthlyReport {
        let series = self.aggregate_by_month(leads, query);

        MonthlyReport {
            year: query.year,
            group_filter: query.group_filter.clone(),
            metric: query.metric,
            buckets: bucket_views(&series),
            totals: Metrics::from(&series.totals()),
            trend: trend(&series, query.metric),
        }
    }

    pub fn monthly_views_by_group(
        &self,
        leads: &[LeadRecord],
        year: i32,
        group_by: GroupBy,
        metric: TrendMetric,
    ) -> Vec<GroupSeriesView> {
        self.monthly_by_group(leads, year, group_by)
            .into_iter()
            .map(|group| GroupSeriesView {
                buckets: bucket_views(&group.series),
                trend: trend(&group.series, metric),
                label: group.label,
            })
            .collect()
    }
}

fn bucket_views(series: &TimeSeries) -> Vec<MonthBucketView> {
    series
        .labelled()
        .enumerate()
        .map(|(index, (month, stat))| MonthBucketView::new(index, month, stat))
        .collect()
}
