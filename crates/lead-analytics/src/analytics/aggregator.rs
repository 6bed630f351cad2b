use super::classifier::{Classification, OrderPolicy};
use super::domain::{GroupBy, LeadRecord, TimeWindow, TrendMetric, MONTH_LABELS};
use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// Lead, order and sales counters for one group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GroupStat {
    pub lead_count: u64,
    pub order_count: u64,
    pub sales_total_cents: u64,
}

impl GroupStat {
    /// Folds one classified lead: every lead counts, only orders add sales.
    pub fn record(&mut self, classification: Classification) {
        self.lead_count += 1;
        if classification.is_order {
            self.order_count += 1;
            self.sales_total_cents = self
                .sales_total_cents
                .saturating_add(classification.value_cents);
        }
    }

    pub fn merge(&mut self, other: &GroupStat) {
        self.lead_count += other.lead_count;
        self.order_count += other.order_count;
        self.sales_total_cents = self.sales_total_cents.saturating_add(other.sales_total_cents);
    }

    pub fn conversion_rate(&self) -> f64 {
        ratio(self.order_count, self.lead_count)
    }

    pub fn sales_total(&self) -> f64 {
        cents_to_units(self.sales_total_cents)
    }

    pub fn average_order_value(&self) -> f64 {
        ratio(self.sales_total_cents, self.order_count) / 100.0
    }

    pub fn metric(&self, metric: TrendMetric) -> u64 {
        match metric {
            TrendMetric::Leads => self.lead_count,
            TrendMetric::Orders => self.order_count,
            TrendMetric::Sales => self.sales_total_cents,
        }
    }
}

pub(crate) fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

pub(crate) fn cents_to_units(cents: u64) -> f64 {
    cents as f64 / 100.0
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupEntry {
    pub label: String,
    pub stat: GroupStat,
}

/// Per-group statistics in order of first appearance in the input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupedStats {
    group_by: GroupBy,
    entries: Vec<GroupEntry>,
    index: HashMap<String, usize>,
}

impl GroupedStats {
    pub fn new(group_by: GroupBy) -> Self {
        Self {
            group_by,
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn group_by(&self) -> GroupBy {
        self.group_by
    }

    pub fn get(&self, label: &str) -> Option<&GroupStat> {
        self.index.get(label).map(|&position| &self.entries[position].stat)
    }

    pub fn entries(&self) -> &[GroupEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn totals(&self) -> GroupStat {
        let mut totals = GroupStat::default();
        for entry in &self.entries {
            totals.merge(&entry.stat);
        }
        totals
    }

    fn stat_mut(&mut self, label: &str) -> &mut GroupStat {
        let position = match self.index.get(label) {
            Some(&position) => position,
            None => {
                self.entries.push(GroupEntry {
                    label: label.to_string(),
                    stat: GroupStat::default(),
                });
                let position = self.entries.len() - 1;
                self.index.insert(label.to_string(), position);
                position
            }
        };
        &mut self.entries[position].stat
    }
}

/// Restricts monthly aggregation to one agent or team label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupFilter {
    pub group_by: GroupBy,
    pub label: String,
}

impl GroupFilter {
    pub fn agent(label: impl Into<String>) -> Self {
        Self {
            group_by: GroupBy::Agent,
            label: label.into(),
        }
    }

    pub fn team(label: impl Into<String>) -> Self {
        Self {
            group_by: GroupBy::Team,
            label: label.into(),
        }
    }

    pub fn matches(&self, lead: &LeadRecord) -> bool {
        match self.group_by {
            GroupBy::Global => true,
            group_by => group_by.key(lead) == self.label.trim(),
        }
    }
}

/// Twelve calendar-month buckets for a single year; empty months stay zeroed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeSeries {
    year: i32,
    buckets: [GroupStat; 12],
}

impl TimeSeries {
    pub fn new(year: i32) -> Self {
        Self {
            year,
            buckets: [GroupStat::default(); 12],
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn buckets(&self) -> &[GroupStat; 12] {
        &self.buckets
    }

    /// Bucket for a zero-based month index.
    pub fn month(&self, month0: usize) -> Option<&GroupStat> {
        self.buckets.get(month0)
    }

    pub fn labelled(&self) -> impl Iterator<Item = (&'static str, &GroupStat)> + '_ {
        MONTH_LABELS.iter().copied().zip(self.buckets.iter())
    }

    pub fn values(&self, metric: TrendMetric) -> [u64; 12] {
        self.buckets.map(|bucket| bucket.metric(metric))
    }

    pub fn totals(&self) -> GroupStat {
        let mut totals = GroupStat::default();
        for bucket in &self.buckets {
            totals.merge(bucket);
        }
        totals
    }

    fn record(&mut self, created_at: DateTime<Utc>, classification: Classification) {
        let month0 = created_at.month0() as usize;
        self.buckets[month0].record(classification);
    }
}

/// Groups `leads` by `group_by` after applying `window` relative to `now`.
pub fn aggregate(
    leads: &[LeadRecord],
    policy: &OrderPolicy,
    group_by: GroupBy,
    window: TimeWindow,
    now: DateTime<Utc>,
) -> GroupedStats {
    let mut grouped = GroupedStats::new(group_by);
    let mut excluded = 0usize;

    for lead in leads {
        if !window.contains(lead.created_at, now) {
            excluded += 1;
            continue;
        }
        grouped
            .stat_mut(group_by.key(lead))
            .record(policy.classify(lead));
    }

    debug!(
        leads = leads.len(),
        excluded,
        groups = grouped.len(),
        group_by = group_by.label(),
        window = window.label(),
        "aggregated leads"
    );
    grouped
}

/// Buckets the leads created in `year` by calendar month. Undated leads are skipped.
pub fn aggregate_by_month(
    leads: &[LeadRecord],
    policy: &OrderPolicy,
    year: i32,
    group_filter: Option<&GroupFilter>,
) -> TimeSeries {
    let mut series = TimeSeries::new(year);

    for lead in leads {
        if group_filter.is_some_and(|filter| !filter.matches(lead)) {
            continue;
        }
        if let Some(created_at) = lead.created_at.filter(|created| created.year() == year) {
            series.record(created_at, policy.classify(lead));
        }
    }

    series
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSeries {
    pub label: String,
    pub series: TimeSeries,
}

/// One monthly series per group label, in order of first appearance.
///
/// Groups only appear when they have at least one lead dated in `year`.
pub fn monthly_by_group(
    leads: &[LeadRecord],
    policy: &OrderPolicy,
    year: i32,
    group_by: GroupBy,
) -> Vec<GroupSeries> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<GroupSeries> = Vec::new();

    for lead in leads {
        let Some(created_at) = lead.created_at.filter(|created| created.year() == year) else {
            continue;
        };
        let label = group_by.key(lead);
        let position = *positions.entry(label).or_insert_with(|| {
            groups.push(GroupSeries {
                label: label.to_string(),
                series: TimeSeries::new(year),
            });
            groups.len() - 1
        });
        groups[position].series.record(created_at, policy.classify(lead));
    }

    groups
}
