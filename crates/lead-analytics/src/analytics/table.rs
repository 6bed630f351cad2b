use super::domain::OptionParseError;
use super::summary::SummaryRow;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortColumn {
    #[default]
    Group,
    Leads,
    Orders,
    Conversion,
    Sales,
    AverageOrderValue,
}

impl FromStr for SortColumn {
    type Err = OptionParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "group" | "agent" | "team" | "label" => Ok(Self::Group),
            "leads" => Ok(Self::Leads),
            "orders" => Ok(Self::Orders),
            "conversion" => Ok(Self::Conversion),
            "sales" => Ok(Self::Sales),
            "aov" | "average_order_value" => Ok(Self::AverageOrderValue),
            _ => Err(OptionParseError::new("sort column", value)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Performance table rows with client-side style filtering and sorting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceTable {
    rows: Vec<SummaryRow>,
}

impl PerformanceTable {
    pub fn new(rows: Vec<SummaryRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[SummaryRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<SummaryRow> {
        self.rows
    }

    /// Keeps rows whose label contains `query`, ignoring case. Blank queries keep everything.
    pub fn filter(mut self, query: &str) -> Self {
        let needle = query.trim().to_lowercase();
        if !needle.is_empty() {
            self.rows
                .retain(|row| row.label.to_lowercase().contains(&needle));
        }
        self
    }

    /// Stable sort; rows comparing equal keep their current relative order.
    pub fn sort_by(mut self, column: SortColumn, direction: SortDirection) -> Self {
        self.rows.sort_by(|left, right| {
            let ordering = compare(left, right, column);
            match direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });
        self
    }
}

fn compare(left: &SummaryRow, right: &SummaryRow, column: SortColumn) -> Ordering {
    let (l, r) = (&left.metrics, &right.metrics);
    match column {
        SortColumn::Group => left.label.to_lowercase().cmp(&right.label.to_lowercase()),
        SortColumn::Leads => l.lead_count.cmp(&r.lead_count),
        SortColumn::Orders => l.order_count.cmp(&r.order_count),
        SortColumn::Conversion => l.conversion_rate.total_cmp(&r.conversion_rate),
        SortColumn::Sales => l.sales_total_cents.cmp(&r.sales_total_cents),
        SortColumn::AverageOrderValue => l.average_order_value.total_cmp(&r.average_order_value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::{GroupStat, Metrics};

    fn row(label: &str, leads: u64, orders: u64, cents: u64) -> SummaryRow {
        SummaryRow {
            label: label.to_string(),
            metrics: Metrics::from(&GroupStat {
                lead_count: leads,
                order_count: orders,
                sales_total_cents: cents,
            }),
        }
    }

    fn labels(table: &PerformanceTable) -> Vec<&str> {
        table.rows().iter().map(|row| row.label.as_str()).collect()
    }

    #[test]
    fn filter_matches_substrings_case_insensitively() {
        let table = PerformanceTable::new(vec![
            row("Alice Martin", 1, 0, 0),
            row("Bob", 1, 0, 0),
            row("MARTINE", 1, 0, 0),
        ]);
        let filtered = table.clone().filter("martin");
        assert_eq!(labels(&filtered), vec!["Alice Martin", "MARTINE"]);
        assert_eq!(table.filter("  ").rows().len(), 3);
    }

    #[test]
    fn sort_by_sales_descending() {
        let table = PerformanceTable::new(vec![
            row("A", 2, 1, 10_000),
            row("B", 1, 1, 20_000),
            row("C", 4, 0, 0),
        ])
        .sort_by(SortColumn::Sales, SortDirection::Descending);
        assert_eq!(labels(&table), vec!["B", "A", "C"]);
    }

    #[test]
    fn sort_is_stable_for_ties() {
        let table = PerformanceTable::new(vec![
            row("First", 1, 0, 0),
            row("Second", 1, 0, 0),
            row("Third", 3, 0, 0),
        ])
        .sort_by(SortColumn::Leads, SortDirection::Ascending);
        assert_eq!(labels(&table), vec!["First", "Second", "Third"]);
    }

    #[test]
    fn sort_by_conversion_and_group() {
        let rows = vec![row("b", 2, 1, 0), row("A", 1, 1, 0), row("c", 4, 1, 0)];
        let by_conversion = PerformanceTable::new(rows.clone())
            .sort_by(SortColumn::Conversion, SortDirection::Descending);
        assert_eq!(labels(&by_conversion), vec!["A", "b", "c"]);

        let by_group =
            PerformanceTable::new(rows).sort_by(SortColumn::Group, SortDirection::Ascending);
        assert_eq!(labels(&by_group), vec!["A", "b", "c"]);
    }

    #[test]
    fn sort_columns_parse() {
        assert_eq!("AOV".parse::<SortColumn>(), Ok(SortColumn::AverageOrderValue));
        assert!("revenue".parse::<SortColumn>().is_err());
    }
}
