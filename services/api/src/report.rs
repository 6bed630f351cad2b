use crate::infra::AnalyticsState;
use chrono::{DateTime, Utc};
use clap::Args;
use lead_analytics::analytics::{
    format_currency, DashboardReport, GroupBy, GroupFilter, GroupSeriesView, MonthlyQuery,
    MonthlyReport, PerformanceTable, SortColumn, SortDirection, TimeWindow, Trend, TrendMetric,
};
use lead_analytics::config::AppConfig;
use lead_analytics::error::AppError;
use lead_analytics::feed::LeadFeed;
use std::fmt::Write;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct ReportArgs {
    /// Lead export to summarize (`.csv`, otherwise JSON)
    #[arg(long)]
    pub(crate) leads: PathBuf,
    /// Group rows by agent, team, or none
    #[arg(long)]
    pub(crate) group_by: Option<GroupBy>,
    /// Time window: last_7_days, last_30_days, year_to_date, or all
    #[arg(long)]
    pub(crate) window: Option<TimeWindow>,
    /// Reference time for rolling windows (RFC 3339 or YYYY-MM-DD, defaults to now)
    #[arg(long, value_parser = crate::infra::parse_reference_time)]
    pub(crate) now: Option<DateTime<Utc>>,
    /// Keep only rows whose label contains this text (case-insensitive)
    #[arg(long)]
    pub(crate) filter: Option<String>,
    /// Sort rows by group, leads, orders, conversion, sales, or aov
    #[arg(long)]
    pub(crate) sort: Option<SortColumn>,
    /// Sort in descending order
    #[arg(long)]
    pub(crate) descending: bool,
    /// Also print the twelve-month breakdown
    #[arg(long)]
    pub(crate) monthly: bool,
    /// Year for the monthly breakdown (defaults to the configured or current year)
    #[arg(long)]
    pub(crate) year: Option<i32>,
    /// Series used for the trend indicator: leads, orders, or sales
    #[arg(long)]
    pub(crate) metric: Option<TrendMetric>,
    /// Restrict the monthly breakdown to one team
    #[arg(long, conflicts_with = "agent")]
    pub(crate) team: Option<String>,
    /// Restrict the monthly breakdown to one agent
    #[arg(long)]
    pub(crate) agent: Option<String>,
}

pub(crate) fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let state = AnalyticsState::from_config(config.analytics);
    let leads = LeadFeed::from_path(&args.leads)?;

    let now = args.now.unwrap_or_else(Utc::now);
    let mut query = state.default_query(now);
    if let Some(group_by) = args.group_by {
        query.group_by = group_by;
    }
    if let Some(window) = args.window {
        query.window = window;
    }

    let mut report = state.analytics.dashboard(&leads, &query);
    let mut table = PerformanceTable::new(report.rows);
    if let Some(filter) = args.filter.as_deref() {
        table = table.filter(filter);
    }
    if let Some(column) = args.sort {
        let direction = if args.descending {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        };
        table = table.sort_by(column, direction);
    }
    report.rows = table.into_rows();

    println!("Lead analytics report ({} leads loaded)", leads.len());
    print!("{}", render_dashboard(&report));

    if !args.monthly {
        return Ok(());
    }

    let year = args
        .year
        .unwrap_or_else(|| state.defaults.resolve_year(now));
    let metric = args.metric.unwrap_or_default();
    let mut monthly_query = MonthlyQuery::new(year).with_metric(metric);
    if let Some(team) = args.team {
        monthly_query = monthly_query.with_filter(GroupFilter::team(team));
    } else if let Some(agent) = args.agent {
        monthly_query = monthly_query.with_filter(GroupFilter::agent(agent));
    }

    let monthly = state.analytics.monthly(&leads, &monthly_query);
    let groups = if monthly_query.group_filter.is_none() && query.group_by != GroupBy::Global {
        state
            .analytics
            .monthly_views_by_group(&leads, year, query.group_by, metric)
    } else {
        Vec::new()
    };
    print!("{}", render_monthly(&monthly, &groups));

    Ok(())
}

pub(crate) fn render_dashboard(report: &DashboardReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "\nPerformance by {} ({})",
        report.group_by_label, report.window_label
    );

    if report.rows.is_empty() {
        let _ = writeln!(out, "- no leads in this window");
    }
    for row in &report.rows {
        let metrics = &row.metrics;
        let _ = writeln!(
            out,
            "- {}: {} leads | {} orders | {:.1}% conversion | {} sales | {} avg order",
            row.label,
            metrics.lead_count,
            metrics.order_count,
            metrics.conversion_percent(),
            format_currency(metrics.sales_total_cents),
            format_currency(to_cents(metrics.average_order_value)),
        );
    }

    let totals = &report.totals;
    let _ = writeln!(
        out,
        "Totals: {} leads | {} orders | {:.1}% conversion | {} sales | {} avg order",
        totals.lead_count,
        totals.order_count,
        totals.conversion_percent(),
        format_currency(totals.sales_total_cents),
        format_currency(to_cents(totals.average_order_value)),
    );
    out
}

pub(crate) fn render_monthly(report: &MonthlyReport, groups: &[GroupSeriesView]) -> String {
    let mut out = String::new();
    match &report.group_filter {
        Some(filter) => {
            let _ = writeln!(out, "\nMonthly breakdown {} ({})", report.year, filter.label);
        }
        None => {
            let _ = writeln!(out, "\nMonthly breakdown {}", report.year);
        }
    }

    for bucket in &report.buckets {
        let _ = writeln!(
            out,
            "- {}: {} leads | {} orders | {} sales",
            bucket.month,
            bucket.lead_count,
            bucket.order_count,
            format_currency(bucket.sales_total_cents),
        );
    }
    let _ = writeln!(out, "{}", describe_trend(&report.trend));

    for group in groups {
        let _ = writeln!(out, "  {}: {}", group.label, describe_trend(&group.trend));
    }
    out
}

fn describe_trend(trend: &Trend) -> String {
    let (first, last) = trend.endpoints();
    format!(
        "{} trend: {} {:.1}% ({} -> {})",
        trend.metric.label(),
        trend.direction.label(),
        trend.percent_change.abs(),
        format_endpoint(trend.metric, first),
        format_endpoint(trend.metric, last),
    )
}

fn format_endpoint(metric: TrendMetric, value: f64) -> String {
    match metric {
        TrendMetric::Sales => format_currency(to_cents(value)),
        TrendMetric::Leads | TrendMetric::Orders => format!("{value:.0}"),
    }
}

fn to_cents(units: f64) -> u64 {
    if units.is_finite() && units > 0.0 {
        (units * 100.0).round() as u64
    } else {
        0
    }
}
