use chrono::{DateTime, TimeZone, Utc};
use lead_analytics::analytics::{
    summarize, trend, AnalyticsQuery, GroupBy, GroupFilter, LeadAnalytics, LeadRecord, Metrics,
    MonthlyQuery, OrderPolicy, TimeWindow, TrendDirection, TrendMetric,
};
use lead_analytics::feed::LeadFeed;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 12, 31, 18, 0, 0)
        .single()
        .expect("valid reference time")
}

fn scenario_leads() -> Vec<LeadRecord> {
    LeadFeed::from_json_str(
        r#"[
            { "agent": "A", "createdAt": "2024-03-05", "stageLabel": "Confirmation de réception", "amount": "100" },
            { "agent": "A", "createdAt": "2024-03-20", "stageLabel": "New", "amount": "50" },
            { "agent": "B", "createdAt": "2024-04-01", "stageLabel": "Confirmation de réception", "amount": "200" }
        ]"#,
    )
    .expect("scenario feed parses")
}

/// A noisy feed mixing undated, unlabelled, malformed and out-of-year leads.
fn mixed_leads() -> Vec<LeadRecord> {
    LeadFeed::from_json_str(
        r#"{ "data": { "leads": [
            { "createdBy": { "label": "Alice" }, "team": { "label": "North" }, "createdAt": "2024-01-10T09:00:00Z", "pipelineStage": { "label": "Confirmation de réception" }, "prixttc": "120.10" },
            { "createdBy": { "label": "Bob" }, "team": { "label": "South" }, "createdAt": "2024-02-11T09:00:00Z", "pipelineStage": { "label": "confirmation de RÉCEPTION" }, "prixttc": 80.2 },
            { "createdBy": { "label": "Alice" }, "createdAt": "2024-12-29T09:00:00Z", "pipelineStage": { "label": "Qualification" }, "prixttc": "999" },
            { "team": { "label": "North" }, "pipelineStage": { "label": "Confirmation de réception" }, "prixttc": "0.3" },
            { "createdBy": { "label": "Carol" }, "createdAt": "2023-06-01", "pipelineStage": { "label": "Confirmation de réception" }, "prixttc": "not a number" },
            { "createdBy": { "label": "Bob" }, "createdAt": "garbage", "prixttc": "-15" },
            null
        ] } }"#,
    )
    .expect("mixed feed parses")
}

#[test]
fn agent_breakdown_matches_reference_scenario() {
    let analytics = LeadAnalytics::new(OrderPolicy::new("confirmation de réception"));
    let query = AnalyticsQuery::new(GroupBy::Agent, TimeWindow::Unrestricted, now());
    let summary = summarize(&analytics.aggregate(&scenario_leads(), &query));

    assert_eq!(summary.rows.len(), 2);

    let a = &summary.rows[0];
    assert_eq!(a.label, "A");
    assert_eq!(a.metrics.lead_count, 2);
    assert_eq!(a.metrics.order_count, 1);
    assert_eq!(a.metrics.sales_total, 100.0);
    assert_eq!(a.metrics.conversion_rate, 0.5);
    assert_eq!(a.metrics.average_order_value, 100.0);

    let b = &summary.rows[1];
    assert_eq!(b.label, "B");
    assert_eq!(b.metrics.lead_count, 1);
    assert_eq!(b.metrics.order_count, 1);
    assert_eq!(b.metrics.sales_total, 200.0);
    assert_eq!(b.metrics.conversion_rate, 1.0);
    assert_eq!(b.metrics.average_order_value, 200.0);

    assert_eq!(summary.totals.lead_count, 3);
    assert_eq!(summary.totals.order_count, 2);
    assert_eq!(summary.totals.sales_total, 300.0);
}

#[test]
fn empty_collection_yields_zero_totals() {
    let analytics = LeadAnalytics::default();
    let query = AnalyticsQuery::new(GroupBy::Agent, TimeWindow::Last30Days, now());
    let report = analytics.dashboard(&[], &query);

    assert!(report.rows.is_empty());
    assert_eq!(report.totals.lead_count, 0);
    assert_eq!(report.totals.order_count, 0);
    assert_eq!(report.totals.sales_total_cents, 0);
    assert_eq!(report.totals.conversion_rate, 0.0);
    assert_eq!(report.totals.average_order_value, 0.0);

    let monthly = analytics.monthly(&[], &MonthlyQuery::new(2024));
    assert_eq!(monthly.buckets.len(), 12);
    assert_eq!(monthly.trend.percent_change, 0.0);
}

#[test]
fn grouping_never_changes_grand_totals() {
    let leads = mixed_leads();
    let analytics = LeadAnalytics::default();

    for window in [
        TimeWindow::Last7Days,
        TimeWindow::Last30Days,
        TimeWindow::YearToDate,
        TimeWindow::Unrestricted,
    ] {
        let global = analytics
            .aggregate(&leads, &AnalyticsQuery::new(GroupBy::Global, window, now()))
            .totals();

        for group_by in [GroupBy::Agent, GroupBy::Team] {
            let grouped =
                analytics.aggregate(&leads, &AnalyticsQuery::new(group_by, window, now()));
            let summed_sales: u64 = grouped
                .entries()
                .iter()
                .map(|entry| entry.stat.sales_total_cents)
                .sum();
            let summed_leads: u64 = grouped
                .entries()
                .iter()
                .map(|entry| entry.stat.lead_count)
                .sum();

            assert_eq!(summed_sales, global.sales_total_cents, "{group_by:?} {window:?}");
            assert_eq!(summed_leads, global.lead_count, "{group_by:?} {window:?}");
            assert_eq!(grouped.totals(), global, "{group_by:?} {window:?}");
        }
    }
}

#[test]
fn group_stats_stay_within_bounds() {
    let leads = mixed_leads();
    let check = |metrics: &Metrics| {
        assert!(metrics.order_count <= metrics.lead_count);
        assert!(metrics.conversion_rate.is_finite());
        assert!((0.0..=1.0).contains(&metrics.conversion_rate));
        assert!(metrics.average_order_value.is_finite());
        assert!(metrics.average_order_value >= 0.0);
    };

    for policy in [
        OrderPolicy::default(),
        OrderPolicy::default().requiring_positive_amount(true),
    ] {
        let analytics = LeadAnalytics::new(policy);
        for group_by in [GroupBy::Agent, GroupBy::Team, GroupBy::Global] {
            let query = AnalyticsQuery::new(group_by, TimeWindow::Unrestricted, now());
            let summary = summarize(&analytics.aggregate(&leads, &query));
            summary.rows.iter().for_each(|row| check(&row.metrics));
            check(&summary.totals);
        }
    }
}

#[test]
fn missing_labels_and_amounts_are_counted_not_dropped() {
    let leads = mixed_leads();
    let analytics = LeadAnalytics::default();

    let by_team = analytics.aggregate(
        &leads,
        &AnalyticsQuery::new(GroupBy::Team, TimeWindow::Unrestricted, now()),
    );
    let unknown_team = by_team.get("Unknown Team").expect("unknown team bucket");
    assert_eq!(unknown_team.lead_count, 3);

    let by_agent = analytics.aggregate(
        &leads,
        &AnalyticsQuery::new(GroupBy::Agent, TimeWindow::Unrestricted, now()),
    );
    let unknown_agent = by_agent.get("Unknown").expect("unknown agent bucket");
    assert_eq!(unknown_agent.lead_count, 1);
    assert_eq!(unknown_agent.order_count, 1);
    assert_eq!(unknown_agent.sales_total_cents, 30);

    let carol = by_agent.get("Carol").expect("carol bucket");
    assert_eq!(carol.order_count, 1);
    assert_eq!(carol.sales_total_cents, 0);
}

#[test]
fn strict_policy_is_applied_uniformly() {
    let leads = mixed_leads();
    let analytics = LeadAnalytics::new(OrderPolicy::default().requiring_positive_amount(true));

    let grouped = analytics.aggregate(
        &leads,
        &AnalyticsQuery::new(GroupBy::Agent, TimeWindow::Unrestricted, now()),
    );
    assert_eq!(grouped.get("Carol").map(|stat| stat.order_count), Some(0));

    let monthly = analytics.aggregate_by_month(&leads, &MonthlyQuery::new(2023));
    assert_eq!(monthly.totals().order_count, 0);
    assert_eq!(monthly.totals().lead_count, 1);
}

#[test]
fn windows_exclude_undated_leads_except_unrestricted() {
    let leads = mixed_leads();
    let analytics = LeadAnalytics::default();
    let count = |window| {
        analytics
            .aggregate(&leads, &AnalyticsQuery::new(GroupBy::Global, window, now()))
            .totals()
            .lead_count
    };

    assert_eq!(count(TimeWindow::Unrestricted), 6);
    assert_eq!(count(TimeWindow::YearToDate), 3);
    assert_eq!(count(TimeWindow::Last30Days), 1);
    assert_eq!(count(TimeWindow::Last7Days), 1);
}

#[test]
fn aggregation_is_repeatable() {
    let leads = mixed_leads();
    let analytics = LeadAnalytics::default();
    let query = AnalyticsQuery::new(GroupBy::Team, TimeWindow::YearToDate, now());

    assert_eq!(
        analytics.aggregate(&leads, &query),
        analytics.aggregate(&leads, &query)
    );
    assert_eq!(
        analytics.dashboard(&leads, &query),
        analytics.dashboard(&leads, &query)
    );
}

#[test]
fn monthly_series_always_has_twelve_buckets() {
    let leads = mixed_leads();
    let analytics = LeadAnalytics::default();

    for year in [2022, 2023, 2024] {
        let report = analytics.monthly(&leads, &MonthlyQuery::new(year));
        assert_eq!(report.buckets.len(), 12);
        assert_eq!(report.buckets[0].month, "Jan");
        assert_eq!(report.buckets[11].month, "Dec");
    }

    let report = analytics.monthly(
        &leads,
        &MonthlyQuery::new(2024).with_filter(GroupFilter::team("North")),
    );
    assert_eq!(report.totals.lead_count, 1);
    assert_eq!(report.buckets[0].order_count, 1);
}

#[test]
fn trend_spans_first_and_last_nonzero_months() {
    let leads = LeadFeed::from_json_str(
        r#"[
            { "createdAt": "2024-03-02", "stageLabel": "Confirmation de réception", "amount": 100 },
            { "createdAt": "2024-07-02", "stageLabel": "Confirmation de réception", "amount": 40 },
            { "createdAt": "2024-12-02", "stageLabel": "Confirmation de réception", "amount": 200 }
        ]"#,
    )
    .expect("feed parses");
    let analytics = LeadAnalytics::default();
    let series = analytics.aggregate_by_month(&leads, &MonthlyQuery::new(2024));

    let sales = trend(&series, TrendMetric::Sales);
    assert_eq!(sales.first, 10_000);
    assert_eq!(sales.last, 20_000);
    assert_eq!(sales.percent_change, 100.0);
    assert_eq!(sales.direction, TrendDirection::Up);
    assert_eq!(sales.endpoints(), (100.0, 200.0));

    let orders = trend(&series, TrendMetric::Orders);
    assert_eq!(orders.percent_change, 0.0);
}

#[test]
fn declining_trend_points_down() {
    let leads = LeadFeed::from_json_str(
        r#"[
            { "createdAt": "2024-01-15" },
            { "createdAt": "2024-01-16" },
            { "createdAt": "2024-01-17" },
            { "createdAt": "2024-01-18" },
            { "createdAt": "2024-05-01" }
        ]"#,
    )
    .expect("feed parses");
    let report = LeadAnalytics::default().monthly(
        &leads,
        &MonthlyQuery::new(2024).with_metric(TrendMetric::Leads),
    );

    assert_eq!(report.trend.percent_change, -75.0);
    assert_eq!(report.trend.direction, TrendDirection::Down);
}

#[test]
fn per_agent_series_follow_first_appearance() {
    let leads = mixed_leads();
    let views = LeadAnalytics::default().monthly_views_by_group(
        &leads,
        2024,
        GroupBy::Agent,
        TrendMetric::Leads,
    );

    let labels: Vec<&str> = views.iter().map(|view| view.label.as_str()).collect();
    assert_eq!(labels, vec!["Alice", "Bob"]);
    assert!(views.iter().all(|view| view.buckets.len() == 12));
    assert_eq!(views[0].buckets[11].lead_count, 1);
}

#[test]
fn dashboard_lists_group_options() {
    let leads = mixed_leads();
    let report = LeadAnalytics::default().dashboard(
        &leads,
        &AnalyticsQuery::new(GroupBy::Team, TimeWindow::Unrestricted, now()),
    );

    assert_eq!(report.group_options, vec!["North", "South"]);
    assert_eq!(report.window_label, "All time");
    let labels: Vec<&str> = report.rows.iter().map(|row| row.label.as_str()).collect();
    assert_eq!(labels, vec!["North", "South", "Unknown Team"]);
}
