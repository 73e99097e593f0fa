//! Portfolio metrics for both record shapes.

mod common;

use bankdash_core::{
    config::DashConfig,
    customer::{AccountType, CustomerStatus, RiskLevel},
    engine::CustomerEngine,
    metrics::compute_metrics,
    query::FilterRules,
};
use common::{account_customer, date, scored, ScriptedGateway};
use std::sync::Arc;

#[test]
fn account_metrics_sum_balances_and_count_recent_registrations() {
    let reference = date(2024, 6, 30);
    let customers = vec![
        account_customer(
            "customer-1", "Jane", "Smith", CustomerStatus::Active, RiskLevel::Low,
            &[(AccountType::Checking, 1_000.0), (AccountType::Savings, 3_000.0)],
            date(2024, 6, 20),
        ),
        account_customer(
            "customer-2", "John", "Doe", CustomerStatus::Inactive, RiskLevel::High,
            &[(AccountType::Credit, 2_000.0)],
            // Exactly 30 days back: outside the window.
            date(2024, 5, 31),
        ),
        account_customer(
            "customer-3", "Mary", "Jones", CustomerStatus::Active, RiskLevel::Medium,
            &[],
            reference,
        ),
    ];

    let m = compute_metrics(&customers, &FilterRules::default(), reference);
    assert_eq!(m.total_customers, 3);
    assert_eq!(m.active_customers, 2);
    assert_eq!(m.total_balance, 6_000.0);
    assert_eq!(m.average_balance, 2_000.0);
    assert_eq!(m.new_registrations, 2);
}

#[test]
fn empty_portfolio_has_zero_average() {
    let m = compute_metrics(&[], &FilterRules::default(), date(2024, 1, 1));
    assert_eq!(m.total_customers, 0);
    assert_eq!(m.average_balance, 0.0);
}

#[tokio::test]
async fn scored_metrics_through_the_engine() {
    let customers = (1..=10)
        .map(|i| scored(i, "Customer", if i <= 4 { 1 } else { 0 }, 5.0))
        .collect();
    let engine = CustomerEngine::new(
        Arc::new(ScriptedGateway::returning(customers)),
        &DashConfig::default_test(),
    );

    let m = engine.metrics(date(2024, 6, 30)).await.unwrap();
    assert_eq!(m.total_customers, 10);
    assert_eq!(m.active_customers, 4);
    assert_eq!(m.total_balance, 600_000.0);
    assert_eq!(m.new_registrations, 1);
}
