//! Search + filter pipeline over the cached customer set.

mod common;

use bankdash_core::{
    config::{DashConfig, EmptyResultPolicy, RiskBands},
    customer::{AccountType, Customer, CustomerStatus, RiskLevel},
    engine::CustomerEngine,
    query::{CustomerFilters, DateRange, FilterRules},
};
use common::{account_customer, date, scored, ScriptedGateway};
use std::{collections::HashSet, sync::Arc};

// ── Test helpers ────────────────────────────────────────────────────────────

fn scored_engine(customers: Vec<Customer>) -> CustomerEngine {
    CustomerEngine::new(
        Arc::new(ScriptedGateway::returning(customers)),
        &DashConfig::default_test(),
    )
}

fn ids(customers: &[Customer]) -> Vec<String> {
    customers.iter().map(Customer::id).collect()
}

fn scored_population() -> Vec<Customer> {
    vec![
        scored(1, "Ana Silva", 1, 9.0),
        scored(2, "Ben Okafor", 0, 3.0),
        scored(3, "Anabel Ortiz", 1, 6.0),
        scored(4, "Chen Wei", 2, 8.0),
        scored(5, "Dana Anand", 1, 2.0),
    ]
}

fn account_population() -> Vec<Customer> {
    vec![
        account_customer(
            "customer-1", "Jane", "Smith", CustomerStatus::Active, RiskLevel::Low,
            &[(AccountType::Checking, 1_500.0), (AccountType::Savings, 20_000.0)],
            date(2021, 3, 1),
        ),
        account_customer(
            "customer-2", "John", "Smithers", CustomerStatus::Suspended, RiskLevel::High,
            &[(AccountType::Credit, 300.0)],
            date(2022, 8, 9),
        ),
        account_customer(
            "customer-3", "Mary", "Jones", CustomerStatus::Active, RiskLevel::Medium,
            &[(AccountType::Investment, 75_000.0)],
            date(2023, 1, 20),
        ),
        account_customer(
            "customer-4", "Linda", "Brown", CustomerStatus::Inactive, RiskLevel::Low,
            &[],
            date(2020, 6, 30),
        ),
    ]
}

// ── Scored schema ────────────────────────────────────────────────────────────

#[tokio::test]
async fn active_status_maps_to_segment_one() {
    let engine = scored_engine(vec![scored(1, "Ana Silva", 1, 9.0), scored(2, "Ben Okafor", 0, 3.0)]);

    let filters = CustomerFilters {
        status: Some(CustomerStatus::Active),
        ..Default::default()
    };
    let out = engine.query(&filters, None).await.unwrap();
    assert_eq!(ids(&out), vec!["1"]);
}

#[tokio::test]
async fn search_is_case_insensitive_substring() {
    let engine = scored_engine(scored_population());

    let out = engine.query(&Default::default(), Some("ANA")).await.unwrap();
    assert_eq!(ids(&out), vec!["1", "3", "5"]);

    let none = engine.query(&Default::default(), Some("zed")).await.unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn risk_levels_follow_ten_point_bands() {
    let engine = scored_engine(scored_population());

    let by_level = |level| CustomerFilters {
        risk_level: Some(level),
        ..Default::default()
    };
    assert_eq!(ids(&engine.query(&by_level(RiskLevel::Low), None).await.unwrap()), vec!["1", "4"]);
    assert_eq!(ids(&engine.query(&by_level(RiskLevel::Medium), None).await.unwrap()), vec!["3"]);
    assert_eq!(ids(&engine.query(&by_level(RiskLevel::High), None).await.unwrap()), vec!["2", "5"]);
}

#[tokio::test]
async fn probability_bands_are_configurable() {
    let customers = vec![
        scored(1, "Ana", 1, 0.91),
        scored(2, "Ben", 1, 0.62),
        scored(3, "Cai", 1, 0.12),
    ];
    let rules = FilterRules {
        risk_bands: RiskBands::probability(),
        ..FilterRules::default()
    };
    let engine = CustomerEngine::with_rules(
        Arc::new(ScriptedGateway::returning(customers)),
        rules,
        EmptyResultPolicy::Keep,
    );

    let filters = CustomerFilters {
        risk_level: Some(RiskLevel::Medium),
        ..Default::default()
    };
    assert_eq!(ids(&engine.query(&filters, None).await.unwrap()), vec!["2"]);
}

#[tokio::test]
async fn filters_compose_as_and() {
    let engine = scored_engine(scored_population());

    let filters = CustomerFilters {
        status: Some(CustomerStatus::Active),
        risk_level: Some(RiskLevel::High),
        ..Default::default()
    };
    let out = engine.query(&filters, Some("an")).await.unwrap();
    assert_eq!(ids(&out), vec!["5"]);
}

#[tokio::test]
async fn results_are_a_duplicate_free_subset() {
    let engine = scored_engine(scored_population());
    let all: HashSet<String> = ids(engine.ensure_populated().await.unwrap().customers())
        .into_iter()
        .collect();

    let combos = [
        (CustomerFilters::default(), Some("a")),
        (
            CustomerFilters { status: Some(CustomerStatus::Active), ..Default::default() },
            None,
        ),
        (
            CustomerFilters { risk_level: Some(RiskLevel::Low), ..Default::default() },
            Some("chen"),
        ),
    ];
    for (filters, search) in combos {
        let out = ids(&engine.query(&filters, search).await.unwrap());
        let unique: HashSet<_> = out.iter().cloned().collect();
        assert_eq!(unique.len(), out.len(), "duplicates in {out:?}");
        assert!(unique.is_subset(&all), "invented records in {out:?}");
    }
}

#[tokio::test]
async fn repeated_queries_are_order_stable_and_leave_cache_intact() {
    let engine = scored_engine(scored_population());
    let filters = CustomerFilters {
        status: Some(CustomerStatus::Active),
        ..Default::default()
    };

    let first = engine.query(&filters, Some("a")).await.unwrap();
    let second = engine.query(&filters, Some("a")).await.unwrap();
    assert_eq!(first, second);

    let cached = engine.ensure_populated().await.unwrap();
    assert_eq!(ids(cached.customers()), vec!["1", "2", "3", "4", "5"]);
}

// ── Account schema ───────────────────────────────────────────────────────────

fn account_engine() -> CustomerEngine {
    let config = DashConfig {
        schema: bankdash_core::customer::CustomerSchema::Account,
        ..DashConfig::default_test()
    };
    CustomerEngine::new(Arc::new(ScriptedGateway::returning(account_population())), &config)
}

#[tokio::test]
async fn account_status_and_risk_compare_directly() {
    let engine = account_engine();

    let active = CustomerFilters {
        status: Some(CustomerStatus::Active),
        ..Default::default()
    };
    assert_eq!(ids(&engine.query(&active, None).await.unwrap()), vec!["customer-1", "customer-3"]);

    let low = CustomerFilters {
        risk_level: Some(RiskLevel::Low),
        ..Default::default()
    };
    assert_eq!(ids(&engine.query(&low, None).await.unwrap()), vec!["customer-1", "customer-4"]);
}

#[tokio::test]
async fn account_search_covers_full_name_and_email() {
    let engine = account_engine();

    let out = engine.query(&Default::default(), Some("smith")).await.unwrap();
    assert_eq!(ids(&out), vec!["customer-1", "customer-2"]);

    let by_full_name = engine.query(&Default::default(), Some("mary jones")).await.unwrap();
    assert_eq!(ids(&by_full_name), vec!["customer-3"]);

    let by_email = engine.query(&Default::default(), Some("linda.brown@")).await.unwrap();
    assert_eq!(ids(&by_email), vec!["customer-4"]);
}

#[tokio::test]
async fn account_type_and_registration_range() {
    let engine = account_engine();

    let savers = CustomerFilters {
        account_type: Some(AccountType::Savings),
        ..Default::default()
    };
    assert_eq!(ids(&engine.query(&savers, None).await.unwrap()), vec!["customer-1"]);

    let registered_2022_on = CustomerFilters {
        registered_between: Some(DateRange {
            start: date(2022, 8, 9),
            end: date(2023, 12, 31),
        }),
        ..Default::default()
    };
    assert_eq!(
        ids(&engine.query(&registered_2022_on, None).await.unwrap()),
        vec!["customer-2", "customer-3"]
    );
}
