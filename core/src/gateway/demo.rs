//! Offline gateway backed by seeded, generated data.
//!
//! Stands in for the backend in demo mode: the customer list is generated
//! once at construction and never changes; predictions are derived from the
//! record's own labels; unlearning routes a customer to the baseline offer
//! until the next `reset`.

use super::{
    CustomerGateway, Interpretation, PostEffective, PreEffective, PredictionResult, RemovalProof,
    RemovalReport, ResetAck, UnlearnAck, UnlearnBatchAck, BASELINE_NBO, BASELINE_NBO_PROBS,
    BASELINE_SCORE, BASELINE_SEGMENT,
};
use crate::{
    customer::{
        Account, AccountCustomer, AccountType, Address, Customer, CustomerSchema, CustomerStatus,
        RiskLevel, ScoredCustomer, Transaction, TransactionType,
    },
    error::{GatewayError, GatewayResult},
    name_generator::NameGenerator,
    rng::{DemoRng, DemoStream},
    types::CustomerId,
};
use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use std::{
    collections::{BTreeMap, HashMap},
    sync::{Mutex, MutexGuard, PoisonError},
};

pub const DEFAULT_POPULATION: usize = 50;
pub const TRANSACTIONS_PER_CUSTOMER: usize = 20;
/// First identifier handed out to scored-schema demo customers.
pub const FIRST_SCORED_ID: i64 = 1001;

pub const SEGMENT_NAMES: [&str; 3] = ["Mass Affluent Online", "Expat Frequent Traveller", "Value Seeker"];
pub const CARD_NAMES: [&str; 3] = ["Silver", "Gold", "Platinum"];

const TRANSACTION_CATEGORIES: &[&str] = &[
    "Groceries", "Utilities", "Entertainment", "Travel", "Dining", "Shopping",
    "Healthcare", "Transfer", "Salary", "Insurance",
];

const TRANSACTION_DESCRIPTIONS: &[&str] = &[
    "Grocery Store Purchase", "Electric Bill Payment", "Online Subscription",
    "Flight Booking", "Restaurant", "Department Store", "Pharmacy",
    "Wire Transfer", "Payroll Deposit", "Insurance Premium",
];

pub struct DemoGateway {
    seed: u64,
    customers: Vec<Customer>,
    unlearned: Mutex<HashMap<CustomerId, RemovalReport>>,
}

impl DemoGateway {
    pub fn new(schema: CustomerSchema, seed: u64, population: usize) -> Self {
        let customers = match schema {
            CustomerSchema::Scored => generate_scored_customers(seed, population),
            CustomerSchema::Account => generate_account_customers(seed, population),
        };
        log::info!(
            "gateway=demo generated {} {schema:?} customers (seed={seed})",
            customers.len()
        );
        Self {
            seed,
            customers,
            unlearned: Mutex::new(HashMap::new()),
        }
    }

    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    fn find(&self, id: &str) -> Option<&Customer> {
        self.customers.iter().find(|c| c.id() == id)
    }

    fn unlearned(&self) -> MutexGuard<'_, HashMap<CustomerId, RemovalReport>> {
        self.unlearned.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn forget(&self, customer: &Customer) {
        let report = removal_report(&personalised_prediction(customer));
        self.unlearned().insert(customer.id(), report);
    }
}

#[async_trait]
impl CustomerGateway for DemoGateway {
    fn name(&self) -> &'static str {
        "demo"
    }

    async fn fetch_customers(&self) -> GatewayResult<Vec<Customer>> {
        Ok(self.customers.clone())
    }

    async fn fetch_customer_by_id(&self, id: &str) -> GatewayResult<Customer> {
        self.find(id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound { id: id.to_string() })
    }

    async fn fetch_transactions(&self, customer_id: &str) -> GatewayResult<Vec<Transaction>> {
        let customer = self
            .find(customer_id)
            .ok_or_else(|| GatewayError::NotFound { id: customer_id.to_string() })?;
        Ok(generate_transactions(self.seed, customer))
    }

    async fn trigger_unlearn(&self, customer_id: &str) -> GatewayResult<UnlearnAck> {
        let Some(customer) = self.find(customer_id) else {
            return Ok(UnlearnAck {
                message: format!("Customer {customer_id} not found"),
                retrained_shard: -1,
            });
        };
        self.forget(customer);
        log::info!("gateway=demo unlearned customer={customer_id}");
        Ok(UnlearnAck {
            message: format!("Unlearning completed for {customer_id}"),
            retrained_shard: 0,
        })
    }

    async fn unlearn_batch(&self, customer_ids: &[CustomerId]) -> GatewayResult<UnlearnBatchAck> {
        let mut unlearned = Vec::new();
        let mut not_found = Vec::new();
        for id in customer_ids {
            match self.find(id) {
                Some(customer) => {
                    self.forget(customer);
                    unlearned.push(id.clone());
                }
                None => not_found.push(id.clone()),
            }
        }

        let message = if unlearned.is_empty() {
            "No valid customer IDs provided.".to_string()
        } else if not_found.is_empty() {
            format!("Successfully unlearned {} customers.", unlearned.len())
        } else {
            format!(
                "Successfully unlearned {} customers. {} customers not found.",
                unlearned.len(),
                not_found.len()
            )
        };
        let shards_retrained = if unlearned.is_empty() { vec![] } else { vec![0] };
        Ok(UnlearnBatchAck {
            message,
            customers_unlearned: unlearned,
            customers_not_found: not_found,
            shards_retrained,
        })
    }

    async fn predict(&self, customer_id: &str) -> GatewayResult<PredictionResult> {
        let Some(customer) = self.find(customer_id) else {
            return Ok(PredictionResult {
                customer_id: customer_id.to_string(),
                customer_name: "Unknown".into(),
                segment: BASELINE_SEGMENT.into(),
                nbo: BASELINE_NBO.into(),
                score: BASELINE_SCORE,
                baseline: true,
                raw_segment_probs: vec![0.33, 0.33, 0.33],
                raw_nbo_probs: BASELINE_NBO_PROBS.to_vec(),
                raw_score_pred: BASELINE_SCORE,
            });
        };

        let personal = personalised_prediction(customer);
        if self.unlearned().contains_key(customer_id) {
            return Ok(PredictionResult {
                segment: BASELINE_SEGMENT.into(),
                nbo: BASELINE_NBO.into(),
                score: BASELINE_SCORE,
                baseline: true,
                ..personal
            });
        }
        Ok(personal)
    }

    async fn removal_proof(&self, customer_id: &str) -> GatewayResult<RemovalProof> {
        Ok(match self.unlearned().get(customer_id) {
            Some(report) => RemovalProof::Available(Box::new(report.clone())),
            None => RemovalProof::Unavailable {
                error: format!(
                    "No metrics found for customer_id={customer_id}. \
                     Unlearn this customer first, then query metrics."
                ),
            },
        })
    }

    async fn reset(&self) -> GatewayResult<ResetAck> {
        self.unlearned().clear();
        Ok(ResetAck {
            message: "Demo reset complete. Unlearning cleared.".into(),
            total_customers: Some(self.customers.len() as u64),
            augmented_records: None,
            shards: Some(1),
        })
    }

    async fn health(&self) -> GatewayResult<bool> {
        Ok(true)
    }
}

// ── Generation ─────────────────────────────────────────────────────

fn random_date(rng: &mut DemoRng, start_year: i32, end_year: i32) -> NaiveDate {
    let start = NaiveDate::from_ymd_opt(start_year, 1, 1).unwrap_or(NaiveDate::MIN);
    let end = NaiveDate::from_ymd_opt(end_year, 12, 31).unwrap_or(start);
    let span = (end - start).num_days().max(0) as u64;
    start
        .checked_add_days(Days::new(rng.range_inclusive(0, span)))
        .unwrap_or(start)
}

fn generate_scored_customers(seed: u64, population: usize) -> Vec<Customer> {
    (0..population)
        .map(|i| {
            let mut rng = DemoRng::for_entity(seed, DemoStream::Customer, i as u64);
            let first = NameGenerator::generate_first_name(&mut rng);
            let last = NameGenerator::generate_last_name(&mut rng);
            Customer::Scored(ScoredCustomer {
                customer_id: FIRST_SCORED_ID + i as i64,
                customer_name: format!("{first} {last}"),
                age: rng.range_inclusive(21, 75) as u32,
                income: rng.range_inclusive(20_000, 200_000) as f64,
                tenure_months: rng.range_inclusive(1, 240) as u32,
                travel_ratio: rng.next_f64(),
                online_ratio: rng.next_f64(),
                num_cards: rng.range_inclusive(0, 5) as u32,
                late_12m: rng.range_inclusive(0, 6) as u32,
                mobile_logins: rng.range_inclusive(0, 400) as u32,
                segment_label: rng.next_u64_below(3) as i64,
                nbo_label: rng.next_u64_below(3) as i64,
                score_label: rng.range_inclusive(0, 10) as f64,
            })
        })
        .collect()
}

fn generate_account_customers(seed: u64, population: usize) -> Vec<Customer> {
    const STATUSES: [CustomerStatus; 3] =
        [CustomerStatus::Active, CustomerStatus::Inactive, CustomerStatus::Suspended];
    const RISKS: [RiskLevel; 3] = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High];

    (0..population)
        .map(|i| {
            let mut rng = DemoRng::for_entity(seed, DemoStream::Customer, i as u64);
            let first = NameGenerator::generate_first_name(&mut rng);
            let last = NameGenerator::generate_last_name(&mut rng);
            let id = format!("customer-{}", i + 1);
            let address = Address {
                street: NameGenerator::generate_street(&mut rng),
                city: NameGenerator::generate_city(&mut rng).into(),
                state: NameGenerator::generate_state(&mut rng).into(),
                zip_code: rng.range_inclusive(10_000, 99_999).to_string(),
                country: "USA".into(),
            };
            let phone = format!(
                "+1 (555) {}-{}",
                rng.range_inclusive(100, 999),
                rng.range_inclusive(1000, 9999)
            );
            let date_of_birth = random_date(&mut rng, 1950, 2000);
            let registration_date = random_date(&mut rng, 2020, 2023);
            let status = *rng.pick(&STATUSES);
            let risk_level = *rng.pick(&RISKS);
            let accounts = generate_accounts(seed, i as u64, &id);

            Customer::Account(AccountCustomer {
                email: format!("{}.{}@example.com", first.to_lowercase(), last.to_lowercase()),
                first_name: first.into(),
                last_name: last.into(),
                phone,
                date_of_birth,
                address,
                accounts,
                registration_date,
                status,
                risk_level,
                id,
            })
        })
        .collect()
}

fn generate_accounts(seed: u64, entity: u64, customer_id: &str) -> Vec<Account> {
    const TYPES: [AccountType; 4] = [
        AccountType::Checking,
        AccountType::Savings,
        AccountType::Investment,
        AccountType::Credit,
    ];
    let mut rng = DemoRng::for_entity(seed, DemoStream::Account, entity);
    let count = rng.range_inclusive(1, 3);
    (1..=count)
        .map(|n| Account {
            id: format!("account-{customer_id}-{n}"),
            customer_id: customer_id.to_string(),
            account_number: rng.range_inclusive(1_000_000_000, 9_999_999_999).to_string(),
            account_type: *rng.pick(&TYPES),
            balance: rng.range_inclusive(1_000, 100_999) as f64,
            currency: "USD".into(),
            created_at: random_date(&mut rng, 2020, 2023),
        })
        .collect()
}

fn generate_transactions(seed: u64, customer: &Customer) -> Vec<Transaction> {
    let entity = customer
        .id()
        .bytes()
        .fold(0u64, |h, b| h.wrapping_mul(31).wrapping_add(u64::from(b)));
    let mut rng = DemoRng::for_entity(seed, DemoStream::Transaction, entity);
    let account_ids: Vec<String> = match customer {
        Customer::Account(c) if !c.accounts.is_empty() => {
            c.accounts.iter().map(|a| a.id.clone()).collect()
        }
        _ => (1..=3).map(|n| format!("account-{n}")).collect(),
    };

    (0..TRANSACTIONS_PER_CUSTOMER)
        .map(|_| {
            let mut bytes = [0u8; 16];
            rng.fill_bytes(&mut bytes);
            Transaction {
                id: uuid::Builder::from_random_bytes(bytes).into_uuid().to_string(),
                account_id: rng.pick(&account_ids).clone(),
                amount: rng.range_inclusive(10, 1009) as f64,
                kind: if rng.chance(0.5) {
                    TransactionType::Credit
                } else {
                    TransactionType::Debit
                },
                description: (*rng.pick(TRANSACTION_DESCRIPTIONS)).into(),
                date: random_date(&mut rng, 2023, 2024),
                category: (*rng.pick(TRANSACTION_CATEGORIES)).into(),
            }
        })
        .collect()
}

// ── Prediction ─────────────────────────────────────────────────────

/// A peaked distribution over three classes.
fn peaked(index: usize) -> Vec<f64> {
    (0..3).map(|i| if i == index { 0.8 } else { 0.1 }).collect()
}

fn label_index(label: i64) -> usize {
    label.clamp(0, 2) as usize
}

fn personalised_prediction(customer: &Customer) -> PredictionResult {
    let (segment_idx, nbo_idx, score) = match customer {
        Customer::Scored(c) => {
            let score = if c.score_label > 1.0 {
                c.score_label / 10.0
            } else {
                c.score_label
            };
            (label_index(c.segment_label), label_index(c.nbo_label), score)
        }
        Customer::Account(c) => {
            let (segment, score) = match c.risk_level {
                RiskLevel::Low => (0, 0.85),
                RiskLevel::Medium => (1, 0.6),
                RiskLevel::High => (2, 0.3),
            };
            let balance = c.total_balance();
            let nbo = if balance < 50_000.0 {
                0
            } else if balance < 150_000.0 {
                1
            } else {
                2
            };
            (segment, nbo, score)
        }
    };

    PredictionResult {
        customer_id: customer.id(),
        customer_name: customer.display_name(),
        segment: SEGMENT_NAMES[segment_idx].into(),
        nbo: CARD_NAMES[nbo_idx].into(),
        score,
        baseline: false,
        raw_segment_probs: peaked(segment_idx),
        raw_nbo_probs: peaked(nbo_idx),
        raw_score_pred: score,
    }
}

/// KL(p || q) with a small floor against log(0).
fn kl(p: &[f64], q: &[f64]) -> f64 {
    const EPS: f64 = 1e-12;
    p.iter()
        .zip(q)
        .map(|(&pi, &qi)| {
            let pi = pi.max(EPS);
            pi * (pi / qi.max(EPS)).ln()
        })
        .sum()
}

fn removal_report(pre: &PredictionResult) -> RemovalReport {
    let nbo_gap_pre = kl(&pre.raw_nbo_probs, &BASELINE_NBO_PROBS);
    let score_gap_pre = (pre.score - BASELINE_SCORE).abs();

    let personalization_gaps = BTreeMap::from([
        ("nbo_gap_pre_kl_to_baseline".to_string(), nbo_gap_pre),
        ("nbo_gap_post_kl_to_baseline".to_string(), 0.0),
        ("score_gap_pre_abs".to_string(), score_gap_pre),
        ("score_gap_post_abs".to_string(), 0.0),
    ]);

    RemovalReport {
        customer_id: pre.customer_id.clone(),
        pre_effective: PreEffective {
            segment: Some(pre.segment.clone()),
            nbo: Some(pre.nbo.clone()),
            score: Some(pre.score),
            baseline_segment: Some(BASELINE_SEGMENT.into()),
            baseline_nbo: Some(BASELINE_NBO.into()),
            baseline_score: Some(BASELINE_SCORE),
        },
        post_effective: PostEffective {
            segment: Some(BASELINE_SEGMENT.into()),
            nbo: Some(BASELINE_NBO.into()),
            score: Some(BASELINE_SCORE),
        },
        personalization_gaps,
        // The demo model is not retrained, so there is no raw drift.
        raw_change: BTreeMap::from([("raw_nbo_pre_post_kl".to_string(), 0.0)]),
        interpretation: Interpretation {
            overall_summary: format!(
                "Customer {} now receives the generic {BASELINE_NBO} offer.",
                pre.customer_id
            ),
            bullet_points: vec![format!(
                "Before removal the offer was {} with a score of {:.2} \
                 (KL to baseline = {nbo_gap_pre:.3}, score gap = {score_gap_pre:.3}).",
                pre.nbo, pre.score
            )],
        },
    }
}
