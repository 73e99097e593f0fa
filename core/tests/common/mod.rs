//! Shared test helpers: record builders and a scripted, call-counting gateway.

#![allow(dead_code)]

use async_trait::async_trait;
use bankdash_core::{
    customer::{
        Account, AccountCustomer, AccountType, Address, Customer, CustomerStatus, RiskLevel,
        ScoredCustomer, Transaction,
    },
    error::{GatewayError, GatewayResult},
    gateway::{
        CustomerGateway, PredictionResult, RemovalProof, ResetAck, UnlearnAck, UnlearnBatchAck,
    },
    types::{CustomerId, Label},
};
use chrono::NaiveDate;
use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

pub fn scored(id: i64, name: &str, segment: Label, score: f64) -> Customer {
    Customer::Scored(ScoredCustomer {
        customer_id: id,
        customer_name: name.into(),
        age: 35,
        income: 60_000.0,
        tenure_months: 24,
        travel_ratio: 0.2,
        online_ratio: 0.6,
        num_cards: 2,
        late_12m: 0,
        mobile_logins: 80,
        segment_label: segment,
        nbo_label: 1,
        score_label: score,
    })
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn account_customer(
    id: &str,
    first: &str,
    last: &str,
    status: CustomerStatus,
    risk: RiskLevel,
    accounts: &[(AccountType, f64)],
    registered: NaiveDate,
) -> Customer {
    Customer::Account(AccountCustomer {
        id: id.into(),
        first_name: first.into(),
        last_name: last.into(),
        email: format!("{}.{}@example.com", first.to_lowercase(), last.to_lowercase()),
        phone: "+1 (555) 200-3000".into(),
        date_of_birth: date(1980, 5, 17),
        address: Address {
            street: "1 Main St".into(),
            city: "Austin".into(),
            state: "TX".into(),
            zip_code: "73301".into(),
            country: "USA".into(),
        },
        accounts: accounts
            .iter()
            .enumerate()
            .map(|(n, (kind, balance))| Account {
                id: format!("account-{id}-{}", n + 1),
                customer_id: id.into(),
                account_number: format!("10000000{:02}", n),
                account_type: *kind,
                balance: *balance,
                currency: "USD".into(),
                created_at: registered,
            })
            .collect(),
        registration_date: registered,
        status,
        risk_level: risk,
    })
}

/// Gateway whose `fetch_customers` answers come from a script.
///
/// Each call pops the next scripted response; when the script runs dry the
/// last response is repeated. An optional delay keeps fetches in flight long
/// enough for concurrent callers to overlap.
pub struct ScriptedGateway {
    script: Mutex<VecDeque<GatewayResult<Vec<Customer>>>>,
    last: Mutex<GatewayResult<Vec<Customer>>>,
    delay: Duration,
    fetch_calls: AtomicUsize,
    reset_calls: AtomicUsize,
}

impl ScriptedGateway {
    pub fn returning(customers: Vec<Customer>) -> Self {
        Self::scripted(vec![Ok(customers)])
    }

    pub fn scripted(responses: Vec<GatewayResult<Vec<Customer>>>) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let last = responses
            .last()
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()));
        Self {
            script: Mutex::new(responses.into()),
            last: Mutex::new(last),
            delay: Duration::ZERO,
            fetch_calls: AtomicUsize::new(0),
            reset_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn reset_calls(&self) -> usize {
        self.reset_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CustomerGateway for ScriptedGateway {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn fetch_customers(&self) -> GatewayResult<Vec<Customer>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        let response = match next {
            Some(r) => {
                *self.last.lock().unwrap() = r.clone();
                r
            }
            None => self.last.lock().unwrap().clone(),
        };
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        response
    }

    async fn fetch_customer_by_id(&self, id: &str) -> GatewayResult<Customer> {
        Err(GatewayError::NotFound { id: id.into() })
    }

    async fn fetch_transactions(&self, _customer_id: &str) -> GatewayResult<Vec<Transaction>> {
        Ok(Vec::new())
    }

    async fn trigger_unlearn(&self, customer_id: &str) -> GatewayResult<UnlearnAck> {
        Ok(UnlearnAck {
            message: format!("Unlearning completed for {customer_id}"),
            retrained_shard: 0,
        })
    }

    async fn unlearn_batch(&self, customer_ids: &[CustomerId]) -> GatewayResult<UnlearnBatchAck> {
        Ok(UnlearnBatchAck {
            message: String::new(),
            customers_unlearned: customer_ids.to_vec(),
            customers_not_found: Vec::new(),
            shards_retrained: vec![0],
        })
    }

    async fn predict(&self, customer_id: &str) -> GatewayResult<PredictionResult> {
        Err(GatewayError::NotFound { id: customer_id.into() })
    }

    async fn removal_proof(&self, _customer_id: &str) -> GatewayResult<RemovalProof> {
        Ok(RemovalProof::Unavailable { error: "none".into() })
    }

    async fn reset(&self) -> GatewayResult<ResetAck> {
        self.reset_calls.fetch_add(1, Ordering::SeqCst);
        Ok(ResetAck {
            message: "reset".into(),
            total_customers: None,
            augmented_records: None,
            shards: None,
        })
    }

    async fn health(&self) -> GatewayResult<bool> {
        Ok(true)
    }
}
