//! Remote data gateway: the only path from the core to the backend.
//!
//! RULE: Gateways own no customer state and never retry.
//! A failed call surfaces immediately as a typed [`GatewayError`].
//!
//! Two implementations ship with the crate:
//!   - [`http::HttpGateway`]: the real backend over HTTP/JSON.
//!   - [`demo::DemoGateway`]: seeded offline data for demo mode and tests.

pub mod demo;
pub mod http;

use crate::{
    customer::{Customer, Transaction},
    error::GatewayResult,
    types::CustomerId,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Segment name the backend reports for profile-free customers.
pub const BASELINE_SEGMENT: &str = "Unprofiled / Default";
/// Offer the backend routes profile-free customers to.
pub const BASELINE_NBO: &str = "Silver (Baseline)";
pub const BASELINE_SCORE: f64 = 0.50;
pub const BASELINE_NBO_PROBS: [f64; 3] = [0.78, 0.18, 0.04];

#[async_trait]
pub trait CustomerGateway: Send + Sync {
    /// Stable name used in log lines.
    fn name(&self) -> &'static str;

    async fn fetch_customers(&self) -> GatewayResult<Vec<Customer>>;

    /// `GatewayError::NotFound` when the backend has no such customer.
    async fn fetch_customer_by_id(&self, id: &str) -> GatewayResult<Customer>;

    async fn fetch_transactions(&self, customer_id: &str) -> GatewayResult<Vec<Transaction>>;

    /// Ask the backend to forget one customer. No local state changes.
    async fn trigger_unlearn(&self, customer_id: &str) -> GatewayResult<UnlearnAck>;

    async fn unlearn_batch(&self, customer_ids: &[CustomerId]) -> GatewayResult<UnlearnBatchAck>;

    async fn predict(&self, customer_id: &str) -> GatewayResult<PredictionResult>;

    /// Proof-of-removal document. A backend-reported `{error}` is returned
    /// as [`RemovalProof::Unavailable`], not as an `Err`.
    async fn removal_proof(&self, customer_id: &str) -> GatewayResult<RemovalProof>;

    /// Restore the backend to its initial state. Callers must reload any
    /// cache afterwards.
    async fn reset(&self) -> GatewayResult<ResetAck>;

    async fn health(&self) -> GatewayResult<bool>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerIdRequest {
    pub customer_id: CustomerId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerIdsRequest {
    pub customer_ids: Vec<CustomerId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub segment: String,
    pub nbo: String,
    pub score: f64,
    /// True when the backend answered with the non-personalised baseline.
    pub baseline: bool,
    pub raw_segment_probs: Vec<f64>,
    pub raw_nbo_probs: Vec<f64>,
    pub raw_score_pred: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnlearnAck {
    pub message: String,
    /// `-1` when the backend did not know the customer.
    pub retrained_shard: i64,
}

impl UnlearnAck {
    pub fn found(&self) -> bool {
        self.retrained_shard >= 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnlearnBatchAck {
    pub message: String,
    pub customers_unlearned: Vec<CustomerId>,
    pub customers_not_found: Vec<CustomerId>,
    pub shards_retrained: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResetAck {
    pub message: String,
    #[serde(default)]
    pub total_customers: Option<u64>,
    #[serde(default)]
    pub augmented_records: Option<u64>,
    #[serde(default)]
    pub shards: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreEffective {
    pub segment: Option<String>,
    pub nbo: Option<String>,
    pub score: Option<f64>,
    pub baseline_segment: Option<String>,
    pub baseline_nbo: Option<String>,
    pub baseline_score: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostEffective {
    pub segment: Option<String>,
    pub nbo: Option<String>,
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Interpretation {
    pub overall_summary: String,
    pub bullet_points: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemovalReport {
    pub customer_id: CustomerId,
    pub pre_effective: PreEffective,
    pub post_effective: PostEffective,
    pub personalization_gaps: BTreeMap<String, f64>,
    pub raw_change: BTreeMap<String, f64>,
    pub interpretation: Interpretation,
}

impl RemovalReport {
    /// Post-minus-pre effective score, when both sides are present.
    pub fn score_delta(&self) -> Option<f64> {
        Some(self.post_effective.score? - self.pre_effective.score?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RemovalProof {
    Unavailable { error: String },
    Available(Box<RemovalReport>),
}

/// `GET /metrics` wraps its document in `{ "result": ... }`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RemovalProofEnvelope {
    pub result: RemovalProof,
}
