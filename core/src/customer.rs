//! Customer data model.
//!
//! Two record shapes are in circulation: the behavioural-scoring shape the
//! prediction backend serves, and the account-centric shape of the older
//! back-office API. Which one a deployment speaks is fixed in configuration
//! via [`CustomerSchema`]; payloads are decoded into the tagged [`Customer`]
//! enum accordingly.

use crate::{
    error::{GatewayError, GatewayResult},
    types::{AccountId, CustomerId, Label},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerSchema {
    #[default]
    Scored,
    Account,
}

impl CustomerSchema {
    /// Decode a single customer payload.
    pub fn decode(self, value: serde_json::Value) -> GatewayResult<Customer> {
        let customer = match self {
            Self::Scored => serde_json::from_value(value).map(Customer::Scored),
            Self::Account => serde_json::from_value(value).map(Customer::Account),
        };
        customer.map_err(|e| GatewayError::Schema(format!("{self:?} customer: {e}")))
    }

    /// Decode a customer list payload. Anything other than a JSON array is
    /// rejected; it is never coerced into an empty list.
    pub fn decode_list(self, value: serde_json::Value) -> GatewayResult<Vec<Customer>> {
        match value {
            serde_json::Value::Array(items) => {
                items.into_iter().map(|item| self.decode(item)).collect()
            }
            other => Err(GatewayError::Schema(format!(
                "expected an array of customers, got {}",
                json_kind(&other)
            ))),
        }
    }
}

pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

// ── Scored schema ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCustomer {
    pub customer_id: i64,
    pub customer_name: String,
    #[serde(default)]
    pub age: u32,
    #[serde(default)]
    pub income: f64,
    #[serde(default)]
    pub tenure_months: u32,
    #[serde(default)]
    pub travel_ratio: f64,
    #[serde(default)]
    pub online_ratio: f64,
    #[serde(default)]
    pub num_cards: u32,
    #[serde(default)]
    pub late_12m: u32,
    #[serde(default)]
    pub mobile_logins: u32,
    pub segment_label: Label,
    pub nbo_label: Label,
    /// 0–10 scale or 0–1 probability depending on the backend revision.
    /// Interpreted only through the configured risk bands.
    pub score_label: f64,
}

// ── Account schema ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerStatus {
    Active,
    Inactive,
    Suspended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Checking,
    Savings,
    Investment,
    Credit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: AccountId,
    pub customer_id: CustomerId,
    pub account_number: String,
    pub account_type: AccountType,
    pub balance: f64,
    pub currency: String,
    pub created_at: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountCustomer {
    pub id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: NaiveDate,
    pub address: Address,
    #[serde(default)]
    pub accounts: Vec<Account>,
    pub registration_date: NaiveDate,
    pub status: CustomerStatus,
    pub risk_level: RiskLevel,
}

impl AccountCustomer {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Sum of balances across every account. Computed on each call.
    pub fn total_balance(&self) -> f64 {
        self.accounts.iter().map(|a| a.balance).sum()
    }

    pub fn has_account_type(&self, account_type: AccountType) -> bool {
        self.accounts.iter().any(|a| a.account_type == account_type)
    }
}

// ── Tagged customer ────────────────────────────────────────────────

/// A customer record in whichever shape the configured schema selects.
/// Serializes back to the wire shape it was decoded from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Customer {
    Scored(ScoredCustomer),
    Account(AccountCustomer),
}

impl Customer {
    /// Identifier in string form; the cache key.
    pub fn id(&self) -> CustomerId {
        match self {
            Self::Scored(c) => c.customer_id.to_string(),
            Self::Account(c) => c.id.clone(),
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            Self::Scored(c) => c.customer_name.clone(),
            Self::Account(c) => c.full_name(),
        }
    }

    pub fn schema(&self) -> CustomerSchema {
        match self {
            Self::Scored(_) => CustomerSchema::Scored,
            Self::Account(_) => CustomerSchema::Account,
        }
    }

    pub fn score(&self) -> Option<f64> {
        match self {
            Self::Scored(c) => Some(c.score_label),
            Self::Account(_) => None,
        }
    }

    pub fn total_balance(&self) -> Option<f64> {
        match self {
            Self::Scored(_) => None,
            Self::Account(c) => Some(c.total_balance()),
        }
    }

    /// Case-insensitive substring match over the name-bearing fields.
    /// `needle` must already be lowercased.
    pub(crate) fn matches_search(&self, needle: &str) -> bool {
        match self {
            Self::Scored(c) => c.customer_name.to_lowercase().contains(needle),
            Self::Account(c) => {
                c.full_name().to_lowercase().contains(needle)
                    || c.email.to_lowercase().contains(needle)
            }
        }
    }
}

// ── Transactions ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Credit,
    Debit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub account_id: AccountId,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub description: String,
    pub date: NaiveDate,
    pub category: String,
}
