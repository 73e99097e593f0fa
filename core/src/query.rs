//! Read-only filter + search pipeline over a cached customer slice.
//!
//! STAGE ORDER (fixed, never reordered):
//!   1. Search          : case-insensitive substring on name fields
//!   2. Status          : exact match (scored schema: via the status map)
//!   3. Risk            : score band (scored) or risk level (account)
//!   4. Account type    : account schema only
//!   5. Registration    : account schema only, inclusive date range
//!
//! Every stage is an AND. A `None` filter dimension is a pass-through, as is
//! a dimension the record's schema cannot express.

use crate::{
    config::{DashConfig, RiskBands},
    customer::{AccountType, Customer, CustomerStatus, RiskLevel},
    types::Label,
};
use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerFilters {
    #[serde(deserialize_with = "all_as_none")]
    pub status: Option<CustomerStatus>,
    #[serde(deserialize_with = "all_as_none")]
    pub risk_level: Option<RiskLevel>,
    #[serde(deserialize_with = "all_as_none")]
    pub account_type: Option<AccountType>,
    pub registered_between: Option<DateRange>,
}

/// `"all"` is the dashboard's pass-through value; it decodes to `None`.
fn all_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) if s == "all" => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// Schema-dependent interpretation tables for the filter stages.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterRules {
    pub status_map: HashMap<CustomerStatus, Label>,
    pub risk_bands: RiskBands,
}

impl FilterRules {
    pub fn from_config(config: &DashConfig) -> Self {
        Self {
            status_map: config.status_map.clone(),
            risk_bands: config.risk_bands,
        }
    }

    fn status_matches(&self, customer: &Customer, status: CustomerStatus) -> bool {
        match customer {
            // No mapping for this status: the filter does not apply.
            Customer::Scored(c) => self
                .status_map
                .get(&status)
                .map_or(true, |label| c.segment_label == *label),
            Customer::Account(c) => c.status == status,
        }
    }

    fn risk_matches(&self, customer: &Customer, level: RiskLevel) -> bool {
        match customer {
            Customer::Scored(c) => self.risk_bands.for_level(level).contains(c.score_label),
            Customer::Account(c) => c.risk_level == level,
        }
    }
}

impl Default for FilterRules {
    fn default() -> Self {
        Self::from_config(&DashConfig::default())
    }
}

/// Run the pipeline. Returns a fresh vector in cache order; `customers` is
/// never touched.
pub fn run_query(
    customers: &[Customer],
    filters: &CustomerFilters,
    search: Option<&str>,
    rules: &FilterRules,
) -> Vec<Customer> {
    let needle = search.filter(|s| !s.is_empty()).map(str::to_lowercase);

    customers
        .iter()
        .filter(|c| needle.as_deref().map_or(true, |n| c.matches_search(n)))
        .filter(|c| filters.status.map_or(true, |s| rules.status_matches(c, s)))
        .filter(|c| filters.risk_level.map_or(true, |r| rules.risk_matches(c, r)))
        .filter(|c| match (filters.account_type, c) {
            (Some(kind), Customer::Account(a)) => a.has_account_type(kind),
            _ => true,
        })
        .filter(|c| match (filters.registered_between, c) {
            (Some(range), Customer::Account(a)) => range.contains(a.registration_date),
            _ => true,
        })
        .cloned()
        .collect()
}
