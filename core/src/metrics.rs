//! Portfolio summary figures for the dashboard header cards.

use crate::{
    customer::{Customer, CustomerStatus},
    query::FilterRules,
};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Account-schema customers registered within this many days of the
/// reference date count as new.
pub const NEW_REGISTRATION_WINDOW_DAYS: u64 = 30;

/// The scored schema carries no registration date; this share of its
/// customers is reported as new.
pub const SCORED_NEW_REGISTRATION_SHARE: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerMetrics {
    pub total_customers: usize,
    pub active_customers: usize,
    /// Sum of account balances; scored customers contribute their income.
    pub total_balance: f64,
    pub new_registrations: usize,
    pub average_balance: f64,
}

pub fn compute_metrics(
    customers: &[Customer],
    rules: &FilterRules,
    reference: NaiveDate,
) -> CustomerMetrics {
    let active_label = rules.status_map.get(&CustomerStatus::Active).copied();
    let window_start = reference
        .checked_sub_days(Days::new(NEW_REGISTRATION_WINDOW_DAYS))
        .unwrap_or(NaiveDate::MIN);

    let mut active = 0usize;
    let mut total_balance = 0.0;
    let mut scored = 0usize;
    let mut registered_recently = 0usize;

    for customer in customers {
        match customer {
            Customer::Scored(c) => {
                scored += 1;
                total_balance += c.income;
                if Some(c.segment_label) == active_label {
                    active += 1;
                }
            }
            Customer::Account(c) => {
                total_balance += c.total_balance();
                if c.status == CustomerStatus::Active {
                    active += 1;
                }
                if c.registration_date > window_start && c.registration_date <= reference {
                    registered_recently += 1;
                }
            }
        }
    }

    let total = customers.len();
    CustomerMetrics {
        total_customers: total,
        active_customers: active,
        total_balance,
        new_registrations: registered_recently
            + (scored as f64 * SCORED_NEW_REGISTRATION_SHARE).floor() as usize,
        average_balance: if total == 0 { 0.0 } else { total_balance / total as f64 },
    }
}
