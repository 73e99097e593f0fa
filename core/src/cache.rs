//! Immutable customer snapshot held by the engine.
//!
//! Bulk reads see the customers in the order the gateway returned them;
//! point lookups go through an id index. A snapshot is built once and never
//! edited; the engine swaps whole snapshots on refresh.

use crate::{
    customer::Customer,
    error::{GatewayError, GatewayResult},
    types::CustomerId,
};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct CustomerCache {
    customers: Vec<Customer>,
    index: HashMap<CustomerId, usize>,
}

impl CustomerCache {
    /// Build a snapshot. Duplicate identifiers reject the whole batch.
    pub fn from_customers(customers: Vec<Customer>) -> GatewayResult<Self> {
        let mut index = HashMap::with_capacity(customers.len());
        for (pos, customer) in customers.iter().enumerate() {
            let id = customer.id();
            if index.insert(id.clone(), pos).is_some() {
                return Err(GatewayError::Schema(format!(
                    "duplicate customer id '{id}' in customer list"
                )));
            }
        }
        Ok(Self { customers, index })
    }

    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    pub fn get(&self, id: &str) -> Option<&Customer> {
        self.index.get(id).map(|&pos| &self.customers[pos])
    }

    pub fn len(&self) -> usize {
        self.customers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.customers.is_empty()
    }
}
