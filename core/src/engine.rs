//! Customer cache & query engine.
//!
//! RULES:
//!   - The engine exclusively owns the customer cache. Callers receive
//!     immutable snapshots (`Arc<CustomerCache>`) or fresh vectors.
//!   - The cache is replaced wholesale, never edited in place.
//!   - At most one population fetch is in flight. Concurrent callers share
//!     its outcome through a single `Shared` future handle.
//!   - Gateway errors propagate unchanged and never write to the cache.
//!
//! POPULATION STATES:
//!   Unpopulated → Populating → Populated
//!        ↑             │
//!        └── error ────┘   (also: empty result under `EmptyResultPolicy::Refetch`)
//!
//! `clear_cache()` returns to Unpopulated from any state. A fetch that was
//! in flight at that moment still answers its own waiters, but its result is
//! discarded instead of stored.

use crate::{
    cache::CustomerCache,
    config::{DashConfig, EmptyResultPolicy},
    customer::Customer,
    error::{GatewayError, GatewayResult},
    gateway::{CustomerGateway, ResetAck},
    metrics::{compute_metrics, CustomerMetrics},
    query::{run_query, CustomerFilters, FilterRules},
};
use chrono::NaiveDate;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;

type SharedFetch = Shared<BoxFuture<'static, GatewayResult<Arc<CustomerCache>>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopulationState {
    Unpopulated,
    Populating,
    Populated,
}

#[derive(Clone)]
enum Population {
    Unpopulated,
    Populating { fetch_id: u64, fetch: SharedFetch },
    Populated(Arc<CustomerCache>),
}

struct EngineState {
    population: Population,
    next_fetch_id: u64,
}

pub struct CustomerEngine {
    gateway: Arc<dyn CustomerGateway>,
    rules: FilterRules,
    empty_policy: EmptyResultPolicy,
    state: Mutex<EngineState>,
}

impl CustomerEngine {
    pub fn new(gateway: Arc<dyn CustomerGateway>, config: &DashConfig) -> Self {
        Self::with_rules(
            gateway,
            FilterRules::from_config(config),
            config.empty_result_policy,
        )
    }

    pub fn with_rules(
        gateway: Arc<dyn CustomerGateway>,
        rules: FilterRules,
        empty_policy: EmptyResultPolicy,
    ) -> Self {
        Self {
            gateway,
            rules,
            empty_policy,
            state: Mutex::new(EngineState {
                population: Population::Unpopulated,
                next_fetch_id: 0,
            }),
        }
    }

    /// The gateway this engine populates from; for pass-through calls
    /// (predict, unlearn, transactions) that do not touch the cache.
    pub fn gateway(&self) -> &Arc<dyn CustomerGateway> {
        &self.gateway
    }

    pub fn population_state(&self) -> PopulationState {
        match self.state().population {
            Population::Unpopulated => PopulationState::Unpopulated,
            Population::Populating { .. } => PopulationState::Populating,
            Population::Populated(_) => PopulationState::Populated,
        }
    }

    fn state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn start_fetch(&self) -> SharedFetch {
        let gateway = Arc::clone(&self.gateway);
        async move {
            let customers = gateway.fetch_customers().await?;
            CustomerCache::from_customers(customers).map(Arc::new)
        }
        .boxed()
        .shared()
    }

    /// Return the cached snapshot, fetching it first if necessary.
    pub async fn ensure_populated(&self) -> GatewayResult<Arc<CustomerCache>> {
        let (fetch_id, fetch) = {
            let mut state = self.state();
            match state.population.clone() {
                Population::Populated(cache) => return Ok(cache),
                Population::Populating { fetch_id, fetch } => {
                    log::debug!("engine: joining in-flight fetch {fetch_id}");
                    (fetch_id, fetch)
                }
                Population::Unpopulated => {
                    state.next_fetch_id += 1;
                    let fetch_id = state.next_fetch_id;
                    let fetch = self.start_fetch();
                    state.population = Population::Populating {
                        fetch_id,
                        fetch: fetch.clone(),
                    };
                    log::debug!(
                        "engine: fetch {fetch_id} started via gateway={}",
                        self.gateway.name()
                    );
                    (fetch_id, fetch)
                }
            }
        };

        let outcome = fetch.await;
        self.settle(fetch_id, &outcome);
        outcome
    }

    /// As [`ensure_populated`](Self::ensure_populated), but gives up with
    /// `GatewayError::Cancelled` once `cancel` fires. Cancelling only
    /// releases this caller; the shared fetch stays registered and the next
    /// caller resumes it.
    pub async fn ensure_populated_with(
        &self,
        cancel: &CancellationToken,
    ) -> GatewayResult<Arc<CustomerCache>> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(GatewayError::Cancelled),
            outcome = self.ensure_populated() => outcome,
        }
    }

    /// Record a fetch outcome, unless the fetch has been superseded.
    fn settle(&self, fetch_id: u64, outcome: &GatewayResult<Arc<CustomerCache>>) {
        let mut state = self.state();
        let current = matches!(
            &state.population,
            Population::Populating { fetch_id: id, .. } if *id == fetch_id
        );
        if !current {
            return;
        }

        state.population = match outcome {
            Ok(cache) if cache.is_empty() && self.empty_policy == EmptyResultPolicy::Refetch => {
                log::info!("engine: fetch {fetch_id} returned no customers; will refetch");
                Population::Unpopulated
            }
            Ok(cache) => {
                log::info!("engine: fetch {fetch_id} cached {} customers", cache.len());
                Population::Populated(Arc::clone(cache))
            }
            Err(e) => {
                log::warn!("engine: fetch {fetch_id} failed: {e}");
                Population::Unpopulated
            }
        };
    }

    /// Search and filter the cached customers. See [`crate::query`] for the
    /// stage order.
    pub async fn query(
        &self,
        filters: &CustomerFilters,
        search: Option<&str>,
    ) -> GatewayResult<Vec<Customer>> {
        let cache = self.ensure_populated().await?;
        Ok(run_query(cache.customers(), filters, search, &self.rules))
    }

    /// Point lookup in the current cache. Never touches the network;
    /// `None` covers both "unknown id" and "not populated yet".
    pub fn get_by_id(&self, id: &str) -> Option<Customer> {
        match &self.state().population {
            Population::Populated(cache) => cache.get(id).cloned(),
            _ => None,
        }
    }

    /// Drop the cache; the next `ensure_populated` goes to the gateway.
    pub fn clear_cache(&self) {
        let mut state = self.state();
        if let Population::Populating { fetch_id, .. } = &state.population {
            log::debug!("engine: discarding in-flight fetch {fetch_id}");
        }
        state.population = Population::Unpopulated;
    }

    pub async fn refresh(&self) -> GatewayResult<Arc<CustomerCache>> {
        self.clear_cache();
        self.ensure_populated().await
    }

    /// Reset the backend, then reload the cache from it.
    pub async fn reset_backend(&self) -> GatewayResult<ResetAck> {
        let ack = self.gateway.reset().await?;
        self.refresh().await?;
        Ok(ack)
    }

    pub async fn metrics(&self, reference: NaiveDate) -> GatewayResult<CustomerMetrics> {
        let cache = self.ensure_populated().await?;
        Ok(compute_metrics(cache.customers(), &self.rules, reference))
    }
}
