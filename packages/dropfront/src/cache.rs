//! Read cache: one [`ReadState`] per upstream query, kept fresh by a poller.
//!
//! Page requests never fetch directly. They register the keys they depend on,
//! wait briefly for keys they have never seen, then build a [`DropState`]
//! from whatever the cache holds. Every state change bumps a version on a
//! `watch` channel.

use crate::metrics::METRICS;
use crate::queries::DropQueries;
use alloy_primitives::Address;
use dropfront_types::{
    ClaimCondition, ClaimerProof, ContractMetadata, DropState, IneligibilityReason, ReadState,
};
use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Query type plus arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKey {
    ClaimConditions(Address),
    ActiveClaimCondition(Address, Option<Address>),
    ClaimerProofs(Address, Address),
    IneligibilityReasons(Address, Option<Address>, u32),
    UnclaimedSupply(Address),
    ClaimedSupply(Address),
    TotalSupply(Address),
    ContractMetadata(Address),
}

impl QueryKey {
    pub fn label(&self) -> &'static str {
        match self {
            QueryKey::ClaimConditions(_) => "claim conditions",
            QueryKey::ActiveClaimCondition(..) => "active claim condition",
            QueryKey::ClaimerProofs(..) => "allow-list proof",
            QueryKey::IneligibilityReasons(..) => "claim eligibility",
            QueryKey::UnclaimedSupply(_) => "unclaimed supply",
            QueryKey::ClaimedSupply(_) => "claimed supply",
            QueryKey::TotalSupply(_) => "total supply",
            QueryKey::ContractMetadata(_) => "contract metadata",
        }
    }
}

/// Everything the mint page reads for one contract/wallet/quantity.
pub fn page_keys(
    contract: Address,
    wallet: Option<Address>,
    quantity: u32,
    total_supply_contract: Address,
) -> Vec<QueryKey> {
    let mut keys = vec![
        QueryKey::ContractMetadata(contract),
        QueryKey::ClaimConditions(contract),
        QueryKey::ActiveClaimCondition(contract, wallet),
        QueryKey::IneligibilityReasons(contract, wallet, quantity),
        QueryKey::UnclaimedSupply(contract),
        QueryKey::ClaimedSupply(contract),
        QueryKey::TotalSupply(total_supply_contract),
    ];
    if let Some(wallet) = wallet {
        keys.push(QueryKey::ClaimerProofs(contract, wallet));
    }
    keys
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    ClaimConditions(Vec<ClaimCondition>),
    ClaimCondition(ClaimCondition),
    ClaimerProof(Option<ClaimerProof>),
    Reasons(Vec<IneligibilityReason>),
    /// Decimal count.
    Supply(String),
    Metadata(ContractMetadata),
}

struct Entry {
    state: ReadState<QueryValue>,
    last_access: Instant,
    last_error: Option<String>,
}

/// Tracked keys kept when no explicit bound is configured.
pub const DEFAULT_MAX_TRACKED: usize = 4096;

pub struct ReadCache {
    entries: RwLock<HashMap<QueryKey, Entry>>,
    version: watch::Sender<u64>,
    poll_interval: Duration,
    key_idle: Duration,
    max_tracked: usize,
}

impl ReadCache {
    pub fn new(poll_interval: Duration, key_idle: Duration) -> Self {
        let (version, _) = watch::channel(0);
        Self {
            entries: RwLock::new(HashMap::new()),
            version,
            poll_interval,
            key_idle,
            max_tracked: DEFAULT_MAX_TRACKED,
        }
    }

    /// Bound the number of tracked keys. At the bound, tracking a new key
    /// drops the least recently accessed one.
    pub fn with_max_tracked(mut self, max_tracked: usize) -> Self {
        self.max_tracked = max_tracked.max(1);
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    pub fn version(&self) -> u64 {
        *self.version.borrow()
    }

    fn bump(&self) {
        self.version.send_modify(|v| *v += 1);
    }

    pub async fn tracked_count(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Register `key` for polling. Returns `true` when it was not tracked yet.
    pub async fn track(&self, key: QueryKey) -> bool {
        let mut entries = self.entries.write().await;
        match entries.get_mut(&key) {
            Some(entry) => {
                entry.last_access = Instant::now();
                false
            }
            None => {
                if entries.len() >= self.max_tracked {
                    let oldest = entries
                        .iter()
                        .min_by_key(|(_, entry)| entry.last_access)
                        .map(|(key, _)| *key);
                    if let Some(oldest) = oldest {
                        entries.remove(&oldest);
                        METRICS.read_evictions.fetch_add(1, Ordering::Relaxed);
                        debug!(query = oldest.label(), "Read cache full, dropped oldest key");
                    }
                }
                entries.insert(
                    key,
                    Entry {
                        state: ReadState::loading(),
                        last_access: Instant::now(),
                        last_error: None,
                    },
                );
                true
            }
        }
    }

    /// Current state of `key`; untracked keys read as loading.
    pub async fn get(&self, key: &QueryKey) -> ReadState<QueryValue> {
        self.entries
            .read()
            .await
            .get(key)
            .map(|entry| entry.state.clone())
            .unwrap_or_default()
    }

    /// Fetch one key and store the outcome.
    pub async fn refresh<Q: DropQueries>(&self, queries: &Q, key: QueryKey) {
        METRICS.read_refreshes.fetch_add(1, Ordering::Relaxed);
        let result = fetch(queries, &key).await;

        let mut entries = self.entries.write().await;
        let Some(entry) = entries.get_mut(&key) else {
            // Evicted while the fetch was in flight.
            return;
        };
        let changed = match result {
            Ok(value) => {
                let next = ReadState::ready(value);
                entry.last_error = None;
                let changed = entry.state != next;
                entry.state = next;
                changed
            }
            Err(e) => {
                METRICS.read_errors.fetch_add(1, Ordering::Relaxed);
                debug!(query = key.label(), error = %e, "Read failed");
                let changed = entry.state.is_loading || !entry.state.is_error;
                entry.state.is_loading = false;
                entry.state.is_error = true;
                entry.last_error = Some(e.to_string());
                changed
            }
        };
        drop(entries);
        if changed {
            self.bump();
        }
    }

    /// Track `keys`, then give first-time keys up to `wait` to resolve.
    /// Fetches still running afterwards complete in the background.
    pub async fn prime<Q: DropQueries>(
        self: &Arc<Self>,
        queries: &Arc<Q>,
        keys: &[QueryKey],
        wait: Duration,
    ) {
        let mut handles = tokio::task::JoinSet::new();
        for key in keys {
            if self.track(*key).await {
                let cache = Arc::clone(self);
                let queries = Arc::clone(queries);
                let key = *key;
                handles.spawn(async move { cache.refresh(queries.as_ref(), key).await });
            }
        }
        if handles.is_empty() {
            return;
        }
        let joined = tokio::time::timeout(wait, async {
            while handles.join_next().await.is_some() {}
        })
        .await;
        if joined.is_err() {
            debug!(pending = handles.len(), "First reads still pending");
            handles.detach_all();
        }
    }

    /// Drop keys no request has touched within `key_idle`. Returns how many
    /// were removed.
    pub async fn evict_idle(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        let key_idle = self.key_idle;
        entries.retain(|_, entry| entry.last_access.elapsed() < key_idle);
        let evicted = before - entries.len();
        drop(entries);
        if evicted > 0 {
            METRICS
                .read_evictions
                .fetch_add(evicted as u64, Ordering::Relaxed);
            debug!(evicted, "Evicted idle reads");
            self.bump();
        }
        evicted
    }

    /// Refresh every tracked key concurrently.
    pub async fn refresh_all<Q: DropQueries>(self: &Arc<Self>, queries: &Arc<Q>) {
        self.evict_idle().await;
        let keys: Vec<QueryKey> = self.entries.read().await.keys().copied().collect();
        let mut handles = tokio::task::JoinSet::new();
        for key in keys {
            let cache = Arc::clone(self);
            let queries = Arc::clone(queries);
            handles.spawn(async move { cache.refresh(queries.as_ref(), key).await });
        }
        while let Some(result) = handles.join_next().await {
            if let Err(e) = result {
                warn!(error = %e, "Read refresh task failed");
            }
        }
    }

    /// Run the poll loop. Returns when `cancel` is triggered.
    pub async fn run_poller<Q: DropQueries>(
        self: Arc<Self>,
        queries: Arc<Q>,
        cancel: CancellationToken,
    ) {
        info!(
            interval_secs = self.poll_interval.as_secs(),
            key_idle_secs = self.key_idle.as_secs(),
            "Read poller started"
        );
        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {},
                _ = cancel.cancelled() => {
                    info!("Read poller shutting down");
                    return;
                }
            }
            self.refresh_all(&queries).await;
        }
    }

    /// Project the cached reads for one page render.
    pub async fn drop_state(
        &self,
        contract: Address,
        wallet: Option<Address>,
        quantity: u32,
        total_supply_contract: Address,
    ) -> DropState {
        let entries = self.entries.read().await;
        let state = |key: QueryKey| {
            entries
                .get(&key)
                .map(|entry| entry.state.clone())
                .unwrap_or_default()
        };

        let claimer_proof = match wallet {
            Some(wallet) => project(&state(QueryKey::ClaimerProofs(contract, wallet)), |v| match v {
                QueryValue::ClaimerProof(proof) => Some(proof.clone()),
                _ => None,
            }),
            None => ReadState::ready(None),
        };

        DropState {
            claim_conditions: project(&state(QueryKey::ClaimConditions(contract)), |v| match v {
                QueryValue::ClaimConditions(list) => Some(list.clone()),
                _ => None,
            }),
            active_claim_condition: project(
                &state(QueryKey::ActiveClaimCondition(contract, wallet)),
                |v| match v {
                    QueryValue::ClaimCondition(cc) => Some(cc.clone()),
                    _ => None,
                },
            ),
            claimer_proof,
            ineligibility_reasons: project(
                &state(QueryKey::IneligibilityReasons(contract, wallet, quantity)),
                |v| match v {
                    QueryValue::Reasons(reasons) => Some(reasons.clone()),
                    _ => None,
                },
            ),
            unclaimed_supply: project(&state(QueryKey::UnclaimedSupply(contract)), supply),
            claimed_supply: project(&state(QueryKey::ClaimedSupply(contract)), supply),
            total_supply: project(&state(QueryKey::TotalSupply(total_supply_contract)), supply),
            contract_loaded: true,
        }
    }

    pub async fn metadata(&self, contract: Address) -> Option<ContractMetadata> {
        match self.get(&QueryKey::ContractMetadata(contract)).await.data {
            Some(QueryValue::Metadata(metadata)) => Some(metadata),
            _ => None,
        }
    }

    /// One message per failed read among `keys`. The active claim condition is
    /// left out: it fails whenever no phase has started yet.
    pub async fn advisories(&self, keys: &[QueryKey]) -> Vec<String> {
        let entries = self.entries.read().await;
        keys.iter()
            .filter(|key| !matches!(key, QueryKey::ActiveClaimCondition(..)))
            .filter_map(|key| {
                let entry = entries.get(key)?;
                let error = entry.last_error.as_deref()?;
                Some(format!("Could not load {}: {error}", key.label()))
            })
            .collect()
    }
}

async fn fetch<Q: DropQueries>(queries: &Q, key: &QueryKey) -> Result<QueryValue, crate::Error> {
    Ok(match *key {
        QueryKey::ClaimConditions(contract) => {
            QueryValue::ClaimConditions(queries.claim_conditions(contract).await?)
        }
        QueryKey::ActiveClaimCondition(contract, wallet) => {
            QueryValue::ClaimCondition(queries.active_claim_condition(contract, wallet).await?)
        }
        QueryKey::ClaimerProofs(contract, wallet) => {
            QueryValue::ClaimerProof(queries.claimer_proofs(contract, wallet).await?)
        }
        QueryKey::IneligibilityReasons(contract, wallet, quantity) => QueryValue::Reasons(
            queries
                .claim_ineligibility_reasons(contract, wallet, quantity)
                .await?,
        ),
        QueryKey::UnclaimedSupply(contract) => {
            QueryValue::Supply(queries.unclaimed_supply(contract).await?.to_string())
        }
        QueryKey::ClaimedSupply(contract) => {
            QueryValue::Supply(queries.claimed_supply(contract).await?.to_string())
        }
        QueryKey::TotalSupply(contract) => {
            QueryValue::Supply(queries.total_supply(contract).await?.to_string())
        }
        QueryKey::ContractMetadata(contract) => {
            QueryValue::Metadata(queries.contract_metadata(contract).await?)
        }
    })
}

fn project<T>(state: &ReadState<QueryValue>, f: impl Fn(&QueryValue) -> Option<T>) -> ReadState<T> {
    ReadState {
        data: state.data.as_ref().and_then(f),
        is_loading: state.is_loading,
        is_error: state.is_error,
    }
}

fn supply(value: &QueryValue) -> Option<String> {
    match value {
        QueryValue::Supply(count) => Some(count.clone()),
        _ => None,
    }
}
