//! Application state shared across handlers.

use crate::cache::ReadCache;
use crate::config::Config;
use crate::mint::MintSubmitter;
use crate::queries::DropQueries;
use crate::rpc::RpcClient;
use alloy_primitives::Address;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// Shared application state.
pub struct AppState<Q, S> {
    pub config: Config,
    pub rpc: Arc<RpcClient>,
    pub queries: Arc<Q>,
    pub submitter: Arc<S>,
    pub cache: Arc<ReadCache>,
    /// Contract whose `totalSupply()` feeds the minted counter; `None` = page contract.
    pub total_supply_contract: Option<Address>,
    pub start_time: Instant,
    pub request_count: AtomicU64,
}

impl<Q: DropQueries, S: MintSubmitter> AppState<Q, S> {
    pub fn new(
        config: Config,
        rpc: Arc<RpcClient>,
        queries: Arc<Q>,
        submitter: Arc<S>,
    ) -> Result<Self, crate::Error> {
        let total_supply_contract = match config.total_supply_contract.trim() {
            "" => None,
            raw => Some(raw.parse().map_err(|e| {
                crate::Error::Config(format!("Invalid total_supply_contract: {e}"))
            })?),
        };

        config.validate()?;

        let cache = Arc::new(
            ReadCache::new(
                Duration::from_secs(config.poll_interval_secs.max(1)),
                Duration::from_secs(config.key_idle_secs),
            )
            .with_max_tracked(config.max_tracked_reads),
        );

        info!(
            total_supply_contract = ?total_supply_contract,
            poll_interval_secs = config.poll_interval_secs,
            max_tracked_reads = config.max_tracked_reads,
            mint_auth = config.mint_api_key().is_some(),
            "Storefront state initialized"
        );

        Ok(Self {
            config,
            rpc,
            queries,
            submitter,
            cache,
            total_supply_contract,
            start_time: Instant::now(),
            request_count: AtomicU64::new(0),
        })
    }

    pub fn first_read_timeout(&self) -> Duration {
        Duration::from_millis(self.config.first_read_timeout_ms)
    }
}
