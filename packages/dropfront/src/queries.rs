//! Upstream contract-query layer.
//!
//! [`DropQueries`] is the seam the read cache fetches through. The shipped
//! implementation, [`SnapshotQueries`], serves claim-phase state from a
//! snapshot document kept current by the drop's operator and reads
//! `totalSupply()` and wallet balances over JSON-RPC.

use crate::rpc::RpcClient;
use alloy_primitives::{Address, U256};
use dropfront_types::units::parse_u256;
use dropfront_types::{
    ClaimCondition, ClaimerProof, ContractMetadata, IneligibilityReason, UNLIMITED,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Reads the mint page depends on. Each call is one fetch; caching and
/// polling live in [`crate::cache::ReadCache`].
pub trait DropQueries: Send + Sync + 'static {
    fn claim_conditions(
        &self,
        contract: Address,
    ) -> impl Future<Output = Result<Vec<ClaimCondition>, crate::Error>> + Send;

    /// Errors when no phase is currently active.
    fn active_claim_condition(
        &self,
        contract: Address,
        wallet: Option<Address>,
    ) -> impl Future<Output = Result<ClaimCondition, crate::Error>> + Send;

    fn claimer_proofs(
        &self,
        contract: Address,
        wallet: Address,
    ) -> impl Future<Output = Result<Option<ClaimerProof>, crate::Error>> + Send;

    fn claim_ineligibility_reasons(
        &self,
        contract: Address,
        wallet: Option<Address>,
        quantity: u32,
    ) -> impl Future<Output = Result<Vec<IneligibilityReason>, crate::Error>> + Send;

    fn unclaimed_supply(
        &self,
        contract: Address,
    ) -> impl Future<Output = Result<U256, crate::Error>> + Send;

    fn claimed_supply(
        &self,
        contract: Address,
    ) -> impl Future<Output = Result<U256, crate::Error>> + Send;

    /// Generic `totalSupply()` read on any contract.
    fn total_supply(
        &self,
        contract: Address,
    ) -> impl Future<Output = Result<U256, crate::Error>> + Send;

    fn contract_metadata(
        &self,
        contract: Address,
    ) -> impl Future<Output = Result<ContractMetadata, crate::Error>> + Send;
}

// --- Snapshot document ---

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropSnapshot {
    #[serde(default)]
    pub contracts: HashMap<String, ContractSnapshot>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractSnapshot {
    #[serde(default)]
    pub metadata: ContractMetadata,
    #[serde(default)]
    pub claim_conditions: Vec<ClaimCondition>,
    /// Allow-list of the drop; empty = public.
    #[serde(default)]
    pub allowlist: Vec<ClaimerProof>,
    #[serde(default)]
    pub claimed_supply: String,
    #[serde(default)]
    pub unclaimed_supply: String,
    /// Tokens already claimed per wallet address.
    #[serde(default)]
    pub claimed_by_wallet: HashMap<String, String>,
}

impl DropSnapshot {
    pub fn parse(json: &[u8]) -> Result<Self, crate::Error> {
        serde_json::from_slice(json)
            .map_err(|e| crate::Error::Query(format!("Invalid snapshot JSON: {e}")))
    }

    pub fn contract(&self, contract: Address) -> Option<&ContractSnapshot> {
        self.contracts
            .iter()
            .find(|(key, _)| key.parse::<Address>().is_ok_and(|a| a == contract))
            .map(|(_, snapshot)| snapshot)
    }
}

impl ContractSnapshot {
    /// Latest phase whose start time has passed.
    pub fn active_condition(&self, now_secs: u64) -> Option<&ClaimCondition> {
        self.claim_conditions
            .iter()
            .filter(|cc| cc.has_started(now_secs))
            .max_by_key(|cc| cc.start_time)
    }

    pub fn proof_for(&self, wallet: Address) -> Option<&ClaimerProof> {
        self.allowlist
            .iter()
            .find(|p| p.address.parse::<Address>().is_ok_and(|a| a == wallet))
    }

    pub fn claimed_by(&self, wallet: Address) -> U256 {
        self.claimed_by_wallet
            .iter()
            .find(|(key, _)| key.parse::<Address>().is_ok_and(|a| a == wallet))
            .and_then(|(_, count)| parse_u256(count).ok())
            .unwrap_or(U256::ZERO)
    }

    /// Active phase as seen by `wallet`: allow-list price overrides apply.
    pub fn active_for_wallet(&self, now_secs: u64, wallet: Option<Address>) -> Option<ClaimCondition> {
        let mut active = self.active_condition(now_secs)?.clone();
        if let Some(price) = wallet
            .and_then(|w| self.proof_for(w))
            .and_then(|p| p.price.as_ref())
        {
            active.currency_metadata.value = price.clone();
        }
        Some(active)
    }

    /// Reasons that don't need chain state, in evaluation order.
    pub fn static_ineligibility(
        &self,
        now_secs: u64,
        wallet: Option<Address>,
        quantity: u32,
    ) -> Vec<IneligibilityReason> {
        let Some(wallet) = wallet else {
            return vec![IneligibilityReason::NotConnected];
        };
        if self.claim_conditions.is_empty() {
            return vec![IneligibilityReason::NoClaimConditionSet];
        }
        let Some(active) = self.active_condition(now_secs) else {
            return vec![IneligibilityReason::NoActiveClaimPhase];
        };

        let mut reasons = Vec::new();
        let requested = U256::from(quantity);

        if let Ok(available) = parse_u256(&active.available_supply) {
            if requested > available {
                reasons.push(IneligibilityReason::NotEnoughSupply);
            }
        }

        let proof = self.proof_for(wallet);
        if !self.allowlist.is_empty() && proof.is_none() {
            reasons.push(IneligibilityReason::AddressNotAllowed);
            return reasons;
        }

        let unlimited = U256::from(UNLIMITED);
        let limit = match proof.map(|p| p.max_claimable.trim()) {
            Some("0") => unlimited,
            Some(raw) => parse_u256(raw).unwrap_or(unlimited),
            None => parse_u256(&active.max_claimable_per_wallet).unwrap_or(unlimited),
        };
        if self.claimed_by(wallet).saturating_add(requested) > limit {
            reasons.push(IneligibilityReason::AddressNotAllowed);
        }
        reasons
    }
}

/// Snapshot-file + JSON-RPC implementation of [`DropQueries`].
pub struct SnapshotQueries {
    path: PathBuf,
    rpc: Arc<RpcClient>,
}

impl SnapshotQueries {
    pub fn new(path: PathBuf, rpc: Arc<RpcClient>) -> Self {
        Self { path, rpc }
    }

    async fn load(&self, contract: Address) -> Result<ContractSnapshot, crate::Error> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            crate::Error::Query(format!(
                "Failed to read snapshot {}: {e}",
                self.path.display()
            ))
        })?;
        let snapshot = DropSnapshot::parse(&bytes)?;
        debug!(path = %self.path.display(), contracts = snapshot.contracts.len(), "Snapshot loaded");
        snapshot
            .contract(contract)
            .cloned()
            .ok_or_else(|| crate::Error::Query(format!("Contract {contract} not in snapshot")))
    }
}

impl DropQueries for SnapshotQueries {
    async fn claim_conditions(&self, contract: Address) -> Result<Vec<ClaimCondition>, crate::Error> {
        Ok(self.load(contract).await?.claim_conditions)
    }

    async fn active_claim_condition(
        &self,
        contract: Address,
        wallet: Option<Address>,
    ) -> Result<ClaimCondition, crate::Error> {
        self.load(contract)
            .await?
            .active_for_wallet(now_secs(), wallet)
            .ok_or_else(|| crate::Error::Query("No active claim condition".into()))
    }

    async fn claimer_proofs(
        &self,
        contract: Address,
        wallet: Address,
    ) -> Result<Option<ClaimerProof>, crate::Error> {
        Ok(self.load(contract).await?.proof_for(wallet).cloned())
    }

    async fn claim_ineligibility_reasons(
        &self,
        contract: Address,
        wallet: Option<Address>,
        quantity: u32,
    ) -> Result<Vec<IneligibilityReason>, crate::Error> {
        let snapshot = self.load(contract).await?;
        let now = now_secs();
        let mut reasons = snapshot.static_ineligibility(now, wallet, quantity);
        if !reasons.is_empty() {
            return Ok(reasons);
        }

        // Connected, active phase, within caps: check the wallet can pay.
        if let (Some(wallet), Some(active)) = (wallet, snapshot.active_for_wallet(now, wallet)) {
            let price = parse_u256(&active.currency_metadata.value).unwrap_or(U256::ZERO);
            let total = price.saturating_mul(U256::from(quantity));
            if !total.is_zero() {
                let balance = self.rpc.balance(wallet).await?;
                if balance < total {
                    reasons.push(IneligibilityReason::NotEnoughTokens);
                }
            }
        }
        Ok(reasons)
    }

    async fn unclaimed_supply(&self, contract: Address) -> Result<U256, crate::Error> {
        let raw = self.load(contract).await?.unclaimed_supply;
        parse_u256(&raw).map_err(|e| crate::Error::Query(format!("unclaimed supply: {e}")))
    }

    async fn claimed_supply(&self, contract: Address) -> Result<U256, crate::Error> {
        let raw = self.load(contract).await?.claimed_supply;
        parse_u256(&raw).map_err(|e| crate::Error::Query(format!("claimed supply: {e}")))
    }

    async fn total_supply(&self, contract: Address) -> Result<U256, crate::Error> {
        Ok(self.rpc.total_supply(contract).await?)
    }

    async fn contract_metadata(&self, contract: Address) -> Result<ContractMetadata, crate::Error> {
        Ok(self.load(contract).await?.metadata)
    }
}

pub(crate) fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
