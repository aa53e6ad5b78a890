//! In-memory query source and submitter for exercising the storefront
//! without a node. Enabled for unit tests and by the `testing` feature.

use crate::mint::{MintCall, MintSubmitter, SubmitError};
use crate::page::parse_address;
use crate::queries::{now_secs, ContractSnapshot, DropQueries};
use alloy_primitives::{Address, U256};
use dropfront_types::{
    ClaimCondition, ClaimerProof, ContractMetadata, CurrencyMetadata, IneligibilityReason,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

pub const DROP: &str = "0x5f8eD33d9eC6B28DAafa9A1f9faDff3D9f94e5fB";
pub const ALICE: &str = "0x00000000000000000000000000000000000a11ce";
pub const BOB: &str = "0x0000000000000000000000000000000000000b0b";

/// Parse one of the fixture addresses above.
pub fn addr(raw: &str) -> Address {
    parse_address(raw).unwrap_or_default()
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

pub fn condition(price_wei: &str, available: &str, start_time: u64) -> ClaimCondition {
    ClaimCondition {
        currency_metadata: CurrencyMetadata {
            value: price_wei.into(),
            decimals: Some(18),
            symbol: "ETH".into(),
        },
        max_claimable_supply: "1998".into(),
        max_claimable_per_wallet: "10".into(),
        available_supply: available.into(),
        start_time,
    }
}

/// Public phase at 0.0505 ETH with 1000 of 1998 left.
pub fn public_sale() -> ContractSnapshot {
    ContractSnapshot {
        metadata: ContractMetadata {
            name: "Crypto Homies Genesis".into(),
            description: Some("Genesis collection".into()),
            image: None,
        },
        claim_conditions: vec![condition("50500000000000000", "1000", 0)],
        claimed_supply: "998".into(),
        unclaimed_supply: "1000".into(),
        ..ContractSnapshot::default()
    }
}

/// Query source serving a mutable snapshot. `totalSupply()` starts at 1998.
pub struct FixtureQueries {
    pub snapshot: Mutex<ContractSnapshot>,
    pub total_supply: Mutex<U256>,
    /// Every read fails while set.
    pub offline: AtomicBool,
}

impl FixtureQueries {
    pub fn new(snapshot: ContractSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
            total_supply: Mutex::new(U256::from(1998u64)),
            offline: AtomicBool::new(false),
        }
    }

    pub fn set_total_supply(&self, value: u64) {
        *lock(&self.total_supply) = U256::from(value);
    }

    fn read(&self) -> Result<ContractSnapshot, crate::Error> {
        if self.offline.load(Ordering::Relaxed) {
            return Err(crate::Error::Rpc("node unreachable".into()));
        }
        Ok(lock(&self.snapshot).clone())
    }
}

impl DropQueries for FixtureQueries {
    async fn claim_conditions(&self, _: Address) -> Result<Vec<ClaimCondition>, crate::Error> {
        Ok(self.read()?.claim_conditions)
    }

    async fn active_claim_condition(
        &self,
        _: Address,
        wallet: Option<Address>,
    ) -> Result<ClaimCondition, crate::Error> {
        self.read()?
            .active_for_wallet(now_secs(), wallet)
            .ok_or_else(|| crate::Error::Query("No active claim condition".into()))
    }

    async fn claimer_proofs(
        &self,
        _: Address,
        wallet: Address,
    ) -> Result<Option<ClaimerProof>, crate::Error> {
        Ok(self.read()?.proof_for(wallet).cloned())
    }

    async fn claim_ineligibility_reasons(
        &self,
        _: Address,
        wallet: Option<Address>,
        quantity: u32,
    ) -> Result<Vec<IneligibilityReason>, crate::Error> {
        Ok(self.read()?.static_ineligibility(now_secs(), wallet, quantity))
    }

    async fn unclaimed_supply(&self, _: Address) -> Result<U256, crate::Error> {
        Ok(self.read()?.unclaimed_supply.parse().unwrap_or_default())
    }

    async fn claimed_supply(&self, _: Address) -> Result<U256, crate::Error> {
        Ok(self.read()?.claimed_supply.parse().unwrap_or_default())
    }

    async fn total_supply(&self, _: Address) -> Result<U256, crate::Error> {
        self.read()?;
        Ok(*lock(&self.total_supply))
    }

    async fn contract_metadata(&self, _: Address) -> Result<ContractMetadata, crate::Error> {
        Ok(self.read()?.metadata)
    }
}

/// Submitter that records calls and replies with a fixed result.
pub struct FixtureSubmitter {
    pub result: Result<String, SubmitError>,
    pub calls: Mutex<Vec<MintCall>>,
}

impl FixtureSubmitter {
    pub fn ok(tx_hash: &str) -> Self {
        Self::with(Ok(tx_hash.into()))
    }

    pub fn with(result: Result<String, SubmitError>) -> Self {
        Self {
            result,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<MintCall> {
        lock(&self.calls).clone()
    }
}

impl MintSubmitter for FixtureSubmitter {
    async fn submit(&self, call: &MintCall) -> Result<String, SubmitError> {
        lock(&self.calls).push(call.clone());
        self.result.clone()
    }
}
