//! Mint eligibility and pricing derived from the latest contract reads.
//!
//! Every operation here is a pure function of a [`DropState`]. Numeric
//! fields are parsed per field and fall back to a fixed default on failure,
//! so a malformed upstream value never aborts the derivation.

use crate::claim::{
    parse_ineligibility, ClaimCondition, ClaimerProof, IneligibilityReason, DEFAULT_DECIMALS,
};
use crate::read::ReadState;
use crate::units::{format_units, parse_u256};
use alloy_primitives::U256;

/// Stand-in for "no practical cap".
pub const UNLIMITED: u64 = 1_000_000;

/// Upper bound of the quantity selector.
pub const MAX_QUANTITY: u32 = 10;

pub const LABEL_SOLD_OUT: &str = "Sold Out";
pub const LABEL_CHECKING: &str = "Checking eligibility...";
pub const LABEL_UNAVAILABLE: &str = "Minting not available";

/// All reads the mint page depends on.
#[derive(Debug, Clone, Default)]
pub struct DropState {
    pub claim_conditions: ReadState<Vec<ClaimCondition>>,
    pub active_claim_condition: ReadState<ClaimCondition>,
    /// `Some(None)` once resolved for a wallet with no allow-list entry.
    pub claimer_proof: ReadState<Option<ClaimerProof>>,
    pub ineligibility_reasons: ReadState<Vec<IneligibilityReason>>,
    pub unclaimed_supply: ReadState<String>,
    pub claimed_supply: ReadState<String>,
    /// Externally read `totalSupply()`, decimal string.
    pub total_supply: ReadState<String>,
    /// A contract handle is resolved.
    pub contract_loaded: bool,
}

impl DropState {
    fn active(&self) -> Option<&ClaimCondition> {
        self.active_claim_condition.data()
    }

    fn proof(&self) -> Option<&ClaimerProof> {
        self.claimer_proof.data().and_then(|p| p.as_ref())
    }

    /// Largest quantity the wallet may claim right now; [`UNLIMITED`] means no cap.
    pub fn max_claimable(&self) -> u64 {
        let unlimited = U256::from(UNLIMITED);
        let active = self.active();

        let mut cap = active
            .and_then(|cc| parse_u256(&cc.max_claimable_supply).ok())
            .unwrap_or(unlimited);

        let per_wallet = active
            .and_then(|cc| parse_u256(&cc.max_claimable_per_wallet).ok())
            .unwrap_or(unlimited);
        if per_wallet <= cap {
            cap = per_wallet;
        }

        if let Some(proof) = self.proof() {
            let snapshot = proof.max_claimable.trim();
            if snapshot == "0" {
                cap = unlimited;
            } else if let Ok(value) = parse_u256(snapshot) {
                cap = value;
            }
        }

        let available = self
            .unclaimed_supply
            .data()
            .and_then(|s| parse_u256(s).ok())
            .unwrap_or(U256::ZERO);
        let max = available.min(cap);

        if max >= unlimited {
            UNLIMITED
        } else {
            u64::try_from(max).unwrap_or(UNLIMITED)
        }
    }

    /// Quantity selector bound: `min(10, max_claimable)`.
    pub fn quantity_limit(&self) -> u32 {
        self.max_claimable().min(MAX_QUANTITY as u64) as u32
    }

    /// `requested` pulled into `1..=quantity_limit()`.
    pub fn clamp_quantity(&self, requested: u32) -> u32 {
        requested.min(self.quantity_limit()).max(1)
    }

    /// Claimed count normalised to a decimal string; unreadable counts as `"0"`.
    pub fn number_claimed(&self) -> String {
        decimal_or_zero(&self.claimed_supply)
    }

    /// Minted counter from the external `totalSupply()` read; unreadable
    /// counts as `"0"`.
    pub fn number_minted(&self) -> String {
        decimal_or_zero(&self.total_supply)
    }

    /// Sold out when the active phase has nothing left, or claimed equals the
    /// external total supply. Fails open: an unreadable available-supply
    /// figure reports `false`.
    pub fn is_sold_out(&self) -> bool {
        if self.active_claim_condition.is_success() {
            let raw = self
                .active()
                .map(|cc| cc.available_supply.trim())
                .unwrap_or_default();
            match supply_exhausted(raw) {
                Some(true) => return true,
                Some(false) => {}
                None => return false,
            }
        }
        match self.total_supply.data() {
            Some(_) => self.number_claimed() == self.number_minted(),
            None => false,
        }
    }

    pub fn can_claim(&self) -> bool {
        self.active_claim_condition.is_success()
            && self.ineligibility_reasons.is_success()
            && self
                .ineligibility_reasons
                .data()
                .is_some_and(|reasons| reasons.is_empty())
            && !self.is_sold_out()
    }

    /// Price per token in base units; zero when unknown.
    pub fn unit_price(&self) -> U256 {
        self.active()
            .and_then(|cc| parse_u256(&cc.currency_metadata.value).ok())
            .unwrap_or(U256::ZERO)
    }

    fn currency(&self) -> (u8, &str) {
        match self.active() {
            Some(cc) => (
                cc.currency_metadata.decimals(),
                cc.currency_metadata.symbol.as_str(),
            ),
            None => (DEFAULT_DECIMALS, ""),
        }
    }

    /// Total for `quantity` tokens, e.g. `"0.1515 ETH"`, or `"Free"`.
    pub fn price_to_mint(&self, quantity: u32) -> String {
        let unit = self.unit_price();
        if unit.is_zero() {
            return "Free".to_string();
        }
        let (decimals, symbol) = self.currency();
        format_price(unit.saturating_mul(U256::from(quantity)), decimals, symbol)
    }

    /// Page-level loading: core reads pending or no contract yet.
    pub fn is_loading(&self) -> bool {
        self.active_claim_condition.is_loading
            || self.unclaimed_supply.is_loading
            || self.claimed_supply.is_loading
            || !self.contract_loaded
    }

    pub fn button_loading(&self) -> bool {
        self.is_loading() || self.ineligibility_reasons.is_loading
    }

    pub fn button_label(&self, quantity: u32) -> String {
        if self.is_sold_out() {
            return LABEL_SOLD_OUT.to_string();
        }
        if self.can_claim() {
            return format!("Mint ({})", self.price_to_mint(quantity));
        }
        if let Some(reasons) = self.ineligibility_reasons.data() {
            if !reasons.is_empty() {
                return parse_ineligibility(reasons, quantity);
            }
        }
        if self.button_loading() {
            return LABEL_CHECKING.to_string();
        }
        LABEL_UNAVAILABLE.to_string()
    }

    /// No sale phase configured, or every phase has a zero supply cap.
    pub fn drop_not_ready(&self) -> bool {
        match self.claim_conditions.data() {
            Some(conditions) => conditions
                .iter()
                .all(|cc| cc.max_claimable_supply.trim() == "0"),
            None => false,
        }
    }

    /// Phases exist but none is active yet.
    pub fn drop_starting_soon(&self, now_secs: u64) -> bool {
        let has_conditions = self
            .claim_conditions
            .data()
            .is_some_and(|conditions| !conditions.is_empty());
        (has_conditions && self.active_claim_condition.is_error)
            || self.active().is_some_and(|cc| !cc.has_started(now_secs))
    }
}

/// `Some(true)` when the figure is zero or negative, `None` when unreadable.
fn supply_exhausted(raw: &str) -> Option<bool> {
    if raw.is_empty() {
        return Some(true);
    }
    if let Some(negative) = raw.strip_prefix('-') {
        return parse_u256(negative).ok().map(|_| true);
    }
    parse_u256(raw).ok().map(|n| n.is_zero())
}

/// `"<amount> <symbol>"` with the amount in display units.
fn decimal_or_zero(read: &ReadState<String>) -> String {
    read.data()
        .and_then(|s| parse_u256(s).ok())
        .unwrap_or(U256::ZERO)
        .to_string()
}

pub fn format_price(amount: U256, decimals: u8, symbol: &str) -> String {
    let shown = format_units(amount, decimals)
        .or_else(|_| format_units(amount, DEFAULT_DECIMALS))
        .unwrap_or_else(|_| amount.to_string());
    format!("{shown} {symbol}").trim_end().to_string()
}

/// Error for a quantity outside `1..=min(10, max_claimable)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantityError {
    pub requested: u32,
    pub limit: u32,
}

impl std::fmt::Display for QuantityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.limit == 0 {
            write!(f, "nothing left to mint for this wallet")
        } else {
            write!(
                f,
                "quantity {} outside allowed range 1-{}",
                self.requested, self.limit
            )
        }
    }
}

impl std::error::Error for QuantityError {}

/// A validated mint quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintRequest {
    quantity: u32,
}

impl MintRequest {
    pub fn new(quantity: u32, max_claimable: u64) -> Result<Self, QuantityError> {
        let limit = max_claimable.min(MAX_QUANTITY as u64) as u32;
        if quantity == 0 || quantity > limit {
            return Err(QuantityError {
                requested: quantity,
                limit,
            });
        }
        Ok(Self { quantity })
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claim::CurrencyMetadata;

    const ETH_0_0505: &str = "50500000000000000";

    fn condition(max_supply: &str, per_wallet: &str, available: &str) -> ClaimCondition {
        ClaimCondition {
            currency_metadata: CurrencyMetadata {
                value: ETH_0_0505.into(),
                decimals: Some(18),
                symbol: "ETH".into(),
            },
            max_claimable_supply: max_supply.into(),
            max_claimable_per_wallet: per_wallet.into(),
            available_supply: available.into(),
            start_time: 0,
        }
    }

    fn eligible_state() -> DropState {
        DropState {
            claim_conditions: ReadState::ready(vec![condition("1998", "10", "1000")]),
            active_claim_condition: ReadState::ready(condition("1998", "10", "1000")),
            claimer_proof: ReadState::ready(None),
            ineligibility_reasons: ReadState::ready(vec![]),
            unclaimed_supply: ReadState::ready("1000".into()),
            claimed_supply: ReadState::ready("998".into()),
            total_supply: ReadState::ready("998000".into()),
            contract_loaded: true,
        }
    }

    fn with_proof(mut state: DropState, max: &str) -> DropState {
        state.claimer_proof = ReadState::ready(Some(ClaimerProof {
            address: "0xabc".into(),
            max_claimable: max.into(),
            price: None,
        }));
        state
    }

    // --- maxClaimable ---

    #[test]
    fn test_max_claimable_per_wallet_cap() {
        assert_eq!(eligible_state().max_claimable(), 10);
    }

    #[test]
    fn test_max_claimable_unparseable_supply_uses_sentinel() {
        let mut state = eligible_state();
        state.active_claim_condition = ReadState::ready(condition("unlimited", "unlimited", "1000"));
        state.unclaimed_supply = ReadState::ready("5000000".into());
        assert_eq!(state.max_claimable(), UNLIMITED);
    }

    #[test]
    fn test_max_claimable_proof_overrides_cap() {
        let state = with_proof(eligible_state(), "25");
        assert_eq!(state.max_claimable(), 25);
    }

    #[test]
    fn test_max_claimable_unclaimed_bound_wins_over_proof() {
        let mut state = with_proof(eligible_state(), "5");
        state.unclaimed_supply = ReadState::ready("3".into());
        assert_eq!(state.max_claimable(), 3);
    }

    #[test]
    fn test_max_claimable_zero_proof_collapses_to_unclaimed() {
        let mut state = with_proof(eligible_state(), "0");
        state.unclaimed_supply = ReadState::ready("40".into());
        assert_eq!(state.max_claimable(), 40);
        state.unclaimed_supply = ReadState::ready("9999999".into());
        assert_eq!(state.max_claimable(), UNLIMITED);
    }

    #[test]
    fn test_max_claimable_garbage_proof_keeps_previous_cap() {
        let state = with_proof(eligible_state(), "lots");
        assert_eq!(state.max_claimable(), 10);
    }

    #[test]
    fn test_max_claimable_never_exceeds_unclaimed() {
        for unclaimed in [0u64, 1, 3, 9, 10, 11, 500] {
            for proof in ["", "0", "2", "7", "12", "x"] {
                let mut state = eligible_state();
                if !proof.is_empty() {
                    state = with_proof(state, proof);
                }
                state.unclaimed_supply = ReadState::ready(unclaimed.to_string());
                let max = state.max_claimable();
                assert!(max <= unclaimed, "unclaimed={unclaimed} proof={proof} max={max}");
                let wallet_cap = match proof {
                    "0" => UNLIMITED,
                    "" | "x" => 10,
                    n => n.parse().unwrap(),
                };
                assert!(max <= wallet_cap);
            }
        }
    }

    #[test]
    fn test_max_claimable_missing_unclaimed_is_zero() {
        let mut state = eligible_state();
        state.unclaimed_supply = ReadState::loading();
        assert_eq!(state.max_claimable(), 0);
        assert_eq!(state.quantity_limit(), 0);
    }

    // --- isSoldOut ---

    #[test]
    fn test_sold_out_when_claimed_matches_total_supply() {
        let mut state = eligible_state();
        state.claimed_supply = ReadState::ready("1998".into());
        state.total_supply = ReadState::ready("1998".into());
        assert!(state.is_sold_out());
        assert_eq!(state.button_label(1), "Sold Out");
    }

    #[test]
    fn test_sold_out_when_available_supply_zero() {
        let mut state = eligible_state();
        state.active_claim_condition = ReadState::ready(condition("1998", "10", "0"));
        assert!(state.is_sold_out());
        assert!(!state.can_claim());
    }

    #[test]
    fn test_sold_out_fails_open_on_malformed_available_supply() {
        let mut state = eligible_state();
        state.active_claim_condition = ReadState::ready(condition("1998", "10", "unlimited"));
        state.claimed_supply = ReadState::ready("1998".into());
        state.total_supply = ReadState::ready("1998".into());
        assert!(!state.is_sold_out());
    }

    #[test]
    fn test_sold_out_ignores_available_supply_while_loading() {
        let mut state = eligible_state();
        state.active_claim_condition = ReadState::loading();
        assert!(!state.is_sold_out());
        state.total_supply = ReadState::loading();
        state.claimed_supply = ReadState::loading();
        assert!(!state.is_sold_out());
    }

    #[test]
    fn test_claimed_compares_normalised_hex() {
        let mut state = eligible_state();
        state.claimed_supply = ReadState::ready("0x7ce".into());
        state.total_supply = ReadState::ready("1998".into());
        assert!(state.is_sold_out());

        state.claimed_supply = ReadState::ready("1998".into());
        state.total_supply = ReadState::ready("0x7ce".into());
        assert!(state.is_sold_out());
    }

    #[test]
    fn test_minted_counter_reads_total_supply() {
        let mut state = eligible_state();
        state.total_supply = ReadState::ready("1500".into());
        assert_eq!(state.number_minted(), "1500");
        assert_eq!(state.number_claimed(), "998");
        state.total_supply = ReadState::failed();
        assert_eq!(state.number_minted(), "0");
    }

    #[test]
    fn test_clamp_quantity_to_limit() {
        let mut state = eligible_state();
        assert_eq!(state.clamp_quantity(7), 7);
        state.unclaimed_supply = ReadState::ready("3".into());
        assert_eq!(state.quantity_limit(), 3);
        assert_eq!(state.clamp_quantity(5), 3);
        assert_eq!(state.clamp_quantity(0), 1);
        state.unclaimed_supply = ReadState::ready("0".into());
        assert_eq!(state.clamp_quantity(4), 1);
    }

    // --- canClaim / labels ---

    #[test]
    fn test_can_claim_requires_successful_reads() {
        let mut state = eligible_state();
        assert!(state.can_claim());
        state.ineligibility_reasons = ReadState::loading();
        assert!(!state.can_claim());
        assert_eq!(state.button_label(1), LABEL_CHECKING);
    }

    #[test]
    fn test_not_connected_reason_blocks_claim() {
        let mut state = eligible_state();
        state.ineligibility_reasons = ReadState::ready(vec![IneligibilityReason::NotConnected]);
        assert!(!state.can_claim());
        assert_eq!(state.button_label(1), "No wallet connected.");
    }

    #[test]
    fn test_price_scales_with_quantity() {
        let state = eligible_state();
        assert_eq!(state.price_to_mint(1), "0.0505 ETH");
        assert_eq!(state.price_to_mint(3), "0.1515 ETH");
        assert_eq!(state.price_to_mint(10), "0.505 ETH");
        for q in 1..=MAX_QUANTITY {
            let expected = format_price(U256::from(50_500_000_000_000_000u64 * q as u64), 18, "ETH");
            assert_eq!(state.price_to_mint(q), expected);
            assert_eq!(state.button_label(q), format!("Mint ({expected})"));
        }
    }

    #[test]
    fn test_free_mint_label() {
        let mut state = eligible_state();
        let mut cc = condition("1998", "10", "1000");
        cc.currency_metadata.value = "0".into();
        state.active_claim_condition = ReadState::ready(cc);
        for q in 1..=MAX_QUANTITY {
            assert!(state.button_label(q).contains("Free"));
        }
        assert_eq!(state.button_label(2), "Mint (Free)");
    }

    #[test]
    fn test_fallback_label_when_nothing_known() {
        let state = DropState {
            active_claim_condition: ReadState::failed(),
            ineligibility_reasons: ReadState::failed(),
            unclaimed_supply: ReadState::failed(),
            claimed_supply: ReadState::failed(),
            total_supply: ReadState::failed(),
            contract_loaded: true,
            ..DropState::default()
        };
        assert_eq!(state.button_label(1), LABEL_UNAVAILABLE);
    }

    #[test]
    fn test_loading_without_contract() {
        let state = DropState::default();
        assert!(state.is_loading());
        assert!(state.button_loading());
        assert!(!state.is_sold_out());
    }

    // --- drop timing ---

    #[test]
    fn test_drop_not_ready_when_all_caps_zero() {
        let mut state = eligible_state();
        state.claim_conditions =
            ReadState::ready(vec![condition("0", "1", "0"), condition("0", "5", "0")]);
        assert!(state.drop_not_ready());
        state.claim_conditions = ReadState::ready(vec![]);
        assert!(state.drop_not_ready());
        state.claim_conditions = ReadState::loading();
        assert!(!state.drop_not_ready());
        state.claim_conditions = ReadState::ready(vec![condition("0", "1", "0"), condition("5", "1", "5")]);
        assert!(!state.drop_not_ready());
    }

    #[test]
    fn test_drop_starting_soon() {
        let mut state = eligible_state();
        assert!(!state.drop_starting_soon(100));

        let mut future = condition("1998", "10", "1000");
        future.start_time = 200;
        state.active_claim_condition = ReadState::ready(future);
        assert!(state.drop_starting_soon(100));
        assert!(!state.drop_starting_soon(200));

        state.active_claim_condition = ReadState::failed();
        assert!(state.drop_starting_soon(100));
        state.claim_conditions = ReadState::ready(vec![]);
        assert!(!state.drop_starting_soon(100));
    }

    // --- MintRequest ---

    #[test]
    fn test_mint_request_bounds() {
        assert_eq!(MintRequest::new(3, 1000).unwrap().quantity(), 3);
        assert!(MintRequest::new(0, 1000).is_err());
        assert!(MintRequest::new(11, UNLIMITED).is_err());
        let err = MintRequest::new(4, 3).unwrap_err();
        assert_eq!(err, QuantityError { requested: 4, limit: 3 });
        assert_eq!(
            MintRequest::new(1, 0).unwrap_err().to_string(),
            "nothing left to mint for this wallet"
        );
    }
}
