//! Claim-phase records as returned by the drop contract's query layer.
//!
//! Numeric fields stay as the strings the query layer hands back (decimal,
//! hex, or sentinels like `"unlimited"`). Interpretation happens in
//! [`crate::eligibility`], where parse failures fall back per field.

use serde::{Deserialize, Serialize};

/// Default decimal count for native currencies.
pub const DEFAULT_DECIMALS: u8 = 18;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyMetadata {
    /// Price per token in base units.
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub decimals: Option<u8>,
    #[serde(default)]
    pub symbol: String,
}

impl CurrencyMetadata {
    pub fn decimals(&self) -> u8 {
        self.decimals.unwrap_or(DEFAULT_DECIMALS)
    }
}

/// One sale phase of the drop.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimCondition {
    #[serde(default)]
    pub currency_metadata: CurrencyMetadata,
    #[serde(default)]
    pub max_claimable_supply: String,
    #[serde(default)]
    pub max_claimable_per_wallet: String,
    #[serde(default)]
    pub available_supply: String,
    /// Unix seconds.
    #[serde(default)]
    pub start_time: u64,
}

impl ClaimCondition {
    pub fn has_started(&self, now_secs: u64) -> bool {
        self.start_time <= now_secs
    }
}

/// Allow-list entry for a wallet. `max_claimable == "0"` means unlimited.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimerProof {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub max_claimable: String,
    #[serde(default)]
    pub price: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContractMetadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// Why a wallet cannot currently claim the requested quantity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IneligibilityReason {
    NotConnected,
    NotEnoughSupply,
    AddressNotAllowed,
    WaitBeforeNextClaimTransaction,
    AlreadyClaimed,
    NotEnoughTokens,
    NoActiveClaimPhase,
    NoClaimConditionSet,
    Unknown,
    Other(String),
}

impl IneligibilityReason {
    pub fn from_code(code: &str) -> Self {
        match code {
            "NotConnected" | "NoWallet" => Self::NotConnected,
            "NotEnoughSupply" => Self::NotEnoughSupply,
            "AddressNotAllowed" => Self::AddressNotAllowed,
            "WaitBeforeNextClaimTransaction" => Self::WaitBeforeNextClaimTransaction,
            "AlreadyClaimed" => Self::AlreadyClaimed,
            "NotEnoughTokens" => Self::NotEnoughTokens,
            "NoActiveClaimPhase" => Self::NoActiveClaimPhase,
            "NoClaimConditionSet" => Self::NoClaimConditionSet,
            "Unknown" => Self::Unknown,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Self::NotConnected => "NotConnected",
            Self::NotEnoughSupply => "NotEnoughSupply",
            Self::AddressNotAllowed => "AddressNotAllowed",
            Self::WaitBeforeNextClaimTransaction => "WaitBeforeNextClaimTransaction",
            Self::AlreadyClaimed => "AlreadyClaimed",
            Self::NotEnoughTokens => "NotEnoughTokens",
            Self::NoActiveClaimPhase => "NoActiveClaimPhase",
            Self::NoClaimConditionSet => "NoClaimConditionSet",
            Self::Unknown => "Unknown",
            Self::Other(code) => code,
        }
    }

    /// Plain-language text for this reason on its own.
    pub fn message(&self) -> &str {
        match self {
            Self::NotConnected => "No wallet connected.",
            Self::NotEnoughSupply => "There is not enough supply to claim.",
            Self::AddressNotAllowed => "This address is not on the allowlist.",
            Self::WaitBeforeNextClaimTransaction => {
                "Not enough time since last claim transaction. Please wait."
            }
            Self::AlreadyClaimed => "You have already claimed the token.",
            Self::NotEnoughTokens => "There are not enough tokens in the wallet to pay for the claim.",
            Self::NoActiveClaimPhase => "There is no active claim phase at the moment.",
            Self::NoClaimConditionSet => "There is no claim condition set.",
            Self::Unknown => "No claim conditions found.",
            Self::Other(code) => code,
        }
    }
}

impl From<String> for IneligibilityReason {
    fn from(code: String) -> Self {
        Self::from_code(&code)
    }
}

impl From<IneligibilityReason> for String {
    fn from(reason: IneligibilityReason) -> Self {
        reason.code().to_string()
    }
}

/// Button text for a non-empty reason list; the first reason decides.
pub fn parse_ineligibility(reasons: &[IneligibilityReason], quantity: u32) -> String {
    let Some(reason) = reasons.first() else {
        return String::new();
    };
    match reason {
        IneligibilityReason::Unknown
        | IneligibilityReason::NoActiveClaimPhase
        | IneligibilityReason::NoClaimConditionSet => {
            "This drop is not ready to be minted.".to_string()
        }
        IneligibilityReason::NotEnoughTokens => "You don't have enough currency to mint.".to_string(),
        IneligibilityReason::AddressNotAllowed if quantity > 1 => {
            format!("You are not eligible to mint {quantity} tokens.")
        }
        IneligibilityReason::AddressNotAllowed => {
            "You are not eligible to mint at this time.".to_string()
        }
        other => other.message().to_string(),
    }
}
