//! Classification of mint reverts.
//!
//! Insufficient-value reverts are recognised by the `value:` line the
//! transaction layer prints, which carries the exact amount sent. The table
//! holds that line for every selectable quantity; a revert is only matched
//! against the entry for the quantity that was actually submitted.

use crate::eligibility::{format_price, MAX_QUANTITY};
use crate::notify::Notification;
use alloy_primitives::U256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevertEntry {
    pub quantity: u32,
    /// Fragment expected in the revert text, e.g. `"value:     0.1515 ETH"`.
    pub expected: String,
    /// Amount that had to be paid, e.g. `"0.1515 ETH"`.
    pub required: String,
}

/// Expected insufficient-value fragments for quantities `1..=10`.
#[derive(Debug, Clone)]
pub struct RevertTable {
    entries: Vec<RevertEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevertKind {
    InsufficientFunds { quantity: u32, required: String },
    Other(String),
}

impl RevertTable {
    pub fn new(unit_price: U256, decimals: u8, symbol: &str) -> Self {
        let entries = (1..=MAX_QUANTITY)
            .map(|quantity| {
                let required =
                    format_price(unit_price.saturating_mul(U256::from(quantity)), decimals, symbol);
                RevertEntry {
                    quantity,
                    expected: format!("value:     {required}"),
                    required,
                }
            })
            .collect();
        Self { entries }
    }

    pub fn entry(&self, quantity: u32) -> Option<&RevertEntry> {
        let index = quantity.checked_sub(1)? as usize;
        self.entries.get(index)
    }

    pub fn classify(&self, reason: &str, quantity: u32) -> RevertKind {
        match self.entry(quantity) {
            Some(entry) if reason.contains(&entry.expected) => RevertKind::InsufficientFunds {
                quantity,
                required: entry.required.clone(),
            },
            _ => RevertKind::Other(reason.to_string()),
        }
    }
}

impl RevertKind {
    pub fn message(&self) -> String {
        match self {
            Self::InsufficientFunds { quantity, required } => {
                let noun = if *quantity == 1 { "token" } else { "tokens" };
                format!(
                    "Insufficient funds: minting {quantity} {noun} costs {required} plus gas. \
                     Add funds to your wallet and try again."
                )
            }
            Self::Other(reason) => reason.clone(),
        }
    }

    pub fn notification(&self) -> Notification {
        match self {
            Self::InsufficientFunds { .. } => {
                Notification::error("Insufficient funds", self.message())
            }
            Self::Other(_) => Notification::error("Failed to mint", self.message()),
        }
    }
}
