//! The mint page as a JSON view model.

use crate::config::Config;
use crate::page::{PageConfig, Theme};
use dropfront_types::{ContractMetadata, DropState};
use serde::Serialize;

/// Everything the page renders for one request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MintPageView {
    pub contract: String,
    pub theme: Theme,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_color: Option<String>,
    pub heading_image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ContractMetadata>,

    /// Minted counter, from `totalSupply()` on the supply contract.
    pub minted: String,
    pub claimed_supply: String,
    pub total_supply_cap: u64,

    pub quantity: u32,
    pub quantity_min: u32,
    pub quantity_max: u32,

    pub price_to_mint: String,
    pub button_label: String,
    pub button_enabled: bool,
    pub button_loading: bool,
    pub loading: bool,
    pub sold_out: bool,
    pub can_claim: bool,
    pub drop_not_ready: bool,
    pub drop_starting_soon: bool,

    /// Reads that failed; shown as page notes, never fatal.
    pub advisories: Vec<String>,
    pub checkout_url: String,
}

impl MintPageView {
    pub fn build(
        page: &PageConfig,
        config: &Config,
        state: &DropState,
        metadata: Option<ContractMetadata>,
        advisories: Vec<String>,
        quantity: u32,
        now_secs: u64,
    ) -> Self {
        let can_claim = state.can_claim();
        let button_loading = state.button_loading();
        let quantity_max = state.quantity_limit();
        Self {
            contract: page.contract.to_string(),
            theme: page.theme,
            primary_color: page.primary_color.clone(),
            heading_image: config.heading_image.clone(),
            metadata,
            minted: state.number_minted(),
            claimed_supply: state.number_claimed(),
            total_supply_cap: config.total_supply_cap,
            quantity,
            quantity_min: 1,
            quantity_max,
            price_to_mint: state.price_to_mint(quantity),
            button_label: state.button_label(quantity),
            button_enabled: can_claim && !button_loading && quantity <= quantity_max,
            button_loading,
            loading: state.is_loading(),
            sold_out: state.is_sold_out(),
            can_claim,
            drop_not_ready: state.drop_not_ready(),
            drop_starting_soon: state.drop_starting_soon(now_secs),
            advisories,
            checkout_url: config.checkout_url.clone(),
        }
    }
}
