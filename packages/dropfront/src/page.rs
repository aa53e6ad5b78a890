//! Page URL parameters resolved against configured defaults.

use crate::config::Config;
use alloy_primitives::Address;
use dropfront_types::MAX_QUANTITY;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const NO_CONTRACT: &str = "No contract address provided";

/// Named accents accepted by `primaryColor`.
pub const COLORS: [(&str, &str); 9] = [
    ("purple", "#7C3AED"),
    ("blue", "#3B82F6"),
    ("orange", "#F59E0B"),
    ("pink", "#EC4899"),
    ("green", "#10B981"),
    ("red", "#EF4444"),
    ("teal", "#14B8A6"),
    ("cyan", "#22D3EE"),
    ("yellow", "#FBBF24"),
];

/// Raw query string of the page URL.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub contract: Option<String>,
    #[serde(rename = "primaryColor")]
    pub primary_color: Option<String>,
    pub theme: Option<String>,
    pub wallet: Option<String>,
    pub quantity: Option<String>,
}

impl PageQuery {
    /// Connected wallet; absent or malformed means not connected.
    pub fn wallet(&self) -> Option<Address> {
        parse_address(self.wallet.as_deref()?)
    }

    /// Requested quantity; values outside `1..=10` keep the default of 1.
    pub fn quantity(&self) -> u32 {
        self.quantity
            .as_deref()
            .and_then(|q| q.trim().parse::<u32>().ok())
            .filter(|q| (1..=MAX_QUANTITY).contains(q))
            .unwrap_or(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("dark") {
            Theme::Dark
        } else {
            Theme::Light
        }
    }
}

/// Display and contract selection for one page render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageConfig {
    pub contract: Address,
    pub primary_color: Option<String>,
    pub theme: Theme,
}

impl PageConfig {
    pub fn resolve(query: &PageQuery, config: &Config) -> Result<Self, crate::Error> {
        let contract = non_empty(query.contract.as_deref())
            .or_else(|| non_empty(config.default_contract.as_deref()))
            .and_then(parse_address)
            .ok_or_else(|| crate::Error::BadRequest(NO_CONTRACT.into()))?;

        let primary_color = non_empty(query.primary_color.as_deref())
            .or_else(|| non_empty(config.default_primary_color.as_deref()))
            .map(resolve_color);

        let theme = non_empty(query.theme.as_deref())
            .or_else(|| non_empty(config.default_theme.as_deref()))
            .map(Theme::parse)
            .unwrap_or_default();

        Ok(Self {
            contract,
            primary_color,
            theme,
        })
    }
}

/// Palette names map to their hex code; anything else passes through.
pub fn resolve_color(raw: &str) -> String {
    let name = raw.trim();
    COLORS
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, hex)| hex.to_string())
        .unwrap_or_else(|| name.to_string())
}

pub fn parse_address(raw: &str) -> Option<Address> {
    Address::from_str(raw.trim()).ok()
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}
