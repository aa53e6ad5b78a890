//! Storefront configuration.

use serde::Deserialize;

/// Configuration for the storefront service.
///
/// Loaded once at startup (`dropfront.toml`, then `DROPFRONT_*` env vars) and
/// shared by reference with every request.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "defaults::rpc_url")]
    pub rpc_url: String,

    #[serde(default = "defaults::fallback_rpc_url")]
    pub fallback_rpc_url: String,

    #[serde(default = "defaults::bind_address")]
    pub bind_address: String,

    /// Collection used when the page URL carries no `contract`.
    #[serde(default)]
    pub default_contract: Option<String>,

    #[serde(default)]
    pub default_primary_color: Option<String>,

    #[serde(default)]
    pub default_theme: Option<String>,

    /// Contract receiving `mint(address,uint256)`. Empty = the page contract.
    #[serde(default = "defaults::mint_contract")]
    pub mint_contract: String,

    /// Contract whose `totalSupply()` feeds the minted counter.
    #[serde(default = "defaults::mint_contract")]
    pub total_supply_contract: String,

    /// Fixed collection size shown next to the minted counter.
    #[serde(default = "defaults::total_supply_cap")]
    pub total_supply_cap: u64,

    /// Native price per token in ether. Unset = the active claim condition's price.
    #[serde(default)]
    pub mint_unit_price: Option<String>,

    /// Account that sends mint transactions. Unset = the minting wallet.
    #[serde(default)]
    pub sender_account: Option<String>,

    /// Key required on `POST /mint` (`X-Api-Key` or `Authorization: Bearer`).
    /// Mandatory when `sender_account` is set.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "defaults::checkout_url")]
    pub checkout_url: String,

    /// Transaction link prefix for success notifications.
    #[serde(default = "defaults::explorer_tx_url")]
    pub explorer_tx_url: String,

    #[serde(default = "defaults::asset_description")]
    pub asset_description: String,

    #[serde(default = "defaults::heading_image")]
    pub heading_image: String,

    /// Claim-state snapshot document consumed by the query layer.
    #[serde(default = "defaults::snapshot_path")]
    pub snapshot_path: String,

    #[serde(default = "defaults::poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Reads stop being polled after this long without a request.
    #[serde(default = "defaults::key_idle_secs")]
    pub key_idle_secs: u64,

    /// Upper bound on polled reads; the least recently used is dropped first.
    #[serde(default = "defaults::max_tracked_reads")]
    pub max_tracked_reads: usize,

    /// How long a page request waits for reads it has never seen before.
    #[serde(default = "defaults::first_read_timeout_ms")]
    pub first_read_timeout_ms: u64,

    #[serde(default = "defaults::receipt_timeout_secs")]
    pub receipt_timeout_secs: u64,
}

impl Config {
    /// Non-empty mint API key, if one is configured.
    pub fn mint_api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }

    /// A shared sender account pays for every mint, so it must not be
    /// reachable without a key.
    pub fn validate(&self) -> Result<(), crate::Error> {
        let has_sender = self
            .sender_account
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty());
        if has_sender && self.mint_api_key().is_none() {
            return Err(crate::Error::Config(
                "api_key is required when sender_account is set".into(),
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_url: defaults::rpc_url(),
            fallback_rpc_url: defaults::fallback_rpc_url(),
            bind_address: defaults::bind_address(),
            default_contract: None,
            default_primary_color: None,
            default_theme: None,
            mint_contract: defaults::mint_contract(),
            total_supply_contract: defaults::mint_contract(),
            total_supply_cap: defaults::total_supply_cap(),
            mint_unit_price: None,
            sender_account: None,
            api_key: None,
            checkout_url: defaults::checkout_url(),
            explorer_tx_url: defaults::explorer_tx_url(),
            asset_description: defaults::asset_description(),
            heading_image: defaults::heading_image(),
            snapshot_path: defaults::snapshot_path(),
            poll_interval_secs: defaults::poll_interval_secs(),
            key_idle_secs: defaults::key_idle_secs(),
            max_tracked_reads: defaults::max_tracked_reads(),
            first_read_timeout_ms: defaults::first_read_timeout_ms(),
            receipt_timeout_secs: defaults::receipt_timeout_secs(),
        }
    }
}

mod defaults {
    pub fn rpc_url() -> String {
        if let Ok(url) = std::env::var("DROPFRONT_RPC_URL") {
            if !url.is_empty() {
                return url;
            }
        }
        "https://ethereum-rpc.publicnode.com".into()
    }

    pub fn fallback_rpc_url() -> String {
        "https://cloudflare-eth.com".into()
    }

    pub fn bind_address() -> String {
        "0.0.0.0:3050".into()
    }

    pub fn mint_contract() -> String {
        "0x5f8eD33d9eC6B28DAafa9A1f9faDff3D9f94e5fB".into()
    }

    pub fn total_supply_cap() -> u64 {
        1998
    }

    pub fn checkout_url() -> String {
        "https://withpaper.com/checkout/a7f941f2-0cc7-480e-8438-c5657f2275ef".into()
    }

    pub fn explorer_tx_url() -> String {
        "https://etherscan.io/tx/".into()
    }

    pub fn asset_description() -> String {
        "1 Crypto Homie Genesis and 3 Crypto Homies Commons have been transferred to your wallet!"
            .into()
    }

    pub fn heading_image() -> String {
        "https://bafybeifrdu43ddcecl5a4ipjrkrpfrperstxcpiuoicucxffp3l76ry7qy.gateway.ipfscdn.io/chg.gif"
            .into()
    }

    pub fn snapshot_path() -> String {
        "./drop_snapshot.json".into()
    }

    pub fn poll_interval_secs() -> u64 {
        15
    }

    pub fn key_idle_secs() -> u64 {
        300
    }

    pub fn max_tracked_reads() -> usize {
        crate::cache::DEFAULT_MAX_TRACKED
    }

    pub fn first_read_timeout_ms() -> u64 {
        2000
    }

    pub fn receipt_timeout_secs() -> u64 {
        60
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_source_fills_defaults() {
        let config: Config = config::Config::builder()
            .set_override("default_contract", "0x0000000000000000000000000000000000000001")
            .unwrap()
            .set_override("poll_interval_secs", 5)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config.poll_interval_secs, 5);
        assert_eq!(config.total_supply_cap, 1998);
        assert_eq!(config.mint_contract, config.total_supply_contract);
        assert!(config.mint_unit_price.is_none());
        assert_eq!(
            config.default_contract.as_deref(),
            Some("0x0000000000000000000000000000000000000001")
        );
        assert_eq!(config.max_tracked_reads, crate::cache::DEFAULT_MAX_TRACKED);
    }

    #[test]
    fn test_sender_account_requires_api_key() {
        let config = Config {
            sender_account: Some("0x0000000000000000000000000000000000000001".into()),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            api_key: Some("  ".into()),
            ..config
        };
        assert!(config.validate().is_err());

        let config = Config {
            api_key: Some("secret".into()),
            ..config
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.mint_api_key(), Some("secret"));
        assert!(Config::default().validate().is_ok());
    }
}
