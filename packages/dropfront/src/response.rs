//! Response types for the storefront API.

use crate::mint::MintOutcome;
use dropfront_types::Notification;
use serde::Serialize;

/// Response from the mint endpoint.
#[derive(Debug, Serialize)]
pub struct MintResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    pub notification: Notification,
}

impl From<MintOutcome> for MintResponse {
    fn from(outcome: MintOutcome) -> Self {
        Self {
            success: outcome.success,
            tx_hash: outcome.tx_hash,
            notification: outcome.notification,
        }
    }
}

/// Response from the health endpoint.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_secs: u64,
    pub requests: u64,
    pub active_rpc: String,
    pub failovers: u64,
    pub tracked_reads: usize,
    pub read_version: u64,
}
