//! Mint submission: validate, price, submit, and turn the outcome into a
//! notification.

use crate::abi::IDrop;
use crate::config::Config;
use crate::metrics::METRICS;
use crate::rpc::{CallError, ReceiptStatus, RpcClient};
use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;
use dropfront_types::units::parse_ether;
use dropfront_types::{
    format_price, DropState, MintRequest, Notification, RevertKind, RevertTable,
    DEFAULT_DECIMALS,
};
use std::future::Future;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub const SUCCESS_TITLE: &str = "Successfully minted";

/// `mint(address,uint256)` on the drop contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintCall {
    pub contract: Address,
    /// Account paying for the transaction.
    pub from: Address,
    /// Recipient of the minted tokens.
    pub wallet: Address,
    pub quantity: u32,
    /// Native value attached, in wei.
    pub value: U256,
    /// `value` as shown to the user, e.g. `"0.1515 ETH"`.
    pub value_display: String,
}

impl MintCall {
    pub fn calldata(&self) -> Vec<u8> {
        IDrop::mintCall {
            to: self.wallet,
            quantity: U256::from(self.quantity),
        }
        .abi_encode()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// Node or contract refused the transaction; carries the reason text.
    Reverted(String),
    /// The transaction never reached a node.
    Transport(String),
}

/// Transaction-submission collaborator.
pub trait MintSubmitter: Send + Sync + 'static {
    /// Returns the transaction hash once the mint is accepted.
    fn submit(&self, call: &MintCall) -> impl Future<Output = Result<String, SubmitError>> + Send;
}

/// Submits through `eth_sendTransaction` and waits for the receipt.
pub struct RpcSubmitter {
    rpc: Arc<RpcClient>,
    receipt_timeout: Duration,
}

impl RpcSubmitter {
    pub fn new(rpc: Arc<RpcClient>, receipt_timeout: Duration) -> Self {
        Self {
            rpc,
            receipt_timeout,
        }
    }
}

impl MintSubmitter for RpcSubmitter {
    async fn submit(&self, call: &MintCall) -> Result<String, SubmitError> {
        let tx_hash = self
            .rpc
            .send_transaction(call.from, call.contract, &call.calldata(), call.value)
            .await
            .map_err(|e| match e {
                CallError::Transport(msg) => SubmitError::Transport(msg),
                node => SubmitError::Reverted(describe_failure(&node.reason(), call)),
            })?;

        match self.rpc.wait_for_receipt(&tx_hash, self.receipt_timeout).await {
            Ok(ReceiptStatus::Confirmed) => Ok(tx_hash),
            Ok(ReceiptStatus::Pending) => {
                warn!(tx_hash, "Mint receipt not seen before timeout");
                Ok(tx_hash)
            }
            Ok(ReceiptStatus::Reverted) => Err(SubmitError::Reverted(format!(
                "Transaction {tx_hash} reverted"
            ))),
            Err(e) => {
                warn!(tx_hash, error = %e.reason(), "Mint receipt lookup failed");
                Ok(tx_hash)
            }
        }
    }
}

/// Node rejections for a short balance get the transaction summary appended.
/// The summary uses the same layout as a wallet's revert report, so its
/// `value:` line is what [`RevertTable`] matches for the submitted quantity.
/// Any other rejection is passed through untouched and classifies as generic.
fn describe_failure(reason: &str, call: &MintCall) -> String {
    if !reason.to_ascii_lowercase().contains("insufficient funds") {
        return reason.to_string();
    }
    format!(
        "{reason}\n\nTransaction:\n  from:      {}\n  to:        {}\n  value:     {}",
        call.from, call.contract, call.value_display
    )
}

/// Result of a submitted mint, success or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintOutcome {
    pub success: bool,
    pub tx_hash: Option<String>,
    pub notification: Notification,
}

/// Build the `mint` call for `quantity` tokens to `wallet`.
///
/// Rejects quantities outside `1..=min(10, maxClaimable)` and wallets that
/// can't currently claim, before anything is sent.
pub fn prepare(
    config: &Config,
    state: &DropState,
    page_contract: Address,
    wallet: Address,
    quantity: u32,
) -> Result<(MintCall, RevertTable), crate::Error> {
    let request = MintRequest::new(quantity, state.max_claimable())
        .map_err(|e| crate::Error::Mint(format!("Cannot mint: {e}")))?;
    if !state.can_claim() {
        return Err(crate::Error::Mint(format!(
            "Cannot mint: {}",
            state.button_label(request.quantity())
        )));
    }

    let (unit_price, decimals, symbol) = match config.mint_unit_price.as_deref() {
        Some(price) => {
            let unit = parse_ether(price)
                .map_err(|e| crate::Error::Config(format!("Invalid mint_unit_price: {e}")))?;
            (unit, DEFAULT_DECIMALS, "ETH".to_string())
        }
        None => {
            let (decimals, symbol) = state
                .active_claim_condition
                .data()
                .map(|cc| (cc.currency_metadata.decimals(), cc.currency_metadata.symbol.clone()))
                .unwrap_or((DEFAULT_DECIMALS, String::new()));
            (state.unit_price(), decimals, symbol)
        }
    };

    let contract = match config.mint_contract.trim() {
        "" => page_contract,
        raw => raw
            .parse()
            .map_err(|e| crate::Error::Config(format!("Invalid mint_contract: {e}")))?,
    };
    let from = match config.sender_account.as_deref().map(str::trim) {
        None | Some("") => wallet,
        Some(raw) => raw
            .parse()
            .map_err(|e| crate::Error::Config(format!("Invalid sender_account: {e}")))?,
    };

    let value = unit_price.saturating_mul(U256::from(request.quantity()));
    let call = MintCall {
        contract,
        from,
        wallet,
        quantity: request.quantity(),
        value,
        value_display: format_price(value, decimals, &symbol),
    };
    Ok((call, RevertTable::new(unit_price, decimals, &symbol)))
}

/// Submit a prepared call. Every outcome becomes a notification.
pub async fn submit<S: MintSubmitter>(
    submitter: &S,
    config: &Config,
    call: &MintCall,
    table: &RevertTable,
) -> MintOutcome {
    match submitter.submit(call).await {
        Ok(tx_hash) => {
            METRICS.mint_success.fetch_add(1, Ordering::Relaxed);
            info!(
                tx_hash,
                wallet = %call.wallet,
                quantity = call.quantity,
                value = %call.value_display,
                "Mint submitted"
            );
            let notification = Notification::success(SUCCESS_TITLE, config.asset_description.clone())
                .with_link(format!("{}{tx_hash}", config.explorer_tx_url));
            MintOutcome {
                success: true,
                tx_hash: Some(tx_hash),
                notification,
            }
        }
        Err(SubmitError::Reverted(reason)) => {
            METRICS.mint_reverted.fetch_add(1, Ordering::Relaxed);
            let kind = table.classify(&reason, call.quantity);
            if matches!(kind, RevertKind::InsufficientFunds { .. }) {
                METRICS.mint_insufficient_funds.fetch_add(1, Ordering::Relaxed);
            }
            warn!(wallet = %call.wallet, quantity = call.quantity, reason, "Mint reverted");
            MintOutcome {
                success: false,
                tx_hash: None,
                notification: kind.notification(),
            }
        }
        Err(SubmitError::Transport(reason)) => {
            METRICS.mint_reverted.fetch_add(1, Ordering::Relaxed);
            warn!(wallet = %call.wallet, error = %reason, "Mint submission failed");
            MintOutcome {
                success: false,
                tx_hash: None,
                notification: RevertKind::Other(reason).notification(),
            }
        }
    }
}
