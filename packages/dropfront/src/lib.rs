//! # Dropfront
//!
//! Mint storefront for a fixed-supply NFT drop. Serves the mint page as a
//! JSON view model derived from cached contract reads, and submits
//! `mint(address,uint256)` transactions on behalf of the page.
//!
//! ## Quick Start
//! ```bash
//! DROPFRONT_DEFAULT_CONTRACT=0x... cargo run --bin dropfront
//! ```
//!
//! ## Endpoints
//! - `GET /` - Mint page view (`?contract=&primaryColor=&theme=&wallet=&quantity=`)
//! - `POST /mint` - Submit a mint, returns a notification (`X-Api-Key` when `api_key` is set)
//! - `GET /checkout` - Redirect to the external card checkout
//! - `GET /health` - Health check with RPC and cache status
//! - `GET /metrics` - Prometheus metrics

pub mod abi;
pub mod cache;
pub mod config;
mod error;
mod handlers;
pub mod metrics;
mod middleware;
pub mod mint;
pub mod page;
pub mod queries;
mod response;
mod router;
pub mod rpc;
mod state;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod view;

pub use config::Config;
pub use error::Error;
pub use response::{HealthResponse, MintResponse};
pub use router::create as create_router;
pub use state::AppState;
