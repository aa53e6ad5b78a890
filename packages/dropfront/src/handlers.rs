//! HTTP request handlers.

use crate::cache::page_keys;
use crate::metrics::METRICS;
use crate::middleware::RequestId;
use crate::mint::{self, MintSubmitter};
use crate::page::{parse_address, PageConfig, PageQuery};
use crate::queries::{now_secs, DropQueries};
use crate::response::{HealthResponse, MintResponse};
use crate::state::AppState;
use crate::view::MintPageView;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect};
use axum::{Extension, Json};
use serde::Deserialize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

type Shared<Q, S> = State<Arc<AppState<Q, S>>>;

/// Render the mint page for the URL's contract, wallet and quantity.
pub async fn page<Q: DropQueries, S: MintSubmitter>(
    State(state): Shared<Q, S>,
    Query(query): Query<PageQuery>,
) -> Result<Json<MintPageView>, crate::Error> {
    state.request_count.fetch_add(1, Ordering::Relaxed);
    METRICS.page_views.fetch_add(1, Ordering::Relaxed);

    let page = PageConfig::resolve(&query, &state.config).inspect_err(|_| {
        METRICS.page_config_errors.fetch_add(1, Ordering::Relaxed);
    })?;
    let wallet = query.wallet();
    let mut quantity = query.quantity();
    let supply_contract = state.total_supply_contract.unwrap_or(page.contract);

    let mut keys = page_keys(page.contract, wallet, quantity, supply_contract);
    state
        .cache
        .prime(&state.queries, &keys, state.first_read_timeout())
        .await;
    let mut drop_state = state
        .cache
        .drop_state(page.contract, wallet, quantity, supply_contract)
        .await;

    // Never offer more than the wallet may claim; eligibility is per quantity.
    let bounded = drop_state.clamp_quantity(quantity);
    if bounded != quantity {
        quantity = bounded;
        keys = page_keys(page.contract, wallet, quantity, supply_contract);
        state
            .cache
            .prime(&state.queries, &keys, state.first_read_timeout())
            .await;
        drop_state = state
            .cache
            .drop_state(page.contract, wallet, quantity, supply_contract)
            .await;
    }
    let metadata = state.cache.metadata(page.contract).await;
    let advisories = state.cache.advisories(&keys).await;

    Ok(Json(MintPageView::build(
        &page,
        &state.config,
        &drop_state,
        metadata,
        advisories,
        quantity,
        now_secs(),
    )))
}

#[derive(Debug, Deserialize)]
pub struct MintBody {
    #[serde(default)]
    pub contract: Option<String>,
    pub wallet: String,
    pub quantity: u32,
}

/// Submit `mint(wallet, quantity)` and report the outcome as a notification.
pub async fn mint<Q: DropQueries, S: MintSubmitter>(
    State(state): Shared<Q, S>,
    Extension(request_id): Extension<RequestId>,
    Json(body): Json<MintBody>,
) -> Result<Json<MintResponse>, crate::Error> {
    let start = Instant::now();
    state.request_count.fetch_add(1, Ordering::Relaxed);
    METRICS.mint_total.fetch_add(1, Ordering::Relaxed);

    let query = PageQuery {
        contract: body.contract.clone(),
        ..PageQuery::default()
    };
    let page = PageConfig::resolve(&query, &state.config)?;
    let wallet = parse_address(&body.wallet)
        .ok_or_else(|| crate::Error::BadRequest("Invalid wallet address".into()))?;
    let supply_contract = state.total_supply_contract.unwrap_or(page.contract);

    info!(
        request_id = %request_id.0,
        contract = %page.contract,
        wallet = %wallet,
        quantity = body.quantity,
        "Mint requested"
    );

    let keys = page_keys(page.contract, Some(wallet), body.quantity, supply_contract);
    state
        .cache
        .prime(&state.queries, &keys, state.first_read_timeout())
        .await;
    let drop_state = state
        .cache
        .drop_state(page.contract, Some(wallet), body.quantity, supply_contract)
        .await;

    let (call, table) = mint::prepare(&state.config, &drop_state, page.contract, wallet, body.quantity)
        .inspect_err(|e| {
            METRICS.mint_rejected.fetch_add(1, Ordering::Relaxed);
            warn!(request_id = %request_id.0, error = %e, "Mint rejected");
        })?;

    let outcome = mint::submit(state.submitter.as_ref(), &state.config, &call, &table).await;

    // Supply and eligibility moved; refetch now instead of on the next tick.
    if outcome.success {
        for key in &keys {
            state.cache.refresh(state.queries.as_ref(), *key).await;
        }
    }

    METRICS.record_mint_duration(start);
    Ok(Json(outcome.into()))
}

/// "Mint with Paper": hand off to the external checkout.
pub async fn checkout<Q: DropQueries, S: MintSubmitter>(State(state): Shared<Q, S>) -> Redirect {
    Redirect::temporary(&state.config.checkout_url)
}

/// Health check with RPC and cache status.
pub async fn health<Q: DropQueries, S: MintSubmitter>(
    State(state): Shared<Q, S>,
) -> impl IntoResponse {
    let status = state.rpc.health_check().await.unwrap_or("unavailable");
    Json(HealthResponse {
        status,
        uptime_secs: state.start_time.elapsed().as_secs(),
        requests: state.request_count.load(Ordering::Relaxed),
        active_rpc: state.rpc.active_url().to_string(),
        failovers: state.rpc.failover_count(),
        tracked_reads: state.cache.tracked_count().await,
        read_version: state.cache.version(),
    })
}

/// Prometheus metrics in text exposition format.
pub async fn metrics<Q: DropQueries, S: MintSubmitter>(
    State(state): Shared<Q, S>,
) -> impl IntoResponse {
    let body = METRICS.render(state.cache.tracked_count().await);
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4",
        )],
        body,
    )
}
