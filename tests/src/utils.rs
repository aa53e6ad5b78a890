use anyhow::Result;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use dropfront::queries::ContractSnapshot;
use dropfront::rpc::RpcClient;
use dropfront::{create_router, AppState, Config};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub use dropfront::testing::{
    condition, public_sale, FixtureQueries, FixtureSubmitter, ALICE, BOB, DROP,
};

pub fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}


pub struct Storefront {
    pub app: Router,
    pub queries: Arc<FixtureQueries>,
    pub submitter: Arc<FixtureSubmitter>,
}

pub fn storefront(
    config: Config,
    snapshot: ContractSnapshot,
    submitter: FixtureSubmitter,
) -> Result<Storefront> {
    let rpc = Arc::new(RpcClient::new("http://127.0.0.1:1", "http://127.0.0.1:2"));
    let queries = Arc::new(FixtureQueries::new(snapshot));
    let submitter = Arc::new(submitter);
    let state = AppState::new(config, rpc, Arc::clone(&queries), Arc::clone(&submitter))?;
    Ok(Storefront {
        app: create_router(Arc::new(state)),
        queries,
        submitter,
    })
}

/// Storefront config with the fixture drop as default contract.
pub fn config() -> Config {
    Config {
        default_contract: Some(DROP.into()),
        total_supply_contract: String::new(),
        ..Config::default()
    }
}

pub async fn get_json(app: &Router, uri: &str) -> Result<(StatusCode, Value)> {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty())?)
        .await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok((status, serde_json::from_slice(&bytes)?))
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> Result<(StatusCode, Value)> {
    post_json_with(app, uri, body, &[]).await
}

pub async fn post_json_with(
    app: &Router,
    uri: &str,
    body: Value,
    headers: &[(&str, &str)],
) -> Result<(StatusCode, Value)> {
    let mut request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    for (name, value) in headers {
        request = request.header(*name, *value);
    }
    let response = app
        .clone()
        .oneshot(request.body(Body::from(serde_json::to_vec(&body)?))?)
        .await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok((status, serde_json::from_slice(&bytes)?))
}
