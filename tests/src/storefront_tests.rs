use crate::utils::*;
use anyhow::Result;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use dropfront::mint::SubmitError;
use dropfront::Config;
use dropfront_types::units::parse_ether;
use dropfront_types::{ClaimerProof, LABEL_SOLD_OUT};
use serde_json::json;
use std::sync::atomic::Ordering;
use tower::ServiceExt;

#[tokio::test]
async fn test_page_without_contract_is_blocked() -> Result<()> {
    let store = storefront(Config::default(), public_sale(), FixtureSubmitter::ok("0x1"))?;
    let (status, body) = get_json(&store.app, "/?theme=dark").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "No contract address provided");
    Ok(())
}

#[tokio::test]
async fn test_page_without_wallet_shows_reason() -> Result<()> {
    let store = storefront(config(), public_sale(), FixtureSubmitter::ok("0x1"))?;
    let (status, view) = get_json(&store.app, "/?primaryColor=purple").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["canClaim"], false);
    assert_eq!(view["buttonEnabled"], false);
    assert_eq!(view["buttonLabel"], "No wallet connected.");
    assert_eq!(view["primaryColor"], "#7C3AED");
    assert_eq!(view["theme"], "light");
    Ok(())
}

#[tokio::test]
async fn test_page_for_eligible_wallet() -> Result<()> {
    let store = storefront(config(), public_sale(), FixtureSubmitter::ok("0x1"))?;
    let (_, view) = get_json(&store.app, &format!("/?wallet={ALICE}&quantity=3")).await?;
    assert_eq!(view["canClaim"], true);
    assert_eq!(view["buttonEnabled"], true);
    assert_eq!(view["buttonLabel"], "Mint (0.1515 ETH)");
    assert_eq!(view["priceToMint"], "0.1515 ETH");
    assert_eq!(view["claimedSupply"], "998");
    assert_eq!(view["minted"], "1998");
    assert_eq!(view["totalSupplyCap"], 1998);
    assert_eq!(view["quantity"], 3);
    assert_eq!(view["quantityMax"], 10);
    assert_eq!(view["metadata"]["name"], "Crypto Homies Genesis");
    assert_eq!(view["advisories"], json!([]));
    Ok(())
}

#[tokio::test]
async fn test_minted_counter_follows_total_supply() -> Result<()> {
    let store = storefront(config(), public_sale(), FixtureSubmitter::ok("0x1"))?;
    store.queries.set_total_supply(1500);
    let (_, view) = get_json(&store.app, &format!("/?wallet={ALICE}")).await?;
    assert_eq!(view["minted"], "1500");
    assert_eq!(view["claimedSupply"], "998");
    assert_eq!(view["totalSupplyCap"], 1998);
    Ok(())
}

#[tokio::test]
async fn test_page_free_drop() -> Result<()> {
    let mut snapshot = public_sale();
    snapshot.claim_conditions = vec![condition("0", "1000", 0)];
    let store = storefront(config(), snapshot, FixtureSubmitter::ok("0x1"))?;
    let (_, view) = get_json(&store.app, &format!("/?wallet={ALICE}")).await?;
    assert_eq!(view["buttonLabel"], "Mint (Free)");
    Ok(())
}

#[tokio::test]
async fn test_page_sold_out_when_claimed_matches_total_supply() -> Result<()> {
    let mut snapshot = public_sale();
    snapshot.claimed_supply = "1998".into();
    let store = storefront(config(), snapshot, FixtureSubmitter::ok("0x1"))?;
    let (_, view) = get_json(&store.app, &format!("/?wallet={ALICE}")).await?;
    assert_eq!(view["soldOut"], true);
    assert_eq!(view["buttonLabel"], LABEL_SOLD_OUT);
    assert_eq!(view["buttonEnabled"], false);
    Ok(())
}

#[tokio::test]
async fn test_allowlist_cap_bounded_by_unclaimed() -> Result<()> {
    let mut snapshot = public_sale();
    snapshot.unclaimed_supply = "3".into();
    snapshot.allowlist = vec![ClaimerProof {
        address: ALICE.into(),
        max_claimable: "5".into(),
        price: None,
    }];
    let store = storefront(config(), snapshot, FixtureSubmitter::ok("0x1"))?;

    let (_, view) = get_json(&store.app, &format!("/?wallet={ALICE}")).await?;
    assert_eq!(view["quantityMax"], 3);

    let (_, view) = get_json(&store.app, &format!("/?wallet={BOB}")).await?;
    assert_eq!(view["canClaim"], false);
    assert_eq!(view["buttonLabel"], "You are not eligible to mint at this time.");
    Ok(())
}

#[tokio::test]
async fn test_quantity_above_claimable_is_clamped() -> Result<()> {
    let mut snapshot = public_sale();
    snapshot.unclaimed_supply = "3".into();
    let store = storefront(config(), snapshot, FixtureSubmitter::ok("0x1"))?;

    let (_, view) = get_json(&store.app, &format!("/?wallet={ALICE}&quantity=5")).await?;
    assert_eq!(view["quantityMax"], 3);
    assert_eq!(view["quantity"], 3);
    assert_eq!(view["buttonLabel"], "Mint (0.1515 ETH)");
    assert_eq!(view["buttonEnabled"], true);

    // The same quantity is what the mint endpoint accepts.
    let (status, body) = post_json(
        &store.app,
        "/mint",
        json!({ "wallet": ALICE, "quantity": view["quantity"] }),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    Ok(())
}

#[tokio::test]
async fn test_drop_not_ready_and_starting_soon() -> Result<()> {
    let mut snapshot = public_sale();
    let mut closed = condition("50500000000000000", "0", 0);
    closed.max_claimable_supply = "0".into();
    snapshot.claim_conditions = vec![closed];
    let store = storefront(config(), snapshot, FixtureSubmitter::ok("0x1"))?;
    let (_, view) = get_json(&store.app, "/").await?;
    assert_eq!(view["dropNotReady"], true);

    let mut snapshot = public_sale();
    snapshot.claim_conditions = vec![condition("50500000000000000", "1000", now_secs() + 86_400)];
    let store = storefront(config(), snapshot, FixtureSubmitter::ok("0x1"))?;
    let (_, view) = get_json(&store.app, &format!("/?wallet={ALICE}")).await?;
    assert_eq!(view["dropStartingSoon"], true);
    assert_eq!(view["buttonLabel"], "This drop is not ready to be minted.");
    // No phase has started: not an advisory.
    assert_eq!(view["advisories"], json!([]));
    Ok(())
}

#[tokio::test]
async fn test_failed_reads_become_advisories() -> Result<()> {
    let store = storefront(config(), public_sale(), FixtureSubmitter::ok("0x1"))?;
    store.queries.offline.store(true, Ordering::Relaxed);
    let (status, view) = get_json(&store.app, "/").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["canClaim"], false);
    assert_eq!(view["soldOut"], false);
    assert!(!view["advisories"].as_array().unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_mint_success() -> Result<()> {
    let store = storefront(config(), public_sale(), FixtureSubmitter::ok("0xfeed"))?;
    let (status, body) = post_json(
        &store.app,
        "/mint",
        json!({ "wallet": ALICE, "quantity": 2 }),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["tx_hash"], "0xfeed");
    assert_eq!(body["notification"]["title"], "Successfully minted");
    assert_eq!(body["notification"]["durationMs"], 5000);
    assert_eq!(body["notification"]["variant"], "success");
    assert_eq!(body["notification"]["link"], "https://etherscan.io/tx/0xfeed");

    let calls = store.submitter.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].quantity, 2);
    assert_eq!(calls[0].value, parse_ether("0.101")?);
    Ok(())
}

#[tokio::test]
async fn test_mint_out_of_range_is_rejected_before_submission() -> Result<()> {
    let store = storefront(config(), public_sale(), FixtureSubmitter::ok("0xfeed"))?;
    let (status, body) = post_json(
        &store.app,
        "/mint",
        json!({ "wallet": ALICE, "quantity": 11 }),
    )
    .await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);
    assert!(store.submitter.calls().is_empty());

    let (status, _) = post_json(
        &store.app,
        "/mint",
        json!({ "wallet": "not-a-wallet", "quantity": 1 }),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_mint_insufficient_funds_notification() -> Result<()> {
    let reason = "insufficient funds for gas * price + value\n  value:     0.1515 ETH";
    let store = storefront(
        config(),
        public_sale(),
        FixtureSubmitter::with(Err(SubmitError::Reverted(reason.into()))),
    )?;
    let (status, body) = post_json(
        &store.app,
        "/mint",
        json!({ "wallet": ALICE, "quantity": 3 }),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert!(body.get("tx_hash").is_none());
    assert_eq!(body["notification"]["title"], "Insufficient funds");
    assert_eq!(body["notification"]["variant"], "error");

    // Same revert for a different quantity stays generic.
    let (_, body) = post_json(
        &store.app,
        "/mint",
        json!({ "wallet": ALICE, "quantity": 2 }),
    )
    .await?;
    assert_eq!(body["notification"]["title"], "Failed to mint");
    assert_eq!(body["notification"]["description"], reason);
    Ok(())
}

#[tokio::test]
async fn test_mint_uses_configured_unit_price() -> Result<()> {
    let config = Config {
        mint_unit_price: Some("0.101".into()),
        ..config()
    };
    let store = storefront(config, public_sale(), FixtureSubmitter::ok("0xfeed"))?;
    post_json(&store.app, "/mint", json!({ "wallet": ALICE, "quantity": 3 })).await?;
    let calls = store.submitter.calls();
    assert_eq!(calls[0].value, parse_ether("0.303")?);
    assert_eq!(calls[0].value_display, "0.303 ETH");
    Ok(())
}

#[tokio::test]
async fn test_mint_requires_api_key_when_configured() -> Result<()> {
    let config = Config {
        sender_account: Some(BOB.into()),
        api_key: Some("s3cret".into()),
        ..config()
    };
    let store = storefront(config, public_sale(), FixtureSubmitter::ok("0xfeed"))?;
    let body = json!({ "wallet": ALICE, "quantity": 1 });

    let (status, reply) = post_json(&store.app, "/mint", body.clone()).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply["success"], false);

    let (status, _) =
        post_json_with(&store.app, "/mint", body.clone(), &[("x-api-key", "wrong!")]).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(store.submitter.calls().is_empty());

    let (status, reply) = post_json_with(
        &store.app,
        "/mint",
        body.clone(),
        &[("authorization", "Bearer s3cret")],
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["success"], true);

    let (status, _) = post_json_with(&store.app, "/mint", body, &[("x-api-key", "s3cret")]).await?;
    assert_eq!(status, StatusCode::OK);

    let calls = store.submitter.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].from.to_string().to_lowercase(), BOB);

    // The page stays public.
    let (status, _) = get_json(&store.app, "/").await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn test_sender_account_without_api_key_is_refused() -> Result<()> {
    let config = Config {
        sender_account: Some(BOB.into()),
        ..config()
    };
    assert!(storefront(config, public_sale(), FixtureSubmitter::ok("0x1")).is_err());
    Ok(())
}

#[tokio::test]
async fn test_distinct_contracts_keep_tracked_reads_bounded() -> Result<()> {
    let config = Config {
        max_tracked_reads: 50,
        ..config()
    };
    let store = storefront(config, public_sale(), FixtureSubmitter::ok("0x1"))?;
    for i in 0..200u32 {
        let contract = format!("0x{:040x}", i + 1);
        let (status, _) = get_json(&store.app, &format!("/?contract={contract}")).await?;
        assert_eq!(status, StatusCode::OK);
    }
    let (_, health) = get_json(&store.app, "/health").await?;
    assert!(health["tracked_reads"].as_u64().unwrap_or(u64::MAX) <= 50);
    Ok(())
}

#[tokio::test]
async fn test_checkout_redirects() -> Result<()> {
    let store = storefront(config(), public_sale(), FixtureSubmitter::ok("0x1"))?;
    let response = store
        .app
        .clone()
        .oneshot(Request::builder().uri("/checkout").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers()["location"],
        "https://withpaper.com/checkout/a7f941f2-0cc7-480e-8438-c5657f2275ef"
    );
    Ok(())
}

#[tokio::test]
async fn test_request_id_is_echoed() -> Result<()> {
    let store = storefront(config(), public_sale(), FixtureSubmitter::ok("0x1"))?;
    let response = store
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .header("x-request-id", "drop-test")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.headers()["x-request-id"], "drop-test");
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let text = String::from_utf8(bytes.to_vec())?;
    assert!(text.contains("dropfront_page_views_total"));
    assert!(text.contains("dropfront_reads_tracked"));
    Ok(())
}

#[tokio::test]
async fn test_health_reports_unreachable_rpc() -> Result<()> {
    let store = storefront(config(), public_sale(), FixtureSubmitter::ok("0x1"))?;
    let (status, body) = get_json(&store.app, "/health").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "unavailable");
    assert_eq!(body["failovers"], 0);
    Ok(())
}
