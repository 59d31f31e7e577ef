//! Score push over websocket.

use futures_util::StreamExt;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use tokio_tungstenite::connect_async;

mod common;
use common::*;

#[tokio::test]
async fn test_subscriber_receives_score_event() {
    let server = spawn_server(test_config()).await;

    let (mut ws, _) = connect_async(format!("ws://{}/ws/scores/{}", server.addr, WALLET))
        .await
        .unwrap();

    let token = server.wallet_token(WALLET).await;
    let res = server.score(Some(&token), WALLET, 100.0).await;
    assert_eq!(res.status(), StatusCode::OK);
    let outcome: Value = res.json().await.unwrap();
    assert_eq!(outcome["delivered"], 1);

    let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    let event: Value = serde_json::from_str(msg.to_text().unwrap()).unwrap();

    assert_eq!(event["wallet"], WALLET);
    assert_eq!(event["score"], 493);
    assert_eq!(event["tier"], "entry");
    assert!(event["computedAt"].as_u64().unwrap() > 0);
    assert_eq!(event["breakdown"].as_object().unwrap().len(), 5);
}

#[tokio::test]
async fn test_events_are_scoped_to_their_wallet() {
    let server = spawn_server(test_config()).await;

    let (mut ws, _) = connect_async(format!("ws://{}/ws/scores/{}", server.addr, SEEDED_WALLET))
        .await
        .unwrap();

    let token = server.wallet_token(WALLET).await;
    let res = server.score(Some(&token), WALLET, 100.0).await;
    let outcome: Value = res.json().await.unwrap();
    assert_eq!(outcome["delivered"], 0);

    let nothing = tokio::time::timeout(Duration::from_millis(300), ws.next()).await;
    assert!(nothing.is_err());
}

#[tokio::test]
async fn test_invalid_wallet_subscription_rejected() {
    let server = spawn_server(test_config()).await;
    let result = connect_async(format!("ws://{}/ws/scores/not-a-wallet", server.addr)).await;

    assert!(result.is_err());
    assert_eq!(server.client.get(server.url("/health")).send().await.unwrap().status(), 200);
}
