//! Shared utilities for integration and load testing.

#![allow(dead_code)]

use reqwest::StatusCode;
use serde_json::{json, Value};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use stellar_credit::auth::CredentialHasher;
use stellar_credit::config::{ActivityEntry, OperatorConfig, Secret};
use stellar_credit::scoring::WalletActivity;
use stellar_credit::{CreditConfig, HttpServer, Shutdown};

pub const SECRET: &str = "integration-secret-0123456789abcdef";
pub const WALLET: &str = "GCKFBEIYTKP33XJZJ5XPT2YDMX3QZYLZSYX6ON6BPUZN5XGMB36HPQLM";
pub const ADMIN_WALLET: &str = "GAAZI4TCR3TY5OJHCTJC2A4QSY6CJWJH5IAJTGKIN2ER7LBNVKOCCWN7";
pub const SEEDED_WALLET: &str = "GBRPYHIL2CI3FNQ4BXLFMNDLFJUNPU2HY3ZMFSHONUCEOASW7QC7OX2H";
pub const OPERATOR: &str = "ops";
pub const OPERATOR_PASSWORD: &str = "correct horse battery staple";

/// A running server bound to an ephemeral local port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub base: String,
    pub client: reqwest::Client,
    pub updates: mpsc::UnboundedSender<CreditConfig>,
    shutdown: Shutdown,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Configuration with cheap hashing, an operator and one seeded wallet.
pub fn test_config() -> CreditConfig {
    let mut config = CreditConfig::default();
    config.auth.jwt_secret = Some(Secret::new(SECRET));
    config.auth.hash_cost = 2;
    config.auth.hash_memory_kib = 1024;
    config.auth.admin_address = Some(ADMIN_WALLET.to_string());

    let hasher = CredentialHasher::new(2, 1024).unwrap();
    config.auth.operators.push(OperatorConfig {
        username: OPERATOR.to_string(),
        password_hash: hasher.hash(OPERATOR_PASSWORD).unwrap(),
    });

    config.observability.metrics_enabled = false;
    config.activity.wallets.push(ActivityEntry {
        address: SEEDED_WALLET.to_string(),
        activity: WalletActivity {
            transaction_count: 120,
            volume: 25_000.0,
            on_time: 9,
            delayed: 1,
            active_days: 27,
            observation_days: 90,
            counterparties: 30,
            operation_types: 2,
            avg_balance: 4_000.0,
        },
    });
    config
}

/// Start the real server with `config`.
pub async fn spawn_server(config: CreditConfig) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(config).unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let (updates, config_updates) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    TestServer {
        addr,
        base: format!("http://{}", addr),
        client: reqwest::Client::new(),
        updates,
        shutdown,
    }
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Open a wallet session and return the token.
    pub async fn wallet_token(&self, wallet: &str) -> String {
        let res = self
            .client
            .post(self.url("/api/v1/auth/session"))
            .json(&json!({ "address": wallet, "message": "login", "signature": "sig" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    /// Log in as the configured operator and return the token.
    pub async fn operator_token(&self) -> String {
        let res = self
            .client
            .post(self.url("/api/v1/auth/login"))
            .json(&json!({ "username": OPERATOR, "password": OPERATOR_PASSWORD }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    pub async fn score(&self, token: Option<&str>, wallet: &str, amount: f64) -> reqwest::Response {
        let mut req = self
            .client
            .post(self.url("/api/v1/score"))
            .json(&json!({ "wallet": wallet, "amount": amount, "duration_months": 12 }));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        req.send().await.unwrap()
    }
}

/// Assert an error response and return its body.
pub async fn expect_error(res: reqwest::Response, status: StatusCode, code: &str) -> Value {
    assert_eq!(res.status(), status);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], code, "unexpected body: {}", body);
    assert!(body["error"].is_string());
    body
}
