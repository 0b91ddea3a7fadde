#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Duration;
use drinks_api::auth::{KeySet, TokenSigner, TokenVerifier};
use drinks_api::config::{AppConfig, JwksSource};
use drinks_api::database::models::{Drink, Ingredient, NewDrink};
use drinks_api::database::{DrinkStore, MemoryDrinkStore, RepoError};
use drinks_api::{router, AppState};
use serde_json::{json, Value};

pub const ISSUER: &str = "https://drinks-test.local/";
pub const AUDIENCE: &str = "drinks";
pub const KID: &str = "test-key";

const SIGNING_KEY: &[u8] = include_bytes!("../fixtures/signing_key.pem");
const FOREIGN_KEY: &[u8] = include_bytes!("../fixtures/foreign_key.pem");

/// A server running in-process on its own port.
pub struct TestServer {
    pub base_url: String,
    pub store: Arc<dyn DrinkStore>,
    pub client: reqwest::Client,
    signer: TokenSigner,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Valid token granting exactly `permissions`.
    pub fn token(&self, permissions: &[&str]) -> String {
        self.signer
            .sign("barista", permissions, Duration::hours(1))
            .expect("failed to sign test token")
    }

    pub fn expired_token(&self, permissions: &[&str]) -> String {
        self.signer
            .sign("barista", permissions, Duration::hours(-2))
            .expect("failed to sign test token")
    }

    /// Token signed by a key that is not in the published key set.
    pub fn forged_token(&self, permissions: &[&str]) -> String {
        TokenSigner::from_rsa_pem(FOREIGN_KEY, KID, ISSUER, AUDIENCE)
            .and_then(|s| s.sign("mallory", permissions, Duration::hours(1)))
            .expect("failed to sign forged token")
    }

    pub fn token_for_audience(&self, audience: &str, permissions: &[&str]) -> String {
        TokenSigner::from_rsa_pem(SIGNING_KEY, KID, ISSUER, audience)
            .and_then(|s| s.sign("barista", permissions, Duration::hours(1)))
            .expect("failed to sign test token")
    }

    /// POST a drink with a fully privileged token, returning the response body.
    pub async fn create_drink(&self, title: &str, recipe: Value) -> Result<Value> {
        let res = self
            .client
            .post(self.url("/drinks"))
            .bearer_auth(self.token(&["post:drinks"]))
            .json(&json!({ "title": title, "recipe": recipe }))
            .send()
            .await?;
        anyhow::ensure!(res.status().is_success(), "create failed with {}", res.status());
        Ok(res.json().await?)
    }

    pub async fn drink_count(&self) -> Result<usize> {
        Ok(self.store.list_all().await?.len())
    }
}

/// Server backed by a fresh memory store.
pub async fn spawn_server() -> Result<TestServer> {
    spawn_server_with(Arc::new(MemoryDrinkStore::new())).await
}

pub async fn spawn_server_with(store: Arc<dyn DrinkStore>) -> Result<TestServer> {
    let config = AppConfig::from_lookup(|_| None);

    let jwks = PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/jwks.json"));
    let keys = KeySet::load(&JwksSource::File(jwks)).await?;
    let verifier = TokenVerifier::new(keys, ISSUER, AUDIENCE);

    let app = router(
        AppState::new(store.clone(), verifier),
        &config.server,
        &config.security,
    );

    // Pick an unused port for isolation
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server crashed");
    });

    Ok(TestServer {
        base_url: format!("http://127.0.0.1:{}", port),
        store,
        client: reqwest::Client::new(),
        signer: TokenSigner::from_rsa_pem(SIGNING_KEY, KID, ISSUER, AUDIENCE)?,
    })
}

/// Storage whose connection is gone. Lookups by id still answer so that
/// handlers reach their write step; every other call times out.
pub struct UnreachableDrinkStore {
    known: Drink,
}

impl UnreachableDrinkStore {
    pub fn new() -> Self {
        Self {
            known: Drink {
                id: 1,
                title: "Espresso".to_string(),
                recipe: vec![Ingredient {
                    name: "espresso".to_string(),
                    color: "brown".to_string(),
                    parts: 1,
                }],
            },
        }
    }
}

fn timed_out() -> RepoError {
    RepoError::Sqlx(sqlx::Error::PoolTimedOut)
}

#[async_trait]
impl DrinkStore for UnreachableDrinkStore {
    async fn list_all(&self) -> Result<Vec<Drink>, RepoError> {
        Err(timed_out())
    }

    async fn get_by_id(&self, id: i32) -> Result<Drink, RepoError> {
        if id == self.known.id {
            Ok(self.known.clone())
        } else {
            Err(RepoError::NotFound(id))
        }
    }

    async fn create(&self, _draft: NewDrink) -> Result<Drink, RepoError> {
        Err(timed_out())
    }

    async fn update_title(&self, _id: i32, _title: &str) -> Result<Drink, RepoError> {
        Err(timed_out())
    }

    async fn delete_by_id(&self, _id: i32) -> Result<i32, RepoError> {
        Err(timed_out())
    }

    async fn ping(&self) -> Result<(), RepoError> {
        Err(timed_out())
    }
}
