//! Shared fixtures for unit and router tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use uuid::Uuid;

use crate::auth::admission::{AdmissionDecision, AdmissionOracle};
use crate::auth::middleware::Identity;
use crate::config::Config;
use crate::db::memory::MemoryStore;
use crate::db::JournalStore;
use crate::models::entry::Entry;
use crate::models::user::SyncUserRequest;
use crate::services::images::ImageResolver;
use crate::AppState;

pub fn test_config() -> Config {
    Config {
        database_url: None,
        host: "127.0.0.1".into(),
        port: 0,
        frontend_url: "http://localhost:3000".into(),
        cors_extra_origins: vec![],
        auth_jwt_public_key: None,
        auth_jwt_secret: Some("test-secret-with-enough-bytes".into()),
        auth_issuer: None,
        pixabay_api_key: String::new(),
        image_timeout_secs: 1,
        rate_limit_capacity: 10,
        rate_limit_refill: 10,
        rate_limit_interval_secs: 3600,
        blocked_identities: vec![],
        admission_timeout_ms: 500,
    }
}

/// Admission oracle that returns whatever decision it was last given.
pub struct ScriptedOracle {
    decision: Mutex<Option<AdmissionDecision>>,
    delay: Option<Duration>,
    charged: Mutex<Vec<u32>>,
}

impl ScriptedOracle {
    pub fn new(decision: AdmissionDecision) -> Self {
        Self {
            decision: Mutex::new(Some(decision)),
            delay: None,
            charged: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            decision: Mutex::new(None),
            delay: None,
            charged: Mutex::new(Vec::new()),
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            decision: Mutex::new(Some(AdmissionDecision::Allow)),
            delay: Some(delay),
            charged: Mutex::new(Vec::new()),
        }
    }

    pub async fn set(&self, decision: AdmissionDecision) {
        *self.decision.lock().await = Some(decision);
    }

    /// Token amounts requested so far, in call order.
    pub async fn charged(&self) -> Vec<u32> {
        self.charged.lock().await.clone()
    }
}

#[async_trait]
impl AdmissionOracle for ScriptedOracle {
    async fn decide(&self, _external_id: &str, requested: u32) -> anyhow::Result<AdmissionDecision> {
        self.charged.lock().await.push(requested);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.decision
            .lock()
            .await
            .clone()
            .ok_or_else(|| anyhow::anyhow!("oracle unavailable"))
    }
}

/// Image resolver that records queries and answers with a fixed URL.
pub struct FixedImages {
    fail: bool,
    queries: Mutex<Vec<String>>,
}

impl FixedImages {
    const URL: &'static str = "https://pixabay.com/get/mood.png";

    pub fn new() -> Self {
        Self {
            fail: false,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn url(&self) -> &'static str {
        Self::URL
    }

    pub async fn queries(&self) -> Vec<String> {
        self.queries.lock().await.clone()
    }
}

#[async_trait]
impl ImageResolver for FixedImages {
    async fn resolve(&self, query: &str) -> anyhow::Result<Option<String>> {
        self.queries.lock().await.push(query.to_string());
        if self.fail {
            anyhow::bail!("image service down");
        }
        Ok(Some(Self::URL.to_string()))
    }
}

pub struct TestContext {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub oracle: Arc<ScriptedOracle>,
    pub images: Arc<FixedImages>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::build(AdmissionDecision::Allow, FixedImages::new())
    }

    pub fn with_decision(decision: AdmissionDecision) -> Self {
        Self::build(decision, FixedImages::new())
    }

    pub fn with_failing_images() -> Self {
        Self::build(AdmissionDecision::Allow, FixedImages::failing())
    }

    fn build(decision: AdmissionDecision, images: FixedImages) -> Self {
        let store = Arc::new(MemoryStore::new());
        let oracle = Arc::new(ScriptedOracle::new(decision));
        let images = Arc::new(images);
        let (ws_tx, _) = broadcast::channel::<String>(64);

        let state = AppState {
            store: store.clone(),
            config: Arc::new(test_config()),
            ws_tx: Some(ws_tx),
            admission: oracle.clone(),
            images: images.clone(),
        };

        Self {
            state,
            store,
            oracle,
            images,
        }
    }

    /// Provisions an internal user for `external_id` and returns its identity.
    pub async fn identity(&self, external_id: &str) -> Identity {
        self.store
            .upsert_user(external_id, SyncUserRequest::default())
            .await
            .unwrap();
        Identity::external(external_id)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.state.ws_tx.as_ref().unwrap().subscribe()
    }

    pub fn drain_paths(rx: &mut broadcast::Receiver<String>) -> Vec<String> {
        let mut paths = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            let value: serde_json::Value = serde_json::from_str(&msg).unwrap();
            paths.push(value["path"].as_str().unwrap().to_string());
        }
        paths
    }
}

pub fn entry_at(user_id: Uuid, mood: &str, mood_score: i32, created_at: DateTime<Utc>) -> Entry {
    Entry {
        id: Uuid::new_v4(),
        user_id,
        title: format!("{} day", mood),
        content: "...".into(),
        mood: mood.into(),
        mood_score,
        mood_image_url: None,
        collection_id: None,
        created_at,
        updated_at: created_at,
    }
}
