use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

mod auth;
mod config;
mod db;
mod error;
mod handlers;
mod models;
mod routes;
mod services;
#[cfg(test)]
mod test_support;

use auth::admission::{AdmissionOracle, TokenBucketOracle};
use config::Config;
use db::memory::MemoryStore;
use db::postgres::PgStore;
use db::JournalStore;
use services::images::{ImageResolver, PixabayResolver};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn JournalStore>,
    pub config: Arc<Config>,
    pub ws_tx: Option<broadcast::Sender<String>>,
    pub admission: Arc<dyn AdmissionOracle>,
    pub images: Arc<dyn ImageResolver>,
}

impl AppState {
    pub fn admission_timeout(&self) -> Duration {
        Duration::from_millis(self.config.admission_timeout_ms)
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reflct_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Arc::new(Config::from_env());

    let store: Arc<dyn JournalStore> = match config.database_url.as_deref() {
        Some(url) => {
            let pool = db::postgres::create_pool(url).await;

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .expect("Failed to run database migrations");

            tracing::info!("Database migrations applied");
            Arc::new(PgStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, journal data is kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    let images = PixabayResolver::from_config(&config).expect("Failed to build image client");
    let admission = Arc::new(TokenBucketOracle::from_config(&config));
    spawn_admission_cleanup_worker(admission.clone());

    // View invalidation channel
    let (ws_tx, _) = broadcast::channel::<String>(256);

    let state = AppState {
        store,
        config: config.clone(),
        ws_tx: Some(ws_tx),
        admission,
        images: Arc::new(images),
    };

    let app = routes::build_router(state);

    let addr = config.listen_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind listen address");
    axum::serve(listener, app).await.expect("Server error");
}

/// Evicts idle admission buckets every 10 minutes.
fn spawn_admission_cleanup_worker(oracle: Arc<TokenBucketOracle>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(600));
        loop {
            interval.tick().await;
            oracle.cleanup().await;
        }
    });
}
