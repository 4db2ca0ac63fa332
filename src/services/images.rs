use async_trait::async_trait;
use serde::Deserialize;

use crate::config::Config;

/// Resolves a search phrase to a stock image URL.
#[async_trait]
pub trait ImageResolver: Send + Sync {
    async fn resolve(&self, query: &str) -> anyhow::Result<Option<String>>;
}

/// Best-effort lookup: any resolver failure becomes `None` so that a missing
/// illustration never blocks an entry write.
pub async fn resolve_mood_image(resolver: &dyn ImageResolver, query: &str) -> Option<String> {
    match resolver.resolve(query).await {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!(error = %e, query = %query, "Mood image lookup failed");
            None
        }
    }
}

#[derive(Debug, Deserialize)]
struct PixabayResponse {
    #[serde(default)]
    hits: Vec<PixabayHit>,
}

#[derive(Debug, Deserialize)]
struct PixabayHit {
    #[serde(rename = "largeImageURL")]
    large_image_url: Option<String>,
}

pub struct PixabayResolver {
    client: reqwest::Client,
    api_key: String,
}

impl PixabayResolver {
    const ENDPOINT: &'static str = "https://pixabay.com/api/";

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.image_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key: config.pixabay_api_key.clone(),
        })
    }
}

#[async_trait]
impl ImageResolver for PixabayResolver {
    async fn resolve(&self, query: &str) -> anyhow::Result<Option<String>> {
        if self.api_key.is_empty() {
            tracing::debug!("PIXABAY_API_KEY not set, skipping mood image");
            return Ok(None);
        }

        let response = self
            .client
            .get(Self::ENDPOINT)
            .query(&[
                ("key", self.api_key.as_str()),
                ("q", query),
                ("min_width", "1280"),
                ("min_height", "720"),
                ("image_type", "illustration"),
                ("category", "feelings"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("Pixabay API error {}", response.status());
        }

        let body: PixabayResponse = response.json().await?;
        Ok(body.hits.into_iter().find_map(|hit| hit.large_image_url))
    }
}
