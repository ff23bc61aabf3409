use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{error::Error, model::ConditionCategory};

const RANDOM_PHOTO_URL: &str = "https://api.unsplash.com/photos/random";

/// Optional backdrop lookup for the current condition category.
///
/// Best-effort by contract: with no key configured, or on any upstream
/// failure, the category's fixed default image is returned instead. This
/// never fails a search.
#[derive(Debug, Clone)]
pub struct BackgroundImages {
    api_key: Option<String>,
    http: Client,
}

impl BackgroundImages {
    pub fn new(api_key: Option<String>) -> Self {
        Self { api_key, http: Client::new() }
    }

    /// URL of a backdrop image for the given category.
    pub async fn for_category(&self, category: ConditionCategory) -> String {
        let Some(api_key) = &self.api_key else {
            debug!("no imagery credential configured, using default backdrop");
            return category.default_background_url().to_string();
        };

        match self.fetch_random(api_key, category).await {
            Ok(url) => url,
            Err(err) => {
                debug!(error = %err, "backdrop lookup failed, using default");
                category.default_background_url().to_string()
            }
        }
    }

    async fn fetch_random(
        &self,
        api_key: &str,
        category: ConditionCategory,
    ) -> Result<String, Error> {
        let res = self
            .http
            .get(RANDOM_PHOTO_URL)
            .query(&[("query", category.imagery_query()), ("orientation", "landscape")])
            .header("Authorization", format!("Client-ID {api_key}"))
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            return Err(Error::network(format!("imagery request failed with status {status}")));
        }

        let photo: RandomPhoto = serde_json::from_str(&res.text().await?)?;
        Ok(photo.urls.regular)
    }
}

#[derive(Debug, Deserialize)]
struct PhotoUrls {
    regular: String,
}

#[derive(Debug, Deserialize)]
struct RandomPhoto {
    urls: PhotoUrls,
}
