//! Freesound ambience: search for a loop and download its preview

use async_trait::async_trait;
use reqwest::Client;

use super::{
    AdapterError, AmbienceGenerator, MediaHandle, SoundtrackRequest,
    http::{ProxyPolicy, build_client, check_status, read_json},
    write_media,
};
use crate::{capability::Provider, config::FreesoundSettings};

pub const SEARCH_URL: &str = "https://freesound.org/apiv2/search/text/";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

pub struct FreesoundAmbience {
    client: Client,
    api_key: String,
    search_query: String,
    license: String,
}

impl FreesoundAmbience {
    pub fn new(settings: &FreesoundSettings) -> Result<Self, AdapterError> {
        let api_key = settings
            .api_key
            .as_deref()
            .ok_or_else(|| AdapterError::Config("freesound.api_key is not set".into()))?;

        Ok(Self {
            client: build_client(
                "freesound",
                &settings.network,
                DEFAULT_TIMEOUT_SECS,
                ProxyPolicy::Ignore,
            )?,
            api_key: api_key.to_string(),
            search_query: settings.search_query.clone(),
            license: settings.license.clone(),
        })
    }

    fn search_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("query", self.search_query.clone()),
            ("filter", format!("license:\"{}\"", self.license)),
            ("token", self.api_key.clone()),
            ("fields", "id,name,previews,license".to_string()),
            ("page_size", "1".to_string()),
        ]
    }
}

fn preview_url(json: &serde_json::Value) -> Result<&str, AdapterError> {
    let first = json["results"]
        .as_array()
        .and_then(|r| r.first())
        .ok_or_else(|| AdapterError::Rejected("no freesound result for the query".into()))?;

    first["previews"]["preview-hq-mp3"]
        .as_str()
        .or_else(|| first["previews"]["preview-lq-mp3"].as_str())
        .ok_or_else(|| AdapterError::Parse("freesound result missing preview url".into()))
}

#[async_trait]
impl AmbienceGenerator for FreesoundAmbience {
    fn provider(&self) -> Provider {
        Provider::Freesound
    }

    /// Search then preview download; the caller retries the pair as one unit.
    async fn generate_ambience(
        &self,
        request: &SoundtrackRequest,
    ) -> Result<MediaHandle, AdapterError> {
        let response = self
            .client
            .get(SEARCH_URL)
            .query(&self.search_params())
            .send()
            .await?;
        let json = read_json(response).await?;
        let url = preview_url(&json)?;

        tracing::debug!("Downloading freesound preview {}", url);
        let preview = check_status(self.client.get(url).send().await?).await?;
        let bytes = preview.bytes().await?;
        write_media(&request.output_path, &bytes).await
    }
}
