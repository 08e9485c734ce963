// Translation provider adapter (Azure Translator v3 REST API)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use transflow_core::port::{ProviderError, TranslationProvider};

const API_VERSION: &str = "3.0";
const KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
const REGION_HEADER: &str = "Ocp-Apim-Subscription-Region";

#[derive(Serialize)]
struct TranslateItem<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct TranslateResult {
    translations: Vec<Translation>,
}

#[derive(Deserialize)]
struct Translation {
    text: String,
}

/// `POST {endpoint}/translate?api-version=3.0&to={lang}` with one item per packet
pub struct AzureTranslator {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    region: String,
}

impl AzureTranslator {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            region: region.into(),
        }
    }

    fn translate_url(&self) -> String {
        format!("{}/translate", self.endpoint.trim_end_matches('/'))
    }
}

#[async_trait]
impl TranslationProvider for AzureTranslator {
    async fn translate(&self, text: &str, target_language: &str) -> Result<String, ProviderError> {
        let mut request = self
            .client
            .post(self.translate_url())
            .query(&[("api-version", API_VERSION), ("to", target_language)])
            .header(KEY_HEADER, &self.api_key)
            .json(&[TranslateItem { text }]);
        if !self.region.is_empty() {
            request = request.header(REGION_HEADER, &self.region);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let results: Vec<TranslateResult> = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        let translated = results
            .into_iter()
            .next()
            .and_then(|r| r.translations.into_iter().next())
            .map(|t| t.text)
            .ok_or_else(|| {
                ProviderError::InvalidResponse("response contains no translations".to_string())
            })?;

        debug!(
            chars_in = text.chars().count(),
            chars_out = translated.chars().count(),
            to = %target_language,
            "Packet translated by provider"
        );
        Ok(translated)
    }
}
