//! HTTP transport over reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::{FetchError, ResourceTransport};
use crate::config::Config;
use crate::models::{PermissionsResponse, SettingsPatch, SiteSettings};

const SETTINGS_PATH: &str = "api/v1/settings";
const PERMISSIONS_PATH: &str = "api/v1/permissions";

/// REST client for the settings and permissions endpoints.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    /// Opaque bearer token, sent as-is.
    token: Option<String>,
}

impl HttpTransport {
    pub fn new(
        base_url: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("atrium/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: normalize_base(base_url)?,
            token: token.filter(|t| !t.is_empty()),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        Self::new(
            &config.api_url,
            config.api_token.clone(),
            config.request_timeout,
        )
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn settings_url(&self) -> Result<Url, FetchError> {
        Ok(self.base_url.join(SETTINGS_PATH)?)
    }

    fn permissions_url(&self, role: &str) -> Result<Url, FetchError> {
        let mut url = self.base_url.join(PERMISSIONS_PATH)?;
        url.query_pairs_mut().append_pair("role", role);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!("{} {}", method, url);
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

#[async_trait]
impl ResourceTransport for HttpTransport {
    async fn fetch_settings(&self) -> Result<SiteSettings, FetchError> {
        let response = self.request(Method::GET, self.settings_url()?).send().await?;
        decode(response).await
    }

    async fn update_settings(&self, patch: &SettingsPatch) -> Result<SiteSettings, FetchError> {
        let response = self
            .request(Method::PUT, self.settings_url()?)
            .json(patch)
            .send()
            .await?;
        decode(response).await
    }

    async fn fetch_permissions(&self, role: &str) -> Result<PermissionsResponse, FetchError> {
        let response = self
            .request(Method::GET, self.permissions_url(role)?)
            .send()
            .await?;
        decode(response).await
    }
}

/// Make sure the base ends with `/` so relative joins keep any path prefix.
fn normalize_base(base_url: &str) -> Result<Url, FetchError> {
    let trimmed = base_url.trim();
    if trimmed.ends_with('/') {
        Ok(Url::parse(trimmed)?)
    } else {
        Ok(Url::parse(&format!("{trimmed}/"))?)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, FetchError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(FetchError::Status {
            status: status.as_u16(),
            message: error_message(status, &body),
        });
    }

    serde_json::from_str(&body).map_err(|e| FetchError::Decode(e.to_string()))
}

/// Pull a human-readable message out of an error body.
fn error_message(status: StatusCode, body: &str) -> String {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["error", "message"]
                .iter()
                .find_map(|field| value.get(*field)?.as_str().map(str::to_string))
        })
        .filter(|message| !message.trim().is_empty());

    from_json.unwrap_or_else(|| format!("request failed with status {status}"))
}
