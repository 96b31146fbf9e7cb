//! Remote access to module metadata documents and script bodies.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::{
    config::RegistryConfig,
    error::{RegistryError, RegistryResult},
    module::ModuleMetadata,
};

/// Source of metadata documents and script payloads.
///
/// The registry only ever talks to the network through this trait, so tests
/// can swap in `MockModuleFetcher` and front-ends can wrap the transport with
/// their own timeouts or proxies.
#[mockall::automock]
#[async_trait]
pub trait ModuleFetcher: Send + Sync {
    /// GET `url` and decode the body as [`ModuleMetadata`].
    ///
    /// Transport failures map to `RegistryError::Fetch`, undecodable bodies
    /// to `RegistryError::Parse`.
    async fn fetch_metadata(&self, url: &str) -> RegistryResult<ModuleMetadata>;

    /// GET `url` and return the raw body.
    async fn fetch_script(&self, url: &str) -> RegistryResult<Vec<u8>>;
}

#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn try_from_config(config: &RegistryConfig) -> reqwest::Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }

    async fn get_bytes(&self, url: &str) -> RegistryResult<Vec<u8>> {
        debug!("Fetching {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RegistryError::fetch(url, e))?;

        if !response.status().is_success() {
            return Err(RegistryError::fetch(
                url,
                format!("unexpected status {}", response.status()),
            ));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| RegistryError::fetch(url, e))?;
        Ok(body.to_vec())
    }
}

#[async_trait]
impl ModuleFetcher for HttpFetcher {
    #[tracing::instrument(skip(self), level = "debug")]
    async fn fetch_metadata(&self, url: &str) -> RegistryResult<ModuleMetadata> {
        let body = self.get_bytes(url).await?;
        serde_json::from_slice(&body).map_err(|e| RegistryError::parse(url, e))
    }

    #[tracing::instrument(skip(self), level = "debug")]
    async fn fetch_script(&self, url: &str) -> RegistryResult<Vec<u8>> {
        self.get_bytes(url).await
    }
}
