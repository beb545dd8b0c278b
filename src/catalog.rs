//! Remote release catalog.
//!
//! The pipeline only talks to the [`Catalog`] trait; [`HttpCatalog`] is the
//! go.dev implementation, driven by the endpoints in [`Settings`].

use crate::config::{Settings, APP_NAME};
use crate::platform::compatible_releases;
use crate::types::{Action, PlatformInfo, Release};
use futures_util::StreamExt;
use reqwest::StatusCode;
use std::io::Write;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: StatusCode },

    #[error("could not decode release catalog: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("no archive found for go version \"{version}\" on this platform")]
    NotFound { version: String },

    #[error("could not write downloaded data: {0}")]
    Io(#[from] std::io::Error),
}

#[allow(async_fn_in_trait)]
pub trait Catalog {
    /// Stable releases that ship an archive for the running platform.
    async fn versions(&self) -> Result<Vec<Release>, CatalogError>;

    /// Expected SHA-256 (lowercase hex) of `version`'s archive for this
    /// platform.
    async fn checksum(&self, version: &str) -> Result<String, CatalogError>;

    async fn version_exists(&self, version: &str) -> Result<bool, CatalogError>;

    /// Streams the archive for `action.version` into `sink`.
    async fn download_version(&self, action: &Action, sink: &mut dyn Write) -> Result<(), CatalogError>;
}

pub struct HttpCatalog {
    client: reqwest::Client,
    versions_url: String,
    download_url: String,
    platform: PlatformInfo,
}

impl HttpCatalog {
    pub fn new(settings: &Settings, platform: PlatformInfo) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.http_timeout)
            .user_agent(format!("{}/{}", APP_NAME, env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            versions_url: settings.versions_url.clone(),
            download_url: settings.download_url.clone(),
            platform,
        })
    }

    pub fn download_url_for(&self, action: &Action) -> String {
        self.download_url
            .replace("{filename}", &action.archive_name(&self.platform))
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, CatalogError> {
        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| CatalogError::Request {
                url: url.to_string(),
                source,
            })?;

        if response.status() != StatusCode::OK {
            return Err(CatalogError::Status {
                url: url.to_string(),
                status: response.status(),
            });
        }
        Ok(response)
    }

    /// Every release the endpoint publishes, unfiltered.
    async fn all_releases(&self) -> Result<Vec<Release>, CatalogError> {
        let response = self.get(&self.versions_url).await?;
        let body = response.bytes().await.map_err(|source| CatalogError::Request {
            url: self.versions_url.clone(),
            source,
        })?;
        Ok(serde_json::from_slice(&body)?)
    }
}

impl Catalog for HttpCatalog {
    async fn versions(&self) -> Result<Vec<Release>, CatalogError> {
        let releases = self.all_releases().await?;
        let total = releases.len();
        let compatible = compatible_releases(releases, &self.platform);
        tracing::debug!(
            "Catalog lists {} releases, {} usable on {}/{}",
            total,
            compatible.len(),
            self.platform.os,
            self.platform.arch
        );
        Ok(compatible)
    }

    async fn checksum(&self, version: &str) -> Result<String, CatalogError> {
        let releases = self.all_releases().await?;
        releases
            .iter()
            .find(|r| r.version == version)
            .and_then(|r| r.archive_for(&self.platform))
            .map(|file| file.sha256.to_lowercase())
            .ok_or_else(|| CatalogError::NotFound {
                version: version.to_string(),
            })
    }

    async fn version_exists(&self, version: &str) -> Result<bool, CatalogError> {
        Ok(self.versions().await?.iter().any(|r| r.version == version))
    }

    async fn download_version(&self, action: &Action, sink: &mut dyn Write) -> Result<(), CatalogError> {
        let url = self.download_url_for(action);
        let response = self.get(&url).await?;

        let mut downloaded = 0u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|source| CatalogError::Request {
                url: url.clone(),
                source,
            })?;
            sink.write_all(&chunk)?;
            downloaded += chunk.len() as u64;
        }
        sink.flush()?;

        tracing::debug!("Downloaded {} bytes from {}", downloaded, url);
        Ok(())
    }
}
