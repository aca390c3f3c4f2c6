//! App-data metadata API client.
//!
//! `GET {base}/{hash}` answers with an envelope whose `fullAppData` field is
//! itself a JSON document serialized to a string. Decoding happens in two
//! named steps so each layer fails with its own error.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::{
    errors::EnrichError,
    models::{AppDataContent, AppMetadata},
};

pub const DEFAULT_APP_DATA_API_BASE: &str = "https://api.cow.fi/mainnet/api/v1/app_data";

/// Resolves an app-data hash to its content.
#[async_trait]
pub trait AppDataSource: Send + Sync {
    async fn fetch_app_data(&self, hash: &str) -> Result<AppDataContent, EnrichError>;
}

/// Outer response body. `full_app_data` is still encoded JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct AppDataEnvelope {
    #[serde(rename = "fullAppData")]
    pub full_app_data: String,
}

/// Inner app-data document carried inside `fullAppData`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppDataDocument {
    #[serde(rename = "appCode", default)]
    pub app_code: Option<String>,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub metadata: Option<AppMetadata>,
    #[serde(default)]
    pub version: Option<String>,
}

impl AppDataDocument {
    pub fn into_content(self, full_app_data: String) -> AppDataContent {
        AppDataContent {
            app_code: self.app_code.unwrap_or_default(),
            environment: self.environment.unwrap_or_default(),
            full_app_data: Some(full_app_data),
            metadata: self.metadata.unwrap_or_default(),
            version: self.version,
        }
    }
}

pub fn parse_envelope(hash: &str, body: &str) -> Result<AppDataEnvelope, EnrichError> {
    serde_json::from_str(body).map_err(|source| EnrichError::EnvelopeParse {
        hash: hash.to_string(),
        source,
    })
}

pub fn parse_document(hash: &str, full_app_data: &str) -> Result<AppDataDocument, EnrichError> {
    serde_json::from_str(full_app_data).map_err(|source| EnrichError::DocumentParse {
        hash: hash.to_string(),
        source,
    })
}

/// Both decode layers, from raw response body to table content.
pub fn decode_app_data(hash: &str, body: &str) -> Result<AppDataContent, EnrichError> {
    let envelope = parse_envelope(hash, body)?;
    let document = parse_document(hash, &envelope.full_app_data)?;
    Ok(document.into_content(envelope.full_app_data))
}

#[derive(Clone)]
pub struct AppDataApiClient {
    client: Client,
    base_url: String,
}

impl AppDataApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("app-data-backfill/0.1")
            .build()
            .context("Failed to build app data HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    #[inline]
    fn url(&self, hash: &str) -> String {
        format!("{}/{}", self.base_url, hash)
    }
}

#[async_trait]
impl AppDataSource for AppDataApiClient {
    async fn fetch_app_data(&self, hash: &str) -> Result<AppDataContent, EnrichError> {
        let network = |source| EnrichError::Network {
            hash: hash.to_string(),
            source,
        };

        let resp = self
            .client
            .get(self.url(hash))
            .send()
            .await
            .map_err(network)?;

        if resp.status() != StatusCode::OK {
            return Err(EnrichError::Status {
                hash: hash.to_string(),
                status: resp.status().as_u16(),
            });
        }

        let body = resp.text().await.map_err(network)?;
        debug!(hash = %hash, body_len = body.len(), "app data response received");

        decode_app_data(hash, &body)
    }
}
