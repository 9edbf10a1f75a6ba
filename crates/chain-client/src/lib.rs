//! chain-client: collaborator contracts and the backend price client
//!
//! The mint/redeem core never talks to a chain or an HTTP API directly. It
//! consumes the traits in [`sources`]; this crate also ships
//! [`BackendClient`], the HTTP implementation of the price and protocol-info
//! sources used by the API server.

pub mod queries;
pub mod sources;

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use ironbank_core::{BackendConfig, ChainError};

pub use sources::{
    AccountIdentity, LedgerSource, PoolContract, PriceSource, ProtocolInfo, ProtocolInfoSource,
    TokenApprover, TokenInfo,
};

/// Result type for collaborator operations
pub type Result<T> = std::result::Result<T, ChainError>;

/// HTTP client for the backend price and bank-info API
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    config: BackendConfig,
}

impl BackendClient {
    /// Create a new backend client
    pub fn new(config: BackendConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("ironbank")
            .build()
            .map_err(|e| ChainError::Unreachable {
                url: format!("{}: {}", config.url, e),
            })?;

        Ok(Self { http, config })
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.url.trim_end_matches('/'), path)
    }

    /// GET a JSON document from the backend
    async fn get_json(&self, path: &str) -> Result<serde_json::Value> {
        if self.config.disabled {
            return Err(ChainError::NotAvailable {
                what: "backend disabled".to_string(),
            });
        }

        let url = self.endpoint(path);
        let response = timed_request(self.timeout(), &url, self.http.get(&url).send())
            .await?
            .error_for_status()
            .map_err(|e| ChainError::ApiError {
                message: e.to_string(),
            })?;

        response
            .json()
            .await
            .map_err(|e| ChainError::ParseError(format!("{}: {}", url, e)))
    }
}

#[async_trait]
impl PriceSource for BackendClient {
    async fn token_infos(&self, symbols: &[&str]) -> Result<HashMap<String, TokenInfo>> {
        let path = format!("/api/tokens?symbols={}", symbols.join(","));
        let json = self.get_json(&path).await?;
        queries::parse_token_infos(&json)
    }
}

#[async_trait]
impl ProtocolInfoSource for BackendClient {
    async fn protocol_info(&self) -> Result<ProtocolInfo> {
        let json = self.get_json("/api/bank/info").await?;
        queries::parse_protocol_info(&json)
    }
}

/// Bound a request future by `limit`, mapping transport errors
async fn timed_request<T, E: std::fmt::Display>(
    limit: Duration,
    url: &str,
    fut: impl std::future::Future<Output = std::result::Result<T, E>>,
) -> Result<T> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| ChainError::Timeout {
            what: format!("{} after {:?}", url, limit),
        })?
        .map_err(|e| ChainError::Unreachable {
            url: format!("{}: {}", url, e),
        })
}
