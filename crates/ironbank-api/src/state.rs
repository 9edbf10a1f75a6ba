//! Application state shared across API handlers

use std::sync::Arc;
use std::time::{Duration, Instant};

use chain_client::{BackendClient, PriceSource, ProtocolInfoSource};
use ironbank::BankState;
use ironbank_core::{AppConfig, ChainError, Network};
use tokio::sync::RwLock;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: RwLock<AppConfig>,
    prices: Arc<dyn PriceSource>,
    info: Arc<dyn ProtocolInfoSource>,
    /// Last fetched bank state and when it was fetched
    bank_state: RwLock<Option<(Instant, BankState)>>,
}

impl AppState {
    /// Create state backed by the configured backend API
    pub fn new(config: AppConfig) -> Result<Self, ChainError> {
        tracing::info!("Creating backend client for URL: {}", config.backend.url);
        let backend = Arc::new(BackendClient::new(config.backend.clone())?);
        Ok(Self::with_sources(config, backend.clone(), backend))
    }

    /// Create state over arbitrary price and protocol-info sources
    pub fn with_sources(
        config: AppConfig,
        prices: Arc<dyn PriceSource>,
        info: Arc<dyn ProtocolInfoSource>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config: RwLock::new(config),
                prices,
                info,
                bank_state: RwLock::new(None),
            }),
        }
    }

    /// Get current config
    pub async fn config(&self) -> AppConfig {
        self.inner.config.read().await.clone()
    }

    /// Get current network
    pub async fn network(&self) -> Network {
        self.inner.config.read().await.network
    }

    pub fn price_source(&self) -> &dyn PriceSource {
        self.inner.prices.as_ref()
    }

    pub fn info_source(&self) -> &dyn ProtocolInfoSource {
        self.inner.info.as_ref()
    }

    /// Bank state fetched less than `max_age` ago
    pub async fn cached_bank_state(&self, max_age: Duration) -> Option<BankState> {
        let cached = self.inner.bank_state.read().await;
        match cached.as_ref() {
            Some((fetched_at, state)) if fetched_at.elapsed() < max_age => Some(state.clone()),
            _ => None,
        }
    }

    pub async fn store_bank_state(&self, state: BankState) {
        *self.inner.bank_state.write().await = Some((Instant::now(), state));
    }
}
