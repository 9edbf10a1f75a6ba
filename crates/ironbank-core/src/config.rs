//! Configuration types for Iron Bank

use std::path::Path;

use serde::{Deserialize, Serialize};

use std::time::Duration;

use crate::{Address, Error, Network, Ppm};

/// Backend price/info API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Backend URL (e.g., "https://api.iron.finance")
    pub url: String,

    /// Skip the backend entirely; prices stay unavailable
    #[serde(default)]
    pub disabled: bool,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "https://api.iron.finance".to_string(),
            disabled: false,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Token and pool contract addresses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenAddresses {
    /// Collateral token (USDC)
    pub collateral: Address,
    /// Share token (TITAN)
    pub share: Address,
    /// Dollar token (IRON)
    pub dollar: Address,
    /// Pool contract that spends approvals and mints/redeems
    pub pool: Address,
}

impl TokenAddresses {
    /// Polygon mainnet deployment
    pub fn polygon() -> Self {
        Self {
            collateral: Address::new("0x2791bca1f2de4661ed88a30c99a7a9449aa84174"),
            share: Address::new("0x49413090e04cE1ecCC7F38a9660FF58b84E58e86"),
            dollar: Address::new("0xb2b1B72acCBc25DD8F69d99C0D1365aDb1A6c716"),
            pool: Address::new("0x88296f7fa23976054FAf04974fce074E35775b3b"),
        }
    }

    /// Known deployment for a network
    pub fn for_network(network: Network) -> Option<Self> {
        match network {
            Network::Polygon => Some(Self::polygon()),
            // Testnet not yet deployed
            Network::Mumbai => None,
        }
    }

    fn all(&self) -> [(&'static str, &Address); 4] {
        [
            ("collateral", &self.collateral),
            ("share", &self.share),
            ("dollar", &self.dollar),
            ("pool", &self.pool),
        ]
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Network (polygon or mumbai)
    pub network: Network,

    /// Contract addresses; the network's known deployment when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<TokenAddresses>,

    /// Backend price/info API settings
    #[serde(default)]
    pub backend: BackendConfig,

    /// Backend symbol for the share token price
    #[serde(default = "default_share_symbol")]
    pub share_symbol: String,

    /// Backend symbol for the dollar token price
    #[serde(default = "default_dollar_symbol")]
    pub dollar_symbol: String,

    /// How long fetched bank state is reused before refreshing
    #[serde(default = "default_polling_interval_secs")]
    pub polling_interval_secs: u64,

    /// Slippage tolerance used when the user has not set one (0.1%)
    #[serde(default = "default_slippage")]
    pub default_slippage: Ppm,

    /// Per-step wait bound for approvals and pool calls
    #[serde(default = "default_step_timeout_secs")]
    pub step_timeout_secs: u64,

    /// API server port
    #[serde(default = "default_api_port")]
    pub api_port: u16,
}

fn default_share_symbol() -> String {
    "titan".to_string()
}

fn default_dollar_symbol() -> String {
    "iron".to_string()
}

fn default_polling_interval_secs() -> u64 {
    10
}

fn default_slippage() -> Ppm {
    Ppm::new(1_000)
}

fn default_step_timeout_secs() -> u64 {
    300
}

fn default_api_port() -> u16 {
    19060
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            network: Network::Polygon,
            tokens: None,
            backend: BackendConfig::default(),
            share_symbol: default_share_symbol(),
            dollar_symbol: default_dollar_symbol(),
            polling_interval_secs: default_polling_interval_secs(),
            default_slippage: default_slippage(),
            step_timeout_secs: default_step_timeout_secs(),
            api_port: default_api_port(),
        }
    }
}

impl AppConfig {
    /// Load from a JSON file. A missing file yields the defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        let config: AppConfig =
            serde_json::from_str(&raw).map_err(|e| Error::Serialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `IRONBANK_BACKEND_URL` and `IRONBANK_API_PORT` overrides
    pub fn with_env_overrides(mut self) -> Result<Self, Error> {
        if let Ok(url) = std::env::var("IRONBANK_BACKEND_URL") {
            self.backend.url = url;
        }
        if let Ok(port) = std::env::var("IRONBANK_API_PORT") {
            self.api_port = port
                .parse()
                .map_err(|_| Error::Config(format!("invalid IRONBANK_API_PORT '{}'", port)))?;
        }
        Ok(self)
    }

    /// Contract addresses in effect: configured, else the network default
    pub fn token_addresses(&self) -> Option<TokenAddresses> {
        self.tokens
            .clone()
            .or_else(|| TokenAddresses::for_network(self.network))
    }

    pub fn polling_interval(&self) -> Duration {
        Duration::from_secs(self.polling_interval_secs)
    }

    /// Check addresses and slippage bounds
    pub fn validate(&self) -> Result<(), Error> {
        let Some(tokens) = &self.tokens else {
            return self.validate_slippage();
        };
        for (name, address) in tokens.all() {
            if !address.is_valid() {
                return Err(Error::Config(format!(
                    "{} address '{}' is not a 20-byte hex address",
                    name, address
                )));
            }
        }
        self.validate_slippage()
    }

    fn validate_slippage(&self) -> Result<(), Error> {
        if self.default_slippage > Ppm::ONE {
            return Err(Error::Config(format!(
                "default slippage {} exceeds 100%",
                self.default_slippage
            )));
        }
        Ok(())
    }
}
