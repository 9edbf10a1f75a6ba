//! Data Transfer Objects for API requests and responses
//!
//! Amounts travel as strings of raw 6-decimal units.

use ironbank::{AccountBalances, MintMode};
use ironbank_core::Amount;
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub network: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            network: String::new(),
        }
    }
}

/// Which mint leg the amount refers to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditedLeg {
    #[default]
    Collateral,
    Share,
}

/// Mint preview request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintPreviewRequest {
    pub amount: String,
    #[serde(default)]
    pub edited: EditedLeg,
    #[serde(default)]
    pub mode: MintMode,
}

/// Mint preview response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintPreviewResponse {
    pub collateral_amount: Option<String>,
    pub share_amount: Option<String>,
    pub min_output_amount: Option<String>,
    pub mint_fee: Option<String>,
    pub can_execute: bool,
    pub error: Option<String>,
}

/// Redeem preview request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedeemPreviewRequest {
    pub dollar_amount: String,
}

/// Redeem preview response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedeemPreviewResponse {
    pub collateral_amount: Option<String>,
    pub share_amount: Option<String>,
    pub redemption_fee: Option<String>,
    pub can_execute: bool,
    pub error: Option<String>,
}

/// Mint plan request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintPlanRequest {
    pub amount: String,
    #[serde(default)]
    pub edited: EditedLeg,
    #[serde(default)]
    pub mode: MintMode,
    /// Slippage tolerance in ppm; config default when absent
    pub slippage_ppm: Option<u32>,
    /// Wallet balances for the pre-confirmation checks
    pub balances: Option<AccountBalances>,
}

/// Redeem plan request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedeemPlanRequest {
    pub dollar_amount: String,
    pub slippage_ppm: Option<u32>,
    pub balances: Option<AccountBalances>,
}

/// Generic API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("bad_request", message)
    }
}

/// Raw-unit string of an amount
pub fn raw_string(amount: Amount) -> String {
    amount.raw().to_string()
}

/// Parse a raw-unit amount string
pub fn parse_raw_amount(value: &str) -> Result<Amount, ApiError> {
    value
        .trim()
        .parse::<u64>()
        .map(Amount::from_raw)
        .map_err(|e| ApiError::bad_request(format!("Invalid amount '{}': {}", value, e)))
}
