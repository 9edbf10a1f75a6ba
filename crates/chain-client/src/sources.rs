//! Collaborator contracts consumed by the mint/redeem core
//!
//! Prices, protocol parameters, balances, token approvals and pool calls all
//! come from outside the core. Each is a narrow async trait so callers can
//! plug in a backend API, a wallet provider, or a test double.

use std::collections::HashMap;

use async_trait::async_trait;
use ironbank_core::{Address, Amount, Ppm, Price, TxHash};
use serde::{Deserialize, Serialize};

use crate::Result;

/// Market data for one token as reported by the price source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    /// USD price, 6-decimal fixed point
    pub price: Price,
    pub total_supply: Amount,
    pub market_cap: Amount,
}

/// Protocol-wide parameters, all parts-per-million
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolInfo {
    /// Ratio the protocol steers towards; decides the mint legs
    pub target_collateral_ratio: Ppm,
    /// Ratio actually backing circulating supply; decides the redeem legs
    pub effective_collateral_ratio: Ppm,
    pub minting_fee: Ppm,
    pub redemption_fee: Ppm,
}

/// Chain and account the wallet is connected with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountIdentity {
    pub chain_id: u64,
    pub address: Address,
}

/// Current token prices keyed by backend symbol
///
/// A symbol missing from the result means its price is not yet available.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn token_infos(&self, symbols: &[&str]) -> Result<HashMap<String, TokenInfo>>;
}

/// Collateral ratio and fee rates
#[async_trait]
pub trait ProtocolInfoSource: Send + Sync {
    async fn protocol_info(&self) -> Result<ProtocolInfo>;
}

/// Token balances and the active wallet identity
#[async_trait]
pub trait LedgerSource: Send + Sync {
    /// `None` while no wallet is connected
    async fn active_account(&self) -> Result<Option<AccountIdentity>>;

    async fn balance_of(&self, token: &Address, owner: &Address) -> Result<Amount>;
}

/// ERC-20 `approve(spender, amount)` on `token`
///
/// Resolves once the approval is mined. A wallet-side refusal is reported as
/// `ChainError::Rejected`; an on-chain revert as `ChainError::Reverted`.
#[async_trait]
pub trait TokenApprover: Send + Sync {
    async fn approve(&self, token: &Address, spender: &Address, amount: Amount) -> Result<TxHash>;
}

/// Pool contract entry points, positional amounts only
#[async_trait]
pub trait PoolContract: Send + Sync {
    async fn mint(
        &self,
        collateral_amount: Amount,
        share_amount: Amount,
        min_output_amount: Amount,
    ) -> Result<TxHash>;

    async fn redeem(
        &self,
        dollar_amount: Amount,
        min_share_amount: Amount,
        min_collateral_amount: Amount,
    ) -> Result<TxHash>;
}
