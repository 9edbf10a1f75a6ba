//! Iron Bank State Fetching
//!
//! Pulls prices, protocol parameters and account balances from the
//! collaborator sources and turns them into protocol state.

use chain_client::{LedgerSource, PriceSource, ProtocolInfoSource};
use ironbank_core::{Address, Amount, AppConfig, ChainError, Network, ProtocolError, TokenAddresses};
use serde::{Deserialize, Serialize};

use crate::calculator::PriceQuote;
use crate::state::BankState;

/// Token balances of the active account
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalances {
    pub collateral: Amount,
    pub share: Amount,
    pub dollar: Amount,
}

fn map_chain_error(e: ChainError, what: &str) -> ProtocolError {
    ProtocolError::StateUnavailable {
        reason: format!("{}: {}", what, e),
    }
}

/// Fetch Iron Bank state from the backend sources
///
/// Protocol parameters are required. Prices that are not yet available
/// degrade to zero, which blocks quoting without failing the fetch.
pub async fn fetch_bank_state(
    price_source: &dyn PriceSource,
    info_source: &dyn ProtocolInfoSource,
    config: &AppConfig,
) -> Result<BankState, ProtocolError> {
    let symbols = [config.share_symbol.as_str(), config.dollar_symbol.as_str()];

    let (infos, info) = tokio::join!(
        price_source.token_infos(&symbols),
        info_source.protocol_info()
    );

    let info = info.map_err(|e| map_chain_error(e, "Protocol info"))?;

    let prices = match infos {
        Ok(infos) => {
            let prices =
                PriceQuote::from_token_infos(&infos, &config.share_symbol, &config.dollar_symbol);
            if !prices.is_loaded() {
                tracing::warn!(symbols = ?symbols, "Some token prices not yet available");
            }
            prices
        }
        Err(e) => {
            tracing::warn!("Price source unavailable, quotes blocked: {}", e);
            PriceQuote::unloaded()
        }
    };

    Ok(BankState::new(info, prices))
}

/// Fetch collateral, share and dollar balances of the connected account
///
/// Refresh is gated on the wallet's chain id: without an account the
/// balances are unavailable, and an account on another chain is rejected.
pub async fn fetch_balances(
    ledger: &dyn LedgerSource,
    network: Network,
    tokens: &TokenAddresses,
) -> Result<AccountBalances, ProtocolError> {
    let account = ledger
        .active_account()
        .await
        .map_err(|e| {
            tracing::warn!("Active account lookup failed: {}", e);
            ProtocolError::BalanceUnavailable
        })?
        .ok_or(ProtocolError::BalanceUnavailable)?;

    if account.chain_id != network.chain_id() {
        tracing::warn!(
            chain_id = account.chain_id,
            expected = network.chain_id(),
            "Dropping balance refresh for wrong chain"
        );
        return Err(ProtocolError::NetworkNotSupported {
            network: Network::from_chain_id(account.chain_id)
                .map(|n| n.to_string())
                .unwrap_or_else(|| format!("chain {}", account.chain_id)),
        });
    }

    let owner = &account.address;
    let (collateral, share, dollar) = tokio::try_join!(
        ledger.balance_of(&tokens.collateral, owner),
        ledger.balance_of(&tokens.share, owner),
        ledger.balance_of(&tokens.dollar, owner),
    )
    .map_err(|e| {
        tracing::warn!(owner = %owner, "Balance fetch failed: {}", e);
        ProtocolError::BalanceUnavailable
    })?;

    Ok(AccountBalances {
        collateral,
        share,
        dollar,
    })
}

/// Collateral held by the pool contract
pub async fn fetch_pool_collateral_balance(
    ledger: &dyn LedgerSource,
    tokens: &TokenAddresses,
) -> Result<Amount, ProtocolError> {
    ledger
        .balance_of(&tokens.collateral, &tokens.pool)
        .await
        .map_err(|e| map_chain_error(e, "Pool collateral balance"))
}

/// Owner address of the connected account, if any
pub async fn active_address(ledger: &dyn LedgerSource) -> Option<Address> {
    match ledger.active_account().await {
        Ok(account) => account.map(|a| a.address),
        Err(e) => {
            tracing::warn!("Active account lookup failed: {}", e);
            None
        }
    }
}
