//! Iron Bank Protocol State
//!
//! Combines protocol parameters and token prices into the state the forms,
//! the validators and the API work from.

use std::collections::HashMap;

use chain_client::{ProtocolInfo, TokenInfo};
use ironbank_core::{Amount, Ppm, Price};
use serde::{Deserialize, Serialize};

use crate::calculator::PriceQuote;

impl PriceQuote {
    /// Build prices from backend token records
    ///
    /// A symbol missing from `infos` leaves that price at zero, which the
    /// quote engine reports as unavailable.
    pub fn from_token_infos(
        infos: &HashMap<String, TokenInfo>,
        share_symbol: &str,
        dollar_symbol: &str,
    ) -> Self {
        let price_of = |symbol: &str| {
            infos
                .get(&symbol.to_ascii_lowercase())
                .map(|info| info.price)
                .unwrap_or(Amount::ZERO)
        };

        Self::pegged(price_of(share_symbol), price_of(dollar_symbol))
    }

    /// All three prices are non-zero
    pub fn is_loaded(&self) -> bool {
        !self.collateral.is_zero() && !self.share.is_zero() && !self.dollar.is_zero()
    }
}

/// Iron Bank state for API responses and quote forms
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankState {
    pub info: ProtocolInfo,
    pub prices: PriceQuote,

    // Collateralization, decided by the target ratio for mint and the
    // effective ratio for redeem
    pub mint_fully_collateralized: bool,
    pub redeem_fully_collateralized: bool,

    // Input split shown next to the mint form
    pub collateral_input_ratio: Ppm,
    pub share_input_ratio: Ppm,

    // Output split shown next to the redeem form
    pub collateral_output_ratio: Ppm,
    pub share_output_ratio: Ppm,

    // Rates: 1 token = x USD
    pub collateral_rate: Price,
    pub share_rate: Price,
    pub dollar_rate: Price,
}

impl BankState {
    pub fn new(info: ProtocolInfo, prices: PriceQuote) -> Self {
        Self {
            info,
            prices,
            mint_fully_collateralized: info.target_collateral_ratio.is_full(),
            redeem_fully_collateralized: info.effective_collateral_ratio.is_full(),
            collateral_input_ratio: info.target_collateral_ratio,
            share_input_ratio: info.target_collateral_ratio.complement(),
            collateral_output_ratio: info.effective_collateral_ratio,
            share_output_ratio: info.effective_collateral_ratio.complement(),
            collateral_rate: prices.collateral,
            share_rate: prices.share,
            dollar_rate: prices.dollar,
        }
    }

    /// Whether every price a quote needs has arrived
    pub fn prices_loaded(&self) -> bool {
        self.prices.is_loaded()
    }
}

impl Default for BankState {
    fn default() -> Self {
        Self::new(ProtocolInfo::default(), PriceQuote::unloaded())
    }
}
