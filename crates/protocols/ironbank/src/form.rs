//! Mint and redeem forms
//!
//! A form holds the user's inputs plus the latest prices and protocol
//! parameters, and keeps a derived quote. Every setter rebuilds the quote
//! from scratch; nothing is cached across recomputations. Observers can
//! follow the quote status through a watch channel.

use chain_client::ProtocolInfo;
use ironbank_core::{Amount, QuoteError};
use tokio::sync::watch;

use crate::calculator::{
    mint_fee, quote_mint, quote_redeem, redemption_fee, MintInput, MintMode, MintQuote,
    PriceQuote, RedeemQuote,
};

/// Whether the form currently has a quote to show
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuoteStatus {
    Ready,
    Unavailable(QuoteError),
}

impl QuoteStatus {
    fn of<T>(result: &Result<T, QuoteError>) -> Self {
        match result {
            Ok(_) => Self::Ready,
            Err(e) => Self::Unavailable(e.clone()),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// Mint form state
#[derive(Debug)]
pub struct MintForm {
    mode: MintMode,
    input: MintInput,
    prices: PriceQuote,
    info: ProtocolInfo,
    result: Result<MintQuote, QuoteError>,
    status_tx: watch::Sender<QuoteStatus>,
}

impl MintForm {
    pub fn new(prices: PriceQuote, info: ProtocolInfo) -> Self {
        let (status_tx, _) = watch::channel(QuoteStatus::Ready);
        let mut form = Self {
            mode: MintMode::Standard,
            input: MintInput::Collateral(Amount::ZERO),
            prices,
            info,
            result: Err(QuoteError::unavailable("not computed")),
            status_tx,
        };
        form.recompute();
        form
    }

    pub fn mode(&self) -> MintMode {
        self.mode
    }

    pub fn input(&self) -> MintInput {
        self.input
    }

    /// Share leg is suppressed while the target ratio is at 100%
    pub fn fully_collateralized(&self) -> bool {
        self.info.target_collateral_ratio.is_full()
    }

    pub fn set_collateral_amount(&mut self, amount: Amount) {
        self.input = MintInput::Collateral(amount);
        self.recompute();
    }

    pub fn set_share_amount(&mut self, amount: Amount) {
        self.input = MintInput::Share(amount);
        self.recompute();
    }

    pub fn set_prices(&mut self, prices: PriceQuote) {
        self.prices = prices;
        self.recompute();
    }

    pub fn set_protocol_info(&mut self, info: ProtocolInfo) {
        self.info = info;
        self.recompute();
    }

    /// Switch between Standard and Zapped; clears all amounts
    pub fn set_mode(&mut self, mode: MintMode) {
        self.mode = mode;
        self.input = MintInput::Collateral(Amount::ZERO);
        self.recompute();
    }

    pub fn quote(&self) -> Option<&MintQuote> {
        self.result.as_ref().ok()
    }

    /// Minting fee on the current quote; `None` whenever the quote is
    pub fn fee(&self) -> Option<Amount> {
        self.quote()
            .and_then(|q| mint_fee(q, self.info.minting_fee).ok())
    }

    pub fn status(&self) -> QuoteStatus {
        QuoteStatus::of(&self.result)
    }

    /// Owned copy of the current quote, frozen for confirmation
    pub fn snapshot(&self) -> Result<MintQuote, QuoteError> {
        self.result.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<QuoteStatus> {
        self.status_tx.subscribe()
    }

    fn recompute(&mut self) {
        self.result = quote_mint(
            self.input,
            self.mode,
            &self.prices,
            self.fully_collateralized(),
        );

        match &self.result {
            Ok(q) => tracing::debug!(
                mode = ?q.mode,
                collateral = %q.collateral_amount,
                share = %q.share_amount,
                min_output = %q.min_output_amount,
                "Mint quote recomputed"
            ),
            Err(e) => tracing::debug!("Mint quote unavailable: {}", e),
        }

        self.status_tx.send_replace(self.status());
    }
}

/// Redeem form state
#[derive(Debug)]
pub struct RedeemForm {
    dollar_amount: Amount,
    prices: PriceQuote,
    info: ProtocolInfo,
    result: Result<RedeemQuote, QuoteError>,
    status_tx: watch::Sender<QuoteStatus>,
}

impl RedeemForm {
    pub fn new(prices: PriceQuote, info: ProtocolInfo) -> Self {
        let (status_tx, _) = watch::channel(QuoteStatus::Ready);
        let mut form = Self {
            dollar_amount: Amount::ZERO,
            prices,
            info,
            result: Err(QuoteError::unavailable("not computed")),
            status_tx,
        };
        form.recompute();
        form
    }

    pub fn dollar_amount(&self) -> Amount {
        self.dollar_amount
    }

    /// Share leg is zero while the effective ratio is at 100%
    pub fn fully_collateralized(&self) -> bool {
        self.info.effective_collateral_ratio.is_full()
    }

    pub fn set_dollar_amount(&mut self, amount: Amount) {
        self.dollar_amount = amount;
        self.recompute();
    }

    pub fn set_prices(&mut self, prices: PriceQuote) {
        self.prices = prices;
        self.recompute();
    }

    pub fn set_protocol_info(&mut self, info: ProtocolInfo) {
        self.info = info;
        self.recompute();
    }

    pub fn quote(&self) -> Option<&RedeemQuote> {
        self.result.as_ref().ok()
    }

    pub fn fee(&self) -> Option<Amount> {
        self.quote()
            .and_then(|q| redemption_fee(q, self.info.redemption_fee).ok())
    }

    pub fn status(&self) -> QuoteStatus {
        QuoteStatus::of(&self.result)
    }

    pub fn snapshot(&self) -> Result<RedeemQuote, QuoteError> {
        self.result.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<QuoteStatus> {
        self.status_tx.subscribe()
    }

    fn recompute(&mut self) {
        self.result = quote_redeem(self.dollar_amount, &self.prices, self.fully_collateralized());

        match &self.result {
            Ok(q) => tracing::debug!(
                dollar = %q.dollar_amount,
                min_collateral = %q.min_collateral_amount,
                min_share = %q.min_share_amount,
                "Redeem quote recomputed"
            ),
            Err(e) => tracing::debug!("Redeem quote unavailable: {}", e),
        }

        self.status_tx.send_replace(self.status());
    }
}
