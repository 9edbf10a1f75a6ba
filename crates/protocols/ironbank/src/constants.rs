//! Iron Bank Protocol Constants
//!
//! Token symbols and the fixed leg-split parameters used by the quote engine.

use ironbank_core::Amount;

/// Display symbols
pub mod symbols {
    pub const COLLATERAL: &str = "USDC";
    pub const SHARE: &str = "TITAN";
    pub const DOLLAR: &str = "IRON";
}

/// Protocol parameters
pub mod params {
    use ironbank_core::Amount;

    /// Share leg divisor for Standard mint: the share value is one ninth of
    /// the collateral value (90/10 split at the reference ratio)
    pub const SHARE_SPLIT_DIVISOR: u64 = 9;

    /// Redeem splits the dollar input into this many parts...
    pub const REDEEM_SPLIT_PARTS: u64 = 10;

    /// ...of which this many are paid out as collateral, the rest as share
    pub const REDEEM_COLLATERAL_PARTS: u64 = 9;

    /// Collateral is pegged at 1.0 USD unless a price is supplied
    pub const PEGGED_COLLATERAL_PRICE: Amount = Amount::ONE;
}

/// Whether an amount can be sent at all (non-zero)
pub fn is_spendable(amount: Amount) -> bool {
    !amount.is_zero()
}
