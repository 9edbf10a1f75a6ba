//! Iron Bank Mint/Redeem Calculator
//!
//! Pure math functions converting one user-supplied leg into the other legs,
//! the minimum output bounds, and the protocol fee.
//! No I/O, no async - just deterministic calculations.
//!
//! # Units
//!
//! - All amounts and prices: raw units with 6 decimals, 1_000_000 = 1.0
//! - Ratios and fee rates: parts-per-million, 1_000_000 = 100%
//! - Intermediate products use u128; every division truncates
//!
//! A zero price means "not loaded yet" and yields `QuoteUnavailable`.
//! A result that does not fit in u64 yields `ArithmeticOverflow`.

use ironbank_core::{Amount, Ppm, Price, QuoteError};
use serde::{Deserialize, Serialize};

use crate::constants::params;

/// Current USD prices of the three tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub collateral: Price,
    pub share: Price,
    pub dollar: Price,
}

impl PriceQuote {
    /// Share and dollar prices with collateral pegged at 1.0
    pub fn pegged(share: Price, dollar: Price) -> Self {
        Self {
            collateral: params::PEGGED_COLLATERAL_PRICE,
            share,
            dollar,
        }
    }

    /// Nothing loaded yet; every quote is unavailable until prices arrive
    pub fn unloaded() -> Self {
        Self::pegged(Amount::ZERO, Amount::ZERO)
    }
}

impl Default for PriceQuote {
    fn default() -> Self {
        Self::unloaded()
    }
}

/// Mint mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MintMode {
    /// Collateral plus share, mixed per the collateral ratio
    #[default]
    Standard,
    /// Collateral only; the protocol sources the share portion itself
    Zapped,
}

/// The leg the user edited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "edited", content = "amount", rename_all = "lowercase")]
pub enum MintInput {
    Collateral(Amount),
    Share(Amount),
}

/// Computed mint legs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintQuote {
    pub mode: MintMode,
    pub collateral_amount: Amount,
    pub share_amount: Amount,
    /// Dollar tokens the mint call must return at least
    pub min_output_amount: Amount,
}

/// Computed redeem legs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedeemQuote {
    pub dollar_amount: Amount,
    pub min_collateral_amount: Amount,
    pub min_share_amount: Amount,
}

fn require_price(price: Price, name: &str) -> Result<u64, QuoteError> {
    if price.is_zero() {
        Err(QuoteError::unavailable(format!("{} not loaded", name)))
    } else {
        Ok(price.raw())
    }
}

fn to_amount(value: Option<u128>, operation: &'static str) -> Result<Amount, QuoteError> {
    value
        .and_then(|v| u64::try_from(v).ok())
        .map(Amount::from_raw)
        .ok_or(QuoteError::ArithmeticOverflow { operation })
}

/// `(share * share_price + collateral * collateral_price) / dollar_price`
fn mint_output(
    collateral: Amount,
    share: Amount,
    prices: &PriceQuote,
) -> Result<Amount, QuoteError> {
    let dollar_price = require_price(prices.dollar, "dollar price")? as u128;
    let collateral_value = (collateral.raw() as u128).checked_mul(prices.collateral.raw() as u128);
    let share_value = (share.raw() as u128).checked_mul(prices.share.raw() as u128);
    let total = collateral_value
        .zip(share_value)
        .and_then(|(c, s)| c.checked_add(s));
    to_amount(total.map(|t| t / dollar_price), "mint output")
}

/// Zapped mint: collateral only, share leg always zero
///
/// `output = collateral * collateral_price / dollar_price`
pub fn quote_mint_zapped(
    collateral_amount: Amount,
    prices: &PriceQuote,
) -> Result<MintQuote, QuoteError> {
    require_price(prices.collateral, "collateral price")?;
    let min_output_amount = mint_output(collateral_amount, Amount::ZERO, prices)?;

    Ok(MintQuote {
        mode: MintMode::Zapped,
        collateral_amount,
        share_amount: Amount::ZERO,
        min_output_amount,
    })
}

/// Standard mint, collateral edited
///
/// `share = floor(collateral * collateral_price / share_price) / 9`
pub fn quote_mint_from_collateral(
    collateral_amount: Amount,
    prices: &PriceQuote,
) -> Result<MintQuote, QuoteError> {
    let collateral_price = require_price(prices.collateral, "collateral price")? as u128;
    let share_price = require_price(prices.share, "share price")? as u128;

    let share_value = (collateral_amount.raw() as u128)
        .checked_mul(collateral_price)
        .map(|v| v / share_price);
    // The intermediate must itself be representable before the split
    let share_amount = Amount::from_raw(
        to_amount(share_value, "share leg")?.raw() / params::SHARE_SPLIT_DIVISOR,
    );
    let min_output_amount = mint_output(collateral_amount, share_amount, prices)?;

    Ok(MintQuote {
        mode: MintMode::Standard,
        collateral_amount,
        share_amount,
        min_output_amount,
    })
}

/// Standard mint, share edited
///
/// `collateral = floor(share * share_price / collateral_price) * 9`
pub fn quote_mint_from_share(
    share_amount: Amount,
    prices: &PriceQuote,
) -> Result<MintQuote, QuoteError> {
    let collateral_price = require_price(prices.collateral, "collateral price")? as u128;
    let share_price = require_price(prices.share, "share price")? as u128;

    let collateral_value = (share_amount.raw() as u128)
        .checked_mul(share_price)
        .map(|v| v / collateral_price)
        .and_then(|v| v.checked_mul(params::SHARE_SPLIT_DIVISOR as u128));
    let collateral_amount = to_amount(collateral_value, "collateral leg")?;
    let min_output_amount = mint_output(collateral_amount, share_amount, prices)?;

    Ok(MintQuote {
        mode: MintMode::Standard,
        collateral_amount,
        share_amount,
        min_output_amount,
    })
}

/// Standard mint while fully collateralized: the share leg is suppressed
fn quote_mint_fully_collateralized(
    collateral_amount: Amount,
    prices: &PriceQuote,
) -> Result<MintQuote, QuoteError> {
    require_price(prices.collateral, "collateral price")?;
    let min_output_amount = mint_output(collateral_amount, Amount::ZERO, prices)?;

    Ok(MintQuote {
        mode: MintMode::Standard,
        collateral_amount,
        share_amount: Amount::ZERO,
        min_output_amount,
    })
}

/// Quote a mint for whichever leg the user edited
///
/// `fully_collateralized` comes from the target collateral ratio; when set,
/// Standard mode behaves like a collateral-only mint and rejects share input.
pub fn quote_mint(
    input: MintInput,
    mode: MintMode,
    prices: &PriceQuote,
    fully_collateralized: bool,
) -> Result<MintQuote, QuoteError> {
    match (mode, input) {
        (MintMode::Zapped, MintInput::Collateral(amount)) => quote_mint_zapped(amount, prices),
        (MintMode::Zapped, MintInput::Share(_)) => Err(QuoteError::unavailable(
            "share input is not accepted in zapped mode",
        )),
        (MintMode::Standard, MintInput::Collateral(amount)) if fully_collateralized => {
            quote_mint_fully_collateralized(amount, prices)
        }
        (MintMode::Standard, MintInput::Share(_)) if fully_collateralized => Err(
            QuoteError::unavailable("share leg is suppressed while fully collateralized"),
        ),
        (MintMode::Standard, MintInput::Collateral(amount)) => {
            quote_mint_from_collateral(amount, prices)
        }
        (MintMode::Standard, MintInput::Share(amount)) => quote_mint_from_share(amount, prices),
    }
}

/// Quote a redeem of `dollar_amount`
///
/// - `collateral = (dollar / 10 * 9) * dollar_price / collateral_price`
/// - `share = (dollar / 10) * dollar_price / share_price`
///
/// When fully collateralized (effective ratio) the share leg is zero and the
/// share price is not required.
pub fn quote_redeem(
    dollar_amount: Amount,
    prices: &PriceQuote,
    fully_collateralized: bool,
) -> Result<RedeemQuote, QuoteError> {
    let dollar_price = require_price(prices.dollar, "dollar price")?;
    let collateral_price = require_price(prices.collateral, "collateral price")?;

    let tenth = dollar_amount.raw() / params::REDEEM_SPLIT_PARTS;
    let collateral_part = tenth * params::REDEEM_COLLATERAL_PARTS;

    let min_collateral_amount = to_amount(
        (collateral_part as u128)
            .checked_mul(dollar_price as u128)
            .map(|v| v / collateral_price as u128),
        "redeem collateral leg",
    )?;

    let min_share_amount = if fully_collateralized {
        Amount::ZERO
    } else {
        let share_price = require_price(prices.share, "share price")?;
        to_amount(
            (tenth as u128)
                .checked_mul(dollar_price as u128)
                .map(|v| v / share_price as u128),
            "redeem share leg",
        )?
    };

    Ok(RedeemQuote {
        dollar_amount,
        min_collateral_amount,
        min_share_amount,
    })
}

/// `amount * rate / 1_000_000`, rejecting rates above 100%
pub fn fee_amount(amount: Amount, rate: Ppm) -> Result<Amount, QuoteError> {
    if rate > Ppm::ONE {
        return Err(QuoteError::unavailable(format!(
            "fee rate {} exceeds 100%",
            rate
        )));
    }
    rate.apply(amount)
        .ok_or(QuoteError::ArithmeticOverflow { operation: "fee" })
}

/// Minting fee, charged on the minimum output
pub fn mint_fee(quote: &MintQuote, minting_fee: Ppm) -> Result<Amount, QuoteError> {
    fee_amount(quote.min_output_amount, minting_fee)
}

/// Redemption fee, charged on the dollar input
pub fn redemption_fee(quote: &RedeemQuote, redemption_fee: Ppm) -> Result<Amount, QuoteError> {
    fee_amount(quote.dollar_amount, redemption_fee)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn amt(raw: u64) -> Amount {
        Amount::from_raw(raw)
    }

    fn sample_prices() -> PriceQuote {
        // TITAN at $2.00, IRON at $1.00
        PriceQuote::pegged(amt(2_000_000), amt(1_000_000))
    }

    #[test]
    fn test_zapped_mint_example() {
        let prices = PriceQuote::pegged(amt(2_000_000), amt(1_050_000));
        let quote = quote_mint_zapped(amt(1_000_000_000), &prices).unwrap();

        assert_eq!(quote.min_output_amount, amt(952_380_952));
        assert_eq!(quote.share_amount, Amount::ZERO);
        assert_eq!(quote.mode, MintMode::Zapped);
    }

    #[test]
    fn test_zapped_mint_ignores_share_price() {
        let prices = PriceQuote::pegged(Amount::ZERO, amt(1_000_000));
        let quote = quote_mint_zapped(amt(10_000_000), &prices).unwrap();
        assert_eq!(quote.min_output_amount, amt(10_000_000));
    }

    #[test]
    fn test_standard_mint_from_collateral() {
        // 900 USDC at $1, TITAN at $2 => 450 TITAN of value, / 9 = 50 TITAN
        let quote = quote_mint_from_collateral(amt(900_000_000), &sample_prices()).unwrap();

        assert_eq!(quote.share_amount, amt(50_000_000));
        // (50 * 2 + 900 * 1) / 1 = 1000 IRON
        assert_eq!(quote.min_output_amount, amt(1_000_000_000));
    }

    #[test]
    fn test_standard_mint_from_share() {
        // 50 TITAN at $2 = 100 USD => 100 USDC * 9 = 900 USDC
        let quote = quote_mint_from_share(amt(50_000_000), &sample_prices()).unwrap();

        assert_eq!(quote.collateral_amount, amt(900_000_000));
        assert_eq!(quote.min_output_amount, amt(1_000_000_000));
    }

    #[test]
    fn test_standard_mint_truncates() {
        // 1 raw unit of collateral cannot buy any share leg
        let quote = quote_mint_from_collateral(amt(1), &sample_prices()).unwrap();
        assert_eq!(quote.share_amount, Amount::ZERO);
        assert_eq!(quote.min_output_amount, amt(1));
    }

    #[test]
    fn test_mint_requires_prices() {
        let unloaded = PriceQuote::unloaded();
        assert!(matches!(
            quote_mint_from_collateral(amt(1_000_000), &unloaded),
            Err(QuoteError::QuoteUnavailable { .. })
        ));
        assert!(matches!(
            quote_mint_from_share(amt(1_000_000), &unloaded),
            Err(QuoteError::QuoteUnavailable { .. })
        ));
        assert!(matches!(
            quote_mint_zapped(amt(1_000_000), &unloaded),
            Err(QuoteError::QuoteUnavailable { .. })
        ));

        // Share price loaded but dollar price missing still blocks
        let no_dollar = PriceQuote::pegged(amt(2_000_000), Amount::ZERO);
        assert!(matches!(
            quote_mint_from_collateral(amt(1_000_000), &no_dollar),
            Err(QuoteError::QuoteUnavailable { .. })
        ));
    }

    #[test]
    fn test_mint_overflow_is_reported() {
        // Tiny share price makes the share leg exceed u64
        let prices = PriceQuote::pegged(amt(1), amt(1_000_000));
        let err = quote_mint_from_collateral(Amount::from_raw(u64::MAX), &prices).unwrap_err();
        assert!(matches!(err, QuoteError::ArithmeticOverflow { .. }));

        let prices = PriceQuote {
            collateral: amt(1),
            share: amt(u64::MAX),
            dollar: amt(1_000_000),
        };
        let err = quote_mint_from_share(Amount::from_raw(u64::MAX), &prices).unwrap_err();
        assert!(matches!(err, QuoteError::ArithmeticOverflow { .. }));
    }

    #[test]
    fn test_quote_mint_dispatch() {
        let prices = sample_prices();

        let zapped = quote_mint(
            MintInput::Collateral(amt(900_000_000)),
            MintMode::Zapped,
            &prices,
            false,
        )
        .unwrap();
        assert_eq!(zapped.share_amount, Amount::ZERO);
        assert_eq!(zapped.min_output_amount, amt(900_000_000));

        let err = quote_mint(
            MintInput::Share(amt(1_000_000)),
            MintMode::Zapped,
            &prices,
            false,
        )
        .unwrap_err();
        assert!(matches!(err, QuoteError::QuoteUnavailable { .. }));

        let standard = quote_mint(
            MintInput::Share(amt(50_000_000)),
            MintMode::Standard,
            &prices,
            false,
        )
        .unwrap();
        assert_eq!(standard.collateral_amount, amt(900_000_000));
    }

    #[test]
    fn test_fully_collateralized_suppresses_share_leg() {
        let prices = sample_prices();

        let quote = quote_mint(
            MintInput::Collateral(amt(900_000_000)),
            MintMode::Standard,
            &prices,
            true,
        )
        .unwrap();
        assert_eq!(quote.mode, MintMode::Standard);
        assert_eq!(quote.share_amount, Amount::ZERO);
        assert_eq!(quote.min_output_amount, amt(900_000_000));

        assert!(quote_mint(
            MintInput::Share(amt(1_000_000)),
            MintMode::Standard,
            &prices,
            true,
        )
        .is_err());
    }

    #[test]
    fn test_redeem_example() {
        let quote = quote_redeem(amt(100_000_000), &sample_prices(), false).unwrap();

        assert_eq!(quote.min_collateral_amount, amt(90_000_000));
        assert_eq!(quote.min_share_amount, amt(5_000_000));
        assert_eq!(quote.dollar_amount, amt(100_000_000));
    }

    #[test]
    fn test_redeem_truncates_tenth_first() {
        // 19 raw units: tenth = 1, collateral part = 9
        let quote = quote_redeem(amt(19), &sample_prices(), false).unwrap();
        assert_eq!(quote.min_collateral_amount, amt(9));
        assert_eq!(quote.min_share_amount, Amount::ZERO);
    }

    #[test]
    fn test_redeem_fully_collateralized() {
        let prices = PriceQuote::pegged(Amount::ZERO, amt(1_000_000));
        let quote = quote_redeem(amt(100_000_000), &prices, true).unwrap();
        assert_eq!(quote.min_collateral_amount, amt(90_000_000));
        assert_eq!(quote.min_share_amount, Amount::ZERO);
    }

    #[test]
    fn test_redeem_requires_prices() {
        let prices = PriceQuote::pegged(Amount::ZERO, amt(1_000_000));
        assert!(matches!(
            quote_redeem(amt(100_000_000), &prices, false),
            Err(QuoteError::QuoteUnavailable { .. })
        ));
        assert!(quote_redeem(amt(100_000_000), &PriceQuote::unloaded(), true).is_err());
    }

    #[test]
    fn test_fees() {
        let prices = sample_prices();
        let mint = quote_mint_from_collateral(amt(900_000_000), &prices).unwrap();
        // 0.3% of 1000 IRON
        assert_eq!(mint_fee(&mint, Ppm::new(3_000)).unwrap(), amt(3_000_000));

        let redeem = quote_redeem(amt(100_000_000), &prices, false).unwrap();
        // 0.4% of 100 IRON input
        assert_eq!(
            redemption_fee(&redeem, Ppm::new(4_000)).unwrap(),
            amt(400_000)
        );

        assert!(fee_amount(amt(1), Ppm::new(1_000_001)).is_err());
        assert_eq!(fee_amount(amt(1_000), Ppm::ZERO).unwrap(), Amount::ZERO);
    }

    proptest! {
        #[test]
        fn prop_zapped_output_formula(
            collateral in 0u64..1_000_000_000_000,
            collateral_price in 1u64..10_000_000,
            dollar_price in 1u64..10_000_000,
        ) {
            let prices = PriceQuote {
                collateral: amt(collateral_price),
                share: Amount::ZERO,
                dollar: amt(dollar_price),
            };
            let quote = quote_mint_zapped(amt(collateral), &prices).unwrap();
            let expected = (collateral as u128 * collateral_price as u128 / dollar_price as u128) as u64;
            prop_assert_eq!(quote.min_output_amount, amt(expected));
            prop_assert_eq!(quote.share_amount, Amount::ZERO);
        }

        #[test]
        fn prop_standard_mint_round_trip(
            collateral in 0u64..1_000_000_000_000,
            collateral_price in 1_000u64..1_000_000_000,
            share_price in 1_000u64..1_000_000_000,
            dollar_price in 1_000u64..1_000_000_000,
        ) {
            let prices = PriceQuote {
                collateral: amt(collateral_price),
                share: amt(share_price),
                dollar: amt(dollar_price),
            };
            let forward = quote_mint_from_collateral(amt(collateral), &prices).unwrap();
            let expected_share =
                (collateral as u128 * collateral_price as u128 / share_price as u128) as u64 / 9;
            prop_assert_eq!(forward.share_amount, amt(expected_share));

            let back = quote_mint_from_share(forward.share_amount, &prices).unwrap();
            let recovered = back.collateral_amount.raw();
            // Two truncating divisions: never overshoots, bounded undershoot
            let tolerance = 9 * (share_price / collateral_price + 2);
            prop_assert!(recovered <= collateral);
            prop_assert!(collateral - recovered <= tolerance);
        }

        #[test]
        fn prop_redeem_legs_monotonic(
            a in 0u64..1_000_000_000_000,
            b in 0u64..1_000_000_000_000,
            collateral_price in 1u64..10_000_000,
            share_price in 1u64..10_000_000,
            dollar_price in 1u64..10_000_000,
        ) {
            let prices = PriceQuote {
                collateral: amt(collateral_price),
                share: amt(share_price),
                dollar: amt(dollar_price),
            };
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let low = quote_redeem(amt(lo), &prices, false).unwrap();
            let high = quote_redeem(amt(hi), &prices, false).unwrap();
            prop_assert!(low.min_collateral_amount <= high.min_collateral_amount);
            prop_assert!(low.min_share_amount <= high.min_share_amount);
        }

        #[test]
        fn prop_fee_bounded_by_output(
            output in 0u64..u64::MAX,
            rate in 0u32..=1_000_000,
        ) {
            let fee = fee_amount(amt(output), Ppm::new(rate)).unwrap();
            prop_assert!(fee <= amt(output));
        }

        #[test]
        fn prop_zero_price_never_quotes(
            amount in 0u64..1_000_000_000_000,
            which in 0usize..3,
        ) {
            let mut prices = sample_prices();
            match which {
                0 => prices.collateral = Amount::ZERO,
                1 => prices.share = Amount::ZERO,
                _ => prices.dollar = Amount::ZERO,
            }
            prop_assert!(quote_mint_from_collateral(amt(amount), &prices).is_err());
            prop_assert!(quote_mint_from_share(amt(amount), &prices).is_err());
            prop_assert!(quote_redeem(amt(amount), &prices, false).is_err());
        }
    }
}
