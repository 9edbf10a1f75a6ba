//! Core type definitions for Iron Bank

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed-point token amount (raw units, 6 decimals)
///
/// Collateral (USDC), share (TITAN) and dollar (IRON) all use 6 decimals,
/// so `Amount::from_raw(1_000_000)` is 1.0 of any of them. Prices in USD
/// use the same scale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(pub u64);

/// Fixed-point USD price, same scale as [`Amount`]
pub type Price = Amount;

impl Amount {
    pub const ZERO: Amount = Amount(0);

    /// One whole token (1.000000)
    pub const ONE: Amount = Amount(constants::UNIT);

    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(&self) -> u64 {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    /// `self * mul / div`, truncated. `None` on zero divisor or overflow.
    pub fn mul_div_floor(self, mul: u64, div: u64) -> Option<Amount> {
        mul_div_floor(self.0, mul, div).map(Amount)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / constants::UNIT;
        let frac = self.0 % constants::UNIT;
        write!(
            f,
            "{}.{:0width$}",
            whole,
            frac,
            width = constants::TOKEN_DECIMALS as usize
        )
    }
}

/// Error returned when parsing an [`Amount`] from a decimal string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmountParseError(pub String);

impl fmt::Display for AmountParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid amount '{}'", self.0)
    }
}

impl std::error::Error for AmountParseError {}

impl FromStr for Amount {
    type Err = AmountParseError;

    /// Parse a decimal string ("1000", "1000.5"). Digits past the sixth
    /// decimal place are truncated.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || AmountParseError(s.to_string());
        let trimmed = s.trim();
        let (whole, frac) = match trimmed.split_once('.') {
            Some((w, f)) => (w, f),
            None => (trimmed, ""),
        };

        if whole.is_empty() && frac.is_empty() {
            return Err(err());
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit())
        {
            return Err(err());
        }

        let whole_units: u64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| err())?
        };

        let decimals = constants::TOKEN_DECIMALS as usize;
        let mut frac_digits: String = frac.chars().take(decimals).collect();
        while frac_digits.len() < decimals {
            frac_digits.push('0');
        }
        let frac_units: u64 = frac_digits.parse().map_err(|_| err())?;

        whole_units
            .checked_mul(constants::UNIT)
            .and_then(|w| w.checked_add(frac_units))
            .map(Amount)
            .ok_or_else(err)
    }
}

/// Parts-per-million ratio (1_000_000 = 100%)
///
/// Used for the collateral ratio, minting/redemption fee rates, and the
/// user's slippage tolerance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ppm(pub u32);

impl Ppm {
    pub const ZERO: Ppm = Ppm(0);
    pub const ONE: Ppm = Ppm(constants::PPM);

    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub const fn value(&self) -> u32 {
        self.0
    }

    /// `1_000_000 - self`, saturating at zero
    pub fn complement(&self) -> Ppm {
        Ppm(constants::PPM.saturating_sub(self.0))
    }

    /// True when the value is at or above 100%
    pub fn is_full(&self) -> bool {
        self.0 >= constants::PPM
    }

    /// `amount * self / 1_000_000`, truncated
    pub fn apply(&self, amount: Amount) -> Option<Amount> {
        amount.mul_div_floor(self.0 as u64, constants::PPM as u64)
    }

    /// Percentage with two decimals, e.g. "90.00%"
    pub fn as_percent(&self) -> String {
        // 1 ppm = 0.0001%, so hundredths of a percent are ppm / 100
        let hundredths = self.0 / 100;
        format!("{}.{:02}%", hundredths / 100, hundredths % 100)
    }
}

impl fmt::Display for Ppm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_percent())
    }
}

/// `a * b / c` with a u128 intermediate, rounding down.
///
/// Returns `None` when `c` is zero or the result does not fit in u64.
pub fn mul_div_floor(a: u64, b: u64, c: u64) -> Option<u64> {
    if c == 0 {
        return None;
    }
    let result = (a as u128).checked_mul(b as u128)?.checked_div(c as u128)?;
    u64::try_from(result).ok()
}

/// EVM account or contract address (20 bytes, 0x-prefixed hex)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub String);

impl Address {
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check the address is `0x` followed by 40 hex characters
    pub fn is_valid(&self) -> bool {
        match self.0.strip_prefix("0x") {
            Some(body) => body.len() == 40 && hex::decode(body).is_ok(),
            None => false,
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transaction hash (32 bytes, 0x-prefixed hex)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxHash(pub String);

impl TxHash {
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Network type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Polygon,
    Mumbai,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Polygon => "polygon",
            Self::Mumbai => "mumbai",
        }
    }

    pub fn chain_id(&self) -> u64 {
        match self {
            Self::Polygon => 137,
            Self::Mumbai => 80001,
        }
    }

    pub fn from_chain_id(chain_id: u64) -> Option<Self> {
        match chain_id {
            137 => Some(Self::Polygon),
            80001 => Some(Self::Mumbai),
            _ => None,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Constants
pub mod constants {
    /// Decimal places shared by collateral, share and dollar tokens
    pub const TOKEN_DECIMALS: u8 = 6;

    /// One whole token in raw units
    pub const UNIT: u64 = 1_000_000;

    /// 100% in parts-per-million
    pub const PPM: u32 = 1_000_000;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_display() {
        assert_eq!(Amount::from_raw(952_380_952).to_string(), "952.380952");
        assert_eq!(Amount::from_raw(5).to_string(), "0.000005");
        assert_eq!(Amount::ZERO.to_string(), "0.000000");
    }

    #[test]
    fn test_amount_parse() {
        assert_eq!("1000".parse::<Amount>().unwrap(), Amount::from_raw(1_000_000_000));
        assert_eq!("1000.5".parse::<Amount>().unwrap(), Amount::from_raw(1_000_500_000));
        assert_eq!(".25".parse::<Amount>().unwrap(), Amount::from_raw(250_000));
        // Truncates past 6 decimals
        assert_eq!(
            "0.1234567".parse::<Amount>().unwrap(),
            Amount::from_raw(123_456)
        );
    }

    #[test]
    fn test_amount_parse_rejects_garbage() {
        assert!("".parse::<Amount>().is_err());
        assert!(".".parse::<Amount>().is_err());
        assert!("-1".parse::<Amount>().is_err());
        assert!("1.2.3".parse::<Amount>().is_err());
        assert!("abc".parse::<Amount>().is_err());
        assert!("99999999999999999999".parse::<Amount>().is_err());
    }

    #[test]
    fn test_mul_div_floor() {
        assert_eq!(mul_div_floor(1_000_000_000, 1_000_000, 1_050_000), Some(952_380_952));
        assert_eq!(mul_div_floor(10, 10, 0), None);
        assert_eq!(mul_div_floor(u64::MAX, u64::MAX, 1), None);
        assert_eq!(mul_div_floor(u64::MAX, 2, 2), Some(u64::MAX));
    }

    #[test]
    fn test_ppm_helpers() {
        let ratio = Ppm::new(900_000);
        assert_eq!(ratio.complement(), Ppm::new(100_000));
        assert_eq!(ratio.as_percent(), "90.00%");
        assert!(!ratio.is_full());
        assert!(Ppm::ONE.is_full());
        assert_eq!(Ppm::new(1_200_000).complement(), Ppm::ZERO);
        assert_eq!(Ppm::new(3_000).as_percent(), "0.30%");

        let fee = Ppm::new(4_000);
        assert_eq!(
            fee.apply(Amount::from_raw(100_000_000)),
            Some(Amount::from_raw(400_000))
        );
    }

    #[test]
    fn test_address_validation() {
        let usdc = Address::new("0x2791bca1f2de4661ed88a30c99a7a9449aa84174");
        assert!(usdc.is_valid());

        assert!(!Address::new("2791bca1f2de4661ed88a30c99a7a9449aa84174").is_valid());
        assert!(!Address::new("0x2791bca1").is_valid());
        assert!(!Address::new("0xzz91bca1f2de4661ed88a30c99a7a9449aa84174").is_valid());
    }

    #[test]
    fn test_network_chain_ids() {
        assert_eq!(Network::Polygon.chain_id(), 137);
        assert_eq!(Network::from_chain_id(80001), Some(Network::Mumbai));
        assert_eq!(Network::from_chain_id(1), None);
        assert_eq!(Network::Polygon.as_str(), "polygon");
    }
}
