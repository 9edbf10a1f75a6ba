//! Backend response parsing helpers
//!
//! The backend reports fixed-point values either as JSON numbers or as
//! decimal strings of raw units. Both are accepted.

use std::collections::HashMap;

use ironbank_core::{Amount, ChainError, Ppm};

use crate::{ProtocolInfo, Result, TokenInfo};

/// Read a raw-unit integer that may be encoded as a number or a string
fn raw_u64(value: &serde_json::Value, field: &str) -> Result<u64> {
    match value.get(field) {
        Some(serde_json::Value::Number(n)) => n
            .as_u64()
            .ok_or_else(|| ChainError::ParseError(format!("{} is not a u64: {}", field, n))),
        Some(serde_json::Value::String(s)) => s
            .parse::<u64>()
            .map_err(|e| ChainError::ParseError(format!("{} '{}': {}", field, s, e))),
        Some(other) => Err(ChainError::ParseError(format!(
            "{} has unexpected type: {}",
            field, other
        ))),
        None => Err(ChainError::ParseError(format!("missing field {}", field))),
    }
}

fn ppm(value: &serde_json::Value, field: &str) -> Result<Ppm> {
    let raw = raw_u64(value, field)?;
    u32::try_from(raw)
        .map(Ppm::new)
        .map_err(|_| ChainError::ParseError(format!("{} out of range: {}", field, raw)))
}

/// Parse `{ "<symbol>": { "price", "totalSupply", "marketCap" }, ... }`
///
/// Entries that fail to parse are skipped so a single bad token does not
/// blank every price.
pub fn parse_token_infos(json: &serde_json::Value) -> Result<HashMap<String, TokenInfo>> {
    let map = json
        .as_object()
        .ok_or_else(|| ChainError::ParseError("token info response is not an object".into()))?;

    let mut infos = HashMap::new();
    for (symbol, entry) in map {
        let parsed = raw_u64(entry, "price").map(|price| TokenInfo {
            price: Amount::from_raw(price),
            total_supply: Amount::from_raw(raw_u64(entry, "totalSupply").unwrap_or(0)),
            market_cap: Amount::from_raw(raw_u64(entry, "marketCap").unwrap_or(0)),
        });
        match parsed {
            Ok(info) => {
                infos.insert(symbol.to_ascii_lowercase(), info);
            }
            Err(e) => {
                tracing::warn!(symbol = %symbol, "Skipping token info: {}", e);
            }
        }
    }
    Ok(infos)
}

/// Parse the bank info record
pub fn parse_protocol_info(json: &serde_json::Value) -> Result<ProtocolInfo> {
    Ok(ProtocolInfo {
        target_collateral_ratio: ppm(json, "targetCollateralRatio")?,
        effective_collateral_ratio: ppm(json, "effectiveCollateralRatio")?,
        minting_fee: ppm(json, "mintingFee")?,
        redemption_fee: ppm(json, "redemptionFee")?,
    })
}
