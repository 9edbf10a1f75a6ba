//! Iron Bank Transaction Plans
//!
//! Turns a confirmed quote into the ordered list of on-chain steps the
//! orchestrator executes.
//!
//! # Important Notes
//!
//! - Approvals always precede the pool call, one per spent token
//! - A zero share leg needs no share approval
//! - Amounts are copied into the plan; later quote changes do not reach it
//! - Slippage is carried for display; the pool call gets the quoted minimums

use std::fmt;
use std::str::FromStr;

use ironbank_core::{Address, Amount, Ppm, ProtocolError, TokenAddresses};
use serde::{Deserialize, Serialize};

use crate::calculator::{MintQuote, RedeemQuote};
use crate::constants::{is_spendable, symbols};
use crate::fetch::AccountBalances;

/// Iron Bank action types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BankAction {
    Mint,
    Redeem,
}

/// Error returned when parsing a `BankAction` from a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankActionParseError;

impl fmt::Display for BankActionParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid bank action (expected 'mint' or 'redeem')")
    }
}

impl FromStr for BankAction {
    type Err = BankActionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mint" => Ok(Self::Mint),
            "redeem" => Ok(Self::Redeem),
            _ => Err(BankActionParseError),
        }
    }
}

impl BankAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mint => "mint",
            Self::Redeem => "redeem",
        }
    }
}

impl fmt::Display for BankAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ERC-20 approval of the pool as spender
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalStep {
    pub token: Address,
    pub token_symbol: String,
    pub spender: Address,
    pub amount: Amount,
}

/// Pool contract call with its positional amounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum PoolCall {
    Mint {
        collateral_amount: Amount,
        share_amount: Amount,
        min_output_amount: Amount,
    },
    Redeem {
        dollar_amount: Amount,
        min_share_amount: Amount,
        min_collateral_amount: Amount,
    },
}

impl PoolCall {
    pub fn method(&self) -> &'static str {
        match self {
            Self::Mint { .. } => "mint",
            Self::Redeem { .. } => "redeem",
        }
    }
}

/// Transaction summary for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxSummary {
    pub action: String,
    pub input_description: String,
    pub output_description: String,
    pub fee: Option<Amount>,
    pub slippage: Ppm,
    /// Lowest dollar (mint) or collateral (redeem) output the user should
    /// expect after slippage
    pub worst_case_output: Amount,
}

/// Everything the orchestrator needs, frozen at confirmation time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionPlan {
    pub action: BankAction,
    pub steps: Vec<ApprovalStep>,
    pub call: PoolCall,
    pub slippage: Ppm,
    pub summary: TxSummary,
}

impl TransactionPlan {
    /// Approvals plus the pool call
    pub fn total_steps(&self) -> usize {
        self.steps.len() + 1
    }
}

/// Balance left after spending `required`
fn ensure_covers(token: &str, required: Amount, available: Amount) -> Result<Amount, ProtocolError> {
    available
        .checked_sub(required)
        .ok_or_else(|| ProtocolError::InsufficientBalance {
            token: token.to_string(),
            required: required.raw(),
            available: available.raw(),
        })
}

fn discount(amount: Amount, slippage: Ppm) -> Amount {
    slippage
        .complement()
        .apply(amount)
        .unwrap_or(Amount::ZERO)
}

/// Validate a mint quote before confirmation
///
/// Balance checks are skipped while balances are unknown.
pub fn validate_mint(
    quote: &MintQuote,
    balances: Option<&AccountBalances>,
) -> Result<(), ProtocolError> {
    if quote.collateral_amount.is_zero() && quote.share_amount.is_zero() {
        return Err(ProtocolError::InvalidAmount {
            message: "Amount must be positive".to_string(),
        });
    }

    if quote.min_output_amount.is_zero() {
        return Err(ProtocolError::InvalidAmount {
            message: format!("Mint would return no {}", symbols::DOLLAR),
        });
    }

    if let Some(balances) = balances {
        ensure_covers(symbols::COLLATERAL, quote.collateral_amount, balances.collateral)?;
        ensure_covers(symbols::SHARE, quote.share_amount, balances.share)?;
    }

    Ok(())
}

/// Validate a redeem quote before confirmation
pub fn validate_redeem(
    quote: &RedeemQuote,
    balances: Option<&AccountBalances>,
) -> Result<(), ProtocolError> {
    if quote.dollar_amount.is_zero() {
        return Err(ProtocolError::InvalidAmount {
            message: "Amount must be positive".to_string(),
        });
    }

    if let Some(balances) = balances {
        ensure_covers(symbols::DOLLAR, quote.dollar_amount, balances.dollar)?;
    }

    Ok(())
}

/// Build the mint plan: approve collateral, approve share if any, mint
pub fn build_mint_plan(
    quote: &MintQuote,
    tokens: &TokenAddresses,
    slippage: Ppm,
    fee: Option<Amount>,
) -> TransactionPlan {
    let mut steps = vec![ApprovalStep {
        token: tokens.collateral.clone(),
        token_symbol: symbols::COLLATERAL.to_string(),
        spender: tokens.pool.clone(),
        amount: quote.collateral_amount,
    }];

    if is_spendable(quote.share_amount) {
        steps.push(ApprovalStep {
            token: tokens.share.clone(),
            token_symbol: symbols::SHARE.to_string(),
            spender: tokens.pool.clone(),
            amount: quote.share_amount,
        });
    }

    let input_description = if quote.share_amount.is_zero() {
        format!("{} {}", quote.collateral_amount, symbols::COLLATERAL)
    } else {
        format!(
            "{} {} + {} {}",
            quote.collateral_amount,
            symbols::COLLATERAL,
            quote.share_amount,
            symbols::SHARE
        )
    };

    let summary = TxSummary {
        action: BankAction::Mint.as_str().to_string(),
        input_description,
        output_description: format!("{} {}", quote.min_output_amount, symbols::DOLLAR),
        fee,
        slippage,
        worst_case_output: discount(quote.min_output_amount, slippage),
    };

    tracing::debug!(
        approvals = steps.len(),
        collateral = %quote.collateral_amount,
        share = %quote.share_amount,
        "Built mint plan"
    );

    TransactionPlan {
        action: BankAction::Mint,
        steps,
        call: PoolCall::Mint {
            collateral_amount: quote.collateral_amount,
            share_amount: quote.share_amount,
            min_output_amount: quote.min_output_amount,
        },
        slippage,
        summary,
    }
}

/// Build the redeem plan: approve dollar, redeem
pub fn build_redeem_plan(
    quote: &RedeemQuote,
    tokens: &TokenAddresses,
    slippage: Ppm,
    fee: Option<Amount>,
) -> TransactionPlan {
    let steps = vec![ApprovalStep {
        token: tokens.dollar.clone(),
        token_symbol: symbols::DOLLAR.to_string(),
        spender: tokens.pool.clone(),
        amount: quote.dollar_amount,
    }];

    let output_description = if quote.min_share_amount.is_zero() {
        format!("{} {}", quote.min_collateral_amount, symbols::COLLATERAL)
    } else {
        format!(
            "{} {} + {} {}",
            quote.min_collateral_amount,
            symbols::COLLATERAL,
            quote.min_share_amount,
            symbols::SHARE
        )
    };

    let summary = TxSummary {
        action: BankAction::Redeem.as_str().to_string(),
        input_description: format!("{} {}", quote.dollar_amount, symbols::DOLLAR),
        output_description,
        fee,
        slippage,
        worst_case_output: discount(quote.min_collateral_amount, slippage),
    };

    tracing::debug!(dollar = %quote.dollar_amount, "Built redeem plan");

    TransactionPlan {
        action: BankAction::Redeem,
        steps,
        call: PoolCall::Redeem {
            dollar_amount: quote.dollar_amount,
            min_share_amount: quote.min_share_amount,
            min_collateral_amount: quote.min_collateral_amount,
        },
        slippage,
        summary,
    }
}
