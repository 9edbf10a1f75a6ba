//! Iron Bank Protocol Implementation
//!
//! This crate implements client-side quoting and transaction sequencing for
//! the Iron Bank fractional-algorithmic stablecoin.
//!
//! # Protocol Overview
//!
//! The pool mints its dollar token against two inputs:
//! - Collateral: a USD stablecoin, pegged at 1.0
//! - Share: the volatile governance token that covers the uncollateralized part
//!
//! Redeeming returns both legs in the same proportions.
//!
//! # Features
//!
//! - Mint and redeem quotes with fee estimates
//! - Reactive mint/redeem forms
//! - Balance checks and transaction plans (approvals + pool call)
//! - Step-by-step execution with a single pending sequence per session
//!
//! # Example
//!
//! ```ignore
//! use ironbank::{build_mint_plan, MintForm, TxSession};
//!
//! let tokens = config.token_addresses().ok_or(ProtocolError::NetworkNotSupported { network })?;
//! let mut form = MintForm::new(state.prices, state.info);
//! form.set_collateral_amount("1000".parse()?);
//! let plan = build_mint_plan(&form.snapshot()?, &tokens, slippage, form.fee());
//! let outcome = session.begin(plan)?.confirm(&wallet, &pool).await?;
//! ```

pub mod calculator;
pub mod constants;
pub mod fetch;
pub mod form;
pub mod orchestrator;
pub mod session;
pub mod state;
pub mod tx_builder;

pub use calculator::*;
pub use constants::*;
pub use fetch::{
    active_address, fetch_balances, fetch_bank_state, fetch_pool_collateral_balance,
    AccountBalances,
};
pub use form::{MintForm, QuoteStatus, RedeemForm};
pub use orchestrator::{Orchestrator, SequenceOutcome, SequenceState};
pub use session::{PendingConfirmation, TxSession};
pub use state::*;
pub use tx_builder::*;
