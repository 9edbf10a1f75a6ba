//! ironbank-api: HTTP API layer for Iron Bank
//!
//! Exposes bank state, mint/redeem previews and transaction plans for a
//! frontend or an external signer.

pub mod dto;
pub mod routes;
pub mod server;
pub mod state;

pub use server::*;
pub use state::AppState;
