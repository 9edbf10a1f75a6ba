//! Iron Bank endpoints

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use ironbank::{
    build_mint_plan, build_redeem_plan, fetch_bank_state, validate_mint, validate_redeem,
    BankState, MintForm, MintMode, RedeemForm, TransactionPlan,
};
use ironbank_core::{constants, Amount, AppConfig, Ppm, ProtocolError, TokenAddresses};

use crate::dto::{
    parse_raw_amount, raw_string, ApiError, EditedLeg, MintPlanRequest, MintPreviewRequest,
    MintPreviewResponse, RedeemPlanRequest, RedeemPreviewRequest, RedeemPreviewResponse,
};
use crate::AppState;

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

/// Create bank routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/state", get(get_state))
        .route("/mint/preview", post(mint_preview))
        .route("/redeem/preview", post(redeem_preview))
        .route("/mint/plan", post(mint_plan))
        .route("/redeem/plan", post(redeem_plan))
}

fn protocol_error(e: ProtocolError) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(ApiError::new(e.error_code(), e.to_string())),
    )
}

fn bad_request(e: ApiError) -> (StatusCode, Json<ApiError>) {
    (StatusCode::BAD_REQUEST, Json(e))
}

async fn load_state(state: &AppState) -> Result<BankState, (StatusCode, Json<ApiError>)> {
    let config = state.config().await;
    if let Some(cached) = state.cached_bank_state(config.polling_interval()).await {
        return Ok(cached);
    }
    let bank = fetch_bank_state(state.price_source(), state.info_source(), &config)
        .await
        .map_err(protocol_error)?;
    // Reuse only complete state; missing prices are retried on the next request
    if bank.prices_loaded() {
        state.store_bank_state(bank.clone()).await;
    }
    Ok(bank)
}

fn mint_form(bank: &BankState, amount: Amount, edited: EditedLeg, mode: MintMode) -> MintForm {
    let mut form = MintForm::new(bank.prices, bank.info);
    form.set_mode(mode);
    match edited {
        EditedLeg::Collateral => form.set_collateral_amount(amount),
        EditedLeg::Share => form.set_share_amount(amount),
    }
    form
}

fn redeem_form(bank: &BankState, amount: Amount) -> RedeemForm {
    let mut form = RedeemForm::new(bank.prices, bank.info);
    form.set_dollar_amount(amount);
    form
}

fn slippage(requested: Option<u32>, default: Ppm) -> Result<Ppm, (StatusCode, Json<ApiError>)> {
    match requested {
        None => Ok(default),
        Some(ppm) if ppm <= constants::PPM => Ok(Ppm::new(ppm)),
        Some(ppm) => Err(bad_request(ApiError::bad_request(format!(
            "Slippage {} ppm exceeds 100%",
            ppm
        )))),
    }
}

fn token_addresses(config: &AppConfig) -> Result<TokenAddresses, (StatusCode, Json<ApiError>)> {
    config.token_addresses().ok_or_else(|| {
        protocol_error(ProtocolError::NetworkNotSupported {
            network: config.network.to_string(),
        })
    })
}

/// GET /bank/state - Get current protocol state
pub async fn get_state(State(state): State<AppState>) -> ApiResult<BankState> {
    Ok(Json(load_state(&state).await?))
}

/// POST /bank/mint/preview - Preview a mint
pub async fn mint_preview(
    State(state): State<AppState>,
    Json(request): Json<MintPreviewRequest>,
) -> ApiResult<MintPreviewResponse> {
    let amount = parse_raw_amount(&request.amount).map_err(bad_request)?;
    let bank = load_state(&state).await?;
    let form = mint_form(&bank, amount, request.edited, request.mode);

    let response = match form.snapshot() {
        Ok(quote) => {
            let check = validate_mint(&quote, None);
            MintPreviewResponse {
                collateral_amount: Some(raw_string(quote.collateral_amount)),
                share_amount: Some(raw_string(quote.share_amount)),
                min_output_amount: Some(raw_string(quote.min_output_amount)),
                mint_fee: form.fee().map(raw_string),
                can_execute: check.is_ok(),
                error: check.err().map(|e| e.to_string()),
            }
        }
        Err(e) => MintPreviewResponse {
            collateral_amount: None,
            share_amount: None,
            min_output_amount: None,
            mint_fee: None,
            can_execute: false,
            error: Some(e.to_string()),
        },
    };

    Ok(Json(response))
}

/// POST /bank/redeem/preview - Preview a redeem
pub async fn redeem_preview(
    State(state): State<AppState>,
    Json(request): Json<RedeemPreviewRequest>,
) -> ApiResult<RedeemPreviewResponse> {
    let amount = parse_raw_amount(&request.dollar_amount).map_err(bad_request)?;
    let bank = load_state(&state).await?;
    let form = redeem_form(&bank, amount);

    let response = match form.snapshot() {
        Ok(quote) => {
            let check = validate_redeem(&quote, None);
            RedeemPreviewResponse {
                collateral_amount: Some(raw_string(quote.min_collateral_amount)),
                share_amount: Some(raw_string(quote.min_share_amount)),
                redemption_fee: form.fee().map(raw_string),
                can_execute: check.is_ok(),
                error: check.err().map(|e| e.to_string()),
            }
        }
        Err(e) => RedeemPreviewResponse {
            collateral_amount: None,
            share_amount: None,
            redemption_fee: None,
            can_execute: false,
            error: Some(e.to_string()),
        },
    };

    Ok(Json(response))
}

/// POST /bank/mint/plan - Build the approval + mint sequence
pub async fn mint_plan(
    State(state): State<AppState>,
    Json(request): Json<MintPlanRequest>,
) -> ApiResult<TransactionPlan> {
    let config = state.config().await;
    let tokens = token_addresses(&config)?;
    let amount = parse_raw_amount(&request.amount).map_err(bad_request)?;
    let slippage = slippage(request.slippage_ppm, config.default_slippage)?;

    let bank = load_state(&state).await?;
    let form = mint_form(&bank, amount, request.edited, request.mode);
    let quote = form.snapshot().map_err(|e| {
        protocol_error(ProtocolError::ActionNotAllowed {
            reason: e.to_string(),
        })
    })?;

    validate_mint(&quote, request.balances.as_ref()).map_err(protocol_error)?;

    Ok(Json(build_mint_plan(
        &quote,
        &tokens,
        slippage,
        form.fee(),
    )))
}

/// POST /bank/redeem/plan - Build the approval + redeem sequence
pub async fn redeem_plan(
    State(state): State<AppState>,
    Json(request): Json<RedeemPlanRequest>,
) -> ApiResult<TransactionPlan> {
    let config = state.config().await;
    let tokens = token_addresses(&config)?;
    let amount = parse_raw_amount(&request.dollar_amount).map_err(bad_request)?;
    let slippage = slippage(request.slippage_ppm, config.default_slippage)?;

    let bank = load_state(&state).await?;
    let form = redeem_form(&bank, amount);
    let quote = form.snapshot().map_err(|e| {
        protocol_error(ProtocolError::ActionNotAllowed {
            reason: e.to_string(),
        })
    })?;

    validate_redeem(&quote, request.balances.as_ref()).map_err(protocol_error)?;

    Ok(Json(build_redeem_plan(
        &quote,
        &tokens,
        slippage,
        form.fee(),
    )))
}
