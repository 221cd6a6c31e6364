use crate::dto::*;
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use spinwheel_core::{Address, DistributionOutcome, Payout, Prize, TxHash};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

type ApiResult<T> = Result<Json<T>, ApiError>;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/spin", post(route_spin))
        .route("/api/distribute", post(route_distribute))
        .route("/api/buyspins", post(route_buy_spins))
        .route("/api/confirmbuy", post(route_confirm_buy))
        .route("/api/credits/:address", get(route_credits))
        .route("/api/report", get(route_report))
        .route("/health", get(route_health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_wallet(value: &str) -> Result<Address, ApiError> {
    value
        .parse()
        .map_err(|e: spinwheel_core::SpinwheelError| ApiError::bad_request(e.to_string()))
}

fn no_prize_message() -> String {
    "No prize won this time.".to_string()
}

async fn route_spin(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SpinRequest>, JsonRejection>,
) -> ApiResult<SpinResponse> {
    let Json(req) = payload?;
    let wallet = required(req.wallet_address)
        .ok_or_else(|| ApiError::bad_request("Wallet address is required"))?;
    let wallet = parse_wallet(&wallet)?;

    let outcome = state
        .game
        .spin(&wallet)
        .map_err(|e| ApiError::from_core(e, "Failed to spin"))?;

    let message = match state.game.resolver().resolve(&outcome.prize) {
        Ok(Payout::Nothing) => no_prize_message(),
        _ => format!("Congratulations! You won {}", outcome.prize),
    };

    Ok(Json(SpinResponse {
        message,
        prize: outcome.prize.to_string(),
    }))
}

async fn route_distribute(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DistributeRequest>, JsonRejection>,
) -> ApiResult<DistributeResponse> {
    let Json(req) = payload?;
    let (Some(wallet), Some(prize)) = (required(req.wallet_address), required(req.prize)) else {
        return Err(ApiError::bad_request("Wallet address and prize are required"));
    };
    let wallet = parse_wallet(&wallet)?;
    let prize = Prize::new(prize.trim());

    let outcome = state
        .game
        .distribute(&wallet, &prize)
        .await
        .map_err(|e| ApiError::from_core(e, "Failed to transfer prize"))?;

    let response = match outcome {
        DistributionOutcome::Transferred(result) => DistributeResponse {
            message: "Prize transferred successfully".to_string(),
            tx_hash: Some(result.tx_hash.to_string()),
        },
        DistributionOutcome::Collectible => DistributeResponse {
            message: format!("You won {}! Verify your collection to see it.", prize),
            tx_hash: None,
        },
        DistributionOutcome::NothingToSend => DistributeResponse {
            message: no_prize_message(),
            tx_hash: None,
        },
    };
    Ok(Json(response))
}

async fn route_buy_spins(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BuySpinsRequest>, JsonRejection>,
) -> ApiResult<BuySpinsResponse> {
    let Json(req) = payload?;
    let (Some(wallet), Some(num_spins)) = (required(req.wallet_address), req.num_spins) else {
        return Err(ApiError::bad_request(
            "Wallet address and number of spins are required",
        ));
    };
    parse_wallet(&wallet)?;

    let quote = state
        .desk
        .quote(num_spins)
        .map_err(|e| ApiError::from_core(e, "Failed to quote spins"))?;

    Ok(Json(BuySpinsResponse {
        message: format!(
            "Send {} {} to {} to buy {} extra spin{}, then confirm with the transaction hash",
            quote.cost,
            state.token_symbol,
            quote.pay_to,
            quote.spins,
            if quote.spins == 1 { "" } else { "s" }
        ),
        cost: quote.cost,
        pay_to: quote.pay_to.to_string(),
    }))
}

async fn route_confirm_buy(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ConfirmBuyRequest>, JsonRejection>,
) -> ApiResult<ConfirmBuyResponse> {
    let Json(req) = payload?;
    let (Some(wallet), Some(num_spins), Some(tx_hash)) =
        (required(req.wallet_address), req.num_spins, required(req.tx_hash))
    else {
        return Err(ApiError::bad_request(
            "Wallet address, number of spins and transaction hash are required",
        ));
    };
    let wallet = parse_wallet(&wallet)?;
    let tx_hash: TxHash = tx_hash
        .parse()
        .map_err(|e: spinwheel_core::SpinwheelError| ApiError::bad_request(e.to_string()))?;

    let credits = state
        .desk
        .confirm(wallet, num_spins, tx_hash)
        .await
        .map_err(|e| ApiError::from_core(e, "Failed to confirm purchase"))?;

    Ok(Json(ConfirmBuyResponse {
        message: format!("Purchase confirmed! Extra spins available: {}", credits),
        credits,
    }))
}

async fn route_credits(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> ApiResult<CreditsResponse> {
    let wallet = parse_wallet(&address)?;
    Ok(Json(CreditsResponse {
        address: wallet.to_string(),
        credits: state.ledger.credits(&wallet),
    }))
}

async fn route_report(State(state): State<Arc<AppState>>) -> Json<ReportResponse> {
    let report = state.ledger.treasury();
    Json(ReportResponse {
        token: state.token_symbol.clone(),
        total_in: report.total_in,
        total_out: report.total_out,
        balance: report.balance,
    })
}

async fn route_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
