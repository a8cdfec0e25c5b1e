//! HTTP surface: simulated payment webhook and health check.
//!
//! Runs on WEB_PORT alongside the bot's long-polling loop. The webhook is a
//! payment simulation endpoint for development and staging; it records a
//! completed deposit transaction and credits the user's prepaid balance.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use farmconnect_core::money;
use farmconnect_core::storage::{db, get_connection, payments, DbPool};

/// Shared state for the web server.
#[derive(Clone)]
struct WebState {
    db: Arc<DbPool>,
}

/// Body of `POST /webhook/paypal/simulate`. Amount is in euros.
#[derive(Debug, Deserialize)]
struct SimulatedDeposit {
    user_id: i64,
    amount: f64,
    paypal_id: String,
}

/// Starts the web server on the given port.
pub async fn start_web_server(port: u16, db: Arc<DbPool>) -> Result<(), Box<dyn std::error::Error>> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let state = WebState { db };

    // CORS for the storefront web-app
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    let app = Router::new()
        .route("/webhook/paypal/simulate", post(simulate_deposit_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .with_state(state);

    log::info!("Starting web server on http://{}", addr);
    log::info!("  POST /webhook/paypal/simulate - Simulated payment webhook");
    log::info!("  GET  /health                  - Health check");

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// POST /webhook/paypal/simulate — records a deposit and credits the balance.
async fn simulate_deposit_handler(State(state): State<WebState>, Json(body): Json<SimulatedDeposit>) -> Response {
    if body.amount <= 0.0 {
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({"error": "Invalid amount"}))).into_response();
    }

    let result = (|| -> farmconnect_core::AppResult<Option<i64>> {
        let mut conn = get_connection(&state.db)?;
        if db::get_user_by_id(&conn, body.user_id)?.is_none() {
            return Ok(None);
        }
        let amount_cents = money::euros_to_cents(body.amount);
        let transaction_id = payments::record_deposit(&mut conn, body.user_id, amount_cents, &body.paypal_id)?;
        Ok(Some(transaction_id))
    })();

    match result {
        Ok(Some(transaction_id)) => {
            log::info!(
                "Recorded simulated deposit of {:.2} EUR for user {} (transaction {})",
                body.amount,
                body.user_id,
                transaction_id
            );
            Json(json!({"status": "ok", "transaction_id": transaction_id})).into_response()
        }
        Ok(None) => (StatusCode::NOT_FOUND, Json(json!({"error": "User not found"}))).into_response(),
        Err(e) => {
            log::error!("Webhook deposit failed for user {}: {}", body.user_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Internal error"})),
            )
                .into_response()
        }
    }
}

/// GET /health — simple health check.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
