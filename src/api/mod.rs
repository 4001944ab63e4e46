//! HTTP layer: maps ledger operations to JSON routes.

mod error;
mod routes;

pub use error::*;
pub use routes::{AmountRequest, BalanceResponse, CreateAccountRequest, Data, DepositResponse, PaymentRequest};

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::application::LedgerService;

/// Build the application router around a shared ledger service.
pub fn router(service: Arc<LedgerService>) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/health", get(routes::health))
        .route(
            "/accounts",
            get(routes::list_accounts).post(routes::create_account),
        )
        .route("/accounts/{account_id}", get(routes::get_account))
        .route("/accounts/{account_id}/balance", get(routes::get_balance))
        .route("/accounts/{account_id}/entries", get(routes::list_entries))
        .route("/accounts/{account_id}/deposits", post(routes::deposit))
        .route("/accounts/{account_id}/withdrawals", post(routes::withdraw))
        .route("/payments", post(routes::pay))
        .route("/entries/{entry_id}", get(routes::get_entry))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}
