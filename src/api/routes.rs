use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::application::{LedgerService, Payment, Withdrawal};
use crate::domain::{Account, Cents, Entry, EntryId};

use super::ApiError;

type ApiResult<T> = Result<(StatusCode, Json<Data<T>>), ApiError>;

/// Success body: `{"data": ...}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Data<T> {
    pub data: T,
}

fn ok<T>(status: StatusCode, data: T) -> ApiResult<T> {
    Ok((status, Json(Data { data })))
}

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub name: String,
    pub lastname: String,
}

#[derive(Debug, Deserialize)]
pub struct AmountRequest {
    pub amount: Cents,
}

#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    pub sender: String,
    pub receiver: String,
    /// Negative magnitude, as for withdrawals
    pub amount: Cents,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    #[serde(rename = "account-id")]
    pub account_id: String,
    pub amount: Cents,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositResponse {
    pub entry_id: EntryId,
}

pub async fn index() -> &'static str {
    "Welcome to Paybook!"
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn list_accounts(State(service): State<Arc<LedgerService>>) -> ApiResult<Vec<Account>> {
    ok(StatusCode::OK, service.list_accounts().await?)
}

pub async fn create_account(
    State(service): State<Arc<LedgerService>>,
    Json(req): Json<CreateAccountRequest>,
) -> ApiResult<Account> {
    let account = service.create_account(&req.name, &req.lastname).await?;
    ok(StatusCode::CREATED, account)
}

pub async fn get_account(
    State(service): State<Arc<LedgerService>>,
    Path(account_id): Path<String>,
) -> ApiResult<Account> {
    ok(StatusCode::OK, service.get_account(&account_id).await?)
}

pub async fn get_balance(
    State(service): State<Arc<LedgerService>>,
    Path(account_id): Path<String>,
) -> ApiResult<BalanceResponse> {
    let amount = service.balance(&account_id).await?;
    ok(StatusCode::OK, BalanceResponse { account_id, amount })
}

pub async fn list_entries(
    State(service): State<Arc<LedgerService>>,
    Path(account_id): Path<String>,
) -> ApiResult<Vec<Entry>> {
    ok(StatusCode::OK, service.entries(&account_id).await?)
}

pub async fn deposit(
    State(service): State<Arc<LedgerService>>,
    Path(account_id): Path<String>,
    Json(req): Json<AmountRequest>,
) -> ApiResult<DepositResponse> {
    let entry_id = service.deposit(&account_id, req.amount).await?;
    ok(StatusCode::CREATED, DepositResponse { entry_id })
}

pub async fn withdraw(
    State(service): State<Arc<LedgerService>>,
    Path(account_id): Path<String>,
    Json(req): Json<AmountRequest>,
) -> ApiResult<Withdrawal> {
    ok(StatusCode::CREATED, service.withdraw(&account_id, req.amount).await?)
}

pub async fn pay(
    State(service): State<Arc<LedgerService>>,
    Json(req): Json<PaymentRequest>,
) -> ApiResult<Payment> {
    let payment = service.pay(&req.sender, &req.receiver, req.amount).await?;
    ok(StatusCode::CREATED, payment)
}

pub async fn get_entry(
    State(service): State<Arc<LedgerService>>,
    Path(entry_id): Path<String>,
) -> ApiResult<Entry> {
    ok(StatusCode::OK, service.get_entry(&entry_id).await?)
}
