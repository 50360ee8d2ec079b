//! Account ledger handlers, one per operation of the HTTP surface.
//!
//! Handlers stay thin: extract, validate, delegate to the ledger service,
//! wrap the result in a response DTO.

use axum::{extract::State, http::StatusCode, Json};
use validator::Validate;

use crate::dtos::{
    AccountKeyRequest, AccountResponse, AgencyRequest, AverageBalanceResponse, BalanceResponse,
    CountRequest, CreateAccountRequest, MovementRequest, RemainingAccountsResponse,
    TransferRequest,
};
use crate::error::AppError;
use crate::models::Account;
use crate::services::metrics::record_operation;
use crate::AppState;

/// Open a new account from the caller-supplied record.
pub async fn create_account(
    State(state): State<AppState>,
    Json(payload): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), AppError> {
    payload.validate()?;

    tracing::info!(
        agency = payload.agency,
        account_number = payload.account_number,
        "Opening account"
    );

    let account = state
        .ledger
        .open_account(Account::new(
            payload.agency,
            payload.account_number,
            payload.name,
            payload.balance,
        ))
        .await?;

    record_operation("create");
    Ok((StatusCode::CREATED, Json(account.into())))
}

pub async fn list_accounts(
    State(state): State<AppState>,
) -> Result<Json<Vec<AccountResponse>>, AppError> {
    let accounts = state.ledger.list_accounts().await?;
    Ok(Json(
        accounts.into_iter().map(AccountResponse::from).collect(),
    ))
}

pub async fn deposit(
    State(state): State<AppState>,
    Json(payload): Json<MovementRequest>,
) -> Result<Json<BalanceResponse>, AppError> {
    payload.validate()?;

    tracing::info!(
        agency = payload.agency,
        account_number = payload.account_number,
        amount = payload.amount,
        "Deposit"
    );

    let balance = state
        .ledger
        .deposit(payload.agency, payload.account_number, payload.amount)
        .await?;

    record_operation("deposit");
    Ok(Json(BalanceResponse { balance }))
}

pub async fn withdraw(
    State(state): State<AppState>,
    Json(payload): Json<MovementRequest>,
) -> Result<Json<BalanceResponse>, AppError> {
    payload.validate()?;

    tracing::info!(
        agency = payload.agency,
        account_number = payload.account_number,
        amount = payload.amount,
        "Withdrawal"
    );

    let balance = state
        .ledger
        .withdraw(payload.agency, payload.account_number, payload.amount)
        .await?;

    record_operation("withdraw");
    Ok(Json(BalanceResponse { balance }))
}

pub async fn balance_inquiry(
    State(state): State<AppState>,
    Json(payload): Json<AccountKeyRequest>,
) -> Result<Json<BalanceResponse>, AppError> {
    let balance = state
        .ledger
        .balance(payload.agency, payload.account_number)
        .await?;
    Ok(Json(BalanceResponse { balance }))
}

/// Delete an account; the response reports how many accounts the agency
/// still holds.
pub async fn delete_account(
    State(state): State<AppState>,
    Json(payload): Json<AccountKeyRequest>,
) -> Result<Json<RemainingAccountsResponse>, AppError> {
    tracing::info!(
        agency = payload.agency,
        account_number = payload.account_number,
        "Closing account"
    );

    let remaining_accounts = state
        .ledger
        .close_account(payload.agency, payload.account_number)
        .await?;

    record_operation("delete");
    Ok(Json(RemainingAccountsResponse { remaining_accounts }))
}

pub async fn transfer(
    State(state): State<AppState>,
    Json(payload): Json<TransferRequest>,
) -> Result<Json<BalanceResponse>, AppError> {
    tracing::info!(
        origin = payload.origin_account_number,
        target = payload.target_account_number,
        amount = payload.amount,
        "Transfer"
    );

    let balance = state
        .ledger
        .transfer(
            payload.origin_account_number,
            payload.target_account_number,
            payload.amount,
        )
        .await?;

    record_operation("transfer");
    Ok(Json(BalanceResponse { balance }))
}

pub async fn average_balance(
    State(state): State<AppState>,
    Json(payload): Json<AgencyRequest>,
) -> Result<Json<AverageBalanceResponse>, AppError> {
    let average_balance = state.ledger.average_balance(payload.agency).await?;
    Ok(Json(AverageBalanceResponse { average_balance }))
}

pub async fn lowest_balances(
    State(state): State<AppState>,
    Json(payload): Json<CountRequest>,
) -> Result<Json<Vec<AccountResponse>>, AppError> {
    payload.validate()?;

    let accounts = state.ledger.lowest_balances(payload.count).await?;
    Ok(Json(
        accounts.into_iter().map(AccountResponse::from).collect(),
    ))
}

pub async fn highest_balances(
    State(state): State<AppState>,
    Json(payload): Json<CountRequest>,
) -> Result<Json<Vec<AccountResponse>>, AppError> {
    payload.validate()?;

    let accounts = state.ledger.highest_balances(payload.count).await?;
    Ok(Json(
        accounts.into_iter().map(AccountResponse::from).collect(),
    ))
}

/// Flag the richest account of every agency by moving it to agency 99.
pub async fn designate_private_agency(
    State(state): State<AppState>,
) -> Result<Json<Vec<AccountResponse>>, AppError> {
    let flagged = state.ledger.designate_private_agency().await?;

    record_operation("private_agency");
    Ok(Json(
        flagged.into_iter().map(AccountResponse::from).collect(),
    ))
}
