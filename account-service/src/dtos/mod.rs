//! Request and response payloads for the HTTP surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::Account;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAccountRequest {
    pub agency: i32,
    pub account_number: i64,
    #[validate(length(min = 1, message = "Account holder name cannot be empty"))]
    pub name: String,
    #[validate(range(min = 0.0, message = "Initial balance cannot be negative"))]
    pub balance: f64,
}

/// Deposit and withdrawal share the same shape.
#[derive(Debug, Deserialize, Validate)]
pub struct MovementRequest {
    pub agency: i32,
    pub account_number: i64,
    #[validate(range(min = 0.0, message = "Amount cannot be negative"))]
    pub amount: f64,
}

#[derive(Debug, Deserialize)]
pub struct AccountKeyRequest {
    pub agency: i32,
    pub account_number: i64,
}

#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub origin_account_number: i64,
    pub target_account_number: i64,
    pub amount: f64,
}

#[derive(Debug, Deserialize)]
pub struct AgencyRequest {
    pub agency: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CountRequest {
    #[validate(range(min = 0, message = "Count cannot be negative"))]
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: String,
    pub agency: i32,
    pub account_number: i64,
    pub name: String,
    pub balance: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id.map(|id| id.to_hex()).unwrap_or_default(),
            agency: account.agency,
            account_number: account.account_number,
            name: account.name,
            balance: account.balance,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub balance: f64,
}

#[derive(Debug, Serialize)]
pub struct RemainingAccountsResponse {
    pub remaining_accounts: u64,
}

#[derive(Debug, Serialize)]
pub struct AverageBalanceResponse {
    #[serde(rename = "averageBalance")]
    pub average_balance: f64,
}
