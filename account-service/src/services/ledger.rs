//! Ledger operations: the business rules over the account store.
//!
//! Every balance mutation is a guarded read-modify-write: the update only
//! lands if the balance still equals what was read, and a guard miss triggers
//! a bounded re-read. Fee policy comes from [`FeesConfig`].

use anyhow::anyhow;
use mongodb::bson::doc;
use mongodb::bson::oid::ObjectId;

use crate::config::FeesConfig;
use crate::error::AppError;
use crate::models::Account;
use crate::services::repository::AccountRepository;

/// Sentinel agency that receives each agency's flagged richest account.
pub const PRIVATE_AGENCY: i32 = 99;

/// Guarded-update attempts before giving up with a conflict.
const MAX_GUARDED_RETRIES: usize = 5;

#[derive(Clone)]
pub struct LedgerService {
    repository: AccountRepository,
    fees: FeesConfig,
}

impl LedgerService {
    pub fn new(repository: AccountRepository, fees: FeesConfig) -> Self {
        Self { repository, fees }
    }

    /// Insert a caller-supplied account record, returning it with its id.
    pub async fn open_account(&self, account: Account) -> Result<Account, AppError> {
        self.repository.insert(account).await
    }

    pub async fn list_accounts(&self) -> Result<Vec<Account>, AppError> {
        self.repository.find_all().await
    }

    pub async fn deposit(
        &self,
        agency: i32,
        account_number: i64,
        amount: f64,
    ) -> Result<f64, AppError> {
        if amount < 0.0 {
            return Err(AppError::BadRequest(anyhow!(
                "deposit amount cannot be negative"
            )));
        }

        for _ in 0..MAX_GUARDED_RETRIES {
            let account = self.require_account(agency, account_number).await?;
            let new_balance = account.balance + amount;
            if self.try_set_balance(&account, new_balance).await? {
                return Ok(new_balance);
            }
        }

        Err(concurrent_update(agency, account_number))
    }

    /// Debit `amount` plus the flat withdrawal fee.
    ///
    /// Withdrawing the exact balance leaves the account at minus the fee;
    /// that overdraft is accepted, any deeper one is rejected up front.
    pub async fn withdraw(
        &self,
        agency: i32,
        account_number: i64,
        amount: f64,
    ) -> Result<f64, AppError> {
        if amount < 0.0 {
            return Err(AppError::BadRequest(anyhow!(
                "withdrawal amount cannot be negative"
            )));
        }

        for _ in 0..MAX_GUARDED_RETRIES {
            let account = self.require_account(agency, account_number).await?;
            let new_balance =
                withdrawal_result(account.balance, amount, self.fees.withdrawal_fee)?;
            if self.try_set_balance(&account, new_balance).await? {
                return Ok(new_balance);
            }
        }

        Err(concurrent_update(agency, account_number))
    }

    pub async fn balance(&self, agency: i32, account_number: i64) -> Result<f64, AppError> {
        Ok(self.require_account(agency, account_number).await?.balance)
    }

    /// Delete an account and report how many accounts its agency still holds.
    pub async fn close_account(&self, agency: i32, account_number: i64) -> Result<u64, AppError> {
        if self
            .repository
            .delete_by_key(agency, account_number)
            .await?
            .is_none()
        {
            return Err(account_not_found(agency, account_number));
        }
        self.repository.count_in_agency(agency).await
    }

    /// Move `amount` between two accounts resolved by account number alone.
    ///
    /// Same-agency transfers move the amount as-is; cross-agency transfers
    /// debit the flat transfer fee from the origin on top of the amount. No
    /// funds check is made and the origin may go negative.
    pub async fn transfer(&self, origin: i64, target: i64, amount: f64) -> Result<f64, AppError> {
        let origin_account = self.require_account_by_number(origin).await?;
        let target_account = self.require_account_by_number(target).await?;

        let debit = transfer_debit(
            origin_account.agency,
            target_account.agency,
            amount,
            self.fees.transfer_fee,
        );

        let origin_balance = self.shift_balance(origin, -debit).await?;
        self.shift_balance(target, amount).await?;

        Ok(origin_balance)
    }

    /// Arithmetic mean of an agency's balances, rounded to cents.
    pub async fn average_balance(&self, agency: i32) -> Result<f64, AppError> {
        let accounts = self.repository.find_in_agency(agency).await?;
        if accounts.is_empty() {
            return Err(AppError::NotFound(anyhow!(
                "agency {} has no accounts",
                agency
            )));
        }

        let total: f64 = accounts.iter().map(|account| account.balance).sum();
        Ok(round_to_cents(total / accounts.len() as f64))
    }

    /// Up to `count` accounts system-wide, poorest first, ties by name.
    pub async fn lowest_balances(&self, count: i64) -> Result<Vec<Account>, AppError> {
        if count <= 0 {
            return Ok(Vec::new());
        }
        self.repository
            .find_sorted(doc! { "balance": 1, "name": 1 }, count)
            .await
    }

    /// Up to `count` accounts system-wide, richest first, ties by name.
    pub async fn highest_balances(&self, count: i64) -> Result<Vec<Account>, AppError> {
        if count <= 0 {
            return Ok(Vec::new());
        }
        self.repository
            .find_sorted(doc! { "balance": -1, "name": 1 }, count)
            .await
    }

    /// Flag the richest account of every agency currently present by moving
    /// it to the private agency.
    ///
    /// Each invocation re-scans the distinct agencies at that moment, so
    /// running it again flags each agency's next-richest account, and the
    /// private agency itself gets re-scanned once populated.
    pub async fn designate_private_agency(&self) -> Result<Vec<Account>, AppError> {
        let agencies = self.repository.distinct_agencies().await?;

        let mut flagged = Vec::with_capacity(agencies.len());
        for agency in agencies {
            let Some(richest) = self.repository.richest_in_agency(agency).await? else {
                continue;
            };
            let id = record_id(&richest)?;
            if let Some(updated) = self.repository.reassign_agency(id, PRIVATE_AGENCY).await? {
                flagged.push(updated);
            }
        }

        tracing::info!(flagged = flagged.len(), "Private agency designation done");
        Ok(flagged)
    }

    async fn require_account(
        &self,
        agency: i32,
        account_number: i64,
    ) -> Result<Account, AppError> {
        self.repository
            .find_by_key(agency, account_number)
            .await?
            .ok_or_else(|| account_not_found(agency, account_number))
    }

    async fn require_account_by_number(&self, account_number: i64) -> Result<Account, AppError> {
        self.repository
            .find_by_number(account_number)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow!("account {} not found", account_number)))
    }

    async fn try_set_balance(
        &self,
        account: &Account,
        new_balance: f64,
    ) -> Result<bool, AppError> {
        let id = record_id(account)?;
        self.repository
            .update_balance_guarded(id, account.balance, new_balance)
            .await
    }

    /// Guarded read-modify-write of a balance, resolved by account number.
    async fn shift_balance(&self, account_number: i64, delta: f64) -> Result<f64, AppError> {
        for _ in 0..MAX_GUARDED_RETRIES {
            let account = self.require_account_by_number(account_number).await?;
            let new_balance = account.balance + delta;
            if self.try_set_balance(&account, new_balance).await? {
                return Ok(new_balance);
            }
        }
        Err(AppError::Conflict(anyhow!(
            "account {} was concurrently modified",
            account_number
        )))
    }
}

fn record_id(account: &Account) -> Result<ObjectId, AppError> {
    account
        .id
        .ok_or_else(|| AppError::Internal(anyhow!("stored account is missing its id")))
}

fn account_not_found(agency: i32, account_number: i64) -> AppError {
    AppError::NotFound(anyhow!("account {}/{} not found", agency, account_number))
}

fn concurrent_update(agency: i32, account_number: i64) -> AppError {
    AppError::Conflict(anyhow!(
        "account {}/{} was concurrently modified",
        agency,
        account_number
    ))
}

/// New balance after a withdrawal, or why it is not allowed.
fn withdrawal_result(balance: f64, amount: f64, fee: f64) -> Result<f64, AppError> {
    if amount > balance || balance < 0.0 {
        return Err(AppError::InsufficientFunds {
            requested: amount,
            available: balance,
        });
    }
    Ok(balance - amount - fee)
}

/// Total debited from the origin account for a transfer.
fn transfer_debit(origin_agency: i32, target_agency: i32, amount: f64, fee: f64) -> f64 {
    if origin_agency == target_agency {
        amount
    } else {
        amount + fee
    }
}

/// Round to two decimal places, half away from zero.
fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
