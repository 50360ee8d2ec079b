//! MongoDB-backed account store.

use anyhow::anyhow;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::{
    FindOneAndUpdateOptions, FindOneOptions, FindOptions, IndexOptions, ReturnDocument,
};
use mongodb::{Collection, Database, IndexModel};

use crate::error::AppError;
use crate::models::Account;

#[derive(Clone)]
pub struct AccountRepository {
    accounts: Collection<Account>,
}

impl AccountRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            accounts: db.collection("accounts"),
        }
    }

    /// Create the indexes backing keyed lookups and the reporting sorts.
    pub async fn init_indexes(&self) -> Result<(), AppError> {
        let key_index = IndexModel::builder()
            .keys(doc! { "agency": 1, "account_number": 1 })
            .options(
                IndexOptions::builder()
                    .name("agency_account_idx".to_string())
                    .build(),
            )
            .build();

        let balance_index = IndexModel::builder()
            .keys(doc! { "balance": 1, "name": 1 })
            .options(
                IndexOptions::builder()
                    .name("balance_name_idx".to_string())
                    .build(),
            )
            .build();

        self.accounts
            .create_indexes([key_index, balance_index], None)
            .await?;

        tracing::info!("Account collection indexes initialized");
        Ok(())
    }

    /// Persist a new account. Balances must be non-negative at rest.
    pub async fn insert(&self, mut account: Account) -> Result<Account, AppError> {
        if account.balance < 0.0 {
            return Err(AppError::BadRequest(anyhow!(
                "initial balance cannot be negative"
            )));
        }

        let result = self.accounts.insert_one(&account, None).await?;
        account.id = result.inserted_id.as_object_id();
        Ok(account)
    }

    pub async fn find_by_key(
        &self,
        agency: i32,
        account_number: i64,
    ) -> Result<Option<Account>, AppError> {
        let filter = doc! { "agency": agency, "account_number": account_number };
        Ok(self.accounts.find_one(filter, None).await?)
    }

    /// Transfers resolve accounts by number alone.
    pub async fn find_by_number(&self, account_number: i64) -> Result<Option<Account>, AppError> {
        Ok(self
            .accounts
            .find_one(doc! { "account_number": account_number }, None)
            .await?)
    }

    pub async fn find_all(&self) -> Result<Vec<Account>, AppError> {
        let cursor = self.accounts.find(doc! {}, None).await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn find_in_agency(&self, agency: i32) -> Result<Vec<Account>, AppError> {
        let cursor = self.accounts.find(doc! { "agency": agency }, None).await?;
        Ok(cursor.try_collect().await?)
    }

    /// All accounts ordered by `sort`, truncated to `limit`.
    pub async fn find_sorted(&self, sort: Document, limit: i64) -> Result<Vec<Account>, AppError> {
        let options = FindOptions::builder().sort(sort).limit(limit).build();
        let cursor = self.accounts.find(doc! {}, Some(options)).await?;
        Ok(cursor.try_collect().await?)
    }

    /// Highest-balance account of an agency; ties resolve in store order.
    pub async fn richest_in_agency(&self, agency: i32) -> Result<Option<Account>, AppError> {
        let options = FindOneOptions::builder()
            .sort(doc! { "balance": -1 })
            .build();
        Ok(self
            .accounts
            .find_one(doc! { "agency": agency }, Some(options))
            .await?)
    }

    pub async fn distinct_agencies(&self) -> Result<Vec<i32>, AppError> {
        let values = self.accounts.distinct("agency", doc! {}, None).await?;
        Ok(values
            .into_iter()
            .filter_map(|value| {
                value
                    .as_i32()
                    .or_else(|| value.as_i64().map(|wide| wide as i32))
            })
            .collect())
    }

    pub async fn count_in_agency(&self, agency: i32) -> Result<u64, AppError> {
        Ok(self
            .accounts
            .count_documents(doc! { "agency": agency }, None)
            .await?)
    }

    /// Set the balance only if it still equals `expected`.
    ///
    /// Returns whether the guard matched; a miss means a concurrent writer got
    /// there first and the caller must re-read.
    pub async fn update_balance_guarded(
        &self,
        id: ObjectId,
        expected: f64,
        new_balance: f64,
    ) -> Result<bool, AppError> {
        let result = self
            .accounts
            .update_one(
                doc! { "_id": id, "balance": expected },
                doc! { "$set": { "balance": new_balance, "updated_at": DateTime::now() } },
                None,
            )
            .await?;
        Ok(result.matched_count == 1)
    }

    /// Move an account to another agency, returning the updated record.
    pub async fn reassign_agency(
        &self,
        id: ObjectId,
        agency: i32,
    ) -> Result<Option<Account>, AppError> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        Ok(self
            .accounts
            .find_one_and_update(
                doc! { "_id": id },
                doc! { "$set": { "agency": agency, "updated_at": DateTime::now() } },
                Some(options),
            )
            .await?)
    }

    pub async fn delete_by_key(
        &self,
        agency: i32,
        account_number: i64,
    ) -> Result<Option<Account>, AppError> {
        let filter = doc! { "agency": agency, "account_number": account_number };
        Ok(self.accounts.find_one_and_delete(filter, None).await?)
    }
}
