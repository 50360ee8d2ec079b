//! Domain model for the account ledger.

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Bank account document stored in the `accounts` collection.
///
/// `account_number` is unique within an agency and forms the lookup key
/// together with `agency`. Transfers resolve accounts by `account_number`
/// alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub agency: i32,
    pub account_number: i64,
    pub name: String,
    pub balance: f64,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new account record ready for insertion.
    pub fn new(agency: i32, account_number: i64, name: String, balance: f64) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            agency,
            account_number,
            name,
            balance,
            created_at: now,
            updated_at: now,
        }
    }
}
