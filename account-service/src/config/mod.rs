use anyhow::Result;
use dotenvy::dotenv;
use secrecy::Secret;
use serde::Deserialize;
use std::env;

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub fees: FeesConfig,
    pub service_name: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    pub db_name: String,
}

/// Flat fee policy applied by the ledger operations.
///
/// Every withdrawal debits `withdrawal_fee` on top of the amount; transfers
/// between different agencies debit `transfer_fee` from the origin account.
#[derive(Deserialize, Clone, Copy, Debug)]
pub struct FeesConfig {
    pub withdrawal_fee: f64,
    pub transfer_fee: f64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let host = env::var("ACCOUNT_SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("ACCOUNT_SERVICE_PORT")
            .unwrap_or_else(|_| "3002".to_string())
            .parse()?;

        let db_url = env::var("ACCOUNT_DATABASE_URL").expect("ACCOUNT_DATABASE_URL must be set");
        let db_name =
            env::var("ACCOUNT_DATABASE_NAME").unwrap_or_else(|_| "accounts_db".to_string());

        let withdrawal_fee = env::var("ACCOUNT_WITHDRAWAL_FEE")
            .unwrap_or_else(|_| "1".to_string())
            .parse()?;
        let transfer_fee = env::var("ACCOUNT_TRANSFER_FEE")
            .unwrap_or_else(|_| "8".to_string())
            .parse()?;

        Ok(Self {
            server: ServerConfig { host, port },
            database: DatabaseConfig {
                url: Secret::new(db_url),
                db_name,
            },
            fees: FeesConfig {
                withdrawal_fee,
                transfer_fee,
            },
            service_name: "account-service".to_string(),
        })
    }
}
