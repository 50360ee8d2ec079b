use account_service::config::{Config, DatabaseConfig, FeesConfig, ServerConfig};
use account_service::Application;
use secrecy::Secret;
use serde_json::{json, Value};

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub db: mongodb::Database,
    pub client: reqwest::Client,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let db_name = format!("accounts_test_{}", uuid::Uuid::new_v4());

        let config = Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Random port
            },
            database: DatabaseConfig {
                url: Secret::new(
                    std::env::var("TEST_MONGODB_URI")
                        .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
                ),
                db_name: db_name.clone(),
            },
            fees: FeesConfig {
                withdrawal_fee: 1.0,
                transfer_fee: 8.0,
            },
            service_name: "account-service-test".to_string(),
        };

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);
        let db = app.db().clone();

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to come up by polling the health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            db,
            client,
        }
    }

    pub async fn create_account(
        &self,
        agency: i32,
        account_number: i64,
        name: &str,
        balance: f64,
    ) -> Value {
        let response = self
            .client
            .post(format!("{}/accounts", self.address))
            .json(&json!({
                "agency": agency,
                "account_number": account_number,
                "name": name,
                "balance": balance,
            }))
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status().as_u16(), 201);
        response.json().await.expect("Failed to parse JSON")
    }

    pub async fn balance_of(&self, agency: i32, account_number: i64) -> f64 {
        let response = self
            .client
            .get(format!("{}/accounts/balance", self.address))
            .json(&json!({ "agency": agency, "account_number": account_number }))
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status().as_u16(), 200);
        let body: Value = response.json().await.expect("Failed to parse JSON");
        body["balance"].as_f64().expect("balance is not a number")
    }

    /// Cleanup test database after test completes.
    pub async fn cleanup(&self) {
        self.db
            .drop(None)
            .await
            .expect("Failed to drop test database");
    }
}
