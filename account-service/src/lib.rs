pub mod config;
pub mod dtos;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use axum::middleware::from_fn;
use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use mongodb::{options::ClientOptions, Client};
use secrecy::ExposeSecret;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use config::Config;
use error::AppError;
use middleware::{metrics_middleware, request_id_middleware, REQUEST_ID_HEADER};
use services::{init_metrics, AccountRepository, LedgerService};

#[derive(Clone)]
pub struct AppState {
    pub db: mongodb::Database,
    pub config: Config,
    pub repository: AccountRepository,
    pub ledger: LedgerService,
}

pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
    db: mongodb::Database,
}

impl Application {
    pub async fn build(config: Config) -> Result<Self, AppError> {
        let mut client_options = ClientOptions::parse(config.database.url.expose_secret())
            .await
            .map_err(|e| {
                tracing::error!("Failed to parse MongoDB connection string: {}", e);
                AppError::Database(e.into())
            })?;
        client_options.app_name = Some(config.service_name.clone());

        let client = Client::with_options(client_options).map_err(|e| {
            tracing::error!("Failed to create MongoDB client: {}", e);
            AppError::Database(e.into())
        })?;
        let db = client.database(&config.database.db_name);

        init_metrics();

        let repository = AccountRepository::new(&db);
        repository.init_indexes().await?;

        let ledger = LedgerService::new(repository.clone(), config.fees);

        let state = AppState {
            db: db.clone(),
            config: config.clone(),
            repository,
            ledger,
        };

        let router = Router::new()
            .route("/health", get(handlers::health_check))
            .route("/ready", get(handlers::readiness_check))
            .route("/metrics", get(handlers::metrics_endpoint))
            .route(
                "/accounts",
                post(handlers::accounts::create_account).get(handlers::accounts::list_accounts),
            )
            .route("/accounts/deposit", patch(handlers::accounts::deposit))
            .route("/accounts/withdraw", patch(handlers::accounts::withdraw))
            .route("/accounts/balance", get(handlers::accounts::balance_inquiry))
            .route("/accounts/delete", delete(handlers::accounts::delete_account))
            .route("/accounts/transfer", patch(handlers::accounts::transfer))
            .route("/accounts/average", get(handlers::accounts::average_balance))
            .route(
                "/accounts/lowestBalance",
                get(handlers::accounts::lowest_balances),
            )
            .route(
                "/accounts/highestBalance",
                get(handlers::accounts::highest_balances),
            )
            .route(
                "/accounts/privateAgency",
                get(handlers::accounts::designate_private_agency),
            )
            .layer(from_fn(metrics_middleware))
            .layer(from_fn(request_id_middleware))
            .layer(CorsLayer::permissive())
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                    let request_id = request
                        .headers()
                        .get(REQUEST_ID_HEADER)
                        .and_then(|value| value.to_str().ok())
                        .unwrap_or("-");

                    tracing::info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = %request.method(),
                        uri = %request.uri(),
                        version = ?request.version(),
                    )
                }),
            )
            .with_state(state);

        // Port 0 lets the integration tests bind to a random free port.
        let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        Ok(Self {
            port,
            listener,
            router,
            db,
        })
    }

    /// Port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Handle to the backing database, for test cleanup.
    pub fn db(&self) -> &mongodb::Database {
        &self.db
    }

    pub async fn run_until_stopped(self) -> Result<(), AppError> {
        tracing::info!("Listening on port {}", self.port);
        axum::serve(self.listener, self.router)
            .await
            .map_err(AppError::from)?;
        Ok(())
    }
}
