use anyhow::Result;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use auth::{
    AppState,
    accounts::AccountService,
    jwt::{JwtConfig, TokenService},
    password::{CredentialStore, PasswordConfig},
    routes,
    session::SessionManager,
};
use common::store::{self, StoreConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting authentication service");

    // Initialize the record store
    let store_config = StoreConfig::from_env()?;
    let store = store::connect(&store_config).await?;

    // Initialize JWT service and credential store
    let jwt_config = JwtConfig::from_env()?;
    let tokens = TokenService::new(jwt_config);
    let credentials = CredentialStore::new(&PasswordConfig::from_env())?;

    let sessions = SessionManager::new(store.clone(), tokens.clone());
    let accounts = AccountService::new(store, credentials, sessions);

    let app_state = AppState { accounts, tokens };

    info!("Authentication service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state);

    let bind_addr = std::env::var("AUTH_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Authentication service listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
