use std::net::SocketAddr;

use kos_server::auth::hash_password;
use kos_server::scheduler::Scheduler;
use kos_server::{AppState, BoxError, Config, api, db, logger};

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;
    let _log_guard = logger::init_logger(config.log_format.as_deref(), config.log_dir.as_deref());

    tracing::info!(
        environment = %config.environment,
        version = env!("CARGO_PKG_VERSION"),
        "Starting kos-server"
    );

    let state = AppState::new(config).await?;
    seed_admin(&state).await?;
    tokio::fs::create_dir_all(state.uploads.dir()).await?;

    let scheduler = Scheduler::start(state.clone());

    let addr = format!("0.0.0.0:{}", state.config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("kos-server HTTP listening on {addr}");

    let app = api::build_app(state);
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

    scheduler.shutdown().await;
    Ok(())
}

async fn seed_admin(state: &AppState) -> Result<(), BoxError> {
    let hash = hash_password(&state.config.admin_password)
        .map_err(|e| format!("Admin password hashing failed: {e}"))?;
    if let Some(id) = db::users::seed_admin(state.pool(), &state.config.admin_username, &hash).await? {
        tracing::info!(user_id = id, username = %state.config.admin_username, "Initial admin account created");
    }
    Ok(())
}
