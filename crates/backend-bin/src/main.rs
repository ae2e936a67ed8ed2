use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use backend_lib::{
    config::Settings,
    router,
    storage::FlatFileStorage,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration first so the log level can come from it
    let settings = Settings::load().or_else(|_| {
        eprintln!("falling back to config/default.toml");
        Settings::load_from("config/default.toml")
    })?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(settings.log_level.clone())),
        )
        .init();

    // Create storage
    let storage = FlatFileStorage::new(&settings.data_dir)?;

    // Create application state
    let bind_addr = settings.bind_addr;
    let state = Arc::new(AppState::new(storage, settings));

    // Create the router
    let app = router::create_router(state);

    // Start the server
    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
