use deposit_insurance_assistant::{
    api::{create_router, ApiState},
    config::AssistantConfig,
    pipeline::Assistant,
};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = AssistantConfig::from_env()?;
    info!(mode = ?config.mode, "Starting assistant API server");

    let assistant = Arc::new(Assistant::new(config)?);
    let router = create_router(ApiState { assistant });

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, router).await?;
    Ok(())
}
