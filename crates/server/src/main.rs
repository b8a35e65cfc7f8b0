use anyhow::Error as AnyhowError;
use server::{AppState, config::ServerConfig, routes};
use skill::{SkillConfig, SkillError, hello_world_skill};
use thiserror::Error;
use tracing_subscriber::{EnvFilter, prelude::*};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Skill(#[from] SkillError),
    #[error(transparent)]
    Other(#[from] AnyhowError),
}

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    // Load environment variables from `.env` if present
    dotenv::dotenv().ok();

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let filter_string = format!("warn,server={level},skill={level}", level = log_level);
    let env_filter = EnvFilter::try_new(filter_string)
        .map_err(|e| anyhow::anyhow!("Failed to create tracing filter: {}", e))?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(env_filter))
        .init();

    let skill_config = SkillConfig::from_env();
    let skill = hello_world_skill(&skill_config)?;
    tracing::info!(
        handlers = skill.registry().len(),
        user_agent = %skill.user_agent(),
        "Skill ready"
    );

    let app_router = routes::router(AppState::new(skill));

    let server_config = ServerConfig::from_env();
    let listener = tokio::net::TcpListener::bind(server_config.bind_address()).await?;
    let actual_port = listener.local_addr()?.port();

    tracing::info!(
        "Server running on http://{}:{}",
        server_config.host,
        actual_port
    );

    axum::serve(listener, app_router).await?;
    Ok(())
}
