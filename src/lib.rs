pub(crate) mod api;
pub(crate) mod bulletins;
pub(crate) mod core;
pub(crate) mod schemas;
pub(crate) mod services;

#[cfg(test)]
mod test_support;

use crate::core::{config::Settings, state::AppState, telemetry};
use crate::services::ypareo::YpareoClient;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    telemetry::init_tracing(&settings)?;
    core::metrics::init(&settings)?;

    std::fs::create_dir_all(&settings.paths().upload_dir)?;
    std::fs::create_dir_all(&settings.paths().output_dir)?;
    std::fs::create_dir_all(&settings.paths().download_dir)?;

    let ypareo = YpareoClient::from_settings(&settings)?;
    let state = AppState::new(settings, ypareo);

    let app = api::router::router(state.clone());
    let listener = tokio::net::TcpListener::bind(state.settings().server_addr()).await?;

    tracing::info!(
        host = %state.settings().server_host(),
        port = state.settings().server_port(),
        environment = %state.settings().runtime().environment.as_str(),
        "Bulletin Rust API listening"
    );

    axum::serve(listener, app).with_graceful_shutdown(core::shutdown::shutdown_signal()).await?;

    Ok(())
}
