use std::sync::{Arc, OnceLock};

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::core::{config::Settings, state::AppState};
use crate::services::ypareo::YpareoClient;

/// Serializes tests that mutate process environment variables.
pub(crate) async fn env_lock() -> OwnedMutexGuard<()> {
    static LOCK: OnceLock<Arc<Mutex<()>>> = OnceLock::new();
    let lock = LOCK.get_or_init(|| Arc::new(Mutex::new(()))).clone();
    lock.lock_owned().await
}

pub(crate) fn set_test_env() {
    dotenvy::dotenv().ok();

    std::env::set_var("BULLETIN_ENV", "test");
    std::env::set_var("BULLETIN_STRICT_CONFIG", "0");
    std::env::set_var("PROMETHEUS_ENABLED", "0");
    std::env::remove_var("PROJECT_NAME");
    std::env::remove_var("VERSION");
    std::env::remove_var("BACKEND_CORS_ORIGINS");
    std::env::remove_var("BULLETIN_BASE_DIR");
    std::env::remove_var("BULLETIN_HOST");
    std::env::remove_var("BULLETIN_PORT");
    std::env::remove_var("UPLOAD_DIR");
    std::env::remove_var("OUTPUT_DIR");
    std::env::remove_var("DOWNLOAD_DIR");
    std::env::remove_var("TEMPLATE_DIR");
    std::env::remove_var("ECTS_JSON_PATH");
    std::env::remove_var("YPAREO_ABSENCE_FROM");
    std::env::remove_var("YPAREO_ABSENCE_TO");
    std::env::remove_var("YPAREO_PERIOD_CODES");
    std::env::remove_var("YPAREO_REPERTOIRE_CODE");
    std::env::remove_var("MAX_UPLOAD_SIZE_MB");
    std::env::set_var("YPAERO_BASE_URL", "http://127.0.0.1:1");
    std::env::set_var("YPAERO_API_TOKEN", "test-token");
}

pub(crate) fn build_state(settings: Settings) -> AppState {
    let ypareo = YpareoClient::from_settings(&settings).expect("ypareo client");
    AppState::new(settings, ypareo)
}
