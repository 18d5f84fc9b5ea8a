use std::sync::Arc;

use crate::core::config::Settings;
use crate::services::ypareo::YpareoClient;

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    ypareo: YpareoClient,
}

impl AppState {
    pub(crate) fn new(settings: Settings, ypareo: YpareoClient) -> Self {
        Self { inner: Arc::new(InnerState { settings, ypareo }) }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn ypareo(&self) -> &YpareoClient {
        &self.inner.ypareo
    }
}
