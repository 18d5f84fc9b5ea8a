use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::Value;

use crate::core::config::Settings;
use crate::schemas::ypareo::{
    AbsenceCollection, DocumentImport, GroupCollection, LearnerCollection,
};

const AUTH_HEADER: &str = "X-Auth-Token";

#[derive(Debug, thiserror::Error)]
pub(crate) enum YpareoError {
    #[error("Yparéo request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Yparéo returned status {status}: {detail}")]
    Upstream { status: u16, detail: String },
    #[error("Yparéo response did not match the expected shape: {0}")]
    Decode(#[from] serde_json::Error),
}

impl YpareoError {
    /// Transport failures and server-side errors are worth retrying;
    /// 4xx rejections are not.
    pub(crate) fn is_retryable(&self) -> bool {
        match self {
            YpareoError::Transport(_) => true,
            YpareoError::Upstream { status, .. } => *status >= 500,
            YpareoError::Decode(_) => false,
        }
    }

    pub(crate) fn upstream_status(&self) -> Option<u16> {
        match self {
            YpareoError::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Client for the Yparéo school-management API.
#[derive(Debug, Clone)]
pub(crate) struct YpareoClient {
    client: Client,
    base_url: String,
    api_token: String,
    period_codes: String,
    repertoire_code: String,
    import_max_retries: u32,
    import_retry_delay: Duration,
}

impl YpareoClient {
    pub(crate) fn from_settings(settings: &Settings) -> Result<Self> {
        let timeout = Duration::from_secs(settings.ypareo().timeout_seconds);
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(20))
            .timeout(timeout)
            .build()
            .context("Failed to build Yparéo HTTP client")?;

        Ok(Self {
            client,
            base_url: settings.ypareo().base_url.trim_end_matches('/').to_string(),
            api_token: settings.ypareo().api_token.clone(),
            period_codes: settings.ypareo().period_codes.clone(),
            repertoire_code: settings.ypareo().repertoire_code.clone(),
            import_max_retries: settings.ypareo().import_max_retries,
            import_retry_delay: Duration::from_secs(
                settings.ypareo().import_retry_delay_seconds,
            ),
        })
    }

    /// Raw upstream JSON for one read endpoint; proxy handlers forward this
    /// body untouched.
    pub(crate) async fn get_json(&self, path: &str) -> Result<Value, YpareoError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .header(AUTH_HEADER, &self.api_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(YpareoError::Upstream { status: status.as_u16(), detail });
        }

        Ok(response.json().await?)
    }

    pub(crate) fn learners_path(&self) -> String {
        format!(
            "/r/v1/formation-longue/apprenants?codesPeriode={}",
            self.period_codes
        )
    }

    pub(crate) fn groups_path(&self) -> &'static str {
        "/r/v1/formation-longue/groupes"
    }

    pub(crate) fn absences_path(&self, from: &str, to: &str) -> String {
        format!("/r/v1/absences/{from}/{to}")
    }

    pub(crate) fn repertoires_path(&self) -> &'static str {
        "/r/v1/document/repertoires-apprenant"
    }

    pub(crate) async fn fetch_learners(&self) -> Result<LearnerCollection, YpareoError> {
        let raw = self.get_json(&self.learners_path()).await?;
        Ok(serde_json::from_value(raw)?)
    }

    pub(crate) async fn fetch_groups(&self) -> Result<GroupCollection, YpareoError> {
        let raw = self.get_json(self.groups_path()).await?;
        Ok(serde_json::from_value(raw)?)
    }

    pub(crate) async fn fetch_absences(
        &self,
        from: &str,
        to: &str,
    ) -> Result<AbsenceCollection, YpareoError> {
        let raw = self.get_json(&self.absences_path(from, to)).await?;
        Ok(serde_json::from_value(raw)?)
    }

    /// Import one learner document, retrying transport and 5xx failures a
    /// bounded number of times with a fixed delay.
    pub(crate) async fn import_document(
        &self,
        learner_code: u64,
        payload: &DocumentImport,
    ) -> Result<(), YpareoError> {
        retry(self.import_max_retries, self.import_retry_delay, |attempt| {
            tracing::debug!(learner_code, attempt, "posting bulletin document");
            self.import_once(learner_code, payload)
        })
        .await
    }

    async fn import_once(
        &self,
        learner_code: u64,
        payload: &DocumentImport,
    ) -> Result<(), YpareoError> {
        let url = format!(
            "{}/r/v1/document/apprenant/{}/document?codeRepertoire={}",
            self.base_url, learner_code, self.repertoire_code
        );

        let response = self
            .client
            .post(&url)
            .header(AUTH_HEADER, &self.api_token)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(YpareoError::Upstream { status: status.as_u16(), detail });
        }

        Ok(())
    }
}

/// Bounded-attempt loop around one import call. Retryable failures sleep
/// `delay` between attempts; the rest surface immediately.
async fn retry<T, F, Fut>(max_attempts: u32, delay: Duration, mut attempt_fn: F) -> Result<T, YpareoError>
where
    F: FnMut(u32) -> Fut,
    Fut: std::future::Future<Output = Result<T, YpareoError>>,
{
    let mut last_error = None;

    for attempt in 1..=max_attempts {
        match attempt_fn(attempt).await {
            Ok(value) => return Ok(value),
            Err(error) => {
                let retryable = error.is_retryable();
                tracing::warn!(attempt, max = max_attempts, %error, "bulletin import attempt failed");
                if !retryable {
                    return Err(error);
                }
                last_error = Some(error);
            }
        }

        if attempt < max_attempts {
            tokio::time::sleep(delay).await;
        }
    }

    Err(last_error.unwrap_or(YpareoError::Upstream {
        status: 500,
        detail: "import never attempted".to_string(),
    }))
}
