//! Log setup for the bulletin service. The filter comes from `BULLETIN_LOG`
//! when set, falling back to `RUST_LOG`, then to the configured level with
//! the chatty HTTP dependencies quieted.

use tracing_subscriber::{fmt, EnvFilter};

use crate::core::config::Settings;

const LOG_ENV: &str = "BULLETIN_LOG";

pub(crate) fn init_tracing(settings: &Settings) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&settings.telemetry().log_level)));

    let builder = fmt().with_env_filter(filter).with_target(false);

    if settings.telemetry().json {
        builder
            .json()
            .with_span_events(fmt::format::FmtSpan::CLOSE)
            .try_init()
            .map_err(|err| anyhow::anyhow!(err.to_string()))?;
    } else {
        builder
            .with_span_events(fmt::format::FmtSpan::CLOSE)
            .try_init()
            .map_err(|err| anyhow::anyhow!(err.to_string()))?;
    }

    Ok(())
}

fn default_directives(level: &str) -> String {
    format!("{level},hyper_util=warn,reqwest=warn,rustls=warn")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_directives_quiet_http_dependencies() {
        let directives = default_directives("debug");
        assert!(directives.starts_with("debug,"));
        assert!(directives.contains("reqwest=warn"));
        assert!(directives.contains("rustls=warn"));
    }
}
