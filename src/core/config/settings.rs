use std::path::PathBuf;

use super::parsing::{
    env_optional, env_or_default, is_valid_date_range_bound, parse_bool, parse_cors_origins,
    parse_environment, parse_u32, parse_u64,
};
use super::types::{
    ApiSettings, BulletinSettings, ConfigError, CorsSettings, PathsSettings, RuntimeSettings,
    ServerHost, ServerPort, ServerSettings, Settings, TelemetrySettings, YpareoSettings,
};

impl Settings {
    pub(crate) fn load() -> Result<Self, ConfigError> {
        let host = env_or_default("BULLETIN_HOST", "0.0.0.0");
        let port = env_or_default("BULLETIN_PORT", "8000");

        let environment =
            parse_environment(env_optional("BULLETIN_ENV").or_else(|| env_optional("ENVIRONMENT")));
        let strict_config =
            env_optional("BULLETIN_STRICT_CONFIG").map(|value| parse_bool(&value)).unwrap_or(false)
                || environment.is_production();

        let project_name = env_or_default("PROJECT_NAME", "Upload de Bulletins");
        let version = env_or_default("VERSION", env!("CARGO_PKG_VERSION"));

        let cors_origins = parse_cors_origins(env_optional("BACKEND_CORS_ORIGINS"))?;

        let ypareo_base_url =
            env_or_default("YPAERO_BASE_URL", "").trim_end_matches('/').to_string();
        let ypareo_api_token = env_or_default("YPAERO_API_TOKEN", "");
        let ypareo_timeout_seconds =
            parse_u64("YPAREO_TIMEOUT_SECONDS", env_or_default("YPAREO_TIMEOUT_SECONDS", "60"))?;
        let period_codes = env_or_default("YPAREO_PERIOD_CODES", "2");
        let absence_from = env_or_default("YPAREO_ABSENCE_FROM", "01-01-2023");
        let absence_to = env_or_default("YPAREO_ABSENCE_TO", "31-12-2024");
        let repertoire_code = env_or_default("YPAREO_REPERTOIRE_CODE", "1000011");
        let import_max_retries =
            parse_u32("YPAREO_IMPORT_MAX_RETRIES", env_or_default("YPAREO_IMPORT_MAX_RETRIES", "3"))?;
        let import_retry_delay_seconds = parse_u64(
            "YPAREO_IMPORT_RETRY_DELAY_SECONDS",
            env_or_default("YPAREO_IMPORT_RETRY_DELAY_SECONDS", "5"),
        )?;

        let base_dir = env_or_default("BULLETIN_BASE_DIR", ".");
        let base = PathBuf::from(base_dir);
        let upload_dir =
            env_optional("UPLOAD_DIR").map(PathBuf::from).unwrap_or_else(|| base.join("uploads"));
        let output_dir =
            env_optional("OUTPUT_DIR").map(PathBuf::from).unwrap_or_else(|| base.join("outputs"));
        let download_dir = env_optional("DOWNLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| base.join("downloads"));
        let template_dir = env_optional("TEMPLATE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| base.join("template"));
        let ects_json_path = env_optional("ECTS_JSON_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| base.join("json").join("ects.json"));

        let converter_bin = env_or_default("BULLETIN_CONVERTER_BIN", "soffice");
        let max_upload_size_mb =
            parse_u64("MAX_UPLOAD_SIZE_MB", env_or_default("MAX_UPLOAD_SIZE_MB", "10"))?;

        let log_level = env_or_default("BULLETIN_LOG_LEVEL", "info");
        let json = env_optional("BULLETIN_LOG_JSON").map(|value| parse_bool(&value)).unwrap_or(false);
        let prometheus_enabled =
            env_optional("PROMETHEUS_ENABLED").map(|value| parse_bool(&value)).unwrap_or(false);

        let settings = Self {
            server: ServerSettings {
                host: ServerHost::parse(host)?,
                port: ServerPort::parse(port)?,
            },
            runtime: RuntimeSettings { environment, strict_config },
            api: ApiSettings { project_name, version },
            cors: CorsSettings { origins: cors_origins },
            ypareo: YpareoSettings {
                base_url: ypareo_base_url,
                api_token: ypareo_api_token,
                timeout_seconds: ypareo_timeout_seconds,
                period_codes,
                absence_from,
                absence_to,
                repertoire_code,
                import_max_retries,
                import_retry_delay_seconds,
            },
            paths: PathsSettings {
                upload_dir,
                output_dir,
                download_dir,
                template_dir,
                ects_json_path,
            },
            bulletin: BulletinSettings { converter_bin, max_upload_size_mb },
            telemetry: TelemetrySettings { log_level, json, prometheus_enabled },
        };

        settings.validate()?;
        Ok(settings)
    }

    pub(crate) fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host.0, self.server.port.0)
    }

    pub(crate) fn server_host(&self) -> &str {
        &self.server.host.0
    }

    pub(crate) fn server_port(&self) -> u16 {
        self.server.port.0
    }

    pub(crate) fn api(&self) -> &ApiSettings {
        &self.api
    }

    pub(crate) fn cors(&self) -> &CorsSettings {
        &self.cors
    }

    pub(crate) fn ypareo(&self) -> &YpareoSettings {
        &self.ypareo
    }

    pub(crate) fn paths(&self) -> &PathsSettings {
        &self.paths
    }

    pub(crate) fn bulletin(&self) -> &BulletinSettings {
        &self.bulletin
    }

    pub(crate) fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    pub(crate) fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_date_range_bound(&self.ypareo.absence_from) {
            return Err(ConfigError::InvalidValue {
                field: "YPAREO_ABSENCE_FROM",
                value: self.ypareo.absence_from.clone(),
            });
        }
        if !is_valid_date_range_bound(&self.ypareo.absence_to) {
            return Err(ConfigError::InvalidValue {
                field: "YPAREO_ABSENCE_TO",
                value: self.ypareo.absence_to.clone(),
            });
        }

        if self.ypareo.import_max_retries == 0 {
            return Err(ConfigError::InvalidValue {
                field: "YPAREO_IMPORT_MAX_RETRIES",
                value: "0".to_string(),
            });
        }

        if self.bulletin.max_upload_size_mb == 0 {
            return Err(ConfigError::InvalidValue {
                field: "MAX_UPLOAD_SIZE_MB",
                value: "0".to_string(),
            });
        }

        if !(self.runtime.strict_config || self.runtime.environment.is_production()) {
            return Ok(());
        }

        if self.ypareo.base_url.is_empty() {
            return Err(ConfigError::MissingSecret("YPAERO_BASE_URL"));
        }
        if self.ypareo.api_token.is_empty() {
            return Err(ConfigError::MissingSecret("YPAERO_API_TOKEN"));
        }

        if !self.paths.template_dir.is_dir() {
            return Err(ConfigError::InvalidValue {
                field: "TEMPLATE_DIR",
                value: self.paths.template_dir.display().to_string(),
            });
        }
        if !self.paths.ects_json_path.is_file() {
            return Err(ConfigError::InvalidValue {
                field: "ECTS_JSON_PATH",
                value: self.paths.ects_json_path.display().to_string(),
            });
        }

        Ok(())
    }
}
