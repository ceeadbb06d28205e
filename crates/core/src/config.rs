use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `VENDORA__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_http_port() -> u16 {
    8080
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

/// Intervals for the three periodic scans, plus how long rejected requests
/// are retained before the cleanup scan purges them.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_activation_interval_secs")]
    pub activation_interval_secs: u64,
    #[serde(default = "default_expiration_interval_secs")]
    pub expiration_interval_secs: u64,
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
    #[serde(default = "default_rejected_retention_months")]
    pub rejected_retention_months: u32,
}

fn default_activation_interval_secs() -> u64 {
    60
}
fn default_expiration_interval_secs() -> u64 {
    3_600
}
fn default_cleanup_interval_secs() -> u64 {
    604_800
}
fn default_rejected_retention_months() -> u32 {
    6
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            activation_interval_secs: default_activation_interval_secs(),
            expiration_interval_secs: default_expiration_interval_secs(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
            rejected_retention_months: default_rejected_retention_months(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("VENDORA")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
