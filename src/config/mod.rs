use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

/// Scraper configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScraperConfig {
    /// Site root; every catalog path is resolved against it.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_login_path")]
    pub login_path: String,

    #[serde(default = "default_costs_path")]
    pub costs_path: String,

    /// Unset means requests never time out.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Export configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExportConfig {
    #[serde(default = "default_export_path")]
    pub path: PathBuf,

    /// Write each record as soon as it is scraped instead of at the end.
    #[serde(default)]
    pub stream: bool,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_base_url() -> String {
    "https://www.arval-carconfigurator.com/".to_string()
}
fn default_login_path() -> String {
    "login/login.do.jsp".to_string()
}
fn default_costs_path() -> String {
    "inc/quotationVehicleBox.jsp".to_string()
}
fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}
fn default_export_path() -> PathBuf {
    PathBuf::from("cars.csv")
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from file + environment overrides
    pub fn load() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(config::Environment::with_prefix("CARCONF").separator("__"))
            .build()?;

        let app_cfg: AppConfig = cfg.try_deserialize().unwrap_or_else(|_| AppConfig::default());
        Ok(app_cfg)
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            login_path: default_login_path(),
            costs_path: default_costs_path(),
            timeout_secs: None,
            user_agent: default_user_agent(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            path: default_export_path(),
            stream: false,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scraper: ScraperConfig::default(),
            export: ExportConfig::default(),
        }
    }
}
