//! Configuration loader for gradepal.
//!
//! Reads `config.toml` from the data directory (`~/.gradepal/` by default)
//! into [`AppConfig`]. Falls back to defaults when the file is missing or
//! malformed, then applies environment overrides.

use std::path::{Path, PathBuf};

use gradepal_types::config::AppConfig;

/// Overrides the data directory.
pub const DATA_DIR_ENV: &str = "GRADEPAL_DATA_DIR";

/// Overrides `[llm].model`.
pub const MODEL_ENV: &str = "GRADEPAL_MODEL";

/// `$GRADEPAL_DATA_DIR`, else `~/.gradepal`, else `./.gradepal`.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".gradepal")
}

/// Load `{data_dir}/config.toml` and apply environment overrides.
///
/// - Missing file: defaults.
/// - Unreadable or unparsable file: a warning and defaults.
pub async fn load_config(data_dir: &Path) -> AppConfig {
    let config = read_config_file(data_dir).await;
    apply_overrides(config, std::env::var(MODEL_ENV).ok())
}

async fn read_config_file(data_dir: &Path) -> AppConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return AppConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return AppConfig::default();
        }
    };

    match toml::from_str::<AppConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", config_path.display());
            AppConfig::default()
        }
    }
}

/// Apply a model override; blank values are ignored.
pub fn apply_overrides(mut config: AppConfig, model: Option<String>) -> AppConfig {
    if let Some(model) = model.filter(|m| !m.trim().is_empty()) {
        tracing::debug!(model = %model, "Model overridden from environment");
        config.llm.model = model;
    }
    config
}
