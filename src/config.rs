use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub security: SecurityConfig,

    pub cart: CartConfig,

    pub pluralization: PluralizationConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Directory recipe images are written to and served from.
    pub images_path: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/ladle.db".to_string(),
            log_level: "info".to_string(),
            images_path: "images".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub cors_allowed_origins: Vec<String>,

    /// Session idle expiry in minutes.
    pub session_minutes: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8090,
            cors_allowed_origins: vec![
                "http://localhost:8090".to_string(),
                "http://127.0.0.1:8090".to_string(),
            ],
            session_minutes: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
        }
    }
}

/// Shopping-list download behavior. The two upstream deployments disagreed on
/// what an empty cart should produce, so both behaviors stay available.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CartConfig {
    /// "reject": an empty cart is a 400-level error.
    /// "empty": an empty cart downloads as an empty document.
    pub on_empty: EmptyCartPolicy,

    /// "plain": `name(unit) - amount` text lines.
    /// "phrased": an HTML document with pluralized `amount unit` phrasing.
    pub format: ListFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmptyCartPolicy {
    #[default]
    Reject,
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ListFormat {
    #[default]
    Plain,
    Phrased,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            on_empty: EmptyCartPolicy::Reject,
            format: ListFormat::Plain,
        }
    }
}

/// Numeric thresholds selecting between a unit's singular and plural forms.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PluralizationConfig {
    /// Amounts up to and including this use the singular form.
    pub singular_max: i64,

    /// Amounts at or above this use the second plural form; amounts in
    /// between use the first.
    pub second_form_min: i64,

    /// Units printed bare, with no count at all ("to taste").
    pub invariant_units: Vec<String>,
}

impl Default for PluralizationConfig {
    fn default() -> Self {
        Self {
            singular_max: 1,
            second_form_min: 5,
            invariant_units: vec!["по вкусу".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("ladle").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".ladle").join("config.toml"));
        }

        paths
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = PathBuf::from("config.toml");
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.general.database_path.is_empty() {
            anyhow::bail!("Database path cannot be empty");
        }

        if self.pluralization.second_form_min <= self.pluralization.singular_max {
            anyhow::bail!("Pluralization thresholds must satisfy singular_max < second_form_min");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn inverted_plural_thresholds_rejected() {
        let mut config = Config::default();
        config.pluralization.singular_max = 5;
        config.pluralization.second_form_min = 2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn cart_policy_parses_from_toml() {
        let config: Config = toml::from_str(
            r#"
            [cart]
            on_empty = "empty"
            format = "phrased"
            "#,
        )
        .unwrap();
        assert_eq!(config.cart.on_empty, EmptyCartPolicy::Empty);
        assert_eq!(config.cart.format, ListFormat::Phrased);
    }
}
