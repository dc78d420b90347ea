//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/pgsetup/pgsetup.toml`
//! 3. Local config: `<root>/.pgsetup.toml` (scan root)
//! 4. Environment variables: `PGSETUP_*` prefix (`__` for nesting)

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;

/// Administrative account of the postgres container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AdminConfig {
    pub user: String,
    pub password: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            user: "postgres".into(),
            password: "password".into(),
        }
    }
}

/// Unified configuration for pgsetup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Service config file name inside each service directory
    pub config_file: String,
    /// Secrets file name inside each service directory
    pub secrets_file: String,
    /// Key holding the database password in the secrets file
    pub password_key: String,
    /// Output directory, relative to the scan root unless absolute
    pub output_dir: PathBuf,
    /// Generated SQL script name
    pub sql_file: String,
    /// Generated env file name
    pub env_file: String,
    /// Postgres admin account written to the env file header
    pub admin: AdminConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_file: "config.yaml".into(),
            secrets_file: ".env".into(),
            password_key: "DB_PASSWORD".into(),
            output_dir: PathBuf::from("postgres"),
            sql_file: "init.sql".into(),
            env_file: ".env".into(),
            admin: AdminConfig::default(),
        }
    }
}

/// Get the XDG config directory for pgsetup.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "pgsetup").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("pgsetup.toml"))
}

/// Get the path to the local config file in a scan root.
pub fn local_config_path(root: &Path) -> PathBuf {
    root.join(".pgsetup.toml")
}

impl Settings {
    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `root` - Scan root holding the optional local config
    pub fn load(root: &Path) -> Result<Self, ApplicationError> {
        let defaults = Settings::default();
        let mut builder = Config::builder()
            .set_default("config_file", defaults.config_file)
            .map_err(config_err)?
            .set_default("secrets_file", defaults.secrets_file)
            .map_err(config_err)?
            .set_default("password_key", defaults.password_key)
            .map_err(config_err)?
            .set_default(
                "output_dir",
                defaults.output_dir.to_string_lossy().to_string(),
            )
            .map_err(config_err)?
            .set_default("sql_file", defaults.sql_file)
            .map_err(config_err)?
            .set_default("env_file", defaults.env_file)
            .map_err(config_err)?
            .set_default("admin.user", defaults.admin.user)
            .map_err(config_err)?
            .set_default("admin.password", defaults.admin.password)
            .map_err(config_err)?;

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                builder = builder.add_source(File::from(global_path).format(FileFormat::Toml));
            }
        }

        let local_path = local_config_path(root);
        if local_path.exists() {
            builder = builder.add_source(File::from(local_path).format(FileFormat::Toml));
        }

        builder = builder.add_source(
            Environment::with_prefix("PGSETUP")
                .prefix_separator("_")
                .separator("__"),
        );

        let config = builder.build().map_err(config_err)?;
        let mut settings: Self = config.try_deserialize().map_err(config_err)?;

        // Expand ~ and $VAR in path-like fields
        settings.expand_paths();

        Ok(settings)
    }

    /// Expand shell variables and tilde in `output_dir`.
    fn expand_paths(&mut self) {
        let raw = self.output_dir.to_string_lossy().to_string();
        let expanded = shellexpand::full(&raw)
            .map(|s| s.into_owned())
            .unwrap_or(raw);
        self.output_dir = PathBuf::from(expanded);
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# pgsetup configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/pgsetup/pgsetup.toml
#   Local:  <root>/.pgsetup.toml
#   Env:    PGSETUP_* environment variables (PGSETUP_ADMIN__USER for [admin] user)

# Service config file looked up in every subdirectory
# config_file = "config.yaml"

# Secrets file and key holding each service's database password
# secrets_file = ".env"
# password_key = "DB_PASSWORD"

# Output location, relative to the scanned root unless absolute
# output_dir = "postgres"
# sql_file = "init.sql"
# env_file = ".env"

[admin]
# Root account of the postgres container
# user = "postgres"
# password = "password"
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
