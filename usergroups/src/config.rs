//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `USERGROUPS_CONFIG`
//! environment variable. A missing file is not an error; every field has a default.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `USERGROUPS_` override YAML values
//! 3. **DATABASE_URL** - Special case: overrides `database_url` if set
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `USERGROUPS_PASSWORD__MIN_LENGTH=8` sets the `password.min_length` field.
//!
//! ## Example
//!
//! ```yaml
//! database_url: sqlite://usergroups.db
//! password:
//!   min_length: 6
//! seed:
//!   groups: [Admin, Guest]
//!   users:
//!     - email: admin@example.com
//!       password: admin123
//!       group: Admin
//!       is_superuser: true
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};

use crate::errors::Error;
use crate::seed::SeedCatalog;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "USERGROUPS_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without touching the database.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// SQLite connection string, e.g. `sqlite://usergroups.db` or `sqlite::memory:`
    pub database_url: String,
    /// Create the database file if it does not exist yet
    pub create_if_missing: bool,
    /// Maximum number of pooled connections
    pub max_connections: u32,
    /// Enable OpenTelemetry OTLP export for distributed tracing
    pub enable_otel_export: bool,
    /// Credential validation and hashing parameters
    pub password: PasswordConfig,
    /// Groups and users ensured by the sample-data seeder
    pub seed: SeedCatalog,
}

/// Password validation rules.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PasswordConfig {
    /// Minimum password length
    pub min_length: usize,
    /// Maximum password length
    pub max_length: usize,
    /// Argon2 memory cost in KiB (default: 19456 KiB = 19 MB, secure for production)
    pub argon2_memory_kib: u32,
    /// Argon2 iterations (default: 2, secure for production)
    pub argon2_iterations: u32,
    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            min_length: 6,
            max_length: 64,
            argon2_memory_kib: 19456,
            argon2_iterations: 2,
            argon2_parallelism: 1,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://usergroups.db".to_string(),
            create_if_missing: true,
            max_connections: 5,
            enable_otel_export: false,
            password: PasswordConfig::default(),
            seed: SeedCatalog::default(),
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        if !self.database_url.starts_with("sqlite:") {
            return Err(Error::Internal {
                operation: format!(
                    "Config validation: database_url must be a sqlite URL (got '{}')",
                    self.database_url
                ),
            });
        }

        if self.max_connections == 0 {
            return Err(Error::Internal {
                operation: "Config validation: max_connections must be at least 1".to_string(),
            });
        }

        if self.password.min_length < 1 {
            return Err(Error::Internal {
                operation: "Config validation: Invalid password configuration: min_length must be at least 1".to_string(),
            });
        }

        if self.password.min_length > self.password.max_length {
            return Err(Error::Internal {
                operation: format!(
                    "Config validation: Invalid password configuration: min_length ({}) cannot be greater than max_length ({})",
                    self.password.min_length, self.password.max_length
                ),
            });
        }

        self.seed.validate().map_err(|e| Error::Internal {
            operation: format!("Config validation: {e}"),
        })?;

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables can still override specific values; USERGROUPS_CONFIG names the file
            .merge(Env::prefixed("USERGROUPS_").ignore(&["CONFIG"]).split("__"))
            // Common DATABASE_URL pattern
            .merge(Env::raw().only(&["DATABASE_URL"]))
    }
}
