//! # usergroups: users, groups and sample data
//!
//! `usergroups` is the data core of a small user/group service. Every user has an email, an
//! Argon2id-hashed credential, active/superuser/verified flags and belongs to at most one
//! group. The crate ships a one-shot binary, `create-sample-data`, that seeds a catalog of
//! groups and users and can be re-run safely.
//!
//! ## Architecture
//!
//! - The **database layer** ([`db`]) uses the repository pattern over SQLite via SQLx.
//!   [`db::handlers::Groups`] and [`db::handlers::Users`] borrow a connection, so callers choose
//!   the transaction boundaries.
//! - The **auth layer** ([`auth`]) defines [`auth::IdentityStore`], the narrow capability used to
//!   look up and register identities, and [`auth::UserManager`], which validates and hashes
//!   credentials before writing.
//! - The **seed layer** ([`seed`]) ensures groups, then users, reporting each record's outcome.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use usergroups::{Config, config::Args};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load(&Args::parse())?;
//!     usergroups::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let pool = usergroups::setup_database(&config).await?;
//!     let report = usergroups::create_sample_data(&config, &pool).await?;
//!     println!("{}", report.summary());
//!     Ok(())
//! }
//! ```
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod seed;
pub mod telemetry;
mod types;

#[cfg(test)]
mod test_utils;

use crate::auth::UserManager;
use crate::seed::SeedReport;
pub use config::Config;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::str::FromStr;
use tracing::{info, instrument};

pub use types::{GroupId, UserId};

/// Get the database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Open the connection pool and bring the schema up to date.
#[instrument(skip_all, err)]
pub async fn setup_database(config: &Config) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.database_url)?
        .create_if_missing(config.create_if_missing)
        .foreign_keys(true);

    // Each connection to `sqlite::memory:` is its own database, so keep exactly one alive.
    let pool = if config.database_url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?
    };

    migrator().run(&pool).await?;
    info!("Database ready");

    Ok(pool)
}

/// Seed the configured catalog using a single pooled connection.
///
/// Per-user failures are reported in the returned [`SeedReport`]; only catalog validation,
/// connection and group failures are errors.
#[instrument(skip_all, err)]
pub async fn create_sample_data(config: &Config, pool: &SqlitePool) -> anyhow::Result<SeedReport> {
    let mut conn = pool.acquire().await?;
    let manager = UserManager::new(config.password.clone());

    let report = seed::run(&mut conn, &manager, &config.seed).await?;
    Ok(report)
}
