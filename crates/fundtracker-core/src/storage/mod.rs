mod config;
pub mod database;
pub mod store;

pub use config::{Config, GoalConfig, NotificationsConfig, StorageConfig};
pub use database::Database;
pub use store::{decode_contributions, ContributionStore, KvContributionStore, MemoryStore};

use std::path::PathBuf;

/// Returns `~/.config/fundtracker[-dev]/` based on FUNDTRACKER_ENV.
///
/// Set FUNDTRACKER_ENV=dev to use the development data directory, or
/// FUNDTRACKER_DATA_DIR to use an explicit directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let dir = match std::env::var_os("FUNDTRACKER_DATA_DIR") {
        Some(explicit) => PathBuf::from(explicit),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("FUNDTRACKER_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("fundtracker-dev")
            } else {
                base_dir.join("fundtracker")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
