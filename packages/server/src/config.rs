//! Server configuration from environment variables.

use std::path::PathBuf;

use adspecta_dataset::paths;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8000;

/// Default bind address.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1";

/// Runtime settings, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub port: u16,
    /// Candidate location CSV, re-read on every request.
    pub dataset_path: PathBuf,
    /// Persisted model bundle, loaded once.
    pub model_path: PathBuf,
}

impl ServerConfig {
    /// Reads `BIND_ADDR`, `PORT`, `ADSPECTA_DATASET` and `ADSPECTA_MODEL`,
    /// falling back to defaults for unset values.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = match lookup("PORT") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                log::warn!("Ignoring invalid PORT '{raw}', using {DEFAULT_PORT}");
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };

        Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            port,
            dataset_path: lookup("ADSPECTA_DATASET")
                .map_or_else(paths::default_dataset_path, PathBuf::from),
            model_path: lookup("ADSPECTA_MODEL")
                .map_or_else(paths::default_model_path, PathBuf::from),
        }
    }
}
