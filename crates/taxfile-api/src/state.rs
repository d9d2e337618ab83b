//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor. All filing data lives in the
//! [`DocumentStore`]; the filing services are cheap handles over it.

use clap::{Parser, ValueEnum};
use taxfile_filing::{FilingReader, FilingWriter, StepService};
use taxfile_store::DocumentStore;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Server configuration, from flags or environment.
#[derive(Clone, Parser)]
#[command(name = "taxfile-api", about = "Tax filing wizard and back-office API")]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Static bearer secret. If absent, authentication is disabled.
    #[arg(long, env = "AUTH_TOKEN")]
    pub auth_token: Option<String>,

    /// PostgreSQL URL. If absent, the store is in-memory only.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            auth_token: None,
            database_url: None,
            log_format: LogFormat::Text,
        }
    }
}

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub store: DocumentStore,
    pub config: AppConfig,
}

impl AppState {
    /// In-memory state with default configuration.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default(), DocumentStore::in_memory())
    }

    pub fn with_config(config: AppConfig, store: DocumentStore) -> Self {
        Self { store, config }
    }

    pub fn writer(&self) -> FilingWriter {
        FilingWriter::new(self.store.clone())
    }

    pub fn reader(&self) -> FilingReader {
        FilingReader::new(self.store.clone())
    }

    pub fn steps(&self) -> StepService {
        StepService::new(self.store.clone())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
