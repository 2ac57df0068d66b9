//! CLI argument definitions for the Plandeck application.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// Plandeck — planning-history dashboard client.
#[derive(Parser, Debug)]
#[command(name = "plandeck", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Base URL of the planning backend.
    #[arg(short = 'b', long = "backend")]
    pub backend: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Restrict the bundle list to one authority.
    #[arg(long = "council")]
    pub council: Option<String>,

    /// Free-text search over the bundle list.
    #[arg(short = 's', long = "search")]
    pub search: Option<String>,

    /// Minimum number of applications a bundle needs to appear.
    #[arg(long = "min-activity")]
    pub min_activity: Option<String>,

    /// Select this bundle instead of the list's first entry.
    #[arg(long = "bundle")]
    pub bundle: Option<String>,

    /// Ask the assistant this question about the selected bundle.
    #[arg(short = 'q', long = "question")]
    pub question: Option<String>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > PLANDECK_CONFIG env var > platform default
    /// (~/.plandeck/config.toml).
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("PLANDECK_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the backend base URL.
    ///
    /// Priority: --backend flag > PLANDECK_BACKEND env var > config file value.
    /// Returns `None` if not overridden.
    pub fn resolve_backend(&self) -> Option<String> {
        if let Some(ref url) = self.backend {
            return Some(url.clone());
        }
        std::env::var("PLANDECK_BACKEND").ok()
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    /// Returns `None` if not overridden.
    pub fn resolve_log_level(&self) -> Option<String> {
        self.log_level.clone()
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".plandeck").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".plandeck").join("config.toml");
    }
    PathBuf::from("config.toml")
}
