use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_RESULTS_FILE: &str = "results.out";
pub const DEFAULT_TIMEOUT_SECS: u64 = 3600;

/// Runtime settings, read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// OpenSees interpreter command
    pub opensees_path: String,
    /// Report file the PASS/FAIL record is appended to
    pub results_file: PathBuf,
    pub timeout: Duration,
    /// Copies of the deck and raw results are exported here when set
    pub debug_export: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            opensees_path: "OpenSees".to_string(),
            results_file: PathBuf::from(DEFAULT_RESULTS_FILE),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            debug_export: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests don't touch the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let opensees_path = resolve_opensees_path(lookup("OPENSEES_PATH"));

        let results_file = lookup("OPENSEES_RESULTS_FILE")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_RESULTS_FILE));

        let timeout_secs = match lookup("OPENSEES_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    tracing::warn!(
                        "Ignoring OPENSEES_TIMEOUT_SECS={:?}, using {}s",
                        raw,
                        DEFAULT_TIMEOUT_SECS
                    );
                    DEFAULT_TIMEOUT_SECS
                }
            },
            None => DEFAULT_TIMEOUT_SECS,
        };

        let debug_export = lookup("OPENSEES_DEBUG_EXPORT")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Self {
            opensees_path,
            results_file,
            timeout: Duration::from_secs(timeout_secs),
            debug_export,
        }
    }
}

/// Explicit path first, then a repo-local binary, then whatever is on `PATH`.
///
/// The engine runs inside a scratch directory, so a relative path is
/// canonicalized when it points at an existing file.
pub fn resolve_opensees_path(explicit: Option<String>) -> String {
    let path = explicit
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| {
            if Path::new("./bin/OpenSees").exists() {
                "./bin/OpenSees".to_string()
            } else {
                "OpenSees".to_string()
            }
        });

    std::fs::canonicalize(&path)
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or(path)
}
