// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Environment-driven configuration for the event log path.

use std::path::{Path, PathBuf};

/// Environment variable consulted before the CLI default.
pub const LOG_PATH_ENV: &str = "TRADELOG_PATH";

/// Default log path, relative to the working directory, when neither the
/// environment variable nor a CLI argument supplies one.
pub const DEFAULT_LOG_PATH: &str = "../data/event_log.bin";

/// Resolved location of the event log file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogPathConfig {
    pub path: PathBuf,
}

impl LogPathConfig {
    /// Resolve the log path: explicit argument, then `TRADELOG_PATH`, then
    /// the documented default. Creates the parent directory if absent.
    pub fn resolve(cli_arg: Option<&str>) -> std::io::Result<Self> {
        let path = cli_arg
            .map(PathBuf::from)
            .or_else(|| std::env::var_os(LOG_PATH_ENV).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_PATH));

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        Ok(Self { path })
    }

    pub fn as_path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_uses_cli_arg_over_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sub").join("log.bin");
        let cfg = LogPathConfig::resolve(Some(path.to_str().unwrap())).expect("resolve");
        assert_eq!(cfg.as_path(), path);
        assert!(path.parent().unwrap().is_dir());
    }

    #[test]
    fn resolve_falls_back_to_default_path() {
        std::env::remove_var(LOG_PATH_ENV);
        let cfg = LogPathConfig::resolve(None).expect("resolve");
        assert_eq!(cfg.as_path(), Path::new(DEFAULT_LOG_PATH));
    }
}
