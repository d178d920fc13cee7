// Author: Dustin Pilgrim
// License: MIT

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can prevent the daemon from starting at all. Anything that
/// degrades gracefully at runtime (broker hiccups, a missing media file,
/// an unknown rule term) is logged in place instead of surfacing here -
/// see the error-kind table in the module docs of `core::resolver` and
/// `subscriber` for the runtime policy.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found in any of: {}", .0.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", "))]
    NotFound(Vec<PathBuf>),

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },

    #[error("missing required section [{0}]")]
    MissingSection(&'static str),

    #[error("missing required key '{key}' in [{section}]")]
    MissingKey {
        section: &'static str,
        key: &'static str,
    },

    #[error("invalid value for '{key}' in [{section}]: {reason}")]
    InvalidValue {
        section: &'static str,
        key: &'static str,
        reason: String,
    },

    #[error("empty precedence rule for action '{action}'")]
    EmptyPrecedenceRule { action: String },
}
