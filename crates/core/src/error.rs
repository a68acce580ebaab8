use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReelError {
    #[error("Missing API key: {env_var} environment variable is not set (required by {stage})")]
    Config {
        env_var: &'static str,
        stage: &'static str,
    },

    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("{service} request failed: {reason}")]
    Service {
        service: &'static str,
        reason: String,
    },

    #[error("Could not parse {what}: {reason}")]
    Parse { what: &'static str, reason: String },

    #[error("Speech synthesis failed. Primary: {primary}. Fallback: {fallback}")]
    Synthesis {
        primary: Box<ReelError>,
        fallback: Box<ReelError>,
    },

    #[error("Composition failed: {reason}")]
    Composition { reason: String },

    #[error("{tool} failed on {path}: {reason}")]
    Media {
        tool: &'static str,
        path: PathBuf,
        reason: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Coarse classification of a [`ReelError`], stable enough to serialize into events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Config,
    InvalidInput,
    Service,
    Parse,
    Synthesis,
    Composition,
    Media,
    Io,
}

impl ReelError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReelError::Config { .. } => ErrorKind::Config,
            ReelError::InvalidInput { .. } => ErrorKind::InvalidInput,
            ReelError::Service { .. } => ErrorKind::Service,
            ReelError::Parse { .. } => ErrorKind::Parse,
            ReelError::Synthesis { .. } => ErrorKind::Synthesis,
            ReelError::Composition { .. } => ErrorKind::Composition,
            ReelError::Media { .. } => ErrorKind::Media,
            ReelError::IoError(_) => ErrorKind::Io,
        }
    }

    pub fn service(service: &'static str, err: impl std::fmt::Display) -> Self {
        ReelError::Service {
            service,
            reason: err.to_string(),
        }
    }

    pub fn parse(what: &'static str, err: impl std::fmt::Display) -> Self {
        ReelError::Parse {
            what,
            reason: err.to_string(),
        }
    }

    pub fn composition(reason: impl Into<String>) -> Self {
        ReelError::Composition {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReelError>;
