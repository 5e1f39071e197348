use std::path::Path;

use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum SnapverifyError {
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No fixture files matching '{pattern}' found in '{dir}'")]
    NoFixtures { dir: String, pattern: String },

    #[error("Invalid fixture glob pattern '{pattern}': {message}")]
    InvalidFixturePattern { pattern: String, message: String },

    #[error("Invalid group filter pattern '{pattern}': {message}")]
    InvalidFilterPattern { pattern: String, message: String },

    #[error("Failed to parse config file '{path}': {message}")]
    InvalidConfig { path: String, message: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Compiler under test is not configured")]
    CompilerMissing,

    #[error("Failed to launch compiler '{program}': {source}")]
    CompilerSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Compiler '{program}' failed: {message}")]
    CompilerFailed { program: String, message: String },

    #[error("Failed to serialize response JSON: {source}")]
    ResponseSerialization {
        #[source]
        source: serde_json::Error,
    },
}

impl SnapverifyError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }

    pub fn to_error_response(&self) -> ErrorResponse {
        let (kind, suggestion) = match self {
            Self::Io { .. } => ("io_error", None),
            Self::NoFixtures { .. } => (
                "no_fixtures",
                Some("Pass the fixture directory as DIR or set fixture_dir in snapverify.toml"),
            ),
            Self::InvalidFixturePattern { .. } | Self::InvalidFilterPattern { .. } => (
                "invalid_pattern",
                Some("Use a valid glob pattern such as '*.test.ts'"),
            ),
            Self::InvalidConfig { .. } => ("invalid_config", None),
            Self::InvalidRequest { .. } => ("invalid_request", None),
            Self::CompilerMissing => (
                "compiler_missing",
                Some("Pass --compiler PROGRAM or set [compiler] program in snapverify.toml"),
            ),
            Self::CompilerSpawn { .. } | Self::CompilerFailed { .. } => ("compiler_failed", None),
            Self::ResponseSerialization { .. } => ("serialization_error", None),
        };

        ErrorResponse {
            error: ErrorBody {
                r#type: kind.to_string(),
                message: self.to_string(),
                suggestion: suggestion.map(ToString::to_string),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub r#type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}
