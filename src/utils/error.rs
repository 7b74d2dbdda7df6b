use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReaperError {
    #[error("{method} {endpoint} failed: {message}")]
    Transport {
        method: &'static str,
        endpoint: String,
        message: String,
    },

    #[error("{method} {endpoint} failed: HTTP status {status}")]
    Status {
        method: &'static str,
        endpoint: String,
        status: u16,
    },

    #[error("GET {endpoint} response body missing")]
    MissingBody { endpoint: String },

    #[error("cannot read GET {endpoint} response body: {message}")]
    UnreadableBody { endpoint: String, message: String },

    #[error("invalid GET {endpoint} response JSON: {source}")]
    MalformedPayload {
        endpoint: String,
        source: serde_json::Error,
    },

    #[error("invalid service instance creation time '{value}': {source}")]
    InvalidCreationTime {
        value: String,
        source: chrono::ParseError,
    },

    #[error("unable to delete service instance: {name} {id} ({source})")]
    DeleteFailed {
        name: String,
        id: String,
        source: Box<ReaperError>,
    },

    #[error("{step} failure: {message}")]
    Authentication { step: String, message: String },

    #[error("{stage} stage aborted: {message}")]
    StageAborted { stage: Stage, message: String },

    #[error("errors occurred whilst reaping ({error_count} recorded)")]
    ReapFailed { error_count: usize },

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required setting: {field}")]
    MissingConfigError { field: String },
}

impl ReaperError {
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigError { .. }
                | Self::InvalidConfigValueError { .. }
                | Self::MissingConfigError { .. }
        )
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::Authentication { .. } => {
                "Check the API URL and credentials, or pass --skip-ssl-validation for self-signed certificates"
            }
            Self::Transport { .. } | Self::ApiError(_) => {
                "Check network connectivity to the API endpoint"
            }
            Self::Status { .. } => "Check that the user is allowed to list and delete service instances",
            Self::MissingBody { .. } | Self::UnreadableBody { .. } | Self::MalformedPayload { .. } => {
                "The API returned an unexpected response; check that the URL points at a v2 API"
            }
            Self::ReapFailed { .. } | Self::DeleteFailed { .. } | Self::InvalidCreationTime { .. } => {
                "Inspect the errors listed in the report and re-run; completed deletions are not repeated"
            }
            Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => "Run with --help to see the expected arguments",
            Self::StageAborted { .. } | Self::IoError(_) => "Re-run with --verbose for details",
        }
    }

    pub fn exit_code(&self) -> u8 {
        if self.is_config_error() {
            2
        } else {
            1
        }
    }
}

/// Pipeline stage that recorded an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Source,
    PlanFilter,
    InstanceFilter,
    Sink,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Source => "source",
            Stage::PlanFilter => "plan-filter",
            Stage::InstanceFilter => "instance-filter",
            Stage::Sink => "sink",
        };
        f.write_str(name)
    }
}

/// An error captured by one pipeline stage and forwarded to the shared error channel.
#[derive(Error, Debug)]
#[error("{error}")]
pub struct PipelineError {
    pub stage: Stage,
    pub error: ReaperError,
}

impl PipelineError {
    pub fn new(stage: Stage, error: ReaperError) -> Self {
        Self { stage, error }
    }
}

pub type Result<T> = std::result::Result<T, ReaperError>;
