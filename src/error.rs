use crate::daemon::DaemonKind;
use thiserror::Error;

// Failures of the single request/response exchange with the provider.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error), // Transport failed before a response arrived.

    #[error("Provider error ({status}): {message}")]
    Provider { status: u16, message: String }, // Provider answered with a non-success status.

    #[error("Malformed response: {0}")]
    MalformedResponse(String), // Body did not match the declared candidates shape.
}

// Failures while turning raw completion text into a daemon result.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("No JSON object found in response")]
    NoJsonFound,

    #[error("Could not locate {0} in response")]
    ExtractionAmbiguous(&'static str),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config format error: {0}")]
    Format(#[from] serde_json::Error),

    #[error("HTTP client could not be built: {0}")]
    Client(reqwest::Error),
}

// Everything a daemon run can end with, caught at the controller boundary.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("Completion error: {0}")]
    Completion(#[from] CompletionError),

    #[error("Normalize error: {0}")]
    Normalize(#[from] NormalizeError),

    #[error("{0} is already running")]
    Busy(DaemonKind),

    #[error("Run was cancelled")]
    Cancelled,

    #[error("Missing tuning parameter: {0}")]
    MissingParameter(&'static str),

    #[error("No matching panel is open")]
    NoPanel,
}

impl DaemonError {
    /// Name of the failure class this error belongs to.
    pub fn category(&self) -> &'static str {
        match self {
            DaemonError::Completion(CompletionError::Network(_))
            | DaemonError::Completion(CompletionError::Provider { .. }) => "NetworkError",
            DaemonError::Completion(CompletionError::MalformedResponse(_)) => {
                "MalformedResponseError"
            }
            DaemonError::Normalize(NormalizeError::NoJsonFound) => "NoJsonFoundError",
            DaemonError::Normalize(NormalizeError::ExtractionAmbiguous(_)) => {
                "ExtractionAmbiguousError"
            }
            DaemonError::Busy(_) => "BusyError",
            DaemonError::Cancelled => "CancelledError",
            DaemonError::MissingParameter(_) => "MissingParameterError",
            DaemonError::NoPanel => "NoPanelError",
        }
    }
}
