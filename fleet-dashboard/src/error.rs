use fleet_structs::core::ModelError;
use fleet_utils::{request_error, RequestError};
use serde::Serialize;
use thiserror::Error;

/// Why an optimization request produced no result.
///
/// Every variant is handled the same way: the loading flag clears, the stored
/// result is kept, and the user is notified.
#[derive(Debug, Error, Clone, PartialEq, Serialize)]
#[serde(tag = "category", content = "detail")]
pub enum Failure {
    /// The optimization service could not be reached.
    #[error("transport failure: {0}")]
    Transport(String),
    /// The service answered with `success: false` or an error status.
    #[error("service failure: {0}")]
    Service(String),
    /// The response parsed but does not describe a valid result.
    #[error("malformed result: {0}")]
    MalformedResult(String),
}

impl Failure {
    pub fn category(&self) -> &'static str {
        match self {
            Failure::Transport(_) => "TransportFailure",
            Failure::Service(_) => "ServiceFailure",
            Failure::MalformedResult(_) => "MalformedResult",
        }
    }

    /// Text shown to the user.
    pub fn notification(&self) -> String {
        match self {
            Failure::Transport(_) => {
                "Optimization failed. Make sure the optimization service is running and reachable."
                    .to_string()
            }
            Failure::Service(detail) => format!("Optimization failed on the service: {}", detail),
            Failure::MalformedResult(detail) => {
                format!("Optimization returned an unusable result: {}", detail)
            }
        }
    }

    /// Classifies an error from the api client.
    pub fn from_error(err: anyhow::Error) -> Self {
        match request_error(&err) {
            Some(RequestError::Status { .. }) => Failure::Service(err.to_string()),
            Some(RequestError::Transport(_)) | Some(RequestError::Body(_)) => {
                Failure::Transport(err.to_string())
            }
            None if err.downcast_ref::<serde_json::Error>().is_some() => {
                Failure::MalformedResult(format!("{:#}", err))
            }
            None => Failure::Transport(format!("{:#}", err)),
        }
    }
}

impl From<ModelError> for Failure {
    fn from(err: ModelError) -> Self {
        Failure::MalformedResult(err.to_string())
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SubmitError {
    #[error("an optimization request is already in flight")]
    Busy,
    #[error("invalid parameters: {0}")]
    InvalidParameters(ModelError),
    #[error(transparent)]
    Failed(#[from] Failure),
}
