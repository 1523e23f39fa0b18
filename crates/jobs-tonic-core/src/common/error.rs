//! Error types for the jobs service.
//!
//! [`Error`] covers every outcome the service reports to callers. The
//! `From<Error> for tonic::Status` impl is the single place where those
//! outcomes are translated into gRPC status codes.

use tonic::Status;

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the jobs service.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// The request was malformed (currently only an empty job name).
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// No job is stored under the given identifier.
    #[error("Job not found: {id}")]
    NotFound { id: String },

    /// Every freshly drawn identifier collided with an existing job.
    #[error("Could not allocate a unique job id after {attempts} attempts")]
    IdExhausted { attempts: usize },

    /// Internal channel send/receive failure, e.g. the stream consumer went
    /// away mid-send.
    #[error("Channel error: {context}")]
    ChannelError { context: String },

    /// The service is in the process of shutting down.
    #[error("Service is shutting down")]
    ServiceShutdown,
}

impl From<Error> for Status {
    fn from(err: Error) -> Self {
        match err {
            Error::InvalidRequest { reason } => Status::invalid_argument(reason),
            Error::NotFound { .. } => Status::not_found("job not found"),
            Error::IdExhausted { attempts } => Status::internal(format!(
                "Could not allocate a unique job id after {attempts} attempts"
            )),
            Error::ChannelError { context } => {
                Status::internal(format!("Channel error: {}", context))
            }
            Error::ServiceShutdown => Status::unavailable("Service is shutting down"),
        }
    }
}
