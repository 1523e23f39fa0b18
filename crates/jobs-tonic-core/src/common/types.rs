//! # Shared Job Types and Constants
//!
//! Values both the server and client rely on: the caller-supplied part of a
//! job ([`NewJob`]) and the defaults that shape the wire contract.

use crate::proto::CreateJobRequest;

/// Number of jobs returned by `ListJobs` when the request's limit is `<= 0`.
pub const DEFAULT_LIST_LIMIT: usize = 100;

/// Address the server binds to unless told otherwise.
pub const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:50051";

/// Endpoint the client dials unless told otherwise. Plaintext only.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:50051";

/// The caller-supplied fields of a job, before an identifier is assigned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewJob {
    pub name: String,
    pub description: String,
    pub status: String,
}

impl NewJob {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            status: status.into(),
        }
    }
}

impl From<CreateJobRequest> for NewJob {
    fn from(req: CreateJobRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            status: req.status,
        }
    }
}

impl From<NewJob> for CreateJobRequest {
    fn from(job: NewJob) -> Self {
        Self {
            name: job.name,
            description: job.description,
            status: job.status,
        }
    }
}

/// Normalizes a wire-level list limit: anything `<= 0` becomes `default`.
pub fn effective_limit(requested: i32, default: usize) -> usize {
    usize::try_from(requested)
        .ok()
        .filter(|&limit| limit > 0)
        .unwrap_or(default)
}
