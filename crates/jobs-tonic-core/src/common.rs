//! Types and errors shared by the jobs server and client.
//!
//! - [`error`] - the service [`Error`] and its mapping to `tonic::Status`.
//! - [`types`] - [`types::NewJob`] and the defaults both sides agree on.

pub mod error;
pub mod types;

pub use error::{Error, Result};
