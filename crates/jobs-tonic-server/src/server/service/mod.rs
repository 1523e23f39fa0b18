//! gRPC service layer.
//!
//! - [`handler`] - the `Jobs` service entry point ([`handler::JobService`]).

pub mod handler;
