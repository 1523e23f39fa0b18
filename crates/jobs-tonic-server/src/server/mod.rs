//! Server-side components of the jobs service.
//!
//! - [`config`] - CLI/env configuration.
//! - [`store`] - the in-memory, lock-guarded job store.
//! - [`service`] - the `Jobs` gRPC implementation.
//! - [`streaming`] - the producer behind `ListJobs` streams.
//! - [`telemetry`] - logging, tracing and metrics setup.
//!
//! These are wired together by [`crate::serve_with_incoming`] and the
//! `jobs-tonic-server` binary.

pub mod config;
pub mod service;
pub mod store;
pub mod streaming;
pub mod telemetry;
