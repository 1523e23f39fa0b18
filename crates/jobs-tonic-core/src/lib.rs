#![doc = include_str!("../README.md")]

mod common;
pub use common::*;

/// Generated from `proto/jobs.proto`.
///
/// - [`jobs_server::Jobs`] - the service trait implemented by the server.
/// - [`jobs_client::JobsClient`] - the generated client.
/// - [`Job`] - the record returned by every read and create call.
pub mod proto {
    tonic::include_proto!("jobs");

    /// Encoded descriptor set for `tonic-reflection`.
    pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("jobs_descriptor");
}
