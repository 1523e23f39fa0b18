/// Builds the gRPC client and server code for `proto/jobs.proto` using
/// `tonic-prost-build`.
///
/// Alongside the service bindings, an encoded `FileDescriptorSet` is written
/// to `OUT_DIR/jobs_descriptor.bin` so the server can expose it through gRPC
/// reflection.
///
/// # Panics
///
/// Panics if code generation fails (missing `protoc`, malformed proto).
///
/// # Output
///
/// ```rust,ignore
/// pub mod proto {
///     tonic::include_proto!("jobs");
/// }
/// ```
use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=proto/jobs.proto");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let descriptor_path = out_dir.join("jobs_descriptor.bin");

    let mut config = tonic_prost_build::Config::new();
    config.file_descriptor_set_path(&descriptor_path);

    tonic_prost_build::configure()
        .compile_with_config(config, &["proto/jobs.proto"], &["proto"])
        .unwrap();
}
