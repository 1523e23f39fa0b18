#![doc = include_str!("../README.md")]

pub mod server;

use core::future::Future;
use futures::Stream;
use jobs_tonic_core::proto::{FILE_DESCRIPTOR_SET, jobs_server::JobsServer};
use server::service::handler::JobService;
use tokio::io::{AsyncRead, AsyncWrite};
use tonic::transport::server::Connected;
use tonic::{codec::CompressionEncoding, transport::Server};
use tonic_reflection::server::Builder;
use tonic_web::GrpcWebLayer;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

/// Removes a socket file left at `path` by an earlier run so it can be
/// bound again.
///
/// A missing path is fine. Anything at `path` that is not a socket is left
/// alone and reported as [`std::io::ErrorKind::AlreadyExists`].
#[cfg(unix)]
pub fn remove_stale_socket(path: impl AsRef<std::path::Path>) -> std::io::Result<()> {
    use std::os::unix::fs::FileTypeExt;

    let path = path.as_ref();
    match std::fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_socket() => {
            tracing::warn!("Removing stale socket at {}", path.display());
            std::fs::remove_file(path)
        }
        Ok(_) => Err(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!("{} exists and is not a socket", path.display()),
        )),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Wraps `service` in the generated server with every supported compression
/// encoding offered and accepted.
pub fn build_jobs_service(service: JobService) -> JobsServer<JobService> {
    JobsServer::new(service)
        .send_compressed(CompressionEncoding::Zstd)
        .send_compressed(CompressionEncoding::Gzip)
        .send_compressed(CompressionEncoding::Deflate)
        .accept_compressed(CompressionEncoding::Zstd)
        .accept_compressed(CompressionEncoding::Gzip)
        .accept_compressed(CompressionEncoding::Deflate)
}

/// Serves the jobs service, health and reflection on `incoming` until
/// `signal` resolves.
///
/// When `signal` fires, health flips to `NOT_SERVING`, the service stops
/// accepting calls and ends open `ListJobs` streams, then the transport
/// drains.
pub async fn serve_with_incoming<I, IO, IE, F>(
    incoming: I,
    service: JobService,
    signal: F,
) -> anyhow::Result<()>
where
    I: Stream<Item = Result<IO, IE>>,
    IO: AsyncRead + AsyncWrite + Connected + Unpin + Send + 'static,
    IE: Into<tower::BoxError>,
    F: Future<Output = ()>,
{
    let (health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_serving::<JobsServer<JobService>>()
        .await;

    let reflection = Builder::configure()
        .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
        .build_v1()?;

    let shutdown = {
        let service = service.clone();
        async move {
            signal.await;
            tracing::info!("Shutdown signal received, terminating gracefully...");
            health_reporter
                .set_not_serving::<JobsServer<JobService>>()
                .await;
            service.shutdown();
        }
    };

    Server::builder()
        .accept_http1(true)
        .http2_adaptive_window(Some(true))
        .layer(
            ServiceBuilder::new()
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                )
                .layer(GrpcWebLayer::new()),
        )
        .add_service(health_service)
        .add_service(reflection)
        .add_service(build_jobs_service(service))
        .serve_with_incoming_shutdown(incoming, shutdown)
        .await?;

    tracing::info!("Service shut down successfully");
    Ok(())
}
