//! gRPC service implementation for the job store.
//!
//! [`JobService`] implements the generated [`Jobs`] trait. Each handler
//! validates its request, calls into the shared [`JobStore`], and converts
//! the outcome into a gRPC response or [`Status`] via
//! `From<Error> for Status`.
//!
//! ## Responsibilities
//!
//! - Reject empty job names with `InvalidArgument`.
//! - Surface missing jobs as `NotFound`.
//! - Stream `ListJobs` results from a snapshot through a bounded channel.
//! - Refuse new work with `Unavailable` once shut down.

use crate::server::{
    config::ServerConfig,
    store::JobStore,
    streaming::{STATUS_SLOTS, feed_jobs},
    telemetry::{
        decrement_streams_inflight, increment_errors, increment_jobs_created,
        increment_jobs_deleted, increment_requests, increment_streams_inflight,
        record_stream_duration,
    },
};
use core::pin::Pin;
use jobs_tonic_core::{
    Error,
    proto::{
        CreateJobRequest, DeleteJobRequest, DeleteJobResponse, GetJobRequest, Job,
        ListJobsRequest, jobs_server::Jobs,
    },
    types::NewJob,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::{Stream, wrappers::ReceiverStream};
use tokio_util::sync::CancellationToken;
use tonic::{Request, Response, Status};
use tracing::Instrument;

/// gRPC front end over a shared, in-memory [`JobStore`].
///
/// Cloning is cheap: clones share the same store and shutdown token.
#[derive(Clone, Debug)]
pub struct JobService {
    config: ServerConfig,
    store: Arc<JobStore>,
    shutdown_token: CancellationToken,
}

impl JobService {
    /// Creates a service with an empty store sized by `config`.
    pub fn new(config: ServerConfig) -> Self {
        let store = JobStore::new().with_default_limit(config.default_list_limit);
        Self::with_store(config, Arc::new(store))
    }

    /// Creates a service over an existing store.
    ///
    /// A `stream_buffer_size` of zero is raised to one.
    pub fn with_store(mut config: ServerConfig, store: Arc<JobStore>) -> Self {
        config.stream_buffer_size = config.stream_buffer_size.max(1);
        Self {
            config,
            store,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// The store backing this service, shared by every clone.
    pub fn store(&self) -> &Arc<JobStore> {
        &self.store
    }

    /// Stops accepting requests and ends in-flight `ListJobs` streams.
    ///
    /// Mutations already applied stay applied.
    pub fn shutdown(&self) {
        self.shutdown_token.cancel();
        tracing::info!(jobs = self.store.len(), "Job service shut down");
    }

    /// Whether [`shutdown`](Self::shutdown) has been called on any clone.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown_token.is_cancelled()
    }

    fn ensure_running(&self, method: &'static str) -> Result<(), Status> {
        increment_requests(method);
        if self.is_shutdown() {
            increment_errors(method);
            return Err(Error::ServiceShutdown.into());
        }
        Ok(())
    }
}

/// Logs and counts a failed call before handing the status to tonic.
fn reject(method: &'static str, err: Error) -> Status {
    increment_errors(method);
    match &err {
        Error::NotFound { id } => tracing::debug!(method, %id, "job not found"),
        Error::InvalidRequest { reason } => tracing::debug!(method, %reason, "invalid request"),
        other => tracing::warn!(method, error = %other, "request failed"),
    }
    err.into()
}

#[tonic::async_trait]
impl Jobs for JobService {
    type ListJobsStream = Pin<Box<dyn Stream<Item = Result<Job, Status>> + Send>>;

    #[tracing::instrument(skip_all, fields(name = %req.get_ref().name))]
    async fn create_job(&self, req: Request<CreateJobRequest>) -> Result<Response<Job>, Status> {
        const METHOD: &str = "CreateJob";
        self.ensure_running(METHOD)?;

        let job = NewJob::from(req.into_inner());
        if job.name.is_empty() {
            return Err(reject(
                METHOD,
                Error::InvalidRequest {
                    reason: "name is required".to_string(),
                },
            ));
        }

        let created = self.store.insert(job).map_err(|e| reject(METHOD, e))?;
        increment_jobs_created();
        tracing::info!(id = %created.id, "job created");

        Ok(Response::new(created))
    }

    #[tracing::instrument(skip_all, fields(id = %req.get_ref().id))]
    async fn get_job(&self, req: Request<GetJobRequest>) -> Result<Response<Job>, Status> {
        const METHOD: &str = "GetJob";
        self.ensure_running(METHOD)?;

        let job = self
            .store
            .get(&req.get_ref().id)
            .map_err(|e| reject(METHOD, e))?;

        Ok(Response::new(job))
    }

    /// Streams up to `limit` jobs.
    ///
    /// The store is snapshotted under its read lock and the lock is released
    /// before anything is sent. A spawned producer then feeds the snapshot
    /// into a channel of `stream_buffer_size` job slots, plus one for a closing
    /// status, backing the response.
    #[tracing::instrument(skip_all, fields(limit = req.get_ref().limit))]
    async fn list_jobs(
        &self,
        req: Request<ListJobsRequest>,
    ) -> Result<Response<Self::ListJobsStream>, Status> {
        const METHOD: &str = "ListJobs";
        self.ensure_running(METHOD)?;

        let start = std::time::Instant::now();
        let snapshot = self.store.list(req.get_ref().limit);
        tracing::debug!(count = snapshot.len(), "list snapshot taken");

        let (resp_tx, resp_rx) =
            mpsc::channel::<Result<Job, Status>>(self.config.stream_buffer_size + STATUS_SLOTS);
        let shutdown = self.shutdown_token.child_token();

        increment_streams_inflight();
        let fut = async move {
            match feed_jobs(snapshot, resp_tx, shutdown).await {
                Ok(sent) => {
                    record_stream_duration(start.elapsed().as_secs_f64() * 1000.0);
                    tracing::debug!(sent, "list stream complete");
                }
                Err(e) => {
                    increment_errors(METHOD);
                    tracing::warn!("List stream aborted: {}", e);
                }
            }
            decrement_streams_inflight();
        };

        tokio::spawn(fut.instrument(tracing::info_span!("streaming")));

        Ok(Response::new(Box::pin(ReceiverStream::new(resp_rx))))
    }

    #[tracing::instrument(skip_all, fields(id = %req.get_ref().id))]
    async fn delete_job(
        &self,
        req: Request<DeleteJobRequest>,
    ) -> Result<Response<DeleteJobResponse>, Status> {
        const METHOD: &str = "DeleteJob";
        self.ensure_running(METHOD)?;

        self.store
            .delete(&req.get_ref().id)
            .map_err(|e| reject(METHOD, e))?;
        increment_jobs_deleted();
        tracing::info!("job deleted");

        Ok(Response::new(DeleteJobResponse {}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_stream::StreamExt;
    use tonic::Code;

    fn service() -> JobService {
        JobService::new(ServerConfig::default())
    }

    fn create_req(name: &str, description: &str, status: &str) -> Request<CreateJobRequest> {
        Request::new(CreateJobRequest {
            name: name.into(),
            description: description.into(),
            status: status.into(),
        })
    }

    async fn collect(svc: &JobService, limit: i32) -> Vec<Job> {
        let stream = svc
            .list_jobs(Request::new(ListJobsRequest { limit }))
            .await
            .unwrap()
            .into_inner();
        stream.map(|item| item.unwrap()).collect().await
    }

    #[tokio::test]
    async fn create_echoes_fields_with_assigned_id() {
        let svc = service();
        let job = svc
            .create_job(create_req("Engineer", "Builds things", "open"))
            .await
            .unwrap()
            .into_inner();

        assert!(!job.id.is_empty());
        assert_eq!(job.name, "Engineer");
        assert_eq!(job.description, "Builds things");
        assert_eq!(job.status, "open");
    }

    #[tokio::test]
    async fn create_allows_empty_description_and_status() {
        let svc = service();
        let job = svc
            .create_job(create_req("Minimal", "", ""))
            .await
            .unwrap()
            .into_inner();

        assert_eq!(svc.store().get(&job.id).unwrap(), job);
    }

    #[tokio::test]
    async fn empty_name_is_invalid_argument_and_store_unchanged() {
        let svc = service();
        svc.create_job(create_req("Existing", "", "")).await.unwrap();

        let status = svc
            .create_job(create_req("", "Builds things", "open"))
            .await
            .unwrap_err();

        assert_eq!(status.code(), Code::InvalidArgument);
        assert_eq!(status.message(), "name is required");
        assert_eq!(svc.store().len(), 1);
    }

    #[tokio::test]
    async fn get_returns_created_job() {
        let svc = service();
        let created = svc
            .create_job(create_req("Engineer", "Builds things", "open"))
            .await
            .unwrap()
            .into_inner();

        let fetched = svc
            .get_job(Request::new(GetJobRequest {
                id: created.id.clone(),
            }))
            .await
            .unwrap()
            .into_inner();

        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn get_unknown_is_not_found() {
        let status = service()
            .get_job(Request::new(GetJobRequest { id: "nope".into() }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::NotFound);
    }

    #[tokio::test]
    async fn delete_twice_is_not_found_the_second_time() {
        let svc = service();
        let created = svc
            .create_job(create_req("Engineer", "", ""))
            .await
            .unwrap()
            .into_inner();
        let req = || Request::new(DeleteJobRequest { id: created.id.clone() });

        svc.delete_job(req()).await.unwrap();
        let status = svc.delete_job(req()).await.unwrap_err();

        assert_eq!(status.code(), Code::NotFound);
        let status = svc
            .get_job(Request::new(GetJobRequest { id: created.id.clone() }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::NotFound);
    }

    #[tokio::test]
    async fn list_streams_bounded_results() {
        let svc = service();
        for i in 0..12 {
            svc.create_job(create_req(&format!("job-{i}"), "", ""))
                .await
                .unwrap();
        }

        assert_eq!(collect(&svc, 5).await.len(), 5);
        assert_eq!(collect(&svc, 50).await.len(), 12);
        assert_eq!(collect(&svc, 0).await.len(), 12);
        assert_eq!(collect(&svc, -3).await.len(), 12);
    }

    #[tokio::test]
    async fn list_respects_configured_default_limit() {
        let config = ServerConfig {
            default_list_limit: 4,
            ..ServerConfig::default()
        };
        let svc = JobService::new(config);
        for i in 0..10 {
            svc.create_job(create_req(&format!("job-{i}"), "", ""))
                .await
                .unwrap();
        }

        assert_eq!(collect(&svc, 0).await.len(), 4);
        assert_eq!(collect(&svc, 9).await.len(), 9);
    }

    #[tokio::test]
    async fn writers_proceed_while_a_list_stream_is_unread() {
        let config = ServerConfig {
            stream_buffer_size: 1,
            ..ServerConfig::default()
        };
        let svc = JobService::new(config);
        for i in 0..5 {
            svc.create_job(create_req(&format!("job-{i}"), "", ""))
                .await
                .unwrap();
        }

        // Nobody reads this stream, so its producer is parked on a full
        // channel. Writers must still get through.
        let stream = svc
            .list_jobs(Request::new(ListJobsRequest { limit: 0 }))
            .await
            .unwrap()
            .into_inner();

        let created = tokio::time::timeout(
            std::time::Duration::from_secs(1),
            svc.create_job(create_req("late", "", "")),
        )
        .await
        .expect("create blocked behind list stream")
        .unwrap()
        .into_inner();
        svc.delete_job(Request::new(DeleteJobRequest { id: created.id }))
            .await
            .unwrap();

        let listed: Vec<Job> = stream.map(|item| item.unwrap()).collect().await;
        assert_eq!(listed.len(), 5);
    }

    #[tokio::test]
    async fn shutdown_rejects_new_requests() {
        let svc = service();
        let created = svc
            .create_job(create_req("Engineer", "", ""))
            .await
            .unwrap()
            .into_inner();

        svc.shutdown();
        assert!(svc.is_shutdown());

        let status = svc
            .create_job(create_req("After", "", ""))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::Unavailable);

        let status = svc
            .get_job(Request::new(GetJobRequest { id: created.id }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::Unavailable);

        let status = svc
            .list_jobs(Request::new(ListJobsRequest { limit: 10 }))
            .await
            .err()
            .unwrap();
        assert_eq!(status.code(), Code::Unavailable);

        // Applied mutations survive shutdown.
        assert_eq!(svc.store().len(), 1);
    }

    #[tokio::test]
    async fn shutdown_ends_open_list_stream_with_unavailable() {
        let config = ServerConfig {
            stream_buffer_size: 1,
            ..ServerConfig::default()
        };
        let svc = JobService::new(config);
        for i in 0..5 {
            svc.create_job(create_req(&format!("job-{i}"), "", ""))
                .await
                .unwrap();
        }

        let stream = svc
            .list_jobs(Request::new(ListJobsRequest { limit: 0 }))
            .await
            .unwrap()
            .into_inner();

        // Let the producer fill the buffer and park before shutting down.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        svc.shutdown();

        let items: Vec<Result<Job, Status>> = tokio::time::timeout(
            std::time::Duration::from_secs(1),
            stream.collect::<Vec<_>>(),
        )
        .await
        .expect("stream stayed open after shutdown");

        let (last, jobs) = items.split_last().unwrap();
        assert_eq!(last.as_ref().unwrap_err().code(), Code::Unavailable);
        assert!(jobs.iter().all(Result::is_ok));
        assert!(jobs.len() < 5);
    }

    #[tokio::test]
    async fn zero_stream_buffer_still_lists() {
        let config = ServerConfig {
            stream_buffer_size: 0,
            ..ServerConfig::default()
        };
        let svc = JobService::new(config);
        for i in 0..3 {
            svc.create_job(create_req(&format!("job-{i}"), "", ""))
                .await
                .unwrap();
        }

        assert_eq!(collect(&svc, 0).await.len(), 3);
    }
}
