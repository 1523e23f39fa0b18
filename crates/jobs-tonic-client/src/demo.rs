//! The demonstration sequence.
//!
//! [`run_demo`] walks one job through its whole lifecycle and returns what it
//! saw. The first unexpected outcome aborts the run with a [`DemoError`];
//! nothing is retried.

use crate::config::ClientConfig;
use core::time::Duration;
use jobs_tonic_core::{
    proto::{
        CreateJobRequest, DeleteJobRequest, GetJobRequest, Job, ListJobsRequest,
        jobs_client::JobsClient,
    },
    types::NewJob,
};
use tokio_stream::StreamExt;
use tonic::{
    Code, Status,
    codec::CompressionEncoding,
    transport::{Channel, Endpoint},
};

#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    #[error("invalid server url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: tonic::transport::Error,
    },

    #[error("failed to connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: tonic::transport::Error,
    },

    #[error("{call} failed: {status}")]
    Rpc {
        call: &'static str,
        #[source]
        status: Status,
    },

    #[error("{call}: {detail}")]
    Unexpected { call: &'static str, detail: String },

    #[error("demo did not finish within {0:?}")]
    DeadlineExceeded(Duration),
}

impl DemoError {
    fn rpc(call: &'static str) -> impl FnOnce(Status) -> Self {
        move |status| Self::Rpc { call, status }
    }

    /// The gRPC code behind this error, if the server produced one.
    pub fn code(&self) -> Option<Code> {
        match self {
            Self::Rpc { status, .. } => Some(status.code()),
            _ => None,
        }
    }
}

/// Everything observed during one demo run.
#[derive(Debug, Clone, PartialEq)]
pub struct DemoReport {
    pub created: Job,
    pub fetched: Job,
    pub listed: Vec<Job>,
}

/// Opens a plaintext channel to `url`.
pub async fn connect(url: &str, timeout: Duration) -> Result<JobsClient<Channel>, DemoError> {
    let endpoint = Endpoint::from_shared(url.to_string())
        .map_err(|source| DemoError::InvalidUrl {
            url: url.to_string(),
            source,
        })?
        .connect_timeout(timeout);

    let channel = endpoint
        .connect()
        .await
        .map_err(|source| DemoError::Connect {
            url: url.to_string(),
            source,
        })?;
    tracing::info!("Connected to gRPC server at {}", url);

    Ok(JobsClient::new(channel)
        .send_compressed(CompressionEncoding::Zstd)
        .accept_compressed(CompressionEncoding::Zstd))
}

/// Connects and runs [`run_demo`] under the configured overall deadline.
pub async fn run(config: &ClientConfig) -> Result<DemoReport, DemoError> {
    let work = async {
        let mut client = connect(&config.server_url, config.timeout).await?;
        run_demo(&mut client, config.job.clone(), config.list_limit).await
    };

    tokio::time::timeout(config.timeout, work)
        .await
        .map_err(|_| DemoError::DeadlineExceeded(config.timeout))?
}

/// Create, get, list, delete, then confirm the job is gone.
pub async fn run_demo(
    client: &mut JobsClient<Channel>,
    job: NewJob,
    list_limit: i32,
) -> Result<DemoReport, DemoError> {
    let created = client
        .create_job(CreateJobRequest::from(job))
        .await
        .map_err(DemoError::rpc("CreateJob"))?
        .into_inner();
    tracing::info!("Created: {:?}", created);

    let fetched = client
        .get_job(GetJobRequest {
            id: created.id.clone(),
        })
        .await
        .map_err(DemoError::rpc("GetJob"))?
        .into_inner();
    tracing::info!("GetJob: {:?}", fetched);

    if fetched != created {
        return Err(DemoError::Unexpected {
            call: "GetJob",
            detail: format!("returned {fetched:?}, expected {created:?}"),
        });
    }

    let mut stream = client
        .list_jobs(ListJobsRequest { limit: list_limit })
        .await
        .map_err(DemoError::rpc("ListJobs"))?
        .into_inner();

    tracing::info!("ListJobs stream:");
    let mut listed = Vec::new();
    while let Some(item) = stream.next().await {
        let job = item.map_err(DemoError::rpc("ListJobs"))?;
        tracing::info!("  {:?}", job);
        listed.push(job);
    }

    client
        .delete_job(DeleteJobRequest {
            id: created.id.clone(),
        })
        .await
        .map_err(DemoError::rpc("DeleteJob"))?;
    tracing::info!("Deleted job {}", created.id);

    match client
        .get_job(GetJobRequest {
            id: created.id.clone(),
        })
        .await
    {
        Err(status) if status.code() == Code::NotFound => {
            tracing::info!("GetJob after delete: not found, as expected");
        }
        Err(status) => return Err(DemoError::rpc("GetJob")(status)),
        Ok(resp) => {
            return Err(DemoError::Unexpected {
                call: "GetJob",
                detail: format!("deleted job still present: {:?}", resp.into_inner()),
            });
        }
    }

    Ok(DemoReport {
        created,
        fetched,
        listed,
    })
}
