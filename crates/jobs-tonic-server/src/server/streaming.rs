//! Producer side of the `ListJobs` response stream.

use crate::server::telemetry::increment_jobs_streamed;
use jobs_tonic_core::{Error, proto::Job};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tonic::Status;

/// Channel slots kept free for the status that ends an interrupted stream.
///
/// Callers size the response channel as their job buffer plus this.
pub const STATUS_SLOTS: usize = 1;

/// Pushes a snapshot of jobs into the response channel, one job per message.
///
/// The snapshot was taken and the store lock released before this runs, so
/// a slow or stalled client only ever holds up its own stream. Each job
/// waits for buffer space in `resp_tx`, which is how backpressure reaches
/// the producer. A job is only sent once [`STATUS_SLOTS`] further slots are
/// also free, so the shutdown status always fits behind it.
///
/// # Errors
///
/// - [`Error::ChannelError`] as soon as a send fails because the receiving
///   half was dropped (client disconnected or cancelled), or when `resp_tx`
///   has no room beyond the status slot. Nothing is retried.
/// - [`Error::ServiceShutdown`] if `shutdown` fires mid-stream. The client
///   receives an `Unavailable` status as its final message.
///
/// Returns the number of jobs delivered on success.
pub async fn feed_jobs(
    snapshot: Vec<Job>,
    resp_tx: mpsc::Sender<Result<Job, Status>>,
    shutdown: CancellationToken,
) -> jobs_tonic_core::Result<usize> {
    let total = snapshot.len();
    if total > 0 && resp_tx.max_capacity() <= STATUS_SLOTS {
        return Err(Error::ChannelError {
            context: format!(
                "list channel of {} slots leaves no room for jobs",
                resp_tx.max_capacity()
            ),
        });
    }

    for (sent, job) in snapshot.into_iter().enumerate() {
        let reserved = tokio::select! {
            biased;
            () = shutdown.cancelled() => {
                // Fails only when the client is already gone.
                let _ = resp_tx.try_send(Err(Error::ServiceShutdown.into()));
                increment_jobs_streamed(sent as u64);
                return Err(Error::ServiceShutdown);
            }
            res = resp_tx.reserve_many(1 + STATUS_SLOTS) => res,
        };

        // Unused permits go back to the channel when dropped.
        match reserved {
            Ok(mut permits) => {
                if let Some(permit) = permits.next() {
                    permit.send(Ok(job));
                }
            }
            Err(_) => {
                increment_jobs_streamed(sent as u64);
                return Err(Error::ChannelError {
                    context: format!("list stream closed after {sent} of {total} jobs"),
                });
            }
        }
    }

    increment_jobs_streamed(total as u64);
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonic::Code;

    fn job(i: usize) -> Job {
        Job {
            id: format!("id-{i}"),
            name: format!("job-{i}"),
            description: String::new(),
            status: String::new(),
        }
    }

    #[tokio::test]
    async fn delivers_every_job_then_closes() {
        let (tx, mut rx) = mpsc::channel(2);
        let snapshot: Vec<Job> = (0..5).map(job).collect();

        let producer = tokio::spawn(feed_jobs(snapshot.clone(), tx, CancellationToken::new()));

        let mut received = Vec::new();
        while let Some(msg) = rx.recv().await {
            received.push(msg.unwrap());
        }

        assert_eq!(producer.await.unwrap(), Ok(5));
        assert_eq!(received, snapshot);
    }

    #[tokio::test]
    async fn empty_snapshot_closes_immediately() {
        let (tx, mut rx) = mpsc::channel(1 + STATUS_SLOTS);
        assert_eq!(feed_jobs(Vec::new(), tx, CancellationToken::new()).await, Ok(0));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn aborts_when_receiver_is_dropped() {
        let (tx, rx) = mpsc::channel(1 + STATUS_SLOTS);
        drop(rx);

        let err = feed_jobs((0..3).map(job).collect(), tx, CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ChannelError { .. }));
    }

    #[tokio::test]
    async fn stops_with_unavailable_on_shutdown() {
        let (tx, mut rx) = mpsc::channel(1 + STATUS_SLOTS);
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let err = feed_jobs((0..3).map(job).collect(), tx, shutdown)
            .await
            .unwrap_err();
        assert_eq!(err, Error::ServiceShutdown);

        let status = rx.recv().await.unwrap().unwrap_err();
        assert_eq!(status.code(), Code::Unavailable);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn shutdown_status_fits_behind_a_full_buffer() {
        let (tx, mut rx) = mpsc::channel(1 + STATUS_SLOTS);
        let shutdown = CancellationToken::new();

        let producer = tokio::spawn(feed_jobs((0..3).map(job).collect(), tx, shutdown.clone()));

        // Nobody reads, so the producer parks after the first job.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        shutdown.cancel();
        assert_eq!(producer.await.unwrap(), Err(Error::ServiceShutdown));

        let mut received = Vec::new();
        while let Some(msg) = rx.recv().await {
            received.push(msg);
        }

        assert_eq!(received.len(), 2);
        assert_eq!(received[0].as_ref().unwrap(), &job(0));
        let status = received[1].as_ref().unwrap_err();
        assert_eq!(status.code(), Code::Unavailable);
    }

    #[tokio::test]
    async fn refuses_channel_with_only_the_status_slot() {
        let (tx, mut rx) = mpsc::channel(STATUS_SLOTS);

        let err = feed_jobs((0..2).map(job).collect(), tx, CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ChannelError { .. }));
        assert!(rx.recv().await.is_none());
    }
}
