//! In-memory job store.
//!
//! [`JobStore`] owns every job record for the lifetime of the process. A
//! single [`RwLock`] guards the whole map: [`insert`](JobStore::insert) and
//! [`delete`](JobStore::delete) take it exclusively, [`get`](JobStore::get)
//! and [`list`](JobStore::list) share it. Every operation is therefore
//! linearizable with respect to the others and never observes a half-applied
//! mutation.
//!
//! The lock is only ever held for synchronous map work. Callers receive
//! clones, never references into the map, so nothing outlives the guard.

use jobs_tonic_core::{
    Error, Result,
    proto::Job,
    types::{DEFAULT_LIST_LIMIT, NewJob, effective_limit},
};
use parking_lot::RwLock;
use std::collections::{HashMap, hash_map::Entry};
use std::fmt;


/// How many freshly drawn identifiers may collide before `insert` gives up.
pub const MAX_ID_ATTEMPTS: usize = 8;

/// Source of candidate job identifiers.
pub type IdSource = Box<dyn Fn() -> String + Send + Sync>;

fn uuid_v4() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// The canonical, concurrency-safe collection of jobs.
pub struct JobStore {
    jobs: RwLock<HashMap<String, Job>>,
    next_id: IdSource,
    default_limit: usize,
}

impl JobStore {
    /// Creates an empty store that assigns random UUID v4 identifiers.
    pub fn new() -> Self {
        Self::with_id_source(uuid_v4)
    }

    /// Creates an empty store that draws identifiers from `next_id`.
    ///
    /// Collisions with existing keys are retried up to [`MAX_ID_ATTEMPTS`]
    /// times, so the source only needs to make collisions unlikely.
    pub fn with_id_source<F>(next_id: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Self {
            jobs: RwLock::new(HashMap::new()),
            next_id: Box::new(next_id),
            default_limit: DEFAULT_LIST_LIMIT,
        }
    }

    /// Overrides the cap applied by [`list`](Self::list) when the requested
    /// limit is `<= 0`. A zero default is ignored.
    pub fn with_default_limit(mut self, default_limit: usize) -> Self {
        if default_limit > 0 {
            self.default_limit = default_limit;
        }
        self
    }

    /// The cap used by [`list`](Self::list) for non-positive limits.
    pub fn default_limit(&self) -> usize {
        self.default_limit
    }

    /// Stores `job` under a fresh identifier and returns the stored record.
    ///
    /// # Errors
    ///
    /// [`Error::IdExhausted`] if every one of [`MAX_ID_ATTEMPTS`] candidate
    /// identifiers was already taken.
    pub fn insert(&self, job: NewJob) -> Result<Job> {
        let mut jobs = self.jobs.write();

        for _ in 0..MAX_ID_ATTEMPTS {
            let id = (self.next_id)();
            if let Entry::Vacant(slot) = jobs.entry(id) {
                let record = Job {
                    id: slot.key().clone(),
                    name: job.name,
                    description: job.description,
                    status: job.status,
                };
                return Ok(slot.insert(record).clone());
            }
        }

        Err(Error::IdExhausted {
            attempts: MAX_ID_ATTEMPTS,
        })
    }

    /// Returns a copy of the job stored under `id`.
    pub fn get(&self, id: &str) -> Result<Job> {
        self.jobs
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound { id: id.to_owned() })
    }

    /// Snapshots at most `limit` jobs, in no particular order.
    ///
    /// `limit <= 0` is replaced by the store's default cap. The read lock is
    /// released before this returns, so iterating the snapshot never blocks
    /// writers. Two calls may observe different states if mutations happen
    /// in between.
    pub fn list(&self, limit: i32) -> Vec<Job> {
        let limit = effective_limit(limit, self.default_limit);
        let jobs = self.jobs.read();
        jobs.values().take(limit).cloned().collect()
    }

    /// Removes the job stored under `id`.
    ///
    /// Deleting an absent (or already deleted) job is an error, not a no-op.
    pub fn delete(&self, id: &str) -> Result<()> {
        match self.jobs.write().remove(id) {
            Some(_) => Ok(()),
            None => Err(Error::NotFound { id: id.to_owned() }),
        }
    }

    /// Number of stored jobs at the moment of the call.
    pub fn len(&self) -> usize {
        self.jobs.read().len()
    }

    /// Whether the store currently holds no jobs.
    pub fn is_empty(&self) -> bool {
        self.jobs.read().is_empty()
    }
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for JobStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobStore")
            .field("len", &self.len())
            .field("default_limit", &self.default_limit)
            .finish_non_exhaustive()
    }
}
