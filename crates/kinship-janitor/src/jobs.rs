//! In-memory job tracking with TTL eviction

use kinship_domain::{InferenceJob, JobId, JobStore};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Job records kept in process memory
///
/// Each write refreshes the record's deadline; records untouched for longer
/// than the TTL are evicted on the next access.
#[derive(Debug)]
pub struct MemoryJobStore {
    jobs: Mutex<HashMap<JobId, (Instant, InferenceJob)>>,
    ttl: Duration,
}

impl MemoryJobStore {
    /// Create an empty store with the given retention
    pub fn new(ttl: Duration) -> Self {
        Self {
            jobs: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Records currently held, expired ones excluded
    pub fn len(&self) -> usize {
        let mut jobs = self.lock();
        self.evict(&mut jobs);
        jobs.len()
    }

    /// True when no live record is held
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A panic mid-update leaves a complete map behind, so poisoning is ignored
    fn lock(&self) -> MutexGuard<'_, HashMap<JobId, (Instant, InferenceJob)>> {
        match self.jobs.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn evict(&self, jobs: &mut HashMap<JobId, (Instant, InferenceJob)>) {
        let ttl = self.ttl;
        jobs.retain(|_, (written, _)| written.elapsed() < ttl);
    }
}

impl JobStore for MemoryJobStore {
    fn put(&self, job: InferenceJob) {
        let mut jobs = self.lock();
        self.evict(&mut jobs);
        jobs.insert(job.job_id, (Instant::now(), job));
    }

    fn get(&self, id: &JobId) -> Option<InferenceJob> {
        let mut jobs = self.lock();
        self.evict(&mut jobs);
        jobs.get(id).map(|(_, job)| job.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinship_domain::{JobStatus, PersonId};

    #[test]
    fn test_put_and_get() {
        let store = MemoryJobStore::new(Duration::from_secs(60));
        let mut job = InferenceJob::start(PersonId(7));
        store.put(job.clone());

        job.progress(50, "replaying");
        store.put(job.clone());

        let read = store.get(&job.job_id).unwrap();
        assert_eq!(read.percent, 50);
        assert_eq!(read.status, JobStatus::Running);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_unknown_job_is_none() {
        let store = MemoryJobStore::new(Duration::from_secs(60));
        assert!(store.get(&JobId::new()).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_expired_jobs_evicted() {
        let store = MemoryJobStore::new(Duration::ZERO);
        let job = InferenceJob::start(PersonId(7));
        store.put(job.clone());

        assert!(store.get(&job.job_id).is_none());
        assert!(store.is_empty());
    }
}
