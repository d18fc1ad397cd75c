//! Re-inference jobs
//!
//! A job tracks one full-network re-inference run. Jobs are ephemeral and
//! live in a [`JobStore`](crate::traits::JobStore) with TTL eviction.

use crate::person::PersonId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a job, based on UUIDv7
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JobId(u128);

impl JobId {
    /// Generate a new UUIDv7-based JobId
    ///
    /// # Examples
    ///
    /// ```
    /// use kinship_domain::JobId;
    ///
    /// let id = JobId::new();
    /// assert!(id.value() > 0);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Parse a JobId from its string form
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid job id: {}", e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

/// Lifecycle of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Still working
    Running,
    /// Finished successfully
    Done,
    /// Aborted with an error
    Error,
}

/// Counts reported when a re-inference run finishes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReinferSummary {
    /// People in the network
    pub network_size: usize,
    /// Distinct manual relationships replayed
    pub manual_edges: usize,
    /// Inferred rows removed before replay
    pub deleted_inferred: usize,
    /// Inferred rows present after replay
    pub inferred_after: usize,
}

/// Progress record for one re-inference run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceJob {
    /// Job id
    pub job_id: JobId,
    /// Person who started the job; only they may read it
    pub owner_id: PersonId,
    /// Current status
    pub status: JobStatus,
    /// 0..=100
    pub percent: u8,
    /// Human readable stage description
    pub message: String,
    /// Set once the job is done
    pub result_summary: Option<ReinferSummary>,
}

impl InferenceJob {
    /// New running job at 0%
    pub fn start(owner_id: PersonId) -> Self {
        Self {
            job_id: JobId::new(),
            owner_id,
            status: JobStatus::Running,
            percent: 0,
            message: "queued".to_string(),
            result_summary: None,
        }
    }

    /// Move to a new stage
    pub fn progress(&mut self, percent: u8, message: impl Into<String>) {
        self.percent = percent.min(100);
        self.message = message.into();
    }

    /// Mark finished
    pub fn finish(&mut self, summary: ReinferSummary) {
        self.status = JobStatus::Done;
        self.percent = 100;
        self.message = "done".to_string();
        self.result_summary = Some(summary);
    }

    /// Mark failed
    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = JobStatus::Error;
        self.message = message.into();
    }

    /// Finished either way
    pub fn is_terminal(&self) -> bool {
        self.status != JobStatus::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_id_display_and_parse() {
        let id = JobId::new();
        let parsed = JobId::from_string(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
        assert!(JobId::from_string("nope").is_err());
    }

    #[test]
    fn test_job_lifecycle() {
        let mut job = InferenceJob::start(PersonId(7));
        assert!(!job.is_terminal());

        job.progress(130, "replaying");
        assert_eq!(job.percent, 100);

        job.fail("store unavailable");
        assert_eq!(job.status, JobStatus::Error);
        assert!(job.is_terminal());
    }

    #[test]
    fn test_job_finish_sets_summary() {
        let mut job = InferenceJob::start(PersonId(1));
        job.finish(ReinferSummary {
            network_size: 3,
            manual_edges: 2,
            deleted_inferred: 4,
            inferred_after: 4,
        });
        assert_eq!(job.percent, 100);
        assert_eq!(job.result_summary.unwrap().manual_edges, 2);
    }
}
