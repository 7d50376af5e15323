//! In-Memory Job Store Implementation

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

use crate::application::ports::{JobStoreError, JobStorePort};
use crate::domain::job::{JobStatus, TransformationJob};

/// 进程内任务历史
///
/// 每个任务带一个单调递增序号，列出时按序号排序以保持插入顺序。
/// 无淘汰策略，随进程生命周期无限增长。
pub struct InMemoryJobStore {
    /// job_id -> (序号, 任务)
    jobs: DashMap<Uuid, (u64, TransformationJob)>,
    next_seq: AtomicU64,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self {
            jobs: DashMap::new(),
            next_seq: AtomicU64::new(0),
        }
    }
}

impl Default for InMemoryJobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl JobStorePort for InMemoryJobStore {
    fn append(&self, job: TransformationJob) -> Result<(), JobStoreError> {
        let id = job.id;
        let seq = match self.jobs.entry(id) {
            Entry::Occupied(_) => return Err(JobStoreError::AlreadyExists(id)),
            Entry::Vacant(slot) => {
                let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
                slot.insert((seq, job));
                seq
            }
        };

        tracing::debug!(job_id = %id, seq = seq, "Job appended");
        Ok(())
    }

    fn update_status(&self, id: Uuid, status: JobStatus) -> Result<(), JobStoreError> {
        let mut entry = self.jobs.get_mut(&id).ok_or(JobStoreError::NotFound(id))?;

        let old_status = entry.1.status;
        entry.1.status = status;

        tracing::debug!(
            job_id = %id,
            old_status = %old_status,
            new_status = %status,
            "Job status changed"
        );
        Ok(())
    }

    fn set_storage_url(&self, id: Uuid, url: String) -> Result<(), JobStoreError> {
        let mut entry = self.jobs.get_mut(&id).ok_or(JobStoreError::NotFound(id))?;
        entry.1.storage_url = Some(url);
        Ok(())
    }

    fn get(&self, id: Uuid) -> Option<TransformationJob> {
        self.jobs.get(&id).map(|entry| entry.1.clone())
    }

    fn list_all(&self) -> Vec<TransformationJob> {
        let mut entries: Vec<(u64, TransformationJob)> = self
            .jobs
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        entries.sort_by_key(|(seq, _)| *seq);
        entries.into_iter().map(|(_, job)| job).collect()
    }

    fn len(&self) -> usize {
        self.jobs.len()
    }
}
