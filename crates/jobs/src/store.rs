//! Job result storage.
//!
//! The store holds terminal records only, keyed by job ID. Writers are the
//! worker or the fallback simulator (never both for one ID); readers are the
//! status pollers. The filesystem implementation commits each record with a
//! write-to-temp-then-rename so a concurrent `get` observes either the whole
//! record or nothing.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::RwLock;

use tracing::debug;

use vitalscan_core::JobId;

use crate::record::JobRecord;

/// Job store abstraction.
pub trait JobStore: Send + Sync {
    /// Persist a terminal record under its job ID.
    ///
    /// Overwriting an existing terminal record is refused: terminal jobs are
    /// never mutated again.
    fn put(&self, record: &JobRecord) -> Result<(), JobStoreError>;

    /// Fetch a record by ID. `Ok(None)` means no record yet — pollers map
    /// this to "still processing", not to an error.
    fn get(&self, job_id: JobId) -> Result<Option<JobRecord>, JobStoreError>;
}

/// Job store error.
#[derive(Debug, thiserror::Error)]
pub enum JobStoreError {
    /// An attempt to overwrite a record that is already terminal.
    #[error("job {0} already has a terminal record")]
    TerminalOverwrite(JobId),

    /// A stored record could not be encoded or decoded.
    #[error("record codec error: {0}")]
    Codec(String),

    /// Underlying storage failure.
    #[error("storage error: {0}")]
    Storage(String),
}

impl<S: JobStore + ?Sized> JobStore for std::sync::Arc<S> {
    fn put(&self, record: &JobRecord) -> Result<(), JobStoreError> {
        (**self).put(record)
    }

    fn get(&self, job_id: JobId) -> Result<Option<JobRecord>, JobStoreError> {
        (**self).get(job_id)
    }
}

/// Filesystem-backed store: one JSON file per job under a data directory.
#[derive(Debug)]
pub struct FsJobStore {
    dir: PathBuf,
}

impl FsJobStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, JobStoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| JobStoreError::Storage(e.to_string()))?;
        Ok(Self { dir })
    }

    fn record_path(&self, job_id: JobId) -> PathBuf {
        self.dir.join(format!("{job_id}.json"))
    }

    fn temp_path(&self, job_id: JobId) -> PathBuf {
        // One writer per ID, so a fixed temp name cannot collide.
        self.dir.join(format!("{job_id}.json.tmp"))
    }
}

impl JobStore for FsJobStore {
    fn put(&self, record: &JobRecord) -> Result<(), JobStoreError> {
        if let Some(existing) = self.get(record.job_id)? {
            if existing.is_terminal() {
                return Err(JobStoreError::TerminalOverwrite(record.job_id));
            }
        }

        let bytes =
            serde_json::to_vec_pretty(record).map_err(|e| JobStoreError::Codec(e.to_string()))?;

        // Atomic commit: readers see the old state or the full new record,
        // never a partial write.
        let tmp = self.temp_path(record.job_id);
        let path = self.record_path(record.job_id);

        let mut file = fs::File::create(&tmp).map_err(|e| JobStoreError::Storage(e.to_string()))?;
        file.write_all(&bytes)
            .map_err(|e| JobStoreError::Storage(e.to_string()))?;
        file.sync_all()
            .map_err(|e| JobStoreError::Storage(e.to_string()))?;
        drop(file);

        fs::rename(&tmp, &path).map_err(|e| JobStoreError::Storage(e.to_string()))?;

        debug!(job_id = %record.job_id, status = ?record.status, "job record committed");
        Ok(())
    }

    fn get(&self, job_id: JobId) -> Result<Option<JobRecord>, JobStoreError> {
        let path = self.record_path(job_id);
        let bytes = match fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(JobStoreError::Storage(e.to_string())),
        };

        let record =
            serde_json::from_slice(&bytes).map_err(|e| JobStoreError::Codec(e.to_string()))?;
        Ok(Some(record))
    }
}

/// In-memory store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    records: RwLock<HashMap<JobId, JobRecord>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl JobStore for InMemoryJobStore {
    fn put(&self, record: &JobRecord) -> Result<(), JobStoreError> {
        let mut records = self.records.write().unwrap();
        if let Some(existing) = records.get(&record.job_id) {
            if existing.is_terminal() {
                return Err(JobStoreError::TerminalOverwrite(record.job_id));
            }
        }
        records.insert(record.job_id, record.clone());
        Ok(())
    }

    fn get(&self, job_id: JobId) -> Result<Option<JobRecord>, JobStoreError> {
        Ok(self.records.read().unwrap().get(&job_id).cloned())
    }
}
