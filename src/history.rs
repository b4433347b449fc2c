use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;

use verifalia::job_id::JobId;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Failed to access history file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize/deserialize history: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Failed to find home directory")]
    NoHomeDir,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: JobId,
    pub name: Option<String>,
    pub entries: usize,
    pub timestamp: DateTime<Utc>,
    pub status: Option<String>,
}

impl JobRecord {
    pub fn new(job_id: JobId, name: Option<String>, entries: usize) -> Self {
        Self {
            job_id,
            name,
            entries,
            timestamp: Utc::now(),
            status: None,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct JobHistory {
    pub records: HashMap<JobId, JobRecord>,
}

impl JobHistory {
    pub fn add_record(&mut self, record: JobRecord) {
        self.records.insert(record.job_id.clone(), record);
    }

    pub fn update_status(&mut self, job_id: &JobId, status: String) {
        if let Some(record) = self.records.get_mut(job_id) {
            record.status = Some(status);
        }
    }

    pub fn get_recent_records(&self, limit: usize) -> Vec<&JobRecord> {
        let mut records: Vec<&JobRecord> = self.records.values().collect();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        records.into_iter().take(limit).collect()
    }
}

pub struct HistoryManager {
    history_file: PathBuf,
}

impl HistoryManager {
    pub fn new() -> Result<Self, HistoryError> {
        let home_dir = dirs::home_dir().ok_or(HistoryError::NoHomeDir)?;
        Self::with_path(home_dir.join(".verifalia").join("history.json"))
    }

    pub fn with_path(history_file: PathBuf) -> Result<Self, HistoryError> {
        if let Some(dir) = history_file.parent() {
            fs::create_dir_all(dir)?;
        }
        Ok(Self { history_file })
    }

    pub fn load_history(&self) -> Result<JobHistory, HistoryError> {
        match fs::read_to_string(&self.history_file) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(JobHistory::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save_history(&self, history: &JobHistory) -> Result<(), HistoryError> {
        fs::write(&self.history_file, serde_json::to_string_pretty(history)?)?;
        Ok(())
    }

    /// Applies `change` to the stored history and writes it back.
    fn modify(&self, change: impl FnOnce(&mut JobHistory)) -> Result<(), HistoryError> {
        let mut history = self.load_history()?;
        change(&mut history);
        self.save_history(&history)
    }

    pub fn add_job(&self, record: JobRecord) -> Result<(), HistoryError> {
        self.modify(|history| history.add_record(record))
    }

    pub fn update_job_status(&self, job_id: &JobId, status: String) -> Result<(), HistoryError> {
        self.modify(|history| history.update_status(job_id, status))
    }

    pub fn list_recent_jobs(&self, limit: usize) -> Result<Vec<JobRecord>, HistoryError> {
        let history = self.load_history()?;
        Ok(history
            .get_recent_records(limit)
            .into_iter()
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    fn job(raw: &str) -> JobId {
        JobId::new(raw).unwrap()
    }

    #[test]
    fn test_missing_file_is_empty_history() {
        let dir = tempfile::tempdir().unwrap();
        let manager = HistoryManager::with_path(dir.path().join("nested").join("history.json")).unwrap();

        assert!(manager.list_recent_jobs(10).unwrap().is_empty());
        assert!(dir.path().join("nested").is_dir());
    }

    #[test]
    fn test_add_and_update_job() {
        let dir = tempfile::tempdir().unwrap();
        let manager = HistoryManager::with_path(dir.path().join("history.json")).unwrap();
        let id = job("9ece66cf-916c-4313-9c40-b8a73f0ef872");

        manager
            .add_job(JobRecord::new(id.clone(), Some("newsletter".to_string()), 2))
            .unwrap();
        manager.update_job_status(&id, "Completed".to_string()).unwrap();

        let jobs = manager.list_recent_jobs(10).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].job_id, id);
        assert_eq!(jobs[0].status.as_deref(), Some("Completed"));
    }

    #[test]
    fn test_status_of_unknown_job_leaves_history_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let manager = HistoryManager::with_path(dir.path().join("history.json")).unwrap();
        let known = job("9ece66cf-916c-4313-9c40-b8a73f0ef872");
        manager.add_job(JobRecord::new(known.clone(), None, 1)).unwrap();

        manager
            .update_job_status(&job("00000000-0000-0000-0000-000000000001"), "Expired".to_string())
            .unwrap();

        let jobs = manager.load_history().unwrap();
        assert_eq!(jobs.records.len(), 1);
        assert_eq!(jobs.records[&known].status, None);
    }

    #[test]
    fn test_recent_jobs_are_newest_first() {
        let mut history = JobHistory::default();
        let older = JobRecord {
            timestamp: Utc::now() - Duration::hours(1),
            ..JobRecord::new(job("00000000-0000-0000-0000-000000000001"), None, 1)
        };
        let newer = JobRecord::new(job("00000000-0000-0000-0000-000000000002"), None, 1);
        history.add_record(older.clone());
        history.add_record(newer.clone());

        let recent = history.get_recent_records(1);
        assert_eq!(recent, vec![&newer]);
    }
}
