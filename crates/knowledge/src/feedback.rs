//! Append-only feedback log in JSON Lines format.

use chrono::Utc;
use helpdesk_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// One judged query: the question, the file that answers it, and where it ranked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub question: String,
    pub answer_file: String,
    pub k: u32,
    pub rank: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl FeedbackRecord {
    /// Build a record stamped with the current time.
    pub fn new(question: impl Into<String>, answer_file: impl Into<String>, k: u32, rank: Option<u32>) -> Self {
        Self {
            question: question.into(),
            answer_file: answer_file.into(),
            k,
            rank,
            timestamp: Some(Utc::now().timestamp()),
        }
    }
}

/// Handle to the feedback log file.
#[derive(Debug, Clone)]
pub struct FeedbackLog {
    path: PathBuf,
}

impl FeedbackLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether any feedback has ever been written.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Append one record as a JSON line, creating the file and its directory.
    pub fn append(&self, record: &FeedbackRecord) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        // One write per record keeps concurrent appends line-atomic.
        file.write_all(line.as_bytes())?;

        tracing::debug!(
            "Recorded feedback for '{}' (rank {:?})",
            record.answer_file,
            record.rank
        );
        Ok(())
    }

    /// Read the rank of every line.
    ///
    /// Lines that are not JSON objects are skipped. A missing, non-integer,
    /// or non-positive rank reads as `None`.
    pub fn ranks(&self) -> AppResult<Vec<Option<u32>>> {
        let file = std::fs::File::open(&self.path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::NotFound("No feedback yet. POST /feedback first.".to_string())
            } else {
                AppError::Io(e)
            }
        })?;

        let mut ranks = Vec::new();
        let mut skipped = 0usize;
        for line in BufReader::new(file).lines() {
            let line = line?;
            match serde_json::from_str::<serde_json::Value>(&line) {
                Ok(serde_json::Value::Object(obj)) => {
                    let rank = obj
                        .get("rank")
                        .and_then(serde_json::Value::as_u64)
                        .filter(|&r| r > 0)
                        .and_then(|r| u32::try_from(r).ok());
                    ranks.push(rank);
                }
                _ => skipped += 1,
            }
        }

        if skipped > 0 {
            tracing::warn!("Skipped {} malformed feedback lines in {:?}", skipped, self.path);
        }

        Ok(ranks)
    }

    /// [`append`](Self::append) on the blocking thread pool.
    pub async fn append_async(&self, record: FeedbackRecord) -> AppResult<()> {
        let log = self.clone();
        tokio::task::spawn_blocking(move || log.append(&record))
            .await
            .map_err(|e| AppError::Other(format!("Feedback writer panicked: {}", e)))?
    }

    /// [`ranks`](Self::ranks) on the blocking thread pool.
    pub async fn ranks_async(&self) -> AppResult<Vec<Option<u32>>> {
        let log = self.clone();
        tokio::task::spawn_blocking(move || log.ranks())
            .await
            .map_err(|e| AppError::Other(format!("Feedback reader panicked: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_append_creates_directory() {
        let temp = TempDir::new().unwrap();
        let log = FeedbackLog::new(temp.path().join("eval").join("feedback.jsonl"));
        assert!(!log.exists());

        log.append(&FeedbackRecord::new("how do I reset", "password.txt", 5, Some(2)))
            .unwrap();
        log.append(&FeedbackRecord::new("printer jam", "printer.txt", 5, None))
            .unwrap();

        assert!(log.exists());
        assert_eq!(log.ranks().unwrap(), vec![Some(2), None]);
    }

    #[test]
    fn test_ranks_missing_file() {
        let temp = TempDir::new().unwrap();
        let log = FeedbackLog::new(temp.path().join("feedback.jsonl"));
        assert!(matches!(log.ranks(), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_ranks_tolerates_bad_lines() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("feedback.jsonl");
        std::fs::write(
            &path,
            "{\"rank\": 1}\nnot json\n{\"rank\": -3}\n{\"rank\": \"2\"}\n{\"rank\": null}\n{\"rank\": 4}\n",
        )
        .unwrap();

        let ranks = FeedbackLog::new(&path).ranks().unwrap();
        assert_eq!(ranks, vec![Some(1), None, None, None, Some(4)]);
    }

    #[test]
    fn test_record_serializes_null_rank() {
        let record = FeedbackRecord {
            question: "q".to_string(),
            answer_file: "a.txt".to_string(),
            k: 3,
            rank: None,
            timestamp: None,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert!(json["rank"].is_null());
        assert!(json.get("timestamp").is_none());
    }

    #[tokio::test]
    async fn test_concurrent_async_appends_stay_line_separated() {
        let temp = TempDir::new().unwrap();
        let log = FeedbackLog::new(temp.path().join("eval").join("feedback.jsonl"));

        let writers: Vec<_> = (1..=16u32)
            .map(|rank| {
                let log = log.clone();
                tokio::spawn(async move {
                    let record = FeedbackRecord::new("wifi drops", "wifi.txt", 5, Some(rank));
                    log.append_async(record).await
                })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap().unwrap();
        }

        let mut ranks = log.ranks_async().await.unwrap();
        ranks.sort();
        assert_eq!(ranks, (1..=16).map(Some).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_ranks_async_missing_file() {
        let temp = TempDir::new().unwrap();
        let log = FeedbackLog::new(temp.path().join("feedback.jsonl"));
        assert!(matches!(log.ranks_async().await, Err(AppError::NotFound(_))));
    }
}
