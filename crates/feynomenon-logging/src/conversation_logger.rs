use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

#[derive(Serialize)]
struct LogEntry<'a> {
    timestamp: String, // ISO‑8601 Local time
    session_id: &'a str,
    phase: &'a str,
    role: &'a str,
    content: &'a str,
}

/// Append-only JSONL transcript of one tutoring session.
pub struct ConversationLogger {
    session_id: String,
    file_path: PathBuf,
    file: Option<tokio::fs::File>,
}

impl ConversationLogger {
    /// Create a new transcript file in `logs_dir`; the name carries the local
    /// start time and the session id.
    pub async fn new(logs_dir: &Path, session_id: &str) -> Result<Self> {
        fs::create_dir_all(logs_dir)
            .await
            .with_context(|| format!("Failed to create transcript directory {}", logs_dir.display()))?;

        let now_local = Local::now();
        let safe_id: String = session_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        let filename = format!(
            "feyn-{}-{}.jsonl",
            now_local.format("%Y-%m-%d-%H%M%S"),
            safe_id
        );
        let file_path = logs_dir.join(filename);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file_path)
            .await
            .with_context(|| format!("Failed to open transcript {}", file_path.display()))?;

        Ok(Self {
            session_id: session_id.to_string(),
            file_path,
            file: Some(file),
        })
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Append a single entry. Write failures are reported on stderr and
    /// otherwise ignored.
    pub async fn log(&mut self, phase: &str, role: &str, content: &str) {
        let entry = LogEntry {
            timestamp: Local::now().to_rfc3339(),
            session_id: &self.session_id,
            phase,
            role,
            content,
        };
        if let Some(file) = &mut self.file {
            if let Ok(json) = serde_json::to_string(&entry) {
                if let Err(e) = file.write_all(json.as_bytes()).await {
                    eprintln!("[Logging error] {}", e);
                } else if let Err(e) = file.write_all(b"\n").await {
                    eprintln!("[Logging error] {}", e);
                } else {
                    let _ = file.flush().await;
                }
            }
        }
    }

    /// Close the logger (explicit drop). Called on graceful shutdown.
    pub async fn shutdown(&mut self) {
        if let Some(file) = self.file.take() {
            let _ = file.sync_all().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_writes_one_json_line_per_entry() {
        let dir = TempDir::new().unwrap();
        let mut logger = ConversationLogger::new(dir.path(), "abc-123").await.unwrap();

        logger.log("topic_gathering", "user", "I want to learn about tides").await;
        logger.log("topic_gathering", "assistant", "So you want to learn about tides.").await;
        logger.shutdown().await;

        let content = std::fs::read_to_string(logger.file_path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["session_id"], "abc-123");
        assert_eq!(first["phase"], "topic_gathering");
        assert_eq!(first["role"], "user");
        assert_eq!(first["content"], "I want to learn about tides");
    }

    #[tokio::test]
    async fn test_session_id_is_sanitized_in_file_name() {
        let dir = TempDir::new().unwrap();
        let logger = ConversationLogger::new(dir.path(), "../evil/id").await.unwrap();
        let name = logger.file_path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.ends_with("___evil_id.jsonl"));
        assert_eq!(logger.file_path().parent().unwrap(), dir.path());
    }

    #[tokio::test]
    async fn test_log_after_shutdown_is_noop() {
        let dir = TempDir::new().unwrap();
        let mut logger = ConversationLogger::new(dir.path(), "s").await.unwrap();
        logger.shutdown().await;
        logger.log("feynman_tutoring", "user", "ignored").await;
        let content = std::fs::read_to_string(logger.file_path()).unwrap();
        assert!(content.is_empty());
    }
}
