// src/output/failures.rs
// Optional JSON-lines log of snapshot fetches that failed.
//
// One record per line, appended, so several runs can share one file:
//   {"url":"https://web.archive.org/web/2020...if_/a.com","error":"HTTP 429"}

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::OutputError;
use crate::fetch::FetchOutcome;

#[derive(Debug, Serialize)]
struct FailureRecord<'a> {
    url: &'a str,
    error: String,
}

#[derive(Debug)]
pub struct FailureLog {
    path: PathBuf,
    writer: BufWriter<File>,
    recorded: usize,
}

impl FailureLog {
    pub fn open(path: &Path) -> Result<Self, OutputError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| OutputError::FailureLog {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            recorded: 0,
        })
    }

    /// Appends one failed outcome. Successful outcomes are ignored.
    pub fn record(&mut self, outcome: &FetchOutcome) -> Result<(), OutputError> {
        let Some(error) = &outcome.error else {
            return Ok(());
        };

        let record = FailureRecord {
            url: &outcome.source_url,
            error: error.to_string(),
        };
        serde_json::to_writer(&mut self.writer, &record)
            .map_err(std::io::Error::from)
            .and_then(|_| self.writer.write_all(b"\n"))
            .map_err(|source| OutputError::FailureLog {
                path: self.path.clone(),
                source,
            })?;

        self.recorded += 1;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn recorded(&self) -> usize {
        self.recorded
    }

    pub fn flush(&mut self) -> Result<(), OutputError> {
        self.writer.flush().map_err(|source| OutputError::FailureLog {
            path: self.path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchError;
    use tempfile::TempDir;

    #[test]
    fn test_one_json_line_per_failure() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("failures.jsonl");

        let mut log = FailureLog::open(&path).unwrap();
        log.record(&FetchOutcome::failure("u1".into(), FetchError::Status(503)))
            .unwrap();
        log.record(&FetchOutcome::success("u2".into(), b"fine".to_vec()))
            .unwrap();
        log.record(&FetchOutcome::failure("u3".into(), FetchError::Timeout))
            .unwrap();
        log.flush().unwrap();
        assert_eq!(log.recorded(), 2);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["url"], "u1");
        assert_eq!(lines[0]["error"], "HTTP 503");
        assert_eq!(lines[1]["url"], "u3");
        assert_eq!(lines[1]["error"], "request timed out");
    }

    #[test]
    fn test_existing_log_is_appended() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("failures.jsonl");
        std::fs::write(&path, "{\"url\":\"old\",\"error\":\"x\"}\n").unwrap();

        let mut log = FailureLog::open(&path).unwrap();
        log.record(&FetchOutcome::failure("new".into(), FetchError::Timeout))
            .unwrap();
        log.flush().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }
}
