// Conversion trace
// Stage-by-stage diagnostics returned alongside results, optionally appended to a JSONL file

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Conversion stage an entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Read,
    Pads,
    Sequences,
    Assemble,
    Write,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceLevel {
    Info,
    Warn,
}

/// One diagnostic produced during a conversion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEntry {
    /// RFC 3339 timestamp
    pub timestamp: String,

    pub stage: Stage,
    pub level: TraceLevel,
    pub message: String,

    /// Structured detail (pad plan, layer timing, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl TraceEntry {
    pub fn new(stage: Stage, level: TraceLevel, message: impl Into<String>) -> Self {
        TraceEntry {
            timestamp: Utc::now().to_rfc3339(),
            stage,
            level,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Serialize to JSON line (with newline)
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        Ok(format!("{}\n", json))
    }
}

/// Ordered diagnostics of one conversion
#[derive(Debug, Clone, Default)]
pub struct Trace {
    entries: Vec<TraceEntry>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, stage: Stage, message: impl Into<String>) -> &mut TraceEntry {
        self.push(TraceEntry::new(stage, TraceLevel::Info, message))
    }

    pub fn warn(&mut self, stage: Stage, message: impl Into<String>) -> &mut TraceEntry {
        self.push(TraceEntry::new(stage, TraceLevel::Warn, message))
    }

    pub fn push(&mut self, entry: TraceEntry) -> &mut TraceEntry {
        self.entries.push(entry);
        let last = self.entries.len() - 1;
        &mut self.entries[last]
    }

    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    pub fn stage_entries(&self, stage: Stage) -> impl Iterator<Item = &TraceEntry> {
        self.entries.iter().filter(move |e| e.stage == stage)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &TraceEntry> {
        self.entries.iter().filter(|e| e.level == TraceLevel::Warn)
    }
}

/// Append-only JSONL trace file
pub struct TraceWriter {
    file_path: PathBuf,
}

impl TraceWriter {
    pub fn new(file_path: PathBuf) -> Self {
        TraceWriter { file_path }
    }

    /// Append entries, creating the file if needed
    pub fn append(&self, entries: &[TraceEntry]) -> Result<(), TraceError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)?;

        for entry in entries {
            file.write_all(entry.to_json_line()?.as_bytes())?;
        }

        file.flush()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }
}

/// Read trace entries from a JSONL file
pub fn read_trace_file(path: &Path) -> Result<Vec<TraceEntry>, TraceError> {
    let contents = std::fs::read_to_string(path)?;

    contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(TraceError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_trace_collects_in_order() {
        let mut trace = Trace::new();
        trace.info(Stage::Read, "Read 16 pads");
        trace
            .warn(Stage::Pads, "Pad 3: sample missing")
            .data = Some(serde_json::json!({ "pad": 3 }));
        trace.info(Stage::Pads, "Built 16 pads");

        assert_eq!(trace.entries().len(), 3);
        assert_eq!(trace.stage_entries(Stage::Pads).count(), 2);

        let warnings: Vec<&TraceEntry> = trace.warnings().collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].data.as_ref().unwrap()["pad"], 3);
    }

    #[test]
    fn test_json_line_format() {
        let entry = TraceEntry::new(Stage::Sequences, TraceLevel::Info, "Layer A")
            .with_data(serde_json::json!({ "unquantised": true }));
        let line = entry.to_json_line().unwrap();

        assert!(line.ends_with('\n'));
        assert!(line.contains("\"stage\":\"sequences\""));
        assert!(line.contains("\"level\":\"info\""));

        let parsed: TraceEntry = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(parsed.stage, Stage::Sequences);
        assert_eq!(parsed.data.unwrap()["unquantised"], true);
    }

    #[test]
    fn test_entry_without_data_omits_field() {
        let line = TraceEntry::new(Stage::Write, TraceLevel::Warn, "copy failed")
            .to_json_line()
            .unwrap();
        assert!(!line.contains("\"data\""));
    }

    #[test]
    fn test_writer_appends_across_runs() {
        let temp_dir = TempDir::new().unwrap();
        let trace_path = temp_dir.path().join("trace.jsonl");
        let writer = TraceWriter::new(trace_path.clone());

        let mut first = Trace::new();
        first.info(Stage::Read, "run 1");
        writer.append(first.entries()).unwrap();

        let mut second = Trace::new();
        second.info(Stage::Read, "run 2");
        second.info(Stage::Write, "done");
        writer.append(second.entries()).unwrap();

        let entries = read_trace_file(writer.path()).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].message, "run 1");
        assert_eq!(entries[2].stage, Stage::Write);
    }

    #[test]
    fn test_read_rejects_garbage() {
        let temp_dir = TempDir::new().unwrap();
        let trace_path = temp_dir.path().join("trace.jsonl");
        std::fs::write(&trace_path, "{not json}\n").unwrap();

        assert!(matches!(
            read_trace_file(&trace_path),
            Err(TraceError::Serialization(_))
        ));
    }
}
