use anyhow::{Context, Result};
use mockproc_common::{env_vars, log_schema, redact_argv};
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use std::env;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::history::{EntryOutcome, HistoryEntry};

struct TraceOutput {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl TraceOutput {
    fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create trace directory {:?}", parent))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open trace log {:?}", path))?;

        Ok(Self {
            writer: BufWriter::new(file),
            path: path.to_path_buf(),
        })
    }

    fn write_line(&mut self, value: &Value) -> Result<()> {
        writeln!(self.writer, "{}", value)?;
        self.writer.flush()?;
        if env::var(env_vars::FSYNC_VAR).unwrap_or_default() == "1" {
            self.writer.get_ref().sync_all()?;
        }
        Ok(())
    }
}

/// JSONL mirror of finished history entries.
///
/// Cloning shares the underlying file handle; writes are serialized.
#[derive(Clone)]
pub struct TraceSink {
    output: Arc<Mutex<TraceOutput>>,
    session_id: String,
    component: String,
}

impl TraceSink {
    pub fn open(path: impl AsRef<Path>, session_id: impl Into<String>) -> Result<Self> {
        let output = TraceOutput::open(path.as_ref())?;
        debug!("Opened trace sink at {:?}", output.path);
        Ok(Self {
            output: Arc::new(Mutex::new(output)),
            session_id: session_id.into(),
            component: "dispatcher".to_string(),
        })
    }

    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = component.into();
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn path(&self) -> PathBuf {
        self.output.lock().path.clone()
    }

    pub fn record(&self, entry: &HistoryEntry) -> Result<()> {
        self.record_with(entry, None)
    }

    /// Write `entry`, merging the top-level keys of `extra` into the record.
    pub fn record_with(&self, entry: &HistoryEntry, extra: Option<&Value>) -> Result<()> {
        let mut value = entry_to_json(entry, &self.session_id, &self.component);
        if let (Some(obj), Some(Value::Object(extra))) = (value.as_object_mut(), extra) {
            for (key, val) in extra {
                obj.insert(key.clone(), val.clone());
            }
        }
        self.output.lock().write_line(&value)
    }
}

/// Render a history entry as a single trace record.
pub fn entry_to_json(entry: &HistoryEntry, session_id: &str, component: &str) -> Value {
    let mut record = Map::new();
    record.insert(log_schema::SEQUENCE.into(), json!(entry.seq));
    record.insert(log_schema::TIMESTAMP.into(), json!(entry.ts.to_rfc3339()));
    record.insert(log_schema::SESSION_ID.into(), json!(session_id));
    record.insert(log_schema::COMPONENT.into(), json!(component));
    record.insert(
        log_schema::ARGV.into(),
        json!(redact_argv(&entry.request.argv)),
    );
    record.insert(log_schema::CWD.into(), json!(entry.request.cwd));
    record.insert(log_schema::OUTCOME.into(), json!(entry.outcome.as_str()));

    match &entry.outcome {
        EntryOutcome::Resolved { route, exit_code } => {
            record.insert(log_schema::ROUTE.into(), json!(route));
            record.insert(log_schema::EXIT_CODE.into(), json!(exit_code));
        }
        EntryOutcome::GeneratorFailed { route, message } => {
            record.insert(log_schema::ROUTE.into(), json!(route));
            record.insert(log_schema::ERROR.into(), json!(message));
        }
        EntryOutcome::NoRoute | EntryOutcome::Pending => {}
    }

    Value::Object(record)
}

/// Read every record of a JSONL trace file, skipping blank lines.
pub fn read_trace(path: impl AsRef<Path>) -> Result<Vec<Value>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("Failed to open trace {:?}", path))?;

    let mut records = Vec::new();
    for (lineno, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let value = serde_json::from_str(&line)
            .with_context(|| format!("Invalid trace record at {:?}:{}", path, lineno + 1))?;
        records.push(value);
    }
    Ok(records)
}
