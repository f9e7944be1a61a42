//! Audit trail of step executions.
//!
//! Log entries live in the run state, where they are persisted with every
//! checkpoint. The audit layer additionally mirrors each new entry to a
//! tracing event and, when configured, to a daily JSON Lines file.

use crate::state::{LogEntry, RunState};
use async_trait::async_trait;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use workflow_core::{Result, Step};

/// Destination for step log entries
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, entries: &[LogEntry]) -> std::io::Result<()>;
}

/// Appends entries to `<dir>/run_YYYYMMDD.jsonl`, one JSON object per line
#[derive(Debug, Clone)]
pub struct JsonlAuditSink {
    dir: PathBuf,
    // Serializes appends from concurrently running threads
    write_lock: Arc<tokio::sync::Mutex<()>>,
}

impl JsonlAuditSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// Today's log file
    pub fn current_file(&self) -> PathBuf {
        self.dir.join(format!("run_{}.jsonl", Utc::now().format("%Y%m%d")))
    }
}

#[async_trait]
impl AuditSink for JsonlAuditSink {
    async fn record(&self, entries: &[LogEntry]) -> std::io::Result<()> {
        let mut buf = Vec::new();
        for entry in entries {
            serde_json::to_writer(&mut buf, entry)?;
            buf.push(b'\n');
        }

        let _guard = self.write_lock.lock().await;
        tokio::fs::create_dir_all(&self.dir).await?;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.current_file())
            .await?;
        file.write_all(&buf).await?;
        file.flush().await
    }
}

/// Wraps a step and reports the log entries it appended
pub struct AuditedStep {
    inner: Arc<dyn Step<RunState>>,
    sink: Option<Arc<dyn AuditSink>>,
}

impl AuditedStep {
    pub fn new(inner: Arc<dyn Step<RunState>>, sink: Option<Arc<dyn AuditSink>>) -> Self {
        Self { inner, sink }
    }
}

#[async_trait]
impl Step<RunState> for AuditedStep {
    async fn run(&self, state: RunState) -> Result<RunState> {
        let before = state.node_logs.len();
        let state = self.inner.run(state).await?;
        let appended = state.node_logs.get(before..).unwrap_or_default();

        for entry in appended {
            tracing::info!(
                node = %entry.node,
                inputs = %entry.inputs,
                outputs = %entry.outputs,
                model = entry.model_settings.as_ref().and_then(|m| m.model.as_deref()).unwrap_or("-"),
                human_decision = entry.human_decision.as_ref().map(|h| h.decision.as_str()).unwrap_or("-"),
                "Node executed"
            );
        }

        if let Some(sink) = &self.sink {
            if let Err(e) = sink.record(appended).await {
                tracing::warn!(error = %e, "Failed to write audit log");
            }
        }
        Ok(state)
    }
}
