//! Diagnostic sinks. None of them may disturb stream processing, so every
//! failure is logged and swallowed here.

use crate::domain::model::DiagnosticSnapshot;
use crate::domain::ports::DiagnosticSink;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

/// 不輸出
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDiagnostics;

impl DiagnosticSink for NullDiagnostics {
    fn record(&mut self, _snapshot: &DiagnosticSnapshot) {}
}

/// 以 debug 等級把快照寫進 tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl DiagnosticSink for TracingDiagnostics {
    fn record(&mut self, snapshot: &DiagnosticSnapshot) {
        match serde_json::to_string(snapshot) {
            Ok(json) => tracing::debug!(target: "shelf_weight::diagnostics", "{}", json),
            Err(e) => tracing::warn!("Failed to serialize diagnostic snapshot: {}", e),
        }
    }
}

/// 一行一筆 JSON 附加到檔案
pub struct JsonLinesDiagnostics {
    writer: BufWriter<File>,
    failed: bool,
}

impl JsonLinesDiagnostics {
    pub fn open<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            failed: false,
        })
    }

    fn write_snapshot(&mut self, snapshot: &DiagnosticSnapshot) -> std::io::Result<()> {
        serde_json::to_writer(&mut self.writer, snapshot)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }
}

impl DiagnosticSink for JsonLinesDiagnostics {
    fn record(&mut self, snapshot: &DiagnosticSnapshot) {
        if let Err(e) = self.write_snapshot(snapshot) {
            // 只警告一次，避免每行都刷一次
            if !self.failed {
                tracing::warn!("Diagnostic log write failed, continuing without it: {}", e);
                self.failed = true;
            }
        }
    }
}

/// 保存在記憶體，clone 共用
#[derive(Debug, Default, Clone)]
pub struct MemoryDiagnostics {
    snapshots: Arc<Mutex<Vec<DiagnosticSnapshot>>>,
}

impl MemoryDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshots(&self) -> Vec<DiagnosticSnapshot> {
        self.snapshots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl DiagnosticSink for MemoryDiagnostics {
    fn record(&mut self, snapshot: &DiagnosticSnapshot) {
        self.snapshots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(snapshot.clone());
    }
}
