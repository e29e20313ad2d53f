//! Minimal metrics registry for the client pipeline.
//!
//! No external metrics dependencies are used; this module provides counters
//! with dynamic labels backed by `DashMap`. Labels are flattened into sorted
//! key vectors to keep deterministic ordering.

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use weerelay_proto::ErrorKind;

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

#[derive(Default)]
pub struct CounterVec {
    map: DashMap<Vec<(String, String)>, AtomicU64>,
}

impl CounterVec {
    /// Increment by 1.
    pub fn inc(&self, labels: &[(&str, &str)]) {
        self.add(labels, 1);
    }

    pub fn add(&self, labels: &[(&str, &str)], v: u64) {
        let key = Self::key(labels);
        self.map
            .entry(key)
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(v, Ordering::Relaxed);
    }

    pub fn get(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&Self::key(labels))
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn key(labels: &[(&str, &str)]) -> Vec<(String, String)> {
        let mut key: Vec<(String, String)> = labels
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        key.sort();
        key
    }

    fn render_into(&self, name: &str, out: &mut String) {
        for entry in self.map.iter() {
            let labels = entry
                .key()
                .iter()
                .map(|(k, v)| format!("{k}=\"{}\"", escape_label(v)))
                .collect::<Vec<_>>()
                .join(",");
            let value = entry.value().load(Ordering::Relaxed);
            let _ = writeln!(out, "{name}{{{labels}}} {value}");
        }
    }
}

/// Counters covering the whole decode/apply pipeline.
#[derive(Default)]
pub struct PipelineMetrics {
    frames_total: AtomicU64,
    bytes_total: AtomicU64,
    errors_total: CounterVec,
    mutations_ignored_total: AtomicU64,
    lines_evicted_total: AtomicU64,
    changes_dropped_total: AtomicU64,
}

impl PipelineMetrics {
    pub fn new() -> PipelineMetrics {
        PipelineMetrics::default()
    }

    pub fn frame(&self) {
        self.frames_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bytes_in(&self, n: usize) {
        self.bytes_total.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub fn error(&self, kind: ErrorKind) {
        self.errors_total.inc(&[("kind", kind.as_str())]);
    }

    /// A mutation targeted state the session does not hold.
    pub fn orphan(&self) {
        self.mutations_ignored_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn eviction(&self) {
        self.lines_evicted_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn change_dropped(&self) {
        self.changes_dropped_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn frames(&self) -> u64 {
        self.frames_total.load(Ordering::Relaxed)
    }

    pub fn errors(&self, kind: ErrorKind) -> u64 {
        self.errors_total.get(&[("kind", kind.as_str())])
    }

    pub fn ignored(&self) -> u64 {
        self.mutations_ignored_total.load(Ordering::Relaxed)
    }

    /// Prometheus text format.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "weerelay_frames_total {}",
            self.frames_total.load(Ordering::Relaxed)
        );
        let _ = writeln!(
            out,
            "weerelay_bytes_total {}",
            self.bytes_total.load(Ordering::Relaxed)
        );
        self.errors_total
            .render_into("weerelay_errors_total", &mut out);
        let _ = writeln!(
            out,
            "weerelay_mutations_ignored_total {}",
            self.mutations_ignored_total.load(Ordering::Relaxed)
        );
        let _ = writeln!(
            out,
            "weerelay_lines_evicted_total {}",
            self.lines_evicted_total.load(Ordering::Relaxed)
        );
        let _ = writeln!(
            out,
            "weerelay_changes_dropped_total {}",
            self.changes_dropped_total.load(Ordering::Relaxed)
        );
        out
    }
}
