// Mini-Disclaimer: Educational/experimental use; not investment advice or affiliation; see README & DISCLAIMER.
//! Structured telemetry: latency percentiles, monotonic counters and a
//! JSON-lines exporter for observability pipelines.

use crate::{clock::EngineClock, error::MartimError};
use fnv::FnvHashMap;
use serde::Serialize;
use serde_json::{json, Value};
use std::{
    collections::VecDeque,
    fs::{File, OpenOptions},
    io::{BufWriter, Write},
    path::Path,
    rc::Rc,
};

/// Per-adapter, per-operation latency percentile tracking.
///
/// Raw samples (seconds) are kept in a bounded ring buffer per
/// `(adapter, operation)` pair; percentiles are computed on demand.
#[derive(Debug)]
pub struct LatencyTracker {
    max_samples: usize,
    buckets: FnvHashMap<String, VecDeque<f64>>,
}

/// Percentile digest for one `(adapter, operation)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatencyDigest {
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
    pub mean: f64,
    pub count: usize,
}

impl Default for LatencyTracker {
    fn default() -> Self {
        Self::new(1_000)
    }
}

impl LatencyTracker {
    pub fn new(max_samples: usize) -> Self {
        Self {
            max_samples,
            buckets: FnvHashMap::default(),
        }
    }

    fn key(adapter: &str, operation: &str) -> String {
        format!("{adapter}:{operation}")
    }

    /// Records one latency observation in seconds.
    pub fn record(&mut self, adapter: &str, operation: &str, latency_s: f64) {
        let bucket = self
            .buckets
            .entry(Self::key(adapter, operation))
            .or_default();
        bucket.push_back(latency_s);
        if bucket.len() > self.max_samples {
            bucket.pop_front();
        }
    }

    /// Latency at percentile `pct` (0, 1], or 0.0 without data.
    pub fn percentile(&self, adapter: &str, operation: &str, pct: f64) -> f64 {
        let Some(bucket) = self.buckets.get(&Self::key(adapter, operation)) else {
            return 0.0;
        };
        if bucket.is_empty() {
            return 0.0;
        }
        let mut sorted: Vec<f64> = bucket.iter().copied().collect();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let index = ((pct * sorted.len() as f64).ceil() as usize).saturating_sub(1);
        sorted[index.min(sorted.len() - 1)]
    }

    pub fn mean(&self, adapter: &str, operation: &str) -> f64 {
        let Some(bucket) = self.buckets.get(&Self::key(adapter, operation)) else {
            return 0.0;
        };
        if bucket.is_empty() {
            return 0.0;
        }
        bucket.iter().sum::<f64>() / bucket.len() as f64
    }

    /// Digest of every tracked pair, keyed `adapter:operation`.
    pub fn summary(&self) -> FnvHashMap<String, LatencyDigest> {
        let mut result = FnvHashMap::default();
        for (key, bucket) in &self.buckets {
            if bucket.is_empty() {
                continue;
            }
            let mut sorted: Vec<f64> = bucket.iter().copied().collect();
            sorted.sort_by(|a, b| a.total_cmp(b));
            let n = sorted.len();
            let at = |pct: f64| {
                let index = ((pct * n as f64).ceil() as usize).saturating_sub(1);
                sorted[index.min(n - 1)]
            };
            result.insert(
                key.clone(),
                LatencyDigest {
                    p50: at(0.50),
                    p95: at(0.95),
                    p99: at(0.99),
                    mean: sorted.iter().sum::<f64>() / n as f64,
                    count: n,
                },
            );
        }
        result
    }

    pub fn reset(&mut self) {
        self.buckets.clear();
    }
}

/// Monotonic operational counters (orders sent, fills, reconnects, ...).
#[derive(Debug, Default)]
pub struct PerfCounters {
    counters: FnvHashMap<String, u64>,
}

impl PerfCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc(&mut self, name: &str) {
        self.add(name, 1);
    }

    pub fn add(&mut self, name: &str, amount: u64) {
        *self.counters.entry(name.to_owned()).or_insert(0) += amount;
    }

    pub fn get(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    pub fn snapshot(&self) -> FnvHashMap<String, u64> {
        self.counters.clone()
    }

    pub fn reset(&mut self) {
        self.counters.clear();
    }
}

/// Buffered JSON-lines telemetry sink: one `{ts, type, …}` object per line.
pub struct JsonlExporter {
    sink: Option<BufWriter<File>>,
    buffer: Vec<Value>,
    flush_interval_s: f64,
    last_flush_ns: i64,
    clock: Rc<dyn EngineClock>,
}

impl std::fmt::Debug for JsonlExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonlExporter")
            .field("buffered", &self.buffer.len())
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

impl JsonlExporter {
    /// Opens (appending) the sink file. Pass `None` to only log records.
    pub fn new(
        file_path: Option<&Path>,
        flush_interval_s: f64,
        clock: Rc<dyn EngineClock>,
    ) -> Result<Self, MartimError> {
        let sink = match file_path {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)
                        .map_err(|e| MartimError::Telemetry(e.to_string()))?;
                }
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|e| MartimError::Telemetry(e.to_string()))?;
                Some(BufWriter::new(file))
            }
            None => None,
        };
        Ok(Self {
            sink,
            buffer: Vec::new(),
            flush_interval_s,
            last_flush_ns: 0,
            clock,
        })
    }

    /// Buffers a telemetry record, auto-flushing once the interval elapsed.
    pub fn emit(&mut self, record_type: &str, data: Value) {
        let mut record = json!({
            "ts": self.clock.now_ns() as f64 / 1e9,
            "type": record_type,
        });
        if let (Some(target), Some(source)) = (record.as_object_mut(), data.as_object()) {
            for (key, value) in source {
                target.insert(key.clone(), value.clone());
            }
        }
        self.buffer.push(record);

        let now = self.clock.now_ns();
        if (now - self.last_flush_ns) as f64 / 1e9 >= self.flush_interval_s {
            if let Err(error) = self.flush() {
                tracing::warn!(%error, "telemetry flush failed");
            }
        }
    }

    /// Writes buffered records to the sink (or debug log without one).
    pub fn flush(&mut self) -> Result<(), MartimError> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        for record in self.buffer.drain(..) {
            match &mut self.sink {
                Some(writer) => {
                    serde_json::to_writer(&mut *writer, &record)
                        .map_err(|e| MartimError::Telemetry(e.to_string()))?;
                    writer
                        .write_all(b"\n")
                        .map_err(|e| MartimError::Telemetry(e.to_string()))?;
                }
                None => tracing::debug!(telemetry = %record),
            }
        }
        if let Some(writer) = &mut self.sink {
            writer
                .flush()
                .map_err(|e| MartimError::Telemetry(e.to_string()))?;
        }
        self.last_flush_ns = self.clock.now_ns();
        Ok(())
    }

    /// Exports a full snapshot of latencies and counters.
    pub fn export_snapshot(
        &mut self,
        latency: &LatencyTracker,
        counters: &PerfCounters,
    ) -> Result<(), MartimError> {
        let latencies = serde_json::to_value(latency.summary())
            .map_err(|e| MartimError::Telemetry(e.to_string()))?;
        self.emit("latency_summary", json!({ "latencies": latencies }));
        let counts = serde_json::to_value(counters.snapshot())
            .map_err(|e| MartimError::Telemetry(e.to_string()))?;
        self.emit("counters", json!({ "counters": counts }));
        self.flush()
    }

    /// Flushes and drops the file sink.
    pub fn close(&mut self) -> Result<(), MartimError> {
        self.flush()?;
        self.sink = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SimClock;

    #[test]
    fn test_latency_percentiles() {
        let mut tracker = LatencyTracker::new(100);
        for i in 1..=100 {
            tracker.record("venue", "quote", i as f64 / 1000.0);
        }

        assert_eq!(tracker.percentile("venue", "quote", 0.50), 0.050);
        assert_eq!(tracker.percentile("venue", "quote", 0.99), 0.099);
        assert_eq!(tracker.percentile("venue", "quote", 1.0), 0.100);
        assert!((tracker.mean("venue", "quote") - 0.0505).abs() < 1e-12);
        assert_eq!(tracker.percentile("venue", "swap", 0.5), 0.0);
    }

    #[test]
    fn test_latency_ring_buffer_caps_samples() {
        let mut tracker = LatencyTracker::new(10);
        for i in 0..25 {
            tracker.record("a", "op", i as f64);
        }
        let summary = tracker.summary();
        assert_eq!(summary["a:op"].count, 10);
        // only the last 10 samples (15..24) remain
        assert_eq!(summary["a:op"].p50, 19.0);
    }

    #[test]
    fn test_counters() {
        let mut counters = PerfCounters::new();
        counters.inc("orders_sent");
        counters.add("orders_sent", 2);
        assert_eq!(counters.get("orders_sent"), 3);
        assert_eq!(counters.get("unknown"), 0);

        counters.reset();
        assert_eq!(counters.get("orders_sent"), 0);
    }

    #[test]
    fn test_jsonl_exporter_writes_one_record_per_line() {
        let dir = std::env::temp_dir().join("martim-telemetry-test");
        let path = dir.join("telemetry.jsonl");
        let _ = std::fs::remove_file(&path);

        let clock = Rc::new(SimClock::new(5_000_000_000));
        let mut exporter = JsonlExporter::new(Some(&path), 0.0, clock).unwrap();
        exporter.emit("counter", json!({ "orders": 2 }));
        exporter.emit("latency", json!({ "p99": 0.08 }));
        exporter.close().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["type"], "counter");
        assert_eq!(first["orders"], 2);
        assert_eq!(first["ts"], 5.0);

        let _ = std::fs::remove_file(&path);
    }
}
