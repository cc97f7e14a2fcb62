use anyhow::Result;
use metrics::{counter, gauge, histogram};
use std::time::Duration;
use tracing::info;

/// Metrics collection and management
///
/// Every event is forwarded to the `metrics` facade and also tallied locally,
/// so a run can log a summary without an exporter installed.
#[derive(Debug, Default, Clone)]
pub struct MetricsCollector {
    pub chats_parsed_total: u64,
    pub messages_parsed_total: u64,
    pub lines_skipped_total: u64,
    pub cache_hits_total: u64,
    pub cache_misses_total: u64,
    pub analyses_total: u64,
    pub export_operations_total: u64,
    pub messages_exported_total: u64,
    pub errors_total: u64,
}

impl MetricsCollector {
    /// Install the no-op recorder so the facade has a sink
    pub fn init() -> Result<()> {
        metrics::set_global_recorder(metrics::NoopRecorder)
            .map_err(|_| anyhow::anyhow!("Failed to initialize metrics recorder: already set"))?;
        Ok(())
    }

    /// Record a parse of a chat export
    pub fn record_parse(&mut self, messages: usize, skipped_lines: usize, duration: Duration) {
        self.chats_parsed_total += 1;
        self.messages_parsed_total += messages as u64;
        self.lines_skipped_total += skipped_lines as u64;

        counter!("chat_analyzer_chats_parsed_total").increment(1);
        counter!("chat_analyzer_messages_parsed_total").increment(messages as u64);
        counter!("chat_analyzer_lines_skipped_total").increment(skipped_lines as u64);
        histogram!("chat_analyzer_parse_duration_seconds").record(duration.as_secs_f64());
    }

    /// Record a cache lookup
    pub fn record_cache_lookup(&mut self, hit: bool) {
        if hit {
            self.cache_hits_total += 1;
        } else {
            self.cache_misses_total += 1;
        }
        counter!("chat_analyzer_cache_lookups_total", "result" => if hit { "hit" } else { "miss" }).increment(1);
    }

    /// Record an analysis run
    pub fn record_analysis(&mut self, kind: &str, rows: usize, duration: Duration) {
        self.analyses_total += 1;

        counter!("chat_analyzer_analyses_total", "kind" => kind.to_string()).increment(1);
        histogram!("chat_analyzer_analysis_duration_seconds", "kind" => kind.to_string())
            .record(duration.as_secs_f64());
        gauge!("chat_analyzer_view_rows").set(rows as f64);
    }

    /// Record a record-set export
    pub fn record_export(&mut self, format: &str, messages: usize, bytes: u64) {
        self.export_operations_total += 1;
        self.messages_exported_total += messages as u64;

        counter!("chat_analyzer_exports_total", "format" => format.to_string()).increment(1);
        counter!("chat_analyzer_messages_exported_total").increment(messages as u64);
        histogram!("chat_analyzer_export_file_size_bytes").record(bytes as f64);
    }

    /// Record error metrics
    pub fn record_error(&mut self, error_type: &str, operation: &str) {
        self.errors_total += 1;
        counter!(
            "chat_analyzer_errors_total",
            "type" => error_type.to_string(),
            "operation" => operation.to_string()
        )
        .increment(1);
    }

    /// Cache hit ratio in `[0, 1]`, `None` before the first lookup
    #[must_use]
    pub fn cache_hit_ratio(&self) -> Option<f64> {
        let lookups = self.cache_hits_total + self.cache_misses_total;
        (lookups > 0).then(|| self.cache_hits_total as f64 / lookups as f64)
    }

    /// Log the local tallies
    pub fn log_summary(&self) {
        info!(
            chats_parsed = self.chats_parsed_total,
            messages_parsed = self.messages_parsed_total,
            lines_skipped = self.lines_skipped_total,
            cache_hits = self.cache_hits_total,
            cache_misses = self.cache_misses_total,
            analyses = self.analyses_total,
            exports = self.export_operations_total,
            errors = self.errors_total,
            "Run metrics"
        );
    }
}

/// Performance timing wrapper for metrics
pub struct MetricsTimer {
    operation: String,
    start: std::time::Instant,
}

impl MetricsTimer {
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            start: std::time::Instant::now(),
        }
    }

    /// Record the elapsed time as an analysis of `rows` rows
    pub fn finish_analysis(self, collector: &mut MetricsCollector, rows: usize) -> Duration {
        let duration = self.start.elapsed();
        collector.record_analysis(&self.operation, rows, duration);
        duration
    }

    /// Elapsed time since the timer started
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}
