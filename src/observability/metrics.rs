//! Thread-safe metrics collection system
//!
//! Atomic counters for the hot request path plus mutex-protected maps for
//! per-agent statistics, exposed as a serializable snapshot.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Processing-time samples kept for percentile calculation
const MAX_PROCESSING_SAMPLES: usize = 1000;

/// Global metrics collector instance
pub static METRICS: Lazy<MetricsCollector> = Lazy::new(MetricsCollector::new);

/// Get reference to global metrics collector
pub fn metrics() -> &'static MetricsCollector {
    &METRICS
}

#[derive(Debug, Default, Clone)]
struct AgentStats {
    requests: u64,
    completed: u64,
    rejected: u64,
    failed: u64,
    processing_times: Vec<u64>,
}

/// Thread-safe metrics collector using atomics and mutexes
pub struct MetricsCollector {
    requests_received: AtomicU64,
    requests_in_flight: AtomicU64,
    requests_completed: AtomicU64,
    requests_rejected: AtomicU64,
    requests_failed: AtomicU64,
    validation_failures: AtomicU64,

    stage1_calls: AtomicU64,
    stage2_calls: AtomicU64,
    generation_failures: AtomicU64,

    processing_times: Mutex<Vec<u64>>,
    agent_stats: Mutex<HashMap<String, AgentStats>>,
    failure_kinds: Mutex<HashMap<String, u64>>,

    started_at: Mutex<Instant>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            requests_received: AtomicU64::new(0),
            requests_in_flight: AtomicU64::new(0),
            requests_completed: AtomicU64::new(0),
            requests_rejected: AtomicU64::new(0),
            requests_failed: AtomicU64::new(0),
            validation_failures: AtomicU64::new(0),
            stage1_calls: AtomicU64::new(0),
            stage2_calls: AtomicU64::new(0),
            generation_failures: AtomicU64::new(0),
            processing_times: Mutex::new(Vec::new()),
            agent_stats: Mutex::new(HashMap::new()),
            failure_kinds: Mutex::new(HashMap::new()),
            started_at: Mutex::new(Instant::now()),
        }
    }

    // Request lifecycle

    pub fn request_received(&self, agent_id: &str) {
        self.requests_received.fetch_add(1, Ordering::Relaxed);
        self.requests_in_flight.fetch_add(1, Ordering::Relaxed);
        self.with_agent(agent_id, |stats| stats.requests += 1);
    }

    pub fn request_completed(&self, agent_id: &str, duration: Duration) {
        self.requests_completed.fetch_add(1, Ordering::Relaxed);
        self.finish_request(agent_id, duration, |stats| stats.completed += 1);
    }

    /// Negative classification: a success, counted apart from completions
    pub fn request_rejected(&self, agent_id: &str, duration: Duration) {
        self.requests_rejected.fetch_add(1, Ordering::Relaxed);
        self.finish_request(agent_id, duration, |stats| stats.rejected += 1);
    }

    pub fn request_failed(&self, agent_id: &str, error_kind: &str, duration: Duration) {
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut kinds) = self.failure_kinds.lock() {
            *kinds.entry(error_kind.to_string()).or_insert(0) += 1;
        }
        self.finish_request(agent_id, duration, |stats| stats.failed += 1);
    }

    pub fn validation_failed(&self) {
        self.validation_failures.fetch_add(1, Ordering::Relaxed);
    }

    // Generation calls

    pub fn stage1_invoked(&self) {
        self.stage1_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stage2_invoked(&self) {
        self.stage2_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn generation_failed(&self) {
        self.generation_failures.fetch_add(1, Ordering::Relaxed);
    }

    fn finish_request<F: FnOnce(&mut AgentStats)>(
        &self,
        agent_id: &str,
        duration: Duration,
        update: F,
    ) {
        // Saturating: a snapshot reset can race with in-flight requests
        let _ = self
            .requests_in_flight
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| {
                Some(n.saturating_sub(1))
            });

        let millis = duration.as_millis() as u64;
        if let Ok(mut times) = self.processing_times.lock() {
            push_bounded(&mut times, millis);
        }
        self.with_agent(agent_id, |stats| {
            update(stats);
            push_bounded(&mut stats.processing_times, millis);
        });
    }

    fn with_agent<F: FnOnce(&mut AgentStats)>(&self, agent_id: &str, update: F) {
        if let Ok(mut agents) = self.agent_stats.lock() {
            update(agents.entry(agent_id.to_string()).or_default());
        }
    }

    /// Reset all metrics (useful for testing)
    pub fn reset(&self) {
        for counter in [
            &self.requests_received,
            &self.requests_in_flight,
            &self.requests_completed,
            &self.requests_rejected,
            &self.requests_failed,
            &self.validation_failures,
            &self.stage1_calls,
            &self.stage2_calls,
            &self.generation_failures,
        ] {
            counter.store(0, Ordering::Relaxed);
        }

        if let Ok(mut times) = self.processing_times.lock() {
            times.clear();
        }
        if let Ok(mut agents) = self.agent_stats.lock() {
            agents.clear();
        }
        if let Ok(mut kinds) = self.failure_kinds.lock() {
            kinds.clear();
        }
        if let Ok(mut started) = self.started_at.lock() {
            *started = Instant::now();
        }
    }

    fn uptime_seconds(&self) -> u64 {
        self.started_at
            .lock()
            .map(|started| started.elapsed().as_secs())
            .unwrap_or(0)
    }

    /// Get current metrics snapshot
    pub fn get_metrics(&self) -> MetricsSnapshot {
        let timing = self
            .processing_times
            .lock()
            .map(|times| TimingStats::from_samples(&times))
            .unwrap_or_default();

        let agents = self
            .agent_stats
            .lock()
            .map(|agents| {
                agents
                    .iter()
                    .map(|(id, stats)| {
                        (
                            id.clone(),
                            AgentMetrics {
                                requests: stats.requests,
                                completed: stats.completed,
                                rejected: stats.rejected,
                                failed: stats.failed,
                                timing: TimingStats::from_samples(&stats.processing_times),
                            },
                        )
                    })
                    .collect()
            })
            .unwrap_or_default();

        let failures_by_kind = self
            .failure_kinds
            .lock()
            .map(|kinds| kinds.clone())
            .unwrap_or_default();

        MetricsSnapshot {
            timestamp: chrono::Utc::now().to_rfc3339(),
            uptime_seconds: self.uptime_seconds(),
            requests: RequestMetrics {
                received: self.requests_received.load(Ordering::Relaxed),
                in_flight: self.requests_in_flight.load(Ordering::Relaxed),
                completed: self.requests_completed.load(Ordering::Relaxed),
                rejected: self.requests_rejected.load(Ordering::Relaxed),
                failed: self.requests_failed.load(Ordering::Relaxed),
                validation_failures: self.validation_failures.load(Ordering::Relaxed),
                failures_by_kind,
                timing,
            },
            generation: GenerationMetrics {
                stage1_calls: self.stage1_calls.load(Ordering::Relaxed),
                stage2_calls: self.stage2_calls.load(Ordering::Relaxed),
                failures: self.generation_failures.load(Ordering::Relaxed),
            },
            agents,
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Complete metrics snapshot
#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub timestamp: String,
    pub uptime_seconds: u64,
    pub requests: RequestMetrics,
    pub generation: GenerationMetrics,
    pub agents: HashMap<String, AgentMetrics>,
}

#[derive(Debug, Serialize)]
pub struct RequestMetrics {
    pub received: u64,
    pub in_flight: u64,
    pub completed: u64,
    pub rejected: u64,
    pub failed: u64,
    pub validation_failures: u64,
    pub failures_by_kind: HashMap<String, u64>,
    pub timing: TimingStats,
}

#[derive(Debug, Serialize)]
pub struct GenerationMetrics {
    pub stage1_calls: u64,
    pub stage2_calls: u64,
    pub failures: u64,
}

#[derive(Debug, Serialize)]
pub struct AgentMetrics {
    pub requests: u64,
    pub completed: u64,
    pub rejected: u64,
    pub failed: u64,
    pub timing: TimingStats,
}

/// Processing-time summary in milliseconds
#[derive(Debug, Default, Clone, Serialize)]
pub struct TimingStats {
    pub avg_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
}

impl TimingStats {
    /// Summarise samples (pure function)
    fn from_samples(samples: &[u64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let mut sorted = samples.to_vec();
        sorted.sort_unstable();

        Self {
            avg_ms: sorted.iter().sum::<u64>() as f64 / sorted.len() as f64,
            p50_ms: percentile(&sorted, 50.0),
            p95_ms: percentile(&sorted, 95.0),
            p99_ms: percentile(&sorted, 99.0),
        }
    }
}

fn push_bounded(samples: &mut Vec<u64>, value: u64) {
    samples.push(value);
    if samples.len() > MAX_PROCESSING_SAMPLES {
        samples.remove(0);
    }
}

fn percentile(sorted_data: &[u64], percentile: f64) -> f64 {
    if sorted_data.is_empty() {
        return 0.0;
    }

    let index = (percentile / 100.0) * (sorted_data.len() - 1) as f64;
    let lower = sorted_data[index.floor() as usize] as f64;
    let upper = sorted_data[index.ceil() as usize] as f64;

    lower + (upper - lower) * index.fract()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_request_outcomes_are_counted_separately() {
        let collector = MetricsCollector::new();

        collector.request_received("agent-sdr-analysis");
        collector.request_rejected("agent-sdr-analysis", Duration::from_millis(20));
        collector.request_received("agent-sdr-analysis");
        collector.request_completed("agent-sdr-analysis", Duration::from_millis(1500));
        collector.request_received("agent-sdr");
        collector.request_failed("agent-sdr", "invalid_input", Duration::from_millis(1));

        let metrics = collector.get_metrics();
        assert_eq!(metrics.requests.received, 3);
        assert_eq!(metrics.requests.in_flight, 0);
        assert_eq!(metrics.requests.completed, 1);
        assert_eq!(metrics.requests.rejected, 1);
        assert_eq!(metrics.requests.failed, 1);
        assert_eq!(metrics.requests.failures_by_kind["invalid_input"], 1);

        let analysis = &metrics.agents["agent-sdr-analysis"];
        assert_eq!(analysis.requests, 2);
        assert_eq!(analysis.rejected, 1);
        assert!(analysis.timing.avg_ms > 700.0);
    }

    #[test]
    fn test_generation_metrics() {
        let collector = MetricsCollector::new();

        collector.stage1_invoked();
        collector.stage2_invoked();
        collector.stage1_invoked();
        collector.generation_failed();

        let metrics = collector.get_metrics();
        assert_eq!(metrics.generation.stage1_calls, 2);
        assert_eq!(metrics.generation.stage2_calls, 1);
        assert_eq!(metrics.generation.failures, 1);
    }

    #[test]
    fn test_thread_safety() {
        let collector = Arc::new(MetricsCollector::new());

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let collector = Arc::clone(&collector);
                thread::spawn(move || {
                    for _ in 0..100 {
                        collector.request_received("agent-sdr");
                        collector.stage2_invoked();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let metrics = collector.get_metrics();
        assert_eq!(metrics.requests.received, 1000);
        assert_eq!(metrics.generation.stage2_calls, 1000);
        assert_eq!(metrics.agents["agent-sdr"].requests, 1000);
    }

    #[test]
    fn test_percentile_calculation() {
        let data = vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10];

        assert!((percentile(&data, 50.0) - 5.5).abs() < 0.1);
        assert!((percentile(&data, 95.0) - 9.55).abs() < 0.1);
        assert!((percentile(&data, 0.0) - 1.0).abs() < 0.1);
        assert!((percentile(&data, 100.0) - 10.0).abs() < 0.1);
        assert_eq!(percentile(&[], 50.0), 0.0);
    }

    #[test]
    fn test_processing_time_bounds() {
        let mut samples = Vec::new();
        for i in 0..1500 {
            push_bounded(&mut samples, i);
        }

        assert_eq!(samples.len(), MAX_PROCESSING_SAMPLES);
        assert_eq!(samples[0], 500);
    }

    #[test]
    fn test_reset_functionality() {
        let collector = MetricsCollector::new();

        collector.request_received("agent-sdr-email");
        collector.validation_failed();
        collector.request_failed("agent-sdr-email", "invalid_input", Duration::from_millis(3));

        collector.reset();

        let metrics = collector.get_metrics();
        assert_eq!(metrics.requests.received, 0);
        assert_eq!(metrics.requests.validation_failures, 0);
        assert!(metrics.agents.is_empty());
        assert!(metrics.requests.failures_by_kind.is_empty());
    }
}
