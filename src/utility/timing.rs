// ============================================
// TIMING UTILITY - Stage Measurement
// ============================================
// Usage:
//   1. Wrapper: let result = timed("pipeline", || { /* code */ });
//   2. Manual:  let timer = Timer::start("fetch SPX"); ... timer.stop();
//   3. Batch:   AggregateTimer::record(duration) then summary()
// ============================================

use std::time::{Duration, Instant};
use tracing::info;

/// Timer for measuring execution time, reported through `tracing`
pub struct Timer {
    name: String,
    start: Instant,
    threshold_ms: u128,
    reported: bool,
}

impl Timer {
    pub fn start(name: impl Into<String>) -> Self {
        Self::start_with_threshold(name, 0)
    }

    /// Only logs if execution exceeds threshold (in milliseconds)
    pub fn start_with_threshold(name: impl Into<String>, threshold_ms: u128) -> Self {
        Self {
            name: name.into(),
            start: Instant::now(),
            threshold_ms,
            reported: false,
        }
    }

    /// Stop the timer and log the result
    pub fn stop(mut self) -> Duration {
        let duration = self.start.elapsed();
        self.report(duration);
        duration
    }

    fn report(&mut self, duration: Duration) {
        if self.reported {
            return;
        }
        self.reported = true;

        let ms = duration.as_millis();
        if ms < self.threshold_ms {
            return;
        }
        info!(stage = %self.name, elapsed_ms = ms as u64, speed = speed_label(ms), "timing");
    }
}

fn speed_label(ms: u128) -> &'static str {
    match ms {
        0..=100 => "fast",
        101..=1000 => "ok",
        1001..=5000 => "slow",
        _ => "very slow",
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        self.report(duration);
    }
}

/// Time a synchronous closure
pub fn timed<F, R>(name: impl Into<String>, f: F) -> R
where
    F: FnOnce() -> R,
{
    let timer = Timer::start(name);
    let result = f();
    timer.stop();
    result
}

// ============================================
// AGGREGATE TIMING FOR BATCH OPERATIONS
// ============================================

pub struct AggregateTimer {
    name: String,
    count: usize,
    total_duration: Duration,
    min_duration: Option<Duration>,
    max_duration: Option<Duration>,
}

impl AggregateTimer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            count: 0,
            total_duration: Duration::ZERO,
            min_duration: None,
            max_duration: None,
        }
    }

    pub fn record(&mut self, duration: Duration) {
        self.count += 1;
        self.total_duration += duration;
        self.min_duration = Some(self.min_duration.map_or(duration, |min| min.min(duration)));
        self.max_duration = Some(self.max_duration.map_or(duration, |max| max.max(duration)));
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn avg_duration(&self) -> Option<Duration> {
        if self.count == 0 {
            None
        } else {
            Some(self.total_duration / self.count as u32)
        }
    }

    pub fn summary(&self) {
        if self.count == 0 {
            info!(name = %self.name, "no operations recorded");
            return;
        }
        info!(
            name = %self.name,
            count = self.count,
            total_ms = self.total_duration.as_millis() as u64,
            avg_ms = self.avg_duration().map(|d| d.as_millis() as u64),
            min_ms = self.min_duration.map(|d| d.as_millis() as u64),
            max_ms = self.max_duration.map(|d| d.as_millis() as u64),
            "timing summary"
        );
    }
}
