//! Wall-clock measurement for runs and benchmarks

use std::time::{Duration, Instant};

/// Labelled timer; logs its reading at debug level when stopped
#[derive(Debug)]
pub struct Timer {
    label: String,
    start: Instant,
}

impl Timer {
    pub fn start(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            start: Instant::now(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed().as_millis() as u64
    }

    pub fn stop(self) -> Duration {
        let elapsed = self.elapsed();
        tracing::debug!(label = %self.label, elapsed_ms = elapsed.as_millis() as u64, "timer stopped");
        elapsed
    }
}

/// Time a closure, returning its value and how long it took
pub fn measure<R>(f: impl FnOnce() -> R) -> (R, Duration) {
    let start = Instant::now();
    let value = f();
    (value, start.elapsed())
}

/// Named laps over one continuous measurement
#[derive(Debug)]
pub struct Stopwatch {
    start: Instant,
    last: Instant,
    laps: Vec<(String, Duration)>,
}

impl Stopwatch {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last: now,
            laps: Vec::new(),
        }
    }

    /// Close the current lap; returns its own duration, not the cumulative one
    pub fn lap(&mut self, label: impl Into<String>) -> Duration {
        let now = Instant::now();
        let lap = now - self.last;
        self.last = now;
        self.laps.push((label.into(), lap));
        lap
    }

    pub fn laps(&self) -> &[(String, Duration)] {
        &self.laps
    }

    pub fn lap_named(&self, label: &str) -> Option<Duration> {
        self.laps
            .iter()
            .find(|(name, _)| name == label)
            .map(|(_, d)| *d)
    }

    pub fn total(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn format(&self) -> String {
        let mut output = String::new();
        for (label, duration) in &self.laps {
            output.push_str(&format!("{label}: {}ms\n", duration.as_millis()));
        }
        output.push_str(&format!("Total: {}ms", self.total().as_millis()));
        output
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_timer() {
        let timer = Timer::start("suite");
        sleep(Duration::from_millis(10));
        assert!(timer.elapsed_ms() >= 10);
        assert_eq!(timer.label(), "suite");
        assert!(timer.stop() >= Duration::from_millis(10));
    }

    #[test]
    fn test_measure() {
        let (value, elapsed) = measure(|| {
            sleep(Duration::from_millis(5));
            42
        });
        assert_eq!(value, 42);
        assert!(elapsed >= Duration::from_millis(5));
    }

    #[test]
    fn test_stopwatch_laps_are_not_cumulative() {
        let mut sw = Stopwatch::new();
        sleep(Duration::from_millis(20));
        sw.lap("sequential");
        sleep(Duration::from_millis(5));
        let second = sw.lap("concurrent");

        assert_eq!(sw.laps().len(), 2);
        assert!(second < Duration::from_millis(20));
        assert!(sw.lap_named("sequential").unwrap() >= Duration::from_millis(20));
        assert!(sw.lap_named("missing").is_none());
        assert!(sw.format().contains("Total:"));
    }
}
