use std::time::{Duration, Instant};

/// Counts processed records and logs a line every `interval` of them
#[derive(Debug)]
pub struct ProgressTracker {
    interval: u64,
    processed: u64,
    reports: u64,
    started: Instant,
}

impl ProgressTracker {
    /// `interval == 0` disables the periodic lines
    pub fn new(interval: u64) -> Self {
        Self {
            interval,
            processed: 0,
            reports: 0,
            started: Instant::now(),
        }
    }

    pub fn record(&mut self) {
        self.processed += 1;
        if self.interval > 0 && self.processed % self.interval == 0 {
            self.reports += 1;
            log::info!(
                "Processed {} records. Elapsed time: {:.2?}",
                self.processed,
                self.started.elapsed()
            );
        }
    }

    pub fn processed(&self) -> u64 {
        self.processed
    }

    /// Number of progress lines emitted so far
    pub fn reports(&self) -> u64 {
        self.reports
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
