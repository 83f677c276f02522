use std::time;

/// Measures how long one source took to read and reports it with `debug!`
/// when it is above the threshold.
pub struct Stopwatch {
    start:     time::Instant,
    name:      String,
    threshold: time::Duration,
    lines:     usize,
    stopped:   bool,
}

impl Stopwatch {
    pub fn new<S: Into<String>>(name: S, threshold_ms: u64) -> Self {
        let name = name.into();
        Stopwatch {
            name,
            start: time::Instant::now(),
            threshold: time::Duration::from_millis(threshold_ms),
            lines: 0,
            stopped: false,
        }
    }

    pub fn tick(&mut self) {
        self.lines += 1;
    }

    pub fn stop(&mut self) -> time::Duration {
        let elapsed = self.start.elapsed();
        if self.stopped {
            return elapsed;
        }
        self.stopped = true;
        if elapsed >= self.threshold {
            debug!("<STOPWATCH> {}: {} lines in {:?}", self.name, self.lines, elapsed);
        }
        elapsed
    }
}

impl Drop for Stopwatch {
    fn drop(&mut self) {
        self.stop();
    }
}
