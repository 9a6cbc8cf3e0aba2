use std::time::{Duration, Instant};

const LOG_EVERY: Duration = Duration::from_secs(5);

/// Periodic progress logging for a collection pass.
#[derive(Debug)]
pub struct Progress {
    total: usize,
    done: usize,
    started: Instant,
    last_logged: Instant,
}

impl Progress {
    pub fn new(total: usize) -> Self {
        let now = Instant::now();
        Self {
            total,
            done: 0,
            started: now,
            last_logged: now,
        }
    }

    pub fn done(&self) -> usize {
        self.done
    }

    /// Terms completed per second since the pass started.
    pub fn rate(&self) -> f64 {
        let elapsed = self.started.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.done as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Count one completed term; logs at most every few seconds, and always
    /// for the last one.
    pub fn tick(&mut self) {
        self.done += 1;
        if self.done < self.total && self.last_logged.elapsed() < LOG_EVERY {
            return;
        }
        self.last_logged = Instant::now();
        tracing::info!(
            done = self.done,
            total = self.total,
            percent = format!("{:.1}", 100.0 * self.done as f64 / self.total.max(1) as f64),
            rate = format!("{:.2}it/s", self.rate()),
            "Collecting data"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_counts() {
        let mut progress = Progress::new(3);
        progress.tick();
        progress.tick();
        assert_eq!(progress.done(), 2);
        assert!(progress.rate() >= 0.0);
    }
}
