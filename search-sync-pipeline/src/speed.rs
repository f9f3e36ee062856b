//! Rolling throughput and ETA estimation for a batch run.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Samples kept in the rolling window.
pub const MAX_SPEED_SAMPLES: usize = 5;

/// Minimum spacing between two samples.
pub const SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

/// Below this many completed items no ETA is given.
pub const MIN_COMPLETED_FOR_ETA: u64 = 3;

/// Items-per-second estimator over a window of recent samples.
#[derive(Debug, Clone)]
pub struct SpeedEstimator {
    started_at: Instant,
    last_sample_at: Instant,
    processed_at_last_sample: u64,
    samples: VecDeque<f64>,
}

impl SpeedEstimator {
    pub fn new(now: Instant) -> Self {
        Self {
            started_at: now,
            last_sample_at: now,
            processed_at_last_sample: 0,
            samples: VecDeque::with_capacity(MAX_SPEED_SAMPLES),
        }
    }

    /// Take a sample if at least `SAMPLE_INTERVAL` passed since the last one.
    /// `processed` is the running total of finished items.
    pub fn record_at(&mut self, processed: u64, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(self.last_sample_at);
        if elapsed < SAMPLE_INTERVAL {
            return false;
        }

        let delta = processed.saturating_sub(self.processed_at_last_sample);
        self.samples.push_back(delta as f64 / elapsed.as_secs_f64());
        while self.samples.len() > MAX_SPEED_SAMPLES {
            self.samples.pop_front();
        }

        self.last_sample_at = now;
        self.processed_at_last_sample = processed;
        true
    }

    /// Mean of the window, or the whole-run average before the first sample.
    pub fn average_speed_at(&self, processed: u64, now: Instant) -> f64 {
        if !self.samples.is_empty() {
            return self.samples.iter().sum::<f64>() / self.samples.len() as f64;
        }

        let elapsed = now.saturating_duration_since(self.started_at).as_secs_f64();
        if elapsed > 0.0 {
            processed as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Seconds until `total` items are done. `None` while fewer than
    /// `MIN_COMPLETED_FOR_ETA` items finished or the speed is zero.
    pub fn eta_seconds_at(&self, completed: u64, total: u64, now: Instant) -> Option<u64> {
        if completed < MIN_COMPLETED_FOR_ETA {
            return None;
        }
        let speed = self.average_speed_at(completed, now);
        if speed <= 0.0 {
            return None;
        }
        let remaining = total.saturating_sub(completed) as f64;
        Some((remaining / speed).ceil() as u64)
    }

    pub fn samples(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }

    pub fn elapsed_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started_at)
    }
}

/// `"Ns"` under a minute, `"Mm Ss"` under an hour, else `"Hh Mm"`.
pub fn format_eta(seconds: u64) -> String {
    if seconds < 60 {
        format!("{seconds}s")
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_need_a_second() {
        let start = Instant::now();
        let mut speed = SpeedEstimator::new(start);
        assert!(!speed.record_at(3, start + Duration::from_millis(400)));
        assert!(speed.record_at(4, start + Duration::from_secs(2)));
        assert_eq!(speed.samples().collect::<Vec<_>>(), vec![2.0]);
    }

    #[test]
    fn test_window_is_bounded() {
        let start = Instant::now();
        let mut speed = SpeedEstimator::new(start);
        for i in 1..=8u64 {
            speed.record_at(i * i, start + Duration::from_secs(i));
        }
        let samples: Vec<f64> = speed.samples().collect();
        assert_eq!(samples.len(), MAX_SPEED_SAMPLES);
        // last sample: 64 - 49 over one second
        assert_eq!(samples[4], 15.0);
    }

    #[test]
    fn test_fallback_average_before_first_sample() {
        let start = Instant::now();
        let speed = SpeedEstimator::new(start);
        assert_eq!(speed.average_speed_at(1, start + Duration::from_millis(500)), 2.0);
        assert_eq!(speed.average_speed_at(0, start), 0.0);
    }

    #[test]
    fn test_eta_requires_three_completed() {
        let start = Instant::now();
        let mut speed = SpeedEstimator::new(start);
        let later = start + Duration::from_secs(2);
        speed.record_at(2, later);
        assert_eq!(speed.eta_seconds_at(2, 10, later), None);

        let mut speed = SpeedEstimator::new(start);
        speed.record_at(4, later);
        // 6 remaining at 2 items/s
        assert_eq!(speed.eta_seconds_at(4, 10, later), Some(3));
    }

    #[test]
    fn test_eta_omitted_at_zero_speed() {
        let start = Instant::now();
        let mut speed = SpeedEstimator::new(start);
        speed.record_at(3, start + Duration::from_secs(1));
        speed.record_at(3, start + Duration::from_secs(2));
        speed.record_at(3, start + Duration::from_secs(3));
        speed.record_at(3, start + Duration::from_secs(4));
        speed.record_at(3, start + Duration::from_secs(5));
        speed.record_at(3, start + Duration::from_secs(6));
        assert_eq!(speed.eta_seconds_at(3, 10, start + Duration::from_secs(6)), None);
    }

    #[test]
    fn test_format_eta() {
        assert_eq!(format_eta(0), "0s");
        assert_eq!(format_eta(59), "59s");
        assert_eq!(format_eta(61), "1m 1s");
        assert_eq!(format_eta(3599), "59m 59s");
        assert_eq!(format_eta(3600), "1h 0m");
        assert_eq!(format_eta(7325), "2h 2m");
    }
}
