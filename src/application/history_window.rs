// History window - Fixed-capacity buffer of recent readings
use crate::application::metric_sampler::MetricSampler;
use crate::domain::metric::Metric;
use rand::Rng;
use std::collections::VecDeque;

pub const DEFAULT_CAPACITY: usize = 50;

#[derive(Debug, Clone)]
pub struct HistoryWindow {
    points: VecDeque<Metric>,
    capacity: usize,
}

impl Default for HistoryWindow {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl HistoryWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Build a window pre-filled with `points` synthetic readings walked from
    /// `baseline`, timestamped `interval_ms` apart and ending just before `now_ms`.
    /// Only the newest `capacity` of them are kept.
    pub fn seeded<R: Rng>(
        capacity: usize,
        baseline: &Metric,
        points: usize,
        interval_ms: i64,
        now_ms: i64,
        rng: &mut R,
    ) -> Self {
        let mut window = Self::new(capacity);
        let mut metric = baseline.clone();

        for i in 0..points {
            let timestamp = now_ms - (points - i) as i64 * interval_ms;
            metric = MetricSampler::next(&metric, timestamp, rng);
            window.push(metric.clone());
        }

        window
    }

    /// Append a reading, evicting the oldest one once the window is full.
    pub fn push(&mut self, metric: Metric) {
        self.points.push_back(metric);
        if self.points.len() > self.capacity {
            self.points.pop_front();
        }
    }

    /// Readings oldest first.
    pub fn snapshot(&self) -> Vec<Metric> {
        self.points.iter().cloned().collect()
    }

    #[cfg(test)]
    pub fn latest(&self) -> Option<&Metric> {
        self.points.back()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[cfg(test)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}
