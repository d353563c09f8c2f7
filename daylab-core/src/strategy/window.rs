//! Rolling-state building blocks shared by the strategy catalog.

use std::collections::VecDeque;

/// Fixed-capacity sliding window over the most recent values.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    capacity: usize,
    values: VecDeque<f64>,
}

impl RollingWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            values: VecDeque::with_capacity(capacity),
        }
    }

    /// Push a value, evicting the oldest one when full.
    pub fn push(&mut self, value: f64) {
        if self.capacity == 0 {
            return;
        }
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.capacity > 0 && self.values.len() == self.capacity
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &f64> + ExactSizeIterator {
        self.values.iter()
    }

    /// Values oldest-first, copied out.
    pub fn to_vec(&self) -> Vec<f64> {
        self.values.iter().copied().collect()
    }

    pub fn mean(&self) -> Option<f64> {
        mean(self.values.iter().copied(), self.values.len())
    }

    /// Mean of the newest `n` values.
    pub fn mean_last(&self, n: usize) -> Option<f64> {
        if n == 0 || n > self.values.len() {
            return None;
        }
        mean(self.values.iter().rev().take(n).copied(), n)
    }

    /// Sample standard deviation (n − 1 denominator).
    pub fn std_dev(&self) -> Option<f64> {
        let n = self.values.len();
        if n < 2 {
            return None;
        }
        let m = self.mean()?;
        let var = self.values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1) as f64;
        Some(var.sqrt())
    }

    pub fn max(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::max)
    }

    pub fn min(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::min)
    }
}

fn mean(values: impl Iterator<Item = f64>, n: usize) -> Option<f64> {
    if n == 0 {
        return None;
    }
    Some(values.sum::<f64>() / n as f64)
}

/// Linearly weighted mean, newest value weighted highest.
pub fn wma(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut weighted = 0.0;
    let mut weights = 0.0;
    for (i, v) in values.iter().enumerate() {
        let w = (i + 1) as f64;
        weighted += w * v;
        weights += w;
    }
    Some(weighted / weights)
}

/// Incremental exponential moving average with `alpha = 2 / (period + 1)`.
#[derive(Debug, Clone)]
pub struct Ema {
    alpha: f64,
    value: Option<f64>,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        Self::with_alpha(2.0 / (period as f64 + 1.0))
    }

    pub fn with_alpha(alpha: f64) -> Self {
        Self { alpha, value: None }
    }

    /// Start the average at an explicit value.
    pub fn seed(&mut self, value: f64) {
        self.value = Some(value);
    }

    pub fn update(&mut self, x: f64) -> f64 {
        let next = match self.value {
            Some(prev) => self.alpha * x + (1.0 - self.alpha) * prev,
            None => x,
        };
        self.value = Some(next);
        next
    }
}
