// Mini-Disclaimer: Educational/experimental use; not investment advice or affiliation; see README & DISCLAIMER.
//! Shared building blocks among strategies.

use rust_decimal::Decimal;
use std::collections::VecDeque;

/// Bounded ordered series of observations.
///
/// Capacity caps memory under infinite input; strategies size it at a small
/// multiple of their lookback so window statistics stay available while old
/// data ages out.
#[derive(Debug, Clone)]
pub struct BoundedSeries {
    values: VecDeque<Decimal>,
    capacity: usize,
}

impl BoundedSeries {
    pub fn new(capacity: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, value: Decimal) {
        if self.values.len() >= self.capacity {
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

    pub fn last(&self) -> Option<Decimal> {
        self.values.back().copied()
    }

    /// Value `n` observations back from the latest (0 = latest).
    pub fn back(&self, n: usize) -> Option<Decimal> {
        let len = self.values.len();
        if n >= len {
            return None;
        }
        self.values.get(len - 1 - n).copied()
    }

    /// The trailing `n` observations, oldest first.
    pub fn window(&self, n: usize) -> Vec<Decimal> {
        let len = self.values.len();
        let take = n.min(len);
        self.values.iter().skip(len - take).copied().collect()
    }

    pub fn window_mean(&self, n: usize) -> Decimal {
        let window = self.window(n);
        if window.is_empty() {
            return Decimal::ZERO;
        }
        window.iter().sum::<Decimal>() / Decimal::from(window.len())
    }

    pub fn window_std(&self, n: usize) -> Decimal {
        martim_analytics::algorithm::sample_std_dev(&self.window(n)).unwrap_or(Decimal::ZERO)
    }
}
