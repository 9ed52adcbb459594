// Mini-Disclaimer: Educational/experimental use; not investment advice or affiliation; see README & DISCLAIMER.
//! Rolling statistics over a fixed observation window.

use rust_decimal::{Decimal, MathematicalOps};
use std::collections::VecDeque;

/// Fixed-window rolling statistics.
///
/// Maintains the running sum and sum of squares of the last `window`
/// observations so that mean, variance and standard deviation are available
/// without re-scanning the buffer.
#[derive(Debug, Clone)]
pub struct RollingStats {
    window: usize,
    buffer: VecDeque<Decimal>,
    sum: Decimal,
    sum_sq: Decimal,
}

impl RollingStats {
    /// Creates a tracker over the last `window` observations.
    ///
    /// # Panics
    /// Panics if `window < 2`; a single observation has no deviation.
    pub fn new(window: usize) -> Self {
        assert!(window >= 2, "window must be >= 2");
        Self {
            window,
            buffer: VecDeque::with_capacity(window),
            sum: Decimal::ZERO,
            sum_sq: Decimal::ZERO,
        }
    }

    /// Adds an observation, evicting the oldest when the window is full.
    pub fn push(&mut self, value: Decimal) {
        if self.buffer.len() >= self.window {
            if let Some(old) = self.buffer.pop_front() {
                self.sum -= old;
                self.sum_sq -= old * old;
            }
        }
        self.buffer.push_back(value);
        self.sum += value;
        self.sum_sq += value * value;
    }

    pub fn mean(&self) -> Decimal {
        let n = self.buffer.len();
        if n == 0 {
            Decimal::ZERO
        } else {
            self.sum / Decimal::from(n)
        }
    }

    /// Sample variance over the current window contents.
    pub fn variance(&self) -> Decimal {
        let n = self.buffer.len();
        if n < 2 {
            return Decimal::ZERO;
        }
        let n_dec = Decimal::from(n);
        let mean = self.sum / n_dec;
        let var = (self.sum_sq / n_dec - mean * mean) * n_dec / (n_dec - Decimal::ONE);
        var.max(Decimal::ZERO)
    }

    /// Sample standard deviation over the current window contents.
    pub fn std_dev(&self) -> Decimal {
        self.variance().sqrt().unwrap_or(Decimal::ZERO)
    }

    pub fn count(&self) -> usize {
        self.buffer.len()
    }

    /// Whether the buffer has reached the window size.
    pub fn is_full(&self) -> bool {
        self.buffer.len() >= self.window
    }

    /// Most recent observation, if any.
    pub fn last(&self) -> Option<Decimal> {
        self.buffer.back().copied()
    }
}

/// Sample standard deviation of a slice, `None` when fewer than two values.
pub fn sample_std_dev(values: &[Decimal]) -> Option<Decimal> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let n_dec = Decimal::from(n);
    let mean = values.iter().sum::<Decimal>() / n_dec;
    let var = values
        .iter()
        .map(|v| (*v - mean) * (*v - mean))
        .sum::<Decimal>()
        / (n_dec - Decimal::ONE);
    var.max(Decimal::ZERO).sqrt()
}
