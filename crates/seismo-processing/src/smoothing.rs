//! Exponential moving average

use seismo_core::{validate_smoothing_factor, SeismoResult};

/// EMA over a scalar signal: `s_t = α·x_t + (1-α)·s_{t-1}`, seeded with `s_0 = x_0`
#[derive(Debug, Clone, PartialEq)]
pub struct ExponentialSmoother {
    alpha: f64,
    state: Option<f64>,
}

impl ExponentialSmoother {
    pub fn new(alpha: f64) -> SeismoResult<Self> {
        validate_smoothing_factor(alpha)?;
        Ok(ExponentialSmoother { alpha, state: None })
    }

    /// Feed one value and return the smoothed output
    pub fn update(&mut self, value: f64) -> f64 {
        let smoothed = match self.state {
            None => value,
            Some(previous) => self.alpha * value + (1.0 - self.alpha) * previous,
        };
        self.state = Some(smoothed);
        smoothed
    }

    /// Current smoothed value, `None` until seeded
    pub fn value(&self) -> Option<f64> {
        self.state
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Change α without discarding the current state
    pub fn set_alpha(&mut self, alpha: f64) -> SeismoResult<()> {
        validate_smoothing_factor(alpha)?;
        self.alpha = alpha;
        Ok(())
    }

    /// Back to uninitialized; the next update re-seeds
    pub fn reset(&mut self) {
        self.state = None;
    }
}
