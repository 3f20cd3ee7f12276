use crate::trainer::learning_rate::LearningRate;

/// Hyperparameters, fixed for the entire run.
#[derive(Debug, Copy, Clone)]
pub struct Hyperparameters {
    /// Regularization weight.
    pub regularization: f64,

    pub initial_learning_rate: f64,

    /// Learning rate multiplier applied on every error report.
    pub learning_rate_decay: f64,

    /// Predictions are clamped into `[min_value, max_value]`.
    pub min_value: f64,
    pub max_value: f64,

    /// Maximum number of updates per vertex.
    pub max_updates: u32,

    /// Mean of the training values.
    pub global_mean: f64,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            regularization: 0.001,
            initial_learning_rate: 0.001,
            learning_rate_decay: 0.9,
            min_value: 1e-100,
            max_value: 1e100,
            max_updates: 10,
            global_mean: 0.0,
        }
    }
}

impl Hyperparameters {
    /// Clamps the value into `[min_value, max_value]`, letting NaN through.
    #[must_use]
    pub fn clamp(&self, value: f64) -> f64 {
        if value > self.max_value {
            self.max_value
        } else if value < self.min_value {
            self.min_value
        } else {
            value
        }
    }

    #[must_use]
    pub const fn has_budget(&self, n_updates: u32) -> bool {
        n_updates < self.max_updates
    }
}

/// Shared by every vertex program and aggregator invocation.
pub struct RunContext {
    pub hyperparameters: Hyperparameters,
    pub learning_rate: LearningRate,
}

impl RunContext {
    pub fn new(hyperparameters: Hyperparameters) -> Self {
        Self {
            learning_rate: LearningRate::new(hyperparameters.initial_learning_rate),
            hyperparameters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_ok() {
        let hyperparameters = Hyperparameters {
            min_value: 1.0,
            max_value: 5.0,
            ..Default::default()
        };
        assert_eq!(hyperparameters.clamp(1e300), 5.0);
        assert_eq!(hyperparameters.clamp(-1e300), 1.0);
        assert_eq!(hyperparameters.clamp(f64::INFINITY), 5.0);
        assert_eq!(hyperparameters.clamp(3.5), 3.5);
        assert!(hyperparameters.clamp(f64::NAN).is_nan());
    }

    #[test]
    fn has_budget_ok() {
        let hyperparameters = Hyperparameters {
            max_updates: 2,
            ..Default::default()
        };
        assert!(hyperparameters.has_budget(1));
        assert!(!hyperparameters.has_budget(2));
    }
}
