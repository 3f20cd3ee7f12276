use std::ops::AddAssign;

use crate::engine::ProgramEdge;
use crate::trainer::context::Hyperparameters;
use crate::trainer::math::predict;
use crate::trainer::model::Role;
use crate::trainer::program::BiasSgd;

/// Sum of squared residual errors.
#[derive(Default, Debug, Copy, Clone, PartialEq)]
pub struct SquaredError {
    error: f64,
    count: usize,
}

impl SquaredError {
    pub fn push(&mut self, residual_error: f64) {
        self.error += residual_error * residual_error;
        self.count += 1;
    }

    pub const fn count(&self) -> usize {
        self.count
    }

    /// Root mean squared error, `None` when nothing has been pushed.
    #[must_use]
    pub fn rmse(&self) -> Option<f64> {
        (self.count != 0).then(|| (self.error / self.count as f64).sqrt())
    }
}

impl AddAssign for SquaredError {
    fn add_assign(&mut self, rhs: Self) {
        self.error += rhs.error;
        self.count += rhs.count;
    }
}

/// Training and validation errors, summed independently.
#[derive(Default, Debug, Copy, Clone, PartialEq)]
pub struct ErrorAggregate {
    pub train: SquaredError,
    pub validation: SquaredError,
}

impl AddAssign for ErrorAggregate {
    fn add_assign(&mut self, rhs: Self) {
        self.train += rhs.train;
        assert!(!self.train.error.is_nan());
        self.validation += rhs.validation;
    }
}

impl ErrorAggregate {
    /// Evaluates the edge against the current vertex state.
    pub fn from_edge(hyperparameters: &Hyperparameters, edge: ProgramEdge<'_, BiasSgd>) -> Self {
        let mut aggregate = Self::default();
        let data = edge.data();
        let squared_error = match data.role {
            Role::Train => &mut aggregate.train,
            Role::Validate => &mut aggregate.validation,
            Role::Predict => return aggregate,
        };
        let prediction = predict(hyperparameters, edge.source().data(), edge.target().data());
        let residual_error = data.value - prediction;
        debug_assert!(
            residual_error.abs() <= hyperparameters.max_value - hyperparameters.min_value
                || data.value > hyperparameters.max_value
                || data.value < hyperparameters.min_value,
        );
        squared_error.push(residual_error);
        aggregate
    }

    pub fn finalise(&self) -> LossPair {
        LossPair {
            train: self.train.rmse(),
            validation: self.validation.rmse(),
        }
    }
}

/// Root mean squared errors.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LossPair {
    pub train: Option<f64>,
    pub validation: Option<f64>,
}
