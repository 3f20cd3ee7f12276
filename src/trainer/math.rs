//! Biased matrix factorization.
//!
//! See: <https://sifter.org/~simon/journal/20061211.html>.

use crate::math::vector::{dot, linear_combination};
use crate::trainer::context::Hyperparameters;
use crate::trainer::gradient::Gradient;
use crate::trainer::model::VertexData;

/// Predicts the matrix entry: global mean, plus both biases, plus the factors' dot product.
#[must_use]
pub fn predict(hyperparameters: &Hyperparameters, row: &VertexData, column: &VertexData) -> f64 {
    hyperparameters.clamp(
        hyperparameters.global_mean + row.bias + column.bias + dot(&row.factors, &column.factors),
    )
}

/// Computes the descent step of `own` for the residual error `prediction - value`.
///
/// `delta = -γ·(error·other - λ·own)`. The bias regularization term multiplies
/// the zero-initialized step rather than the bias, so the bias step is `-γ·error`.
#[must_use]
pub fn sgd_step(
    own: &VertexData,
    other: &VertexData,
    residual_error: f64,
    learning_rate: f64,
    regularization: f64,
) -> Gradient {
    debug_assert!(learning_rate >= 0.0);
    debug_assert!(regularization >= 0.0);
    assert!(!residual_error.is_nan());

    let delta = linear_combination(
        -learning_rate * residual_error,
        &other.factors,
        learning_rate * regularization,
        &own.factors,
    );
    Gradient::new(delta, -learning_rate * residual_error)
}
