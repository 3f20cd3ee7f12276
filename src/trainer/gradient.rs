//! Partial gradient step of a single vertex.

use std::ops::AddAssign;

use crate::math::vector::{add_assign, Vector};

/// Gradient step for one vertex, combined across edges or received as a message.
///
/// An empty `delta` means «no contribution yet». Combining with an empty
/// gradient is a no-op, which makes `Gradient::default()` the identity.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Gradient {
    delta: Vector,
    bias_delta: f64,
}

impl Gradient {
    pub fn new(delta: Vector, bias_delta: f64) -> Self {
        debug_assert!(!delta.is_empty(), "use `Gradient::default()` for an empty step");
        Self { delta, bias_delta }
    }

    pub fn is_empty(&self) -> bool {
        self.delta.is_empty()
    }

    pub fn delta(&self) -> &[f64] {
        &self.delta
    }

    pub fn bias_delta(&self) -> f64 {
        self.bias_delta
    }
}

impl AddAssign<&Self> for Gradient {
    fn add_assign(&mut self, rhs: &Self) {
        if self.is_empty() {
            self.clone_from(rhs);
        } else if !rhs.is_empty() {
            add_assign(&mut self.delta, &rhs.delta);
            self.bias_delta += rhs.bias_delta;
        }
    }
}

impl AddAssign for Gradient {
    fn add_assign(&mut self, rhs: Self) {
        if self.is_empty() {
            *self = rhs;
        } else {
            *self += &rhs;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn combine(lhs: &Gradient, rhs: &Gradient) -> Gradient {
        let mut sum = lhs.clone();
        sum += rhs;
        sum
    }

    fn samples() -> [Gradient; 4] {
        [
            Gradient::default(),
            Gradient::new(vec![1.0, -2.0], 0.5),
            Gradient::new(vec![0.25, 4.0], -1.0),
            Gradient::new(vec![-3.0, 0.5], 2.0),
        ]
    }

    #[test]
    fn empty_is_identity_ok() {
        let empty = Gradient::default();
        for gradient in samples() {
            assert_eq!(combine(&gradient, &empty), gradient);
            assert_eq!(combine(&empty, &gradient), gradient);
        }
    }

    #[test]
    fn commutative_ok() {
        for a in samples() {
            for b in samples() {
                assert_eq!(combine(&a, &b), combine(&b, &a));
            }
        }
    }

    #[test]
    fn associative_ok() {
        for a in samples() {
            for b in samples() {
                for c in samples() {
                    assert_eq!(combine(&combine(&a, &b), &c), combine(&a, &combine(&b, &c)));
                }
            }
        }
    }

    #[test]
    fn sum_ok() {
        let mut sum = Gradient::default();
        for gradient in samples() {
            sum += gradient;
        }
        assert_eq!(sum, Gradient::new(vec![-1.75, 2.5], 1.5));
    }
}
