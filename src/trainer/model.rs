use serde::Serialize;

use crate::math::vector::Vector;

/// Row or column of the factorized matrix.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct VertexData {
    /// Number of completed `apply` calls.
    pub n_updates: u32,

    pub bias: f64,

    /// Latent factors, always of the configured length.
    pub factors: Vector,
}

impl VertexData {
    pub fn new(factors: Vector) -> Self {
        Self {
            n_updates: 0,
            bias: 0.0,
            factors,
        }
    }

    /// Factors drawn uniformly from `[-1, 1]`.
    pub fn random(n_factors: usize, rng: &mut impl rand::Rng) -> Self {
        Self::new((0..n_factors).map(|_| rng.gen_range(-1.0..=1.0)).collect())
    }

    pub fn ones(n_factors: usize) -> Self {
        Self::new(vec![1.0; n_factors])
    }
}

/// Train, validation or prediction designation of an edge, fixed at load time.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Role {
    /// The observed value is correct and used in training.
    Train,

    /// The observed value is correct but only used for the error reports.
    Validate,

    /// The observed value is not meaningful, the edge only asks for a prediction.
    Predict,
}

impl Role {
    /// Derives the role from the name of the file the edge has been loaded from.
    pub fn from_file_name(file_name: &str) -> Self {
        if file_name.ends_with(".validate") {
            Self::Validate
        } else if file_name.ends_with(".predict") {
            Self::Predict
        } else {
            Self::Train
        }
    }
}

/// Matrix entry.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct EdgeData {
    pub value: f64,
    pub role: Role,
}

impl EdgeData {
    pub const fn new(value: f64, role: Role) -> Self {
        Self { value, role }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn role_from_file_name_ok() {
        assert_eq!(Role::from_file_name("ratings.validate"), Role::Validate);
        assert_eq!(Role::from_file_name("ratings.predict"), Role::Predict);
        assert_eq!(Role::from_file_name("ratings.train"), Role::Train);
        assert_eq!(Role::from_file_name("ratings"), Role::Train);
        assert_eq!(Role::from_file_name("ratings.validate.txt"), Role::Train);
    }

    #[test]
    fn random_ok() {
        let data = VertexData::random(20, &mut StdRng::seed_from_u64(42));
        assert_eq!(data.factors.len(), 20);
        assert!(data.factors.iter().all(|factor| (-1.0..=1.0).contains(factor)));
        assert_eq!(data.n_updates, 0);
        assert_eq!(data.bias, 0.0);
    }
}
