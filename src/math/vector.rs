pub type Vector = Vec<f64>;

#[must_use]
#[inline]
pub fn dot(x: &[f64], y: &[f64]) -> f64 {
    debug_assert_eq!(x.len(), y.len());
    x.iter().zip(y).fold(0.0, |dot, (xi, yi)| dot + xi * yi)
}

#[inline]
pub fn add_assign(x: &mut [f64], y: &[f64]) {
    debug_assert_eq!(x.len(), y.len());
    for (xi, yi) in x.iter_mut().zip(y) {
        *xi += yi;
    }
}

/// Computes `alpha * x + beta * y`.
#[must_use]
pub fn linear_combination(alpha: f64, x: &[f64], beta: f64, y: &[f64]) -> Vector {
    debug_assert_eq!(x.len(), y.len());
    x.iter()
        .zip(y)
        .map(|(xi, yi)| alpha * xi + beta * yi)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dot_ok() {
        assert!((dot(&[1.0, 2.0, 3.0], &[3.0, 5.0, 7.0]) - 34.0).abs() < f64::EPSILON);
    }

    #[test]
    fn add_assign_ok() {
        let mut x = vec![1.0, 2.0];
        add_assign(&mut x, &[0.5, -2.0]);
        assert_eq!(x, [1.5, 0.0]);
    }

    #[test]
    fn linear_combination_ok() {
        assert_eq!(linear_combination(2.0, &[1.0, 2.0], -1.0, &[0.5, 4.0]), [1.5, 0.0]);
    }
}
