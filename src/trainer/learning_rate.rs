use std::sync::atomic::{AtomicU64, Ordering};

/// Learning rate shared by all the vertex program invocations and decayed by the error monitor.
///
/// Reads are relaxed: an invocation may observe the rate from before a concurrent decay.
pub struct LearningRate(AtomicU64);

impl LearningRate {
    pub fn new(initial: f64) -> Self {
        debug_assert!(initial >= 0.0);
        Self(AtomicU64::new(initial.to_bits()))
    }

    #[must_use]
    pub fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    /// Multiplies the rate by `factor` and returns the new rate.
    pub fn decay(&self, factor: f64) -> f64 {
        let mut current = self.0.load(Ordering::Relaxed);
        loop {
            let new = f64::from_bits(current) * factor;
            match self.0.compare_exchange_weak(
                current,
                new.to_bits(),
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break new,
                Err(actual) => current = actual,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decay_ok() {
        let learning_rate = LearningRate::new(0.01);
        assert!((learning_rate.decay(0.5) - 0.005).abs() < f64::EPSILON);
        assert!((learning_rate.decay(0.5) - 0.0025).abs() < f64::EPSILON);
        assert!((learning_rate.get() - 0.0025).abs() < f64::EPSILON);
    }
}
