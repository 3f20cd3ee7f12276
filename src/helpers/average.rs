use std::ops::AddAssign;

#[derive(Default, Debug, Copy, Clone)]
pub struct Average {
    sum: f64,
    count: usize,
}

impl From<f64> for Average {
    fn from(value: f64) -> Self {
        Self {
            sum: value,
            count: 1,
        }
    }
}

impl AddAssign for Average {
    fn add_assign(&mut self, rhs: Self) {
        self.sum += rhs.sum;
        self.count += rhs.count;
    }
}

impl Average {
    pub const fn count(&self) -> usize {
        self.count
    }

    /// `None` for an empty sample.
    pub fn average(&self) -> Option<f64> {
        (self.count != 0).then(|| self.sum / self.count as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_ok() {
        let mut average = Average::default();
        assert_eq!(average.average(), None);
        average += Average::from(1.0);
        average += Average::from(4.0);
        assert_eq!(average.count(), 2);
        assert_eq!(average.average(), Some(2.5));
    }
}
