use crate::prelude::*;

/// Check point which fires once the interval has elapsed since it last fired.
/// A zero interval fires on every check.
pub struct Periodic {
    interval: StdDuration,
    last_triggered_at: Instant,
    n_triggered: usize,
}

impl Periodic {
    #[must_use]
    pub fn new(interval: StdDuration) -> Self {
        Self::starting_at(interval, Instant::now())
    }

    #[must_use]
    pub const fn starting_at(interval: StdDuration, instant: Instant) -> Self {
        Self {
            interval,
            last_triggered_at: instant,
            n_triggered: 0,
        }
    }

    #[must_use]
    pub fn should_trigger(&mut self) -> bool {
        self.should_trigger_at(Instant::now())
    }

    #[must_use]
    pub fn should_trigger_at(&mut self, now: Instant) -> bool {
        let is_due = now.saturating_duration_since(self.last_triggered_at) >= self.interval;
        if is_due {
            self.last_triggered_at = now;
            self.n_triggered += 1;
        }
        is_due
    }

    pub const fn n_triggered(&self) -> usize {
        self.n_triggered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_interval_always_triggers_ok() {
        let mut periodic = Periodic::new(StdDuration::ZERO);
        assert!(periodic.should_trigger());
        assert!(periodic.should_trigger());
        assert_eq!(periodic.n_triggered(), 2);
    }

    #[test]
    fn should_trigger_at_ok() {
        let start = Instant::now();
        let interval = StdDuration::from_secs(10);
        let mut periodic = Periodic::starting_at(interval, start);

        assert!(!periodic.should_trigger_at(start + StdDuration::from_secs(5)));
        assert!(periodic.should_trigger_at(start + interval));
        // The interval restarts from the last trigger.
        assert!(!periodic.should_trigger_at(start + StdDuration::from_secs(15)));
        assert!(periodic.should_trigger_at(start + StdDuration::from_secs(25)));
        assert_eq!(periodic.n_triggered(), 2);
    }

    #[test]
    fn long_interval_does_not_trigger_ok() {
        let mut periodic = Periodic::new(StdDuration::from_secs(3600));
        assert!(!periodic.should_trigger());
        assert_eq!(periodic.n_triggered(), 0);
    }
}
