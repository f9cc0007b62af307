//! Once-per-period gate.
//!
//! A [`PeriodGate`] remembers the last period it fired for and only fires
//! again for a strictly later one. The clock uses it for day and night
//! boundaries, and [`Watermarks::claim`](crate::Watermarks::claim) uses one
//! per daily pipeline so a restart or a second caller never repeats a day.

/// Fires at most once per period, in increasing period order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeriodGate {
    last: Option<u64>,
}

impl PeriodGate {
    /// A gate that has never fired.
    pub const fn new() -> Self {
        Self { last: None }
    }

    /// A gate that already fired for `watermark`.
    pub const fn seeded(watermark: Option<u64>) -> Self {
        Self { last: watermark }
    }

    /// The last period fired for.
    pub const fn last(&self) -> Option<u64> {
        self.last
    }

    /// Fire for `period` if it is later than every period fired so far.
    ///
    /// Returns `true` and records the period when it fires.
    pub const fn try_fire(&mut self, period: u64) -> bool {
        let due = match self.last {
            Some(last) => period > last,
            None => true,
        };
        if due {
            self.last = Some(period);
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_per_period() {
        let mut gate = PeriodGate::new();
        assert!(gate.try_fire(0));
        assert!(!gate.try_fire(0));
        assert!(gate.try_fire(1));
        assert!(!gate.try_fire(1));
        assert_eq!(gate.last(), Some(1));
    }

    #[test]
    fn never_goes_backwards() {
        let mut gate = PeriodGate::seeded(Some(5));
        assert!(!gate.try_fire(3));
        assert!(!gate.try_fire(5));
        assert!(gate.try_fire(9));
        assert!(!gate.try_fire(6));
        assert_eq!(gate.last(), Some(9));
    }
}
