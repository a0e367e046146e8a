use crate::game::ClockMark;

/// Eight-minute periods
pub const DEFAULT_PERIOD_LENGTH_SECONDS: u32 = 480;

/// Converts pairs of clock readings into elapsed playing time.
///
/// Every period is assumed to last exactly `period_length` seconds, overtime
/// included. The clock counts down, so an earlier reading has the larger value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodClock {
    period_length: u32,
}

impl Default for PeriodClock {
    fn default() -> Self {
        Self::new(DEFAULT_PERIOD_LENGTH_SECONDS)
    }
}

impl PeriodClock {
    pub fn new(period_length: u32) -> Self {
        Self { period_length }
    }

    /// Seconds of play between `from` and `to`, floored at zero
    pub fn elapsed(&self, from: ClockMark, to: ClockMark) -> u32 {
        let from_clock = i64::from(from.clock_seconds);
        let to_clock = i64::from(to.clock_seconds);

        if from.period == to.period {
            return (from_clock - to_clock).max(0) as u32;
        }

        let length = i64::from(self.period_length);
        let whole_periods_between = i64::from(to.period.ordinal() - from.period.ordinal() - 1);
        let elapsed = from_clock + whole_periods_between * length + (length - to_clock);

        elapsed.clamp(0, i64::from(u32::MAX)) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Period;
    use rstest::rstest;

    fn mark(period: Period, clock: u32) -> ClockMark {
        ClockMark::new(period, clock)
    }

    #[rstest]
    #[case(mark(Period::Q1, 480), mark(Period::Q1, 400), 80)]
    #[case(mark(Period::Q1, 400), mark(Period::Q1, 400), 0)]
    #[case(mark(Period::Q2, 100), mark(Period::Q2, 300), 0)]
    #[case(mark(Period::Q1, 100), mark(Period::Q2, 400), 180)]
    #[case(mark(Period::Q1, 100), mark(Period::Q3, 400), 660)]
    #[case(mark(Period::Q4, 30), mark(Period::OT1, 470), 40)]
    #[case(mark(Period::Q3, 200), mark(Period::Q2, 100), 0)]
    fn elapsed_between_marks(#[case] from: ClockMark, #[case] to: ClockMark, #[case] expected: u32) {
        assert_eq!(PeriodClock::default().elapsed(from, to), expected);
    }

    #[test]
    fn period_length_is_configurable() {
        let clock = PeriodClock::new(600);
        assert_eq!(clock.elapsed(mark(Period::Q1, 60), mark(Period::Q2, 540)), 120);
    }
}
