use chrono::Timelike;

/// Minutes in one day; minute-of-day values live in `0..MINUTES_PER_DAY`.
pub const MINUTES_PER_DAY: u16 = 1440;

/// Wall-clock source for time-of-day profile selection.
///
/// - minute_of_day(): current local time as minutes since midnight, in [0, 1440)
pub trait Clock {
    fn minute_of_day(&self) -> u16;
}

/// Local wall clock backed by `chrono::Local`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalClock;

impl LocalClock {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Clock for LocalClock {
    fn minute_of_day(&self) -> u16 {
        let now = chrono::Local::now();
        // hour() <= 23 and minute() <= 59, so this always fits.
        (now.hour() * 60 + now.minute()) as u16
    }
}

/// Clock pinned to a single minute of the day. Values wrap modulo one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(u16);

impl FixedClock {
    #[inline]
    pub fn new(minute_of_day: u16) -> Self {
        Self(minute_of_day % MINUTES_PER_DAY)
    }

    #[inline]
    pub fn at(hour: u16, minute: u16) -> Self {
        Self::new(hour.saturating_mul(60).saturating_add(minute))
    }
}

impl Clock for FixedClock {
    #[inline]
    fn minute_of_day(&self) -> u16 {
        self.0
    }
}
