//! Profile model: identifiers, minute-of-day clock values, and time windows.
//!
//! Times are minutes since local midnight on a 24-hour wrapping clock. A
//! window whose start is after its end spans midnight.

use std::fmt;
use std::str::FromStr;

use crate::error::{Field, TimeParseError};

pub const MINUTES_PER_DAY: u16 = insulin_traits::MINUTES_PER_DAY;

/// Opaque, stable profile identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProfileId(String);

impl ProfileId {
    /// Fresh random identifier for a newly created profile.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ProfileId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProfileId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Minute of the day, always in `0..1440`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MinuteOfDay(u16);

impl MinuteOfDay {
    pub const MIDNIGHT: Self = Self(0);

    #[inline]
    pub fn new(minute: u16) -> Option<Self> {
        (minute < MINUTES_PER_DAY).then_some(Self(minute))
    }

    #[inline]
    pub fn from_hm(hour: u16, minute: u16) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self(hour * 60 + minute))
        } else {
            None
        }
    }

    #[inline]
    pub fn get(self) -> u16 {
        self.0
    }

    #[inline]
    pub fn hour(self) -> u16 {
        self.0 / 60
    }

    #[inline]
    pub fn minute(self) -> u16 {
        self.0 % 60
    }

    /// Minutes elapsed going forward from `earlier` to `self`, wrapping at midnight.
    #[inline]
    pub fn minutes_since(self, earlier: MinuteOfDay) -> u16 {
        (self.0 + MINUTES_PER_DAY - earlier.0) % MINUTES_PER_DAY
    }

    /// `h:MM AM/PM`, with midnight as `12:00 AM` and noon as `12:00 PM`.
    pub fn format_12h(self) -> String {
        let h = self.hour();
        let suffix = if h >= 12 { "PM" } else { "AM" };
        let h12 = match h {
            0 => 12,
            13.. => h - 12,
            _ => h,
        };
        format!("{h12}:{:02} {suffix}", self.minute())
    }
}

impl fmt::Display for MinuteOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for MinuteOfDay {
    type Err = TimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let format_err = || TimeParseError::Format(text.to_string());
        let (h, m) = text.split_once(':').ok_or_else(format_err)?;
        let digits = |part: &str, max_len: usize| {
            !part.is_empty() && part.len() <= max_len && part.bytes().all(|b| b.is_ascii_digit())
        };
        if !digits(h, 2) || m.len() != 2 || !digits(m, 2) {
            return Err(format_err());
        }
        let hour: u16 = h.parse().map_err(|_| format_err())?;
        let minute: u16 = m.parse().map_err(|_| format_err())?;
        MinuteOfDay::from_hm(hour, minute).ok_or_else(|| TimeParseError::OutOfRange(text.to_string()))
    }
}

/// Active time-of-day window `[start, end)`. `start > end` wraps past
/// midnight; `start == end` never matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeWindow {
    start: MinuteOfDay,
    end: MinuteOfDay,
}

/// Default window for a profile named "Day".
pub const DAY_WINDOW: TimeWindow = TimeWindow {
    start: MinuteOfDay(6 * 60),
    end: MinuteOfDay(20 * 60),
};

/// Default window for a profile named "Night".
pub const NIGHT_WINDOW: TimeWindow = TimeWindow {
    start: MinuteOfDay(20 * 60),
    end: MinuteOfDay(6 * 60),
};

impl TimeWindow {
    #[inline]
    pub fn new(start: MinuteOfDay, end: MinuteOfDay) -> Self {
        Self { start, end }
    }

    pub fn parse(start: &str, end: &str) -> Result<Self, TimeParseError> {
        Ok(Self::new(start.parse()?, end.parse()?))
    }

    #[inline]
    pub fn start(self) -> MinuteOfDay {
        self.start
    }

    #[inline]
    pub fn end(self) -> MinuteOfDay {
        self.end
    }

    /// Whether the window spans midnight.
    #[inline]
    pub fn wraps(self) -> bool {
        self.start > self.end
    }

    pub fn contains(self, now: MinuteOfDay) -> bool {
        if self.wraps() {
            now >= self.start || now < self.end
        } else {
            self.start <= now && now < self.end
        }
    }

    /// How long ago the window opened, as seen from `now`.
    #[inline]
    pub fn minutes_since_start(self, now: MinuteOfDay) -> u16 {
        now.minutes_since(self.start)
    }

    /// Half-open `[from, to)` minute ranges covered by the window; `to` may
    /// be 1440. Wrapping windows split into an evening and a morning range.
    pub fn segments(self) -> Vec<(u16, u16)> {
        let (s, e) = (self.start.get(), self.end.get());
        let ranges = if self.wraps() {
            vec![(s, MINUTES_PER_DAY), (0, e)]
        } else {
            vec![(s, e)]
        };
        ranges.into_iter().filter(|(from, to)| to > from).collect()
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Stored dosing constants a user can clear individually.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Constant {
    CarbRatio,
    CorrectionFactor,
    Target,
}

impl From<Constant> for Field {
    fn from(c: Constant) -> Self {
        match c {
            Constant::CarbRatio => Field::CarbRatio,
            Constant::CorrectionFactor => Field::CorrectionFactor,
            Constant::Target => Field::Target,
        }
    }
}

/// Named bundle of dosing constants. Glucose-valued fields are mg/dL.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub id: ProfileId,
    pub name: String,
    pub window: Option<TimeWindow>,
    /// Grams of carbohydrate covered by one unit.
    pub carb_ratio: Option<f64>,
    /// mg/dL drop per unit.
    pub correction_factor: Option<f64>,
    /// mg/dL.
    pub target: Option<f64>,
    /// Signed mg/dL added to the glucose reading; `None` when no trend is selected.
    pub trend_adjustment: Option<f64>,
}

impl Profile {
    pub const DEFAULT_NAME: &'static str = "Profile";

    /// New profile with a fresh id and no constants. A blank name becomes
    /// `"Profile"`.
    pub fn new(name: &str, window: Option<TimeWindow>) -> Self {
        let name = name.trim();
        Self {
            id: ProfileId::generate(),
            name: if name.is_empty() {
                Self::DEFAULT_NAME.to_string()
            } else {
                name.to_string()
            },
            window,
            carb_ratio: None,
            correction_factor: None,
            target: None,
            trend_adjustment: None,
        }
    }

    pub fn day() -> Self {
        Self::new("Day", Some(DAY_WINDOW))
    }

    pub fn night() -> Self {
        Self::new("Night", Some(NIGHT_WINDOW))
    }

    /// Rename, ignoring blank input.
    pub fn rename(&mut self, name: &str) {
        let name = name.trim();
        if !name.is_empty() {
            self.name = name.to_string();
        }
    }

    pub fn constant(&self, which: Constant) -> Option<f64> {
        match which {
            Constant::CarbRatio => self.carb_ratio,
            Constant::CorrectionFactor => self.correction_factor,
            Constant::Target => self.target,
        }
    }

    pub fn clear_constant(&mut self, which: Constant) {
        match which {
            Constant::CarbRatio => self.carb_ratio = None,
            Constant::CorrectionFactor => self.correction_factor = None,
            Constant::Target => self.target = None,
        }
    }

    /// Default window for the built-in "Day"/"Night" names.
    pub fn default_window_for(name: &str) -> Option<TimeWindow> {
        match name {
            "Day" => Some(DAY_WINDOW),
            "Night" => Some(NIGHT_WINDOW),
            _ => None,
        }
    }
}
