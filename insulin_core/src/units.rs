//! Display-unit conversion and the manual trend selector.
//!
//! mg/dL is the internal unit. mmol/L values are converted at the edges with
//! a fixed factor; the calculator never sees them.

use std::fmt;
use std::str::FromStr;

/// mg/dL per mmol/L.
pub const MGDL_PER_MMOL: f64 = 18.018;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GlucoseUnit {
    #[default]
    MgDl,
    MmolL,
}

impl GlucoseUnit {
    /// Convert a value entered in this unit to mg/dL.
    #[inline]
    pub fn to_internal(self, value: f64) -> f64 {
        match self {
            GlucoseUnit::MgDl => value,
            GlucoseUnit::MmolL => value * MGDL_PER_MMOL,
        }
    }

    /// Convert mg/dL to this unit, unrounded.
    #[inline]
    pub fn to_display(self, mgdl: f64) -> f64 {
        match self {
            GlucoseUnit::MgDl => mgdl,
            GlucoseUnit::MmolL => mgdl / MGDL_PER_MMOL,
        }
    }

    /// Decimal places shown for values in this unit.
    #[inline]
    pub fn decimals(self) -> usize {
        match self {
            GlucoseUnit::MgDl => 0,
            GlucoseUnit::MmolL => 1,
        }
    }

    /// Convert mg/dL to this unit rounded the way it is shown.
    pub fn round_for_display(self, mgdl: f64) -> f64 {
        let v = self.to_display(mgdl);
        match self {
            GlucoseUnit::MgDl => v.round(),
            GlucoseUnit::MmolL => (v * 10.0).round() / 10.0,
        }
    }

    /// Format mg/dL in this unit, e.g. `120` or `6.7`.
    pub fn format(self, mgdl: f64) -> String {
        format!("{:.*}", self.decimals(), self.round_for_display(mgdl))
    }

    pub fn label(self) -> &'static str {
        match self {
            GlucoseUnit::MgDl => "mg/dL",
            GlucoseUnit::MmolL => "mmol/L",
        }
    }

    /// Short machine name used in settings (`mgdl` / `mmol`).
    pub fn name(self) -> &'static str {
        match self {
            GlucoseUnit::MgDl => "mgdl",
            GlucoseUnit::MmolL => "mmol",
        }
    }
}

impl fmt::Display for GlucoseUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for GlucoseUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mgdl" | "mg/dl" => Ok(GlucoseUnit::MgDl),
            "mmol" | "mmol/l" => Ok(GlucoseUnit::MmolL),
            other => Err(format!("unknown glucose unit '{other}' (expected mgdl or mmol)")),
        }
    }
}

/// Manually selected CGM trend arrow. Each arrow maps to a fixed mg/dL
/// adjustment added to the reading before the correction is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrendArrow {
    RapidlyFalling,
    Falling,
    SlowlyFalling,
    Steady,
    SlowlyRising,
    Rising,
    RapidlyRising,
}

impl TrendArrow {
    pub const ALL: [TrendArrow; 7] = [
        TrendArrow::RapidlyFalling,
        TrendArrow::Falling,
        TrendArrow::SlowlyFalling,
        TrendArrow::Steady,
        TrendArrow::SlowlyRising,
        TrendArrow::Rising,
        TrendArrow::RapidlyRising,
    ];

    /// Signed adjustment in mg/dL.
    pub fn mgdl(self) -> f64 {
        match self {
            TrendArrow::RapidlyFalling => -75.0,
            TrendArrow::Falling => -50.0,
            TrendArrow::SlowlyFalling => -25.0,
            TrendArrow::Steady => 0.0,
            TrendArrow::SlowlyRising => 25.0,
            TrendArrow::Rising => 50.0,
            TrendArrow::RapidlyRising => 75.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TrendArrow::RapidlyFalling => "Rapidly falling",
            TrendArrow::Falling => "Falling",
            TrendArrow::SlowlyFalling => "Slowly falling",
            TrendArrow::Steady => "Steady",
            TrendArrow::SlowlyRising => "Slowly rising",
            TrendArrow::Rising => "Rising",
            TrendArrow::RapidlyRising => "Rapidly rising",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TrendArrow::RapidlyFalling => "rapidly-falling",
            TrendArrow::Falling => "falling",
            TrendArrow::SlowlyFalling => "slowly-falling",
            TrendArrow::Steady => "steady",
            TrendArrow::SlowlyRising => "slowly-rising",
            TrendArrow::Rising => "rising",
            TrendArrow::RapidlyRising => "rapidly-rising",
        }
    }

    /// Arrow whose adjustment equals `mgdl`, if any.
    pub fn from_mgdl(mgdl: f64) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.mgdl() == mgdl)
    }
}

impl FromStr for TrendArrow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        Self::ALL
            .into_iter()
            .find(|a| a.name() == key)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|a| a.name()).collect();
                format!("unknown trend '{s}' (expected one of {})", names.join(", "))
            })
    }
}
