//! `From` implementations bridging `insulin_config` records to `insulin_core` types.

use insulin_config::{LegacyPreset, PersistedProfile};

use crate::dose::RoundingStep;
use crate::profile::{Profile, ProfileId, TimeWindow};
use crate::state::Settings;
use crate::units::GlucoseUnit;

// ── Units ────────────────────────────────────────────────────────────────────

impl From<insulin_config::Units> for GlucoseUnit {
    fn from(u: insulin_config::Units) -> Self {
        match u {
            insulin_config::Units::Mgdl => GlucoseUnit::MgDl,
            insulin_config::Units::Mmol => GlucoseUnit::MmolL,
        }
    }
}

impl From<GlucoseUnit> for insulin_config::Units {
    fn from(u: GlucoseUnit) -> Self {
        match u {
            GlucoseUnit::MgDl => insulin_config::Units::Mgdl,
            GlucoseUnit::MmolL => insulin_config::Units::Mmol,
        }
    }
}

// ── Settings ─────────────────────────────────────────────────────────────────

impl From<&insulin_config::Settings> for Settings {
    fn from(s: &insulin_config::Settings) -> Self {
        let rounding = RoundingStep::new(s.rounding).unwrap_or_else(|_| {
            tracing::warn!(
                rounding = s.rounding,
                fallback = RoundingStep::DEFAULT.get(),
                "stored rounding step invalid; using default"
            );
            RoundingStep::DEFAULT
        });
        Self {
            units: s.units.into(),
            rounding,
            theme: s.theme,
        }
    }
}

impl From<&Settings> for insulin_config::Settings {
    fn from(s: &Settings) -> Self {
        Self {
            theme: s.theme,
            units: s.units.into(),
            rounding: s.rounding.get(),
        }
    }
}

// ── Profile ──────────────────────────────────────────────────────────────────

fn parse_window(id: &str, start: Option<&str>, end: Option<&str>) -> Option<TimeWindow> {
    match (start, end) {
        (Some(s), Some(e)) => match TimeWindow::parse(s, e) {
            Ok(w) => Some(w),
            Err(err) => {
                tracing::warn!(profile = id, error = %err, "ignoring unreadable time window");
                None
            }
        },
        (None, None) => None,
        _ => {
            tracing::warn!(profile = id, "ignoring half-specified time window");
            None
        }
    }
}

impl From<PersistedProfile> for Profile {
    fn from(p: PersistedProfile) -> Self {
        let window = parse_window(&p.id, p.start_time.as_deref(), p.end_time.as_deref());
        let id = if p.id.trim().is_empty() {
            ProfileId::generate()
        } else {
            ProfileId::from(p.id)
        };
        let name = p.name.trim();
        Self {
            id,
            name: if name.is_empty() {
                Profile::DEFAULT_NAME.to_string()
            } else {
                name.to_string()
            },
            window,
            carb_ratio: p.carb_ratio,
            correction_factor: p.correction_factor,
            target: p.target,
            trend_adjustment: p.trend_adjustment,
        }
    }
}

impl From<&Profile> for PersistedProfile {
    fn from(p: &Profile) -> Self {
        Self {
            id: p.id.to_string(),
            name: p.name.clone(),
            start_time: p.window.map(|w| w.start().to_string()),
            end_time: p.window.map(|w| w.end().to_string()),
            carb_ratio: p.carb_ratio,
            correction_factor: p.correction_factor,
            target: p.target,
            trend_adjustment: p.trend_adjustment,
        }
    }
}

impl Profile {
    /// Profile seeded from a pre-profile Day/Night preset.
    pub fn from_legacy(base: Profile, preset: &LegacyPreset) -> Self {
        Self {
            carb_ratio: preset.carb_ratio,
            correction_factor: preset.correction_factor,
            target: preset.target,
            trend_adjustment: preset.trend_adjustment,
            ..base
        }
    }
}
