#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Insulin dose calculation and time-of-day profile selection.
//!
//! This crate has no I/O of its own. Persistence goes through
//! `insulin_traits::KvStore` and the time of day through
//! `insulin_traits::Clock`.
//!
//! ## Architecture
//!
//! - **Profiles**: named dosing constants with an optional daily window (`profile`)
//! - **Scheduling**: picks the profile whose window opened most recently (`schedule`)
//! - **Dosing**: validation, carb + correction dose, round-down, safety band (`dose`)
//! - **Units**: mg/dL ↔ mmol/L at the edges, trend arrows (`units`)
//! - **State**: profile set, settings, pending edits, load/migrate/save (`state`)
//!
//! All glucose values inside the crate are mg/dL.

pub mod conversions;
pub mod dose;
pub mod error;
pub mod profile;
pub mod schedule;
pub mod state;
pub mod units;

pub use dose::{
    CalculationInput, CalculationResult, DoseOutcome, Operands, RoundingStep, SafetyBand,
    compute_dose,
};
pub use error::{Field, Reason, Result, StateError, TimeParseError, ValidationError, ValidationErrors};
pub use profile::{Constant, MinuteOfDay, Profile, ProfileId, TimeWindow};
pub use schedule::{ProfileWindow, Scheduled, TimelineSegment, resolve_active, timeline};
pub use state::{AppState, MealInput, ProfileDraft, ProfileEdit, Settings};
pub use units::{GlucoseUnit, MGDL_PER_MMOL, TrendArrow};
