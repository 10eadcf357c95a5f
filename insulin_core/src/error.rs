use std::fmt;

use thiserror::Error;

/// Calculator input fields, named as the form presents them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    CarbsToEat,
    CurrentGlucose,
    CarbRatio,
    CorrectionFactor,
    Target,
    TrendAdjustment,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::CarbsToEat => "carbsToEat",
            Field::CurrentGlucose => "currentGlucose",
            Field::CarbRatio => "carbRatio",
            Field::CorrectionFactor => "correctionFactor",
            Field::Target => "target",
            Field::TrendAdjustment => "trendAdjustment",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a field failed validation. `Missing` is kept apart from the invalid
/// reasons so callers can present "please fill in" differently from "fix this".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reason {
    Missing,
    NotFinite,
    Negative,
    ZeroDenominator,
}

impl Reason {
    pub fn name(self) -> &'static str {
        match self {
            Reason::Missing => "missing",
            Reason::NotFinite => "not-finite",
            Reason::Negative => "negative",
            Reason::ZeroDenominator => "zero-denominator",
        }
    }

    #[inline]
    pub fn is_missing(self) -> bool {
        matches!(self, Reason::Missing)
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Reason::Missing => "missing",
            Reason::NotFinite => "not a finite number",
            Reason::Negative => "must not be negative",
            Reason::ZeroDenominator => "must be greater than zero",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("{field} {reason}")]
pub struct ValidationError {
    pub field: Field,
    pub reason: Reason,
}

/// Every field that failed validation in one `compute_dose` call; never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub(crate) fn new(errors: Vec<ValidationError>) -> Self {
        debug_assert!(!errors.is_empty());
        Self(errors)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Reason recorded for `field`, if it failed.
    pub fn reason(&self, field: Field) -> Option<Reason> {
        self.0.iter().find(|e| e.field == field).map(|e| e.reason)
    }

    /// True when every failure is a missing value.
    pub fn only_missing(&self) -> bool {
        self.0.iter().all(|e| e.reason.is_missing())
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid input: ")?;
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Rejected operations on the profile set or settings.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("cannot delete the last remaining profile")]
    LastProfile,
    #[error("unknown profile: {0}")]
    UnknownProfile(String),
    #[error("a profile edit is already in progress")]
    EditInProgress,
    #[error("no profile edit is in progress")]
    NoPendingEdit,
    #[error("invalid setting: {0}")]
    InvalidSetting(&'static str),
    #[error("the usage terms have not been accepted")]
    TermsNotAccepted,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimeParseError {
    #[error("expected a 24-hour HH:MM time, got '{0}'")]
    Format(String),
    #[error("time of day out of range: '{0}'")]
    OutOfRange(String),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
