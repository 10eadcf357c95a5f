//! Dose calculation.
//!
//! All glucose-valued inputs are mg/dL; unit conversion happens before the
//! calculator is called. The calculator validates every field, computes the
//! carb and correction components, rounds the total down to the configured
//! step, and annotates the result with a glucose safety band.

use crate::error::{Field, Reason, StateError, ValidationError, ValidationErrors};

/// Below this reading (mg/dL) the result carries a severe-low warning.
pub const SEVERE_LOW_BELOW_MGDL: f64 = 56.0;
/// Below this reading (mg/dL) the result carries a low warning.
pub const LOW_BELOW_MGDL: f64 = 70.0;
/// Above this reading (mg/dL) the result carries a high warning.
pub const HIGH_ABOVE_MGDL: f64 = 249.0;

/// Dose rounding granularity in insulin units. Always positive and finite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundingStep(f64);

impl RoundingStep {
    pub const DEFAULT: Self = Self(0.5);

    pub fn new(step: f64) -> Result<Self, StateError> {
        if step.is_finite() && step > 0.0 {
            Ok(Self(step))
        } else {
            Err(StateError::InvalidSetting(
                "rounding step must be a positive number",
            ))
        }
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }

    /// Decimal places used to show a dose rounded to this step.
    #[inline]
    pub fn decimals(self) -> usize {
        if self.0 < 0.1 { 2 } else { 1 }
    }

    /// Largest multiple of the step that is `<= value`. No tolerance is
    /// applied, so a total a hair below a multiple drops a whole step.
    #[inline]
    pub fn floor(self, value: f64) -> f64 {
        (value / self.0).floor() * self.0
    }
}

impl Default for RoundingStep {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Calculator inputs. `None` means the field was left blank.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CalculationInput {
    /// Grams of carbohydrate in the meal.
    pub carbs_to_eat: Option<f64>,
    /// mg/dL.
    pub current_glucose: Option<f64>,
    pub carb_ratio: Option<f64>,
    /// mg/dL per unit.
    pub correction_factor: Option<f64>,
    /// mg/dL.
    pub target: Option<f64>,
    /// Signed mg/dL; `None` applies no trend.
    pub trend_adjustment: Option<f64>,
}

impl CalculationInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_carbs(mut self, grams: f64) -> Self {
        self.carbs_to_eat = Some(grams);
        self
    }

    pub fn with_glucose(mut self, mgdl: f64) -> Self {
        self.current_glucose = Some(mgdl);
        self
    }

    pub fn with_carb_ratio(mut self, ratio: f64) -> Self {
        self.carb_ratio = Some(ratio);
        self
    }

    pub fn with_correction_factor(mut self, mgdl_per_unit: f64) -> Self {
        self.correction_factor = Some(mgdl_per_unit);
        self
    }

    pub fn with_target(mut self, mgdl: f64) -> Self {
        self.target = Some(mgdl);
        self
    }

    pub fn with_trend(mut self, mgdl: f64) -> Self {
        self.trend_adjustment = Some(mgdl);
        self
    }
}

/// Validated inputs, echoed back for audit-trail rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Operands {
    pub carbs_to_eat: f64,
    pub current_glucose: f64,
    pub carb_ratio: f64,
    pub correction_factor: f64,
    pub target: f64,
    pub trend_adjustment: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DoseOutcome {
    /// Recommended dose, already rounded down to the step.
    Dose { units: f64 },
    /// Total fell below zero: no insulin, and this many grams of carbohydrate
    /// would bring the total back to zero.
    CarbDeficit { grams: f64 },
}

impl DoseOutcome {
    /// Insulin to give; zero for a carb deficit.
    pub fn units(self) -> f64 {
        match self {
            DoseOutcome::Dose { units } => units,
            DoseOutcome::CarbDeficit { .. } => 0.0,
        }
    }
}

/// Glucose safety annotation, derived from the reading alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SafetyBand {
    Normal,
    Low,
    SevereLow,
    High,
}

impl SafetyBand {
    pub fn classify(current_glucose_mgdl: f64) -> Self {
        if current_glucose_mgdl < SEVERE_LOW_BELOW_MGDL {
            SafetyBand::SevereLow
        } else if current_glucose_mgdl < LOW_BELOW_MGDL {
            SafetyBand::Low
        } else if current_glucose_mgdl > HIGH_ABOVE_MGDL {
            SafetyBand::High
        } else {
            SafetyBand::Normal
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SafetyBand::Normal => "none",
            SafetyBand::Low => "low",
            SafetyBand::SevereLow => "severe-low",
            SafetyBand::High => "high",
        }
    }

    /// Threshold quoted to the user in the warning text, in mg/dL.
    pub fn quoted_threshold_mgdl(self) -> Option<f64> {
        match self {
            SafetyBand::Normal => None,
            SafetyBand::Low => Some(70.0),
            SafetyBand::SevereLow => Some(55.0),
            SafetyBand::High => Some(250.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalculationResult {
    pub carb_dose: f64,
    /// Reading plus trend adjustment (mg/dL).
    pub effective_glucose: f64,
    /// `effective_glucose - target` (mg/dL).
    pub glucose_diff: f64,
    /// Negative when glucose is below target.
    pub correction_dose: f64,
    pub raw_total: f64,
    pub rounded_total: f64,
    pub step: RoundingStep,
    pub outcome: DoseOutcome,
    pub safety: SafetyBand,
    pub operands: Operands,
}

impl CalculationResult {
    #[inline]
    pub fn decimals(&self) -> usize {
        self.step.decimals()
    }

    #[inline]
    pub fn dose_units(&self) -> f64 {
        self.outcome.units()
    }
}

/// Compute a dose recommendation.
///
/// Every field is validated before any arithmetic; on failure all offending
/// fields are reported and no partial result is produced.
pub fn compute_dose(
    input: &CalculationInput,
    step: RoundingStep,
) -> Result<CalculationResult, ValidationErrors> {
    let ops = validate(input)?;

    let carb_dose = ops.carbs_to_eat / ops.carb_ratio;
    let effective_glucose = ops.current_glucose + ops.trend_adjustment.unwrap_or(0.0);
    let glucose_diff = effective_glucose - ops.target;
    let correction_dose = glucose_diff / ops.correction_factor;
    let raw_total = carb_dose + correction_dose;
    let rounded_total = step.floor(raw_total);

    let outcome = if rounded_total < 0.0 {
        DoseOutcome::CarbDeficit {
            grams: (ops.carb_ratio * raw_total).abs().round(),
        }
    } else {
        DoseOutcome::Dose {
            units: rounded_total,
        }
    };
    let safety = SafetyBand::classify(ops.current_glucose);

    tracing::debug!(
        carb_dose,
        correction_dose,
        raw_total,
        rounded_total,
        safety = safety.name(),
        "dose computed"
    );

    Ok(CalculationResult {
        carb_dose,
        effective_glucose,
        glucose_diff,
        correction_dose,
        raw_total,
        rounded_total,
        step,
        outcome,
        safety,
        operands: ops,
    })
}

fn validate(input: &CalculationInput) -> Result<Operands, ValidationErrors> {
    let mut errors = Vec::new();
    let mut check = |field: Field, value: Option<f64>, divisor: bool| -> f64 {
        let reason = match value {
            None => Reason::Missing,
            Some(v) if !v.is_finite() => Reason::NotFinite,
            Some(v) if v < 0.0 => Reason::Negative,
            Some(v) if divisor && v == 0.0 => Reason::ZeroDenominator,
            Some(v) => return v,
        };
        errors.push(ValidationError { field, reason });
        0.0
    };

    let carbs_to_eat = check(Field::CarbsToEat, input.carbs_to_eat, false);
    let current_glucose = check(Field::CurrentGlucose, input.current_glucose, false);
    let carb_ratio = check(Field::CarbRatio, input.carb_ratio, true);
    let correction_factor = check(Field::CorrectionFactor, input.correction_factor, true);
    let target = check(Field::Target, input.target, false);

    let trend_adjustment = input.trend_adjustment;
    if trend_adjustment.is_some_and(|v| !v.is_finite()) {
        errors.push(ValidationError {
            field: Field::TrendAdjustment,
            reason: Reason::NotFinite,
        });
    }

    if !errors.is_empty() {
        return Err(ValidationErrors::new(errors));
    }
    Ok(Operands {
        carbs_to_eat,
        current_glucose,
        carb_ratio,
        correction_factor,
        target,
        trend_adjustment,
    })
}
