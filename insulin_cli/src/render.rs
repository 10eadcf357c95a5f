//! Text and JSON rendering of command results.
//!
//! Every function returns the full output as a `String`; `main` decides
//! where it goes.

use insulin_config::Theme;
use insulin_core::{
    AppState, CalculationResult, DoseOutcome, GlucoseUnit, MinuteOfDay,
    Profile, SafetyBand, Settings, TimelineSegment, TrendArrow,
};
use insulin_core::profile::MINUTES_PER_DAY;
use serde_json::{Value, json};

/// Usage terms shown by `accept-terms`.
pub const TERMS: &str = "This calculator is an aid for people already trained to dose insulin. \
It does not replace advice from your diabetes care team. Check every result before you act \
on it; you remain responsible for each dose you take.";

/// Minutes per timeline column.
const SLOT_MINUTES: u16 = 30;

fn theme_name(t: Theme) -> &'static str {
    match t {
        Theme::System => "system",
        Theme::Light => "light",
        Theme::Dark => "dark",
    }
}

fn minute_label(m: u16) -> String {
    MinuteOfDay::new(m).map_or_else(|| "24:00".to_string(), |m| m.to_string())
}

fn trend_text(mgdl: f64) -> String {
    match TrendArrow::from_mgdl(mgdl) {
        Some(a) => format!("{} ({mgdl:+})", a.label()),
        None => format!("{mgdl:+} mg/dL"),
    }
}

fn optional(v: Option<f64>, f: impl Fn(f64) -> String) -> String {
    v.map_or_else(|| "-".to_string(), f)
}

/// Warning line for a non-normal band, with the threshold in the display unit.
pub fn safety_banner(band: SafetyBand, unit: GlucoseUnit) -> Option<String> {
    let threshold = unit.format(band.quoted_threshold_mgdl()?);
    let label = unit.label();
    let text = match band {
        SafetyBand::SevereLow => {
            format!("Below {threshold} {label}: take immediate action to raise blood sugar.")
        }
        SafetyBand::Low => {
            format!("Below {threshold} {label}: take 15g fast-acting carbs, recheck in 15 min.")
        }
        SafetyBand::High => format!("Above {threshold} {label}: consider checking ketone levels."),
        SafetyBand::Normal => return None,
    };
    Some(format!("WARNING {text}"))
}

fn window_text(p: &Profile) -> String {
    p.window
        .map_or_else(|| "(no window)".to_string(), |w| w.to_string())
}

pub fn calc_text(profile: &Profile, r: &CalculationResult, unit: GlucoseUnit) -> String {
    let ops = &r.operands;
    let g = |mgdl: f64| unit.format(mgdl);
    let trend = match ops.trend_adjustment {
        Some(t) if t < 0.0 => format!(" - Trend ({})", g(t.abs())),
        Some(t) => format!(" + Trend ({})", g(t)),
        None => String::new(),
    };

    let mut out = String::new();
    out.push_str(&format!("Profile: {} {}\n", profile.name, window_text(profile)));
    out.push_str(&format!(
        "Carb dose:       Carbs ({}) / Ratio ({}) = {:.3}\n",
        ops.carbs_to_eat, ops.carb_ratio, r.carb_dose
    ));
    out.push_str(&format!(
        "Correction dose: (Current ({}){trend} - Target ({})) / Factor ({}) = {:.3}\n",
        g(ops.current_glucose),
        g(ops.target),
        g(ops.correction_factor),
        r.correction_dose
    ));
    out.push_str(&format!(
        "Total:           Carb ({:.3}) + Correction ({:.3}) = {:.3}\n",
        r.carb_dose, r.correction_dose, r.raw_total
    ));
    match r.outcome {
        DoseOutcome::Dose { units } => {
            out.push_str(&format!("Dose: {units:.*}u\n", r.decimals()));
        }
        DoseOutcome::CarbDeficit { grams } => {
            out.push_str(&format!(
                "Dose: {:.*}u ({grams}g carb deficit)\n",
                r.decimals(),
                0.0
            ));
        }
    }
    if let Some(banner) = safety_banner(r.safety, unit) {
        out.push_str(&banner);
        out.push('\n');
    }
    out
}

pub fn calc_json(profile: &Profile, r: &CalculationResult, unit: GlucoseUnit) -> Value {
    let ops = &r.operands;
    let (outcome, deficit) = match r.outcome {
        DoseOutcome::Dose { .. } => ("dose", Value::Null),
        DoseOutcome::CarbDeficit { grams } => ("carb-deficit", json!(grams)),
    };
    json!({
        "profile": { "id": profile.id.as_str(), "name": profile.name },
        "units": unit.label(),
        "carb_dose": r.carb_dose,
        "correction_dose": r.correction_dose,
        "raw_total": r.raw_total,
        "rounded_total": r.rounded_total,
        "rounding_step": r.step.get(),
        "dose_units": r.dose_units(),
        "dose_text": format!("{:.*}", r.decimals(), r.dose_units()),
        "outcome": outcome,
        "carb_deficit_g": deficit,
        "safety": r.safety.name(),
        "safety_message": safety_banner(r.safety, unit),
        "effective_glucose_mgdl": r.effective_glucose,
        "inputs": {
            "carbs_to_eat": ops.carbs_to_eat,
            "current_glucose_mgdl": ops.current_glucose,
            "carb_ratio": ops.carb_ratio,
            "correction_factor_mgdl": ops.correction_factor,
            "target_mgdl": ops.target,
            "trend_adjustment_mgdl": ops.trend_adjustment,
        },
    })
}

pub fn profile_json(p: &Profile, active: bool, unit: GlucoseUnit) -> Value {
    json!({
        "id": p.id.as_str(),
        "name": p.name,
        "active": active,
        "start": p.window.map(|w| w.start().to_string()),
        "end": p.window.map(|w| w.end().to_string()),
        "carb_ratio": p.carb_ratio,
        "correction_factor": p.correction_factor.map(|v| unit.round_for_display(v)),
        "target": p.target.map(|v| unit.round_for_display(v)),
        "trend_adjustment_mgdl": p.trend_adjustment,
    })
}

pub fn profiles_text(state: &AppState) -> String {
    let unit = state.settings().units;
    let width = state
        .profiles()
        .iter()
        .map(|p| p.name.chars().count())
        .max()
        .unwrap_or(0);
    let mut out = String::new();
    for p in state.profiles() {
        let marker = if &p.id == state.active_id() { '*' } else { ' ' };
        out.push_str(&format!(
            "{marker} {:<width$}  {:<11}  CR {}  CF {}  Target {}  Trend {}  [{}]\n",
            p.name,
            window_text(p),
            optional(p.carb_ratio, |v| v.to_string()),
            optional(p.correction_factor, |v| unit.format(v)),
            optional(p.target, |v| unit.format(v)),
            optional(p.trend_adjustment, trend_text),
            p.id,
        ));
    }
    out
}

pub fn profiles_json(state: &AppState) -> Value {
    let unit = state.settings().units;
    Value::Array(
        state
            .profiles()
            .iter()
            .map(|p| profile_json(p, &p.id == state.active_id(), unit))
            .collect(),
    )
}

pub fn profile_line(p: &Profile, unit: GlucoseUnit) -> String {
    format!(
        "{} {}  CR {}  CF {}  Target {} {}",
        p.name,
        window_text(p),
        optional(p.carb_ratio, |v| v.to_string()),
        optional(p.correction_factor, |v| unit.format(v)),
        optional(p.target, |v| unit.format(v)),
        unit.label()
    )
}

pub fn active_text(state: &AppState, now: MinuteOfDay, by_time: bool) -> String {
    let p = state.active_profile();
    let how = if by_time {
        "time window"
    } else {
        "no window covers this time; remembered profile"
    };
    format!(
        "{} at {} ({})\n{}\n",
        p.name,
        now,
        how,
        profile_line(p, state.settings().units)
    )
}

pub fn active_json(state: &AppState, now: MinuteOfDay, by_time: bool) -> Value {
    let mut v = profile_json(state.active_profile(), true, state.settings().units);
    if let Value::Object(map) = &mut v {
        map.insert("at".into(), json!(now.to_string()));
        map.insert("matched_by_time".into(), json!(by_time));
    }
    v
}

pub fn settings_text(s: &Settings) -> String {
    format!(
        "units: {}\nrounding: {}\ntheme: {}\n",
        s.units.name(),
        s.rounding.get(),
        theme_name(s.theme)
    )
}

pub fn settings_json(s: &Settings) -> Value {
    json!({
        "units": s.units.name(),
        "rounding": s.rounding.get(),
        "theme": theme_name(s.theme),
    })
}

fn slot_covered(segs: &[&TimelineSegment], slot: usize) -> bool {
    let minute = slot * usize::from(SLOT_MINUTES);
    segs.iter()
        .any(|s| usize::from(s.from) <= minute && minute < usize::from(s.to))
}

/// 24-hour track per profile, one column per half hour, with a marker at `now`.
pub fn timeline_text(state: &AppState, segments: &[TimelineSegment], now: MinuteOfDay) -> String {
    let slots = usize::from(MINUTES_PER_DAY / SLOT_MINUTES);
    let width = state
        .profiles()
        .iter()
        .map(|p| p.name.chars().count())
        .max()
        .unwrap_or(0);

    let mut header = String::new();
    for h in (0..24).step_by(6) {
        header.push_str(&format!("|{h:02}:00{:6}", ""));
    }
    header.push('|');

    let mut out = format!("{:width$}  {header}\n", "");
    for p in state.profiles() {
        let mine: Vec<&TimelineSegment> = segments.iter().filter(|s| s.id == p.id).collect();
        let track: String = if mine.is_empty() {
            "(no window)".to_string()
        } else {
            (0..slots)
                .map(|i| if slot_covered(&mine, i) { '#' } else { '.' })
                .collect()
        };
        out.push_str(&format!("{:<width$}  {track}\n", p.name));
    }
    let col = usize::from(now.get() / SLOT_MINUTES);
    out.push_str(&format!("{:width$}  {:col$}^ {now}\n", "", ""));
    out
}

pub fn timeline_json(state: &AppState, segments: &[TimelineSegment]) -> Value {
    let segs: Vec<Value> = segments
        .iter()
        .map(|s| {
            let name = state.profile(&s.id).map(|p| p.name.clone());
            json!({
                "id": s.id.as_str(),
                "name": name,
                "lane": s.lane,
                "from": minute_label(s.from),
                "to": minute_label(s.to),
            })
        })
        .collect();
    json!({ "segments": segs })
}
