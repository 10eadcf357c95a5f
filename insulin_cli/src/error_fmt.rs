//! Human-readable error descriptions and structured JSON error formatting.

use insulin_core::{Field, StateError, ValidationErrors};

/// Exit code for rejected calculator input.
pub const EXIT_VALIDATION: i32 = 3;
/// Exit code for rejected profile or settings operations.
pub const EXIT_STATE: i32 = 4;

fn flag_for(field: Field) -> &'static str {
    match field {
        Field::CarbsToEat => "--carbs",
        Field::CurrentGlucose => "--glucose",
        Field::CarbRatio => "--carb-ratio",
        Field::CorrectionFactor => "--correction-factor",
        Field::Target => "--target",
        Field::TrendAdjustment => "--trend-value",
    }
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(ve) = err.downcast_ref::<ValidationErrors>() {
        let fields: Vec<String> = ve.iter().map(|e| format!("{} ({})", e.field, e.reason)).collect();
        let flags: Vec<&str> = ve.iter().map(|e| flag_for(e.field)).collect();
        if ve.only_missing() {
            return format!(
                "What happened: Missing input: {}.\nLikely causes: The value was not given and the active profile has none stored.\nHow to fix: Pass {} (constants are remembered after the first successful calculation).",
                fields.join(", "),
                flags.join(", ")
            );
        }
        return format!(
            "What happened: Invalid input: {}.\nLikely causes: A negative or zero value, or a typo in a number.\nHow to fix: Check {}; ratios and factors must be greater than zero.",
            fields.join(", "),
            flags.join(", ")
        );
    }

    if let Some(se) = err.downcast_ref::<StateError>() {
        return match se {
            StateError::LastProfile => {
                "What happened: Refused to delete the only remaining profile.\nLikely causes: At least one profile must always exist.\nHow to fix: Add another profile first (`insulin profiles add`), then delete this one.".to_string()
            }
            StateError::UnknownProfile(key) => format!(
                "What happened: No profile matches '{key}'.\nLikely causes: Misspelled name or a stale id.\nHow to fix: Run `insulin profiles list` and use an exact name or id."
            ),
            StateError::EditInProgress | StateError::NoPendingEdit => format!(
                "What happened: {se}.\nLikely causes: Profile edits were started or finished out of order.\nHow to fix: Retry the command."
            ),
            StateError::TermsNotAccepted => {
                "What happened: Refused to calculate before the usage terms were accepted.\nLikely causes: First run, or a new state file.\nHow to fix: Read and accept the terms with `insulin accept-terms`, then rerun.".to_string()
            }
            StateError::InvalidSetting(msg) => format!(
                "What happened: Invalid setting ({msg}).\nLikely causes: Zero, negative or non-numeric value.\nHow to fix: Pass a positive number, e.g. `insulin settings --rounding 0.5`."
            ),
        };
    }

    if let Some(te) = err.downcast_ref::<toml::de::Error>() {
        return format!(
            "What happened: The config file is not valid TOML ({}).\nLikely causes: A typo, an unknown unit or theme name, or a value of the wrong type.\nHow to fix: Edit the config file, then rerun. See etc/insulin_config.toml for a sample.",
            te.message()
        );
    }

    // String-based heuristics for errors coming from config validation or I/O
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.starts_with("defaults.") || lower.starts_with("storage.") || lower.starts_with("logging.") {
        return format!(
            "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
        );
    }

    if lower.contains("read config") {
        return format!(
            "What happened: Could not read the config file ({msg}).\nLikely causes: Wrong --config path or missing permissions.\nHow to fix: Check the path, or omit --config to use built-in defaults."
        );
    }

    if lower.contains("write ") || lower.contains("saving") {
        return format!(
            "What happened: Could not save state ({msg}).\nLikely causes: The state directory is read-only or the disk is full.\nHow to fix: Pass a writable --state path or fix storage.path in the config."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: 3 for calculator input, 4 for profile/settings
/// operations, 1 for everything else.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<ValidationErrors>().is_some() {
        return EXIT_VALIDATION;
    }
    if err.downcast_ref::<StateError>().is_some() {
        return EXIT_STATE;
    }
    1
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    if let Some(ve) = err.downcast_ref::<ValidationErrors>() {
        let fields: Vec<_> = ve
            .iter()
            .map(|e| json!({ "field": e.field.name(), "reason": e.reason.name() }))
            .collect();
        return json!({ "reason": "Validation", "fields": fields, "message": humanize(err) })
            .to_string();
    }

    if let Some(se) = err.downcast_ref::<StateError>() {
        let reason = match se {
            StateError::LastProfile => "LastProfile",
            StateError::UnknownProfile(_) => "UnknownProfile",
            StateError::EditInProgress => "EditInProgress",
            StateError::NoPendingEdit => "NoPendingEdit",
            StateError::InvalidSetting(_) => "InvalidSetting",
            StateError::TermsNotAccepted => "TermsNotAccepted",
        };
        return json!({ "reason": reason, "message": humanize(err) }).to_string();
    }

    // Generic error JSON
    json!({ "reason": "Error", "message": humanize(err) }).to_string()
}
