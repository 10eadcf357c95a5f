//! JSON records kept in the key-value store.
//!
//! Readers are lenient: numeric fields accept numbers, numeric strings, `""`
//! and `null`, and anything unusable loads as unset. A value that cannot be
//! parsed at all is logged and discarded, never surfaced as an error.

use insulin_traits::KvStore;
use serde::de::{Deserializer, IgnoredAny};
use serde::{Deserialize, Serialize};

use crate::Settings;

pub const KEY_PROFILES: &str = "ic_profiles";
pub const KEY_SETTINGS: &str = "ic_settings";
pub const KEY_ACTIVE_PROFILE: &str = "ic_activeProfileId";
pub const KEY_LEGACY_DAY: &str = "preset_day";
pub const KEY_LEGACY_NIGHT: &str = "preset_night";
pub const KEY_ACCEPTED_TERMS: &str = "acceptedTerms";

/// Stored profile record.
///
/// Window fields are `"HH:MM"` strings; glucose-valued fields are mg/dL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedProfile {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(
        default,
        deserialize_with = "de_blank_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_time: Option<String>,
    #[serde(
        default,
        deserialize_with = "de_blank_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_time: Option<String>,
    #[serde(default, deserialize_with = "de_lenient_f64")]
    pub carb_ratio: Option<f64>,
    #[serde(default, deserialize_with = "de_lenient_f64")]
    pub correction_factor: Option<f64>,
    #[serde(default, deserialize_with = "de_lenient_f64")]
    pub target: Option<f64>,
    /// Older records call this `dexcomValue`.
    #[serde(default, alias = "dexcomValue", deserialize_with = "de_lenient_f64")]
    pub trend_adjustment: Option<f64>,
}

/// Constants from the two-preset (Day/Night) layout that predates profiles.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyPreset {
    #[serde(default, deserialize_with = "de_lenient_f64")]
    pub carb_ratio: Option<f64>,
    #[serde(default, deserialize_with = "de_lenient_f64")]
    pub correction_factor: Option<f64>,
    #[serde(default, deserialize_with = "de_lenient_f64")]
    pub target: Option<f64>,
    #[serde(default, rename = "dexcomValue", deserialize_with = "de_lenient_f64")]
    pub trend_adjustment: Option<f64>,
}

/// Legacy presets found in the store. A present-but-corrupt preset loads as
/// `Some(LegacyPreset::default())` so its profile is still created.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LegacyPresets {
    pub day: Option<LegacyPreset>,
    pub night: Option<LegacyPreset>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LenientNumber {
    Number(f64),
    Text(String),
    Other(IgnoredAny),
}

fn de_lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<LenientNumber> = Option::deserialize(deserializer)?;
    let value = match opt {
        Some(LenientNumber::Number(v)) => Some(v),
        Some(LenientNumber::Text(s)) => s.trim().parse::<f64>().ok(),
        Some(LenientNumber::Other(_)) | None => None,
    };
    Ok(value.filter(|v| v.is_finite()))
}

fn de_blank_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

/// Load the profile list. Absent or corrupt data yields an empty list.
pub fn load_profiles(store: &dyn KvStore) -> Vec<PersistedProfile> {
    let Some(raw) = store.get(KEY_PROFILES) else {
        return Vec::new();
    };
    match serde_json::from_str::<Vec<PersistedProfile>>(&raw) {
        Ok(profiles) => profiles,
        Err(e) => {
            tracing::warn!(key = KEY_PROFILES, error = %e, "discarding corrupt profiles");
            Vec::new()
        }
    }
}

/// Load stored settings merged key-by-key over `defaults`.
pub fn load_settings(store: &dyn KvStore, defaults: &Settings) -> Settings {
    let Some(raw) = store.get(KEY_SETTINGS) else {
        return defaults.clone();
    };
    match merge_settings(defaults, &raw) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!(key = KEY_SETTINGS, error = %e, "discarding corrupt settings");
            defaults.clone()
        }
    }
}

/// Overlay the keys present in `raw` onto `defaults`.
pub fn merge_settings(defaults: &Settings, raw: &str) -> eyre::Result<Settings> {
    let mut base = serde_json::to_value(defaults)?;
    let patch: serde_json::Value = serde_json::from_str(raw)?;
    let serde_json::Value::Object(patch) = patch else {
        eyre::bail!("settings must be a JSON object");
    };
    if let serde_json::Value::Object(base_map) = &mut base {
        base_map.extend(patch);
    }
    Ok(serde_json::from_value(base)?)
}

/// Remembered active profile id. The literal `"null"` counts as unset.
pub fn load_active_id(store: &dyn KvStore) -> Option<String> {
    store
        .get(KEY_ACTIVE_PROFILE)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && s != "null")
}

/// Legacy presets awaiting migration. `None` once profiles exist or when
/// neither preset key is present.
pub fn load_legacy_presets(store: &dyn KvStore) -> Option<LegacyPresets> {
    if store.get(KEY_PROFILES).is_some() {
        return None;
    }
    let read = |key: &str| {
        store.get(key).map(|raw| {
            serde_json::from_str::<LegacyPreset>(&raw).unwrap_or_else(|e| {
                tracing::warn!(key, error = %e, "legacy preset unreadable; migrating with blank constants");
                LegacyPreset::default()
            })
        })
    };
    let presets = LegacyPresets {
        day: read(KEY_LEGACY_DAY),
        night: read(KEY_LEGACY_NIGHT),
    };
    if presets.day.is_none() && presets.night.is_none() {
        return None;
    }
    Some(presets)
}

pub fn clear_legacy_presets(store: &mut dyn KvStore) -> eyre::Result<()> {
    store
        .remove(KEY_LEGACY_DAY)
        .map_err(|e| eyre::eyre!("remove {KEY_LEGACY_DAY}: {e}"))?;
    store
        .remove(KEY_LEGACY_NIGHT)
        .map_err(|e| eyre::eyre!("remove {KEY_LEGACY_NIGHT}: {e}"))?;
    Ok(())
}

pub fn save_profiles(store: &mut dyn KvStore, profiles: &[PersistedProfile]) -> eyre::Result<()> {
    let text = serde_json::to_string(profiles)?;
    store
        .set(KEY_PROFILES, text)
        .map_err(|e| eyre::eyre!("write {KEY_PROFILES}: {e}"))
}

pub fn save_settings(store: &mut dyn KvStore, settings: &Settings) -> eyre::Result<()> {
    let text = serde_json::to_string(settings)?;
    store
        .set(KEY_SETTINGS, text)
        .map_err(|e| eyre::eyre!("write {KEY_SETTINGS}: {e}"))
}

pub fn save_active_id(store: &mut dyn KvStore, id: &str) -> eyre::Result<()> {
    store
        .set(KEY_ACTIVE_PROFILE, id.to_string())
        .map_err(|e| eyre::eyre!("write {KEY_ACTIVE_PROFILE}: {e}"))
}

/// Whether the usage terms were accepted. Only the literal `"true"` counts.
pub fn load_terms_accepted(store: &dyn KvStore) -> bool {
    store.get(KEY_ACCEPTED_TERMS).is_some_and(|v| v.trim() == "true")
}

pub fn save_terms_accepted(store: &mut dyn KvStore) -> eyre::Result<()> {
    store
        .set(KEY_ACCEPTED_TERMS, "true".to_string())
        .map_err(|e| eyre::eyre!("write {KEY_ACCEPTED_TERMS}: {e}"))
}
