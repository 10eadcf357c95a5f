//! Application state: the profile set, settings, the active profile and at
//! most one pending profile edit.
//!
//! `AppState` owns everything the interactive layer mutates. The pure
//! functions in [`crate::schedule`] and [`crate::dose`] never see it; it
//! calls them and applies their results.

use std::collections::HashSet;

use eyre::WrapErr;
use insulin_config::persisted;
use insulin_config::{LegacyPreset, PersistedProfile, Theme};
use insulin_traits::{Clock, KvStore};

use crate::dose::{CalculationInput, CalculationResult, RoundingStep, compute_dose};
use crate::error::{Report, Result, StateError, ValidationErrors};
use crate::profile::{Constant, MinuteOfDay, Profile, ProfileId, TimeWindow};
use crate::schedule::resolve_active;
use crate::units::GlucoseUnit;

/// Runtime settings with validated values.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Settings {
    pub units: GlucoseUnit,
    pub rounding: RoundingStep,
    /// Persisted and reported only.
    pub theme: Theme,
}

/// A profile being created or edited.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileDraft {
    pub profile: Profile,
    /// True for a profile that is not yet part of the set.
    pub is_new: bool,
}

/// Editor form contents. Glucose-valued fields are in the display unit.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProfileEdit {
    pub name: String,
    pub window: Option<TimeWindow>,
    pub carb_ratio: Option<f64>,
    pub correction_factor: Option<f64>,
    pub target: Option<f64>,
}

impl ProfileEdit {
    /// Form prefilled from `profile`, converted to `unit`.
    pub fn from_profile(profile: &Profile, unit: GlucoseUnit) -> Self {
        Self {
            name: profile.name.clone(),
            window: profile.window,
            carb_ratio: profile.carb_ratio,
            correction_factor: profile.correction_factor.map(|v| unit.to_display(v)),
            target: profile.target.map(|v| unit.to_display(v)),
        }
    }
}

/// Calculator form contents.
///
/// Constants left `None` fall back to the active profile. Glucose-valued
/// fields are in the display unit except `trend_adjustment`, which is always
/// mg/dL.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MealInput {
    pub carbs_to_eat: Option<f64>,
    pub current_glucose: Option<f64>,
    pub carb_ratio: Option<f64>,
    pub correction_factor: Option<f64>,
    pub target: Option<f64>,
    pub trend_adjustment: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    profiles: Vec<Profile>,
    settings: Settings,
    active: ProfileId,
    pending: Option<ProfileDraft>,
    terms_accepted: bool,
}

impl AppState {
    /// Build a state from already-loaded parts. An empty profile set is
    /// replaced by the default Day/Night pair; an unknown `active` falls back
    /// to the first profile.
    pub fn from_parts(
        mut profiles: Vec<Profile>,
        settings: Settings,
        active: Option<ProfileId>,
    ) -> Self {
        if profiles.is_empty() {
            profiles = vec![Profile::day(), Profile::night()];
        }
        let active = active
            .filter(|id| profiles.iter().any(|p| &p.id == id))
            .unwrap_or_else(|| profiles[0].id.clone());
        Self {
            profiles,
            settings,
            active,
            pending: None,
            terms_accepted: false,
        }
    }

    /// Load state from `store`, migrating and repairing as needed, then pick
    /// the active profile for the current time. Anything changed on the way
    /// is written back before returning.
    pub fn load(
        store: &mut dyn KvStore,
        clock: &dyn Clock,
        defaults: &insulin_config::Settings,
    ) -> Result<Self> {
        let settings = Settings::from(&persisted::load_settings(store, defaults));
        let mut dirty = false;

        let legacy = persisted::load_legacy_presets(store);
        let migrated = legacy.is_some();
        let (mut profiles, mut remembered) = match legacy {
            Some(presets) => {
                let blank = LegacyPreset::default();
                let day = Profile::from_legacy(Profile::day(), presets.day.as_ref().unwrap_or(&blank));
                let night =
                    Profile::from_legacy(Profile::night(), presets.night.as_ref().unwrap_or(&blank));
                tracing::info!(
                    day = presets.day.is_some(),
                    night = presets.night.is_some(),
                    "migrating legacy day/night presets to profiles"
                );
                dirty = true;
                let active = day.id.clone();
                (vec![day, night], Some(active))
            }
            None => (
                persisted::load_profiles(store)
                    .into_iter()
                    .map(Profile::from)
                    .collect::<Vec<_>>(),
                persisted::load_active_id(store).map(ProfileId::from),
            ),
        };

        let mut seen = HashSet::new();
        for p in &mut profiles {
            if !seen.insert(p.id.clone()) {
                let fresh = ProfileId::generate();
                tracing::warn!(duplicate = %p.id, replacement = %fresh, "duplicate profile id");
                p.id = fresh;
                dirty = true;
            }
            if p.window.is_none()
                && let Some(window) = Profile::default_window_for(&p.name)
            {
                tracing::debug!(profile = %p.id, name = %p.name, %window, "backfilling default window");
                p.window = Some(window);
                dirty = true;
            }
        }

        if profiles.is_empty() {
            tracing::info!("no stored profiles; creating Day and Night");
            let day = Profile::day();
            remembered = Some(day.id.clone());
            profiles = vec![day, Profile::night()];
            dirty = true;
        }

        let now = MinuteOfDay::new(clock.minute_of_day()).unwrap_or(MinuteOfDay::MIDNIGHT);
        let active = match resolve_active(&profiles, now) {
            Some(id) => id.clone(),
            None => remembered
                .clone()
                .filter(|id| profiles.iter().any(|p| &p.id == id))
                .unwrap_or_else(|| profiles[0].id.clone()),
        };
        if remembered.as_ref() != Some(&active) {
            dirty = true;
        }

        let state = Self {
            profiles,
            settings,
            active,
            pending: None,
            terms_accepted: persisted::load_terms_accepted(store),
        };
        tracing::info!(
            profiles = state.profiles.len(),
            active = %state.active,
            %now,
            "state loaded"
        );

        if dirty {
            state.save(store).wrap_err("saving repaired state")?;
        }
        if migrated {
            persisted::clear_legacy_presets(store)?;
        }
        Ok(state)
    }

    /// Write profiles, settings and the active id.
    pub fn save(&self, store: &mut dyn KvStore) -> Result<()> {
        let records: Vec<PersistedProfile> = self.profiles.iter().map(PersistedProfile::from).collect();
        persisted::save_profiles(store, &records)?;
        persisted::save_settings(store, &insulin_config::Settings::from(&self.settings))?;
        persisted::save_active_id(store, self.active.as_str())?;
        if self.terms_accepted {
            persisted::save_terms_accepted(store)?;
        }
        tracing::debug!(profiles = records.len(), active = %self.active, "state saved");
        Ok(())
    }

    pub fn terms_accepted(&self) -> bool {
        self.terms_accepted
    }

    /// Record acceptance of the usage terms. Acceptance is never revoked.
    pub fn accept_terms(&mut self) {
        if !self.terms_accepted {
            tracing::info!("usage terms accepted");
            self.terms_accepted = true;
        }
    }

    /// Fail with [`StateError::TermsNotAccepted`] until the terms are accepted.
    pub fn require_terms(&self) -> Result<()> {
        if self.terms_accepted {
            Ok(())
        } else {
            Err(Report::new(StateError::TermsNotAccepted))
        }
    }

    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn active_id(&self) -> &ProfileId {
        &self.active
    }

    pub fn profile(&self, id: &ProfileId) -> Option<&Profile> {
        self.profiles.iter().find(|p| &p.id == id)
    }

    /// Look up a profile by id, or by exact name when no id matches.
    pub fn find(&self, key: &str) -> Option<&Profile> {
        self.profiles
            .iter()
            .find(|p| p.id.as_str() == key)
            .or_else(|| self.profiles.iter().find(|p| p.name == key))
    }

    pub fn active_profile(&self) -> &Profile {
        self.profile(&self.active).unwrap_or(&self.profiles[0])
    }

    fn active_profile_mut(&mut self) -> &mut Profile {
        let idx = self
            .profiles
            .iter()
            .position(|p| p.id == self.active)
            .unwrap_or(0);
        &mut self.profiles[idx]
    }

    fn require(&self, id: &ProfileId) -> Result<()> {
        if self.profile(id).is_none() {
            return Err(Report::new(StateError::UnknownProfile(id.to_string())));
        }
        Ok(())
    }

    pub fn switch_profile(&mut self, id: &ProfileId) -> Result<()> {
        self.require(id)?;
        if &self.active != id {
            tracing::info!(from = %self.active, to = %id, "switching profile");
            self.active = id.clone();
        }
        Ok(())
    }

    /// Re-run time-of-day selection. Returns true when the active profile
    /// changed; when no window covers the current time the active profile is
    /// kept.
    pub fn reselect_by_time(&mut self, clock: &dyn Clock) -> bool {
        let now = MinuteOfDay::new(clock.minute_of_day()).unwrap_or(MinuteOfDay::MIDNIGHT);
        match resolve_active(&self.profiles, now) {
            Some(id) if id != &self.active => {
                let id = id.clone();
                tracing::info!(from = %self.active, to = %id, %now, "time window changed active profile");
                self.active = id;
                true
            }
            _ => false,
        }
    }

    pub fn pending(&self) -> Option<&ProfileDraft> {
        self.pending.as_ref()
    }

    /// Start creating a profile named `Profile N+1`.
    pub fn begin_new_profile(&mut self) -> Result<&ProfileDraft> {
        if self.pending.is_some() {
            return Err(Report::new(StateError::EditInProgress));
        }
        let name = format!("{} {}", Profile::DEFAULT_NAME, self.profiles.len() + 1);
        let draft = ProfileDraft {
            profile: Profile::new(&name, None),
            is_new: true,
        };
        tracing::debug!(profile = %draft.profile.id, %name, "new profile draft");
        Ok(&*self.pending.insert(draft))
    }

    pub fn begin_edit(&mut self, id: &ProfileId) -> Result<&ProfileDraft> {
        if self.pending.is_some() {
            return Err(Report::new(StateError::EditInProgress));
        }
        let profile = self
            .profile(id)
            .cloned()
            .ok_or_else(|| Report::new(StateError::UnknownProfile(id.to_string())))?;
        tracing::debug!(profile = %id, "editing profile");
        Ok(&*self.pending.insert(ProfileDraft {
            profile,
            is_new: false,
        }))
    }

    /// Editor form for the pending draft, in the current display unit.
    pub fn edit_form(&self) -> Result<ProfileEdit> {
        let draft = self
            .pending
            .as_ref()
            .ok_or_else(|| Report::new(StateError::NoPendingEdit))?;
        Ok(ProfileEdit::from_profile(&draft.profile, self.settings.units))
    }

    /// Apply `edit` to the pending draft and store it. A new profile is
    /// appended to the set. Returns the profile's id.
    pub fn commit_edit(&mut self, edit: ProfileEdit) -> Result<ProfileId> {
        let draft = self
            .pending
            .take()
            .ok_or_else(|| Report::new(StateError::NoPendingEdit))?;
        let unit = self.settings.units;
        let finite = |v: Option<f64>| v.filter(|x| x.is_finite());

        let mut profile = draft.profile;
        profile.rename(&edit.name);
        profile.window = edit.window;
        profile.carb_ratio = finite(edit.carb_ratio);
        profile.correction_factor = finite(edit.correction_factor).map(|v| unit.to_internal(v));
        profile.target = finite(edit.target).map(|v| unit.to_internal(v));

        let id = profile.id.clone();
        if draft.is_new {
            tracing::info!(profile = %id, name = %profile.name, "profile created");
            self.profiles.push(profile);
        } else {
            let slot = self
                .profiles
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or_else(|| Report::new(StateError::UnknownProfile(id.to_string())))?;
            tracing::info!(profile = %id, name = %profile.name, "profile updated");
            *slot = profile;
        }
        Ok(id)
    }

    /// Drop the pending draft. Returns false when nothing was pending.
    pub fn cancel_edit(&mut self) -> bool {
        self.pending.take().is_some()
    }

    /// Remove a profile. The last remaining profile cannot be deleted;
    /// deleting the active profile activates the first remaining one.
    pub fn delete_profile(&mut self, id: &ProfileId) -> Result<()> {
        self.require(id)?;
        if self.profiles.len() <= 1 {
            return Err(Report::new(StateError::LastProfile));
        }
        self.profiles.retain(|p| &p.id != id);
        if self
            .pending
            .as_ref()
            .is_some_and(|d| !d.is_new && &d.profile.id == id)
        {
            self.pending = None;
        }
        if &self.active == id {
            self.active = self.profiles[0].id.clone();
        }
        tracing::info!(profile = %id, active = %self.active, "profile deleted");
        Ok(())
    }

    pub fn set_units(&mut self, units: GlucoseUnit) {
        self.settings.units = units;
    }

    pub fn set_rounding(&mut self, step: f64) -> Result<()> {
        self.settings.rounding = RoundingStep::new(step).map_err(Report::new)?;
        Ok(())
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.settings.theme = theme;
    }

    /// Set or clear the active profile's trend adjustment (mg/dL).
    pub fn set_trend(&mut self, mgdl: Option<f64>) -> Result<()> {
        if mgdl.is_some_and(|v| !v.is_finite()) {
            return Err(Report::new(StateError::InvalidSetting(
                "trend adjustment must be a finite number",
            )));
        }
        self.active_profile_mut().trend_adjustment = mgdl;
        Ok(())
    }

    /// Forget one stored constant on the active profile.
    pub fn clear_constant(&mut self, which: Constant) {
        self.active_profile_mut().clear_constant(which);
    }

    /// Run the calculator with `meal`, filling blank constants from the
    /// active profile. On success the constants used are stored back on the
    /// active profile; the caller persists them.
    pub fn calculate(&mut self, meal: &MealInput) -> std::result::Result<CalculationResult, ValidationErrors> {
        let unit = self.settings.units;
        let to_mgdl = |v: f64| unit.to_internal(v);
        let profile = self.active_profile();

        let input = CalculationInput {
            carbs_to_eat: meal.carbs_to_eat,
            current_glucose: meal.current_glucose.map(to_mgdl),
            carb_ratio: meal.carb_ratio.or(profile.carb_ratio),
            correction_factor: meal.correction_factor.map(to_mgdl).or(profile.correction_factor),
            target: meal.target.map(to_mgdl).or(profile.target),
            trend_adjustment: meal.trend_adjustment.or(profile.trend_adjustment),
        };

        let result = compute_dose(&input, self.settings.rounding).inspect_err(|errs| {
            tracing::debug!(profile = %self.active, errors = %errs, "calculation rejected");
        })?;

        let ops = result.operands;
        let active = self.active_profile_mut();
        active.carb_ratio = Some(ops.carb_ratio);
        active.correction_factor = Some(ops.correction_factor);
        active.target = Some(ops.target);
        if meal.trend_adjustment.is_some() {
            active.trend_adjustment = ops.trend_adjustment;
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AppState {
        AppState::from_parts(Vec::new(), Settings::default(), None)
    }

    #[test]
    fn from_parts_fills_defaults() {
        let s = state();
        assert_eq!(s.profiles().len(), 2);
        assert_eq!(s.active_profile().name, "Day");
    }

    #[test]
    fn new_profile_is_numbered_after_the_set() {
        let mut s = state();
        let draft = s.begin_new_profile().unwrap();
        assert_eq!(draft.profile.name, "Profile 3");
        assert!(draft.is_new);
    }

    #[test]
    fn terms_gate_opens_once_accepted() {
        let mut s = state();
        let err = s.require_terms().unwrap_err();
        assert_eq!(err.downcast_ref::<StateError>(), Some(&StateError::TermsNotAccepted));
        s.accept_terms();
        assert!(s.terms_accepted());
        assert!(s.require_terms().is_ok());
    }

    #[test]
    fn cancel_leaves_set_untouched() {
        let mut s = state();
        s.begin_new_profile().unwrap();
        assert!(s.cancel_edit());
        assert!(!s.cancel_edit());
        assert_eq!(s.profiles().len(), 2);
    }
}
