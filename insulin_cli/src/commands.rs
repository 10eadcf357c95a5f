//! Command handlers: apply a parsed command to the loaded state, persist it,
//! and render the output.

use eyre::{Report, Result};
use insulin_core::{
    AppState, MealInput, MinuteOfDay, ProfileEdit, ProfileId, StateError, TrendArrow,
    resolve_active, timeline,
};
use insulin_traits::KvStore;

use crate::cli::{CalcArgs, ConstantArg, ConstantArgs, ProfileCmd, ThemeArg, TrendCmd, UnitArg, WindowArgs};
use crate::render;

/// Output mode and effective time of day for one invocation.
#[derive(Clone, Copy, Debug)]
pub struct Ctx {
    pub json: bool,
    pub now: MinuteOfDay,
}

fn emit(ctx: Ctx, text: String, json: impl FnOnce() -> serde_json::Value) -> String {
    if ctx.json {
        let mut line = json().to_string();
        line.push('\n');
        line
    } else {
        text
    }
}

fn lookup(state: &AppState, key: &str) -> Result<ProfileId> {
    state
        .find(key)
        .map(|p| p.id.clone())
        .ok_or_else(|| Report::new(StateError::UnknownProfile(key.to_string())))
}

fn apply_constants(form: &mut ProfileEdit, c: &ConstantArgs) {
    if let Some(v) = c.carb_ratio {
        form.carb_ratio = Some(v);
    }
    if let Some(v) = c.correction_factor {
        form.correction_factor = Some(v);
    }
    if let Some(v) = c.target {
        form.target = Some(v);
    }
}

fn window_of(w: &WindowArgs) -> Option<insulin_core::TimeWindow> {
    match (w.start, w.end) {
        (Some(s), Some(e)) => Some(insulin_core::TimeWindow::new(s, e)),
        _ => None,
    }
}

pub fn calc(
    state: &mut AppState,
    store: &mut dyn KvStore,
    args: &CalcArgs,
    ctx: Ctx,
) -> Result<String> {
    state.require_terms()?;
    if let Some(key) = &args.profile {
        let id = lookup(state, key)?;
        state.switch_profile(&id)?;
    }
    let meal = MealInput {
        carbs_to_eat: args.carbs,
        current_glucose: args.glucose,
        carb_ratio: args.carb_ratio,
        correction_factor: args.correction_factor,
        target: args.target,
        trend_adjustment: args.trend.map(TrendArrow::mgdl).or(args.trend_value),
    };
    let result = state.calculate(&meal).map_err(Report::new)?;
    state.save(store)?;

    let unit = state.settings().units;
    let profile = state.active_profile();
    tracing::info!(
        profile = %profile.id,
        dose = result.dose_units(),
        raw_total = result.raw_total,
        safety = result.safety.name(),
        "dose calculated"
    );
    Ok(emit(ctx, render::calc_text(profile, &result, unit), || {
        render::calc_json(profile, &result, unit)
    }))
}

pub fn active(state: &AppState, ctx: Ctx) -> String {
    let by_time = resolve_active(state.profiles(), ctx.now).is_some();
    emit(ctx, render::active_text(state, ctx.now, by_time), || {
        render::active_json(state, ctx.now, by_time)
    })
}

pub fn profiles(
    state: &mut AppState,
    store: &mut dyn KvStore,
    cmd: &ProfileCmd,
    ctx: Ctx,
) -> Result<String> {
    let unit = state.settings().units;
    let id = match cmd {
        ProfileCmd::List => {
            return Ok(emit(ctx, render::profiles_text(state), || {
                render::profiles_json(state)
            }));
        }
        ProfileCmd::Add {
            name,
            window,
            constants,
        } => {
            state.begin_new_profile()?;
            let mut form = state.edit_form()?;
            if let Some(n) = name {
                form.name.clone_from(n);
            }
            form.window = window_of(window);
            apply_constants(&mut form, constants);
            state.commit_edit(form)?
        }
        ProfileCmd::Edit {
            profile,
            name,
            window,
            no_window,
            constants,
        } => {
            let id = lookup(state, profile)?;
            state.begin_edit(&id)?;
            let mut form = state.edit_form()?;
            if let Some(n) = name {
                form.name.clone_from(n);
            }
            if *no_window {
                form.window = None;
            } else if let Some(w) = window_of(window) {
                form.window = Some(w);
            }
            apply_constants(&mut form, constants);
            state.commit_edit(form)?
        }
        ProfileCmd::Delete { profile } => {
            let id = lookup(state, profile)?;
            let name = state.profile(&id).map(|p| p.name.clone()).unwrap_or_default();
            state.delete_profile(&id)?;
            state.save(store)?;
            let active = state.active_profile();
            return Ok(emit(
                ctx,
                format!("Deleted {name}. Active: {}\n", active.name),
                || serde_json::json!({ "deleted": id.as_str(), "active": active.id.as_str() }),
            ));
        }
        ProfileCmd::Switch { profile } => {
            let id = lookup(state, profile)?;
            state.switch_profile(&id)?;
            id
        }
    };
    state.save(store)?;

    let p = state
        .profile(&id)
        .ok_or_else(|| Report::new(StateError::UnknownProfile(id.to_string())))?;
    let active = state.active_id() == &id;
    let marker = if active { " (active)" } else { "" };
    Ok(emit(
        ctx,
        format!("{}{marker}\n", render::profile_line(p, unit)),
        || render::profile_json(p, active, unit),
    ))
}

pub fn settings(
    state: &mut AppState,
    store: &mut dyn KvStore,
    units: Option<UnitArg>,
    rounding: Option<f64>,
    theme: Option<ThemeArg>,
    ctx: Ctx,
) -> Result<String> {
    let mut changed = false;
    if let Some(u) = units {
        state.set_units(u.into());
        changed = true;
    }
    if let Some(step) = rounding {
        state.set_rounding(step)?;
        changed = true;
    }
    if let Some(t) = theme {
        state.set_theme(t.into());
        changed = true;
    }
    if changed {
        state.save(store)?;
        tracing::info!(
            units = state.settings().units.name(),
            rounding = state.settings().rounding.get(),
            "settings updated"
        );
    }
    let s = state.settings();
    Ok(emit(ctx, render::settings_text(s), || render::settings_json(s)))
}

pub fn trend(
    state: &mut AppState,
    store: &mut dyn KvStore,
    cmd: &TrendCmd,
    ctx: Ctx,
) -> Result<String> {
    let value = match cmd {
        TrendCmd::Set { arrow } => Some(arrow.mgdl()),
        TrendCmd::Clear => None,
    };
    state.set_trend(value)?;
    state.save(store)?;
    let p = state.active_profile();
    let text = match cmd {
        TrendCmd::Set { arrow } => format!("{}: trend {} ({:+} mg/dL)\n", p.name, arrow.label(), arrow.mgdl()),
        TrendCmd::Clear => format!("{}: trend cleared\n", p.name),
    };
    Ok(emit(ctx, text, || {
        serde_json::json!({ "profile": p.id.as_str(), "trend_adjustment_mgdl": p.trend_adjustment })
    }))
}

pub fn unlock(
    state: &mut AppState,
    store: &mut dyn KvStore,
    constant: ConstantArg,
    ctx: Ctx,
) -> Result<String> {
    state.clear_constant(constant.into());
    state.save(store)?;
    let unit = state.settings().units;
    let p = state.active_profile();
    Ok(emit(
        ctx,
        format!("{}\n", render::profile_line(p, unit)),
        || render::profile_json(p, true, unit),
    ))
}

pub fn accept_terms(state: &mut AppState, store: &mut dyn KvStore, ctx: Ctx) -> Result<String> {
    state.accept_terms();
    state.save(store)?;
    Ok(emit(ctx, format!("{}\nTerms accepted.\n", render::TERMS), || {
        serde_json::json!({ "accepted_terms": true, "terms": render::TERMS })
    }))
}

pub fn show_timeline(state: &AppState, ctx: Ctx) -> String {
    let segments = timeline(state.profiles());
    emit(ctx, render::timeline_text(state, &segments, ctx.now), || {
        render::timeline_json(state, &segments)
    })
}
