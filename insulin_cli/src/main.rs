mod cli;
mod commands;
mod error_fmt;
mod render;

use std::path::{Path, PathBuf};

use clap::Parser;
use eyre::{Result, WrapErr};
use insulin_config::{Config, FileStore};
use insulin_core::{AppState, MinuteOfDay};
use insulin_traits::{Clock, FixedClock, LocalClock};

use crate::cli::{Cli, Commands, DEFAULT_CONFIG, FILE_GUARD, JSON_MODE};
use crate::commands::Ctx;
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn main() {
    let _ = color_eyre::install();
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    match run(cli) {
        Ok(out) => print!("{out}"),
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            if JSON_MODE.get().copied().unwrap_or(false) {
                println!("{}", format_error_json(&e));
            } else {
                eprintln!("{}", humanize(&e));
            }
            std::process::exit(exit_code_for_error(&e));
        }
    }
}

fn run(cli: Cli) -> Result<String> {
    let cfg = load_config(&cli.config)?;
    init_tracing(cli.json, &cli.log_level, &cfg.logging);

    let state_path: PathBuf = cli.state.clone().unwrap_or_else(|| cfg.storage.path.clone());
    let mut store = FileStore::open(&state_path);
    let clock: Box<dyn Clock> = match cli.at {
        Some(m) => Box::new(FixedClock::new(m.get())),
        None => Box::new(LocalClock::new()),
    };
    tracing::debug!(state = %state_path.display(), at = ?cli.at, "loading state");
    let mut state = AppState::load(&mut store, clock.as_ref(), &cfg.defaults)?;

    let ctx = Ctx {
        json: cli.json,
        now: MinuteOfDay::new(clock.minute_of_day()).unwrap_or(MinuteOfDay::MIDNIGHT),
    };
    match &cli.cmd {
        Commands::Calc(args) => commands::calc(&mut state, &mut store, args, ctx),
        Commands::Active => Ok(commands::active(&state, ctx)),
        Commands::Profiles { cmd } => commands::profiles(&mut state, &mut store, cmd, ctx),
        Commands::Settings {
            units,
            rounding,
            theme,
        } => commands::settings(&mut state, &mut store, *units, *rounding, *theme, ctx),
        Commands::Trend { cmd } => commands::trend(&mut state, &mut store, cmd, ctx),
        Commands::Unlock { constant } => commands::unlock(&mut state, &mut store, *constant, ctx),
        Commands::Timeline => Ok(commands::show_timeline(&state, ctx)),
        Commands::AcceptTerms => commands::accept_terms(&mut state, &mut store, ctx),
    }
}

/// Read and validate the TOML config. The default path may be absent, in
/// which case built-in defaults apply; an explicit path must exist.
fn load_config(path: &Path) -> Result<Config> {
    if path == Path::new(DEFAULT_CONFIG) && !path.exists() {
        return Ok(Config::default());
    }
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("read config {}", path.display()))?;
    let cfg = insulin_config::load_toml(&text)
        .wrap_err_with(|| format!("parse config {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Console logs go to stderr (`RUST_LOG` overrides `--log-level`); an
/// optional JSON-lines file layer follows `[logging]` from the config.
fn init_tracing(json: bool, level: &str, logging: &insulin_config::Logging) {
    use tracing_subscriber::filter::LevelFilter;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{EnvFilter, fmt};

    let console_filter =
        || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let console_json = json.then(|| {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(console_filter())
    });
    let console_text = (!json).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(console_filter())
    });

    let file_layer = logging.file.as_deref().map(|file| {
        let path = Path::new(file);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .map_or_else(|| "insulin.log".into(), std::ffi::OsStr::to_os_string);
        let appender = match logging.rotation.as_deref().map(str::to_ascii_lowercase).as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        let file_level = logging
            .level
            .as_deref()
            .and_then(|l| l.parse::<LevelFilter>().ok())
            .unwrap_or(LevelFilter::INFO);
        fmt::layer()
            .json()
            .with_ansi(false)
            .with_writer(writer)
            .with_filter(file_level)
    });

    let _ = tracing_subscriber::registry()
        .with(console_json)
        .with(console_text)
        .with(file_layer)
        .try_init();
}
