//! CLI argument definitions and shared statics.

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use insulin_core::{Constant, GlucoseUnit, MinuteOfDay, TrendArrow};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "insulin", version, about = "Insulin dose calculator")]
pub struct Cli {
    /// Path to config TOML; a missing default file means built-in defaults
    #[arg(long, value_name = "FILE", default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// State file (overrides storage.path from the config)
    #[arg(long, value_name = "FILE")]
    pub state: Option<PathBuf>,

    /// Print results and errors as JSON, and log as JSON lines
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Pretend the local time is HH:MM when picking the active profile
    #[arg(long, value_name = "HH:MM")]
    pub at: Option<MinuteOfDay>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

pub const DEFAULT_CONFIG: &str = "etc/insulin_config.toml";

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Calculate a meal dose with the active profile
    Calc(CalcArgs),
    /// Show the profile active now (or at --at)
    Active,
    /// Manage profiles
    Profiles {
        #[command(subcommand)]
        cmd: ProfileCmd,
    },
    /// Show or change settings
    Settings {
        /// Glucose display unit
        #[arg(long, value_enum)]
        units: Option<UnitArg>,
        /// Dose rounding step in units (rounds down)
        #[arg(long, value_name = "STEP")]
        rounding: Option<f64>,
        #[arg(long, value_enum)]
        theme: Option<ThemeArg>,
    },
    /// Set or clear the CGM trend on the active profile
    Trend {
        #[command(subcommand)]
        cmd: TrendCmd,
    },
    /// Forget a stored constant on the active profile so it must be entered again
    Unlock {
        #[arg(value_enum)]
        constant: ConstantArg,
    },
    /// 24-hour view of the timed profiles
    Timeline,
    /// Show the usage terms and accept them; `calc` is refused until then
    AcceptTerms,
}

#[derive(Args, Debug, Default)]
pub struct CalcArgs {
    /// Grams of carbohydrate to eat
    #[arg(long, value_name = "GRAMS")]
    pub carbs: Option<f64>,
    /// Current glucose reading (display unit)
    #[arg(long, value_name = "VALUE")]
    pub glucose: Option<f64>,
    /// Grams covered by one unit; defaults to the profile's
    #[arg(long, value_name = "GRAMS")]
    pub carb_ratio: Option<f64>,
    /// Glucose drop per unit (display unit); defaults to the profile's
    #[arg(long, value_name = "VALUE")]
    pub correction_factor: Option<f64>,
    /// Target glucose (display unit); defaults to the profile's
    #[arg(long, value_name = "VALUE")]
    pub target: Option<f64>,
    /// Trend arrow for this calculation (e.g. rising, slowly-falling)
    #[arg(long, value_name = "ARROW", conflicts_with = "trend_value")]
    pub trend: Option<TrendArrow>,
    /// Raw trend adjustment in mg/dL
    #[arg(long, value_name = "MGDL", allow_hyphen_values = true)]
    pub trend_value: Option<f64>,
    /// Use this profile (id or name) instead of the time-selected one
    #[arg(long, value_name = "PROFILE")]
    pub profile: Option<String>,
}

/// Time window flags shared by `profiles add` and `profiles edit`.
#[derive(Args, Debug, Default)]
pub struct WindowArgs {
    /// Window start, 24-hour HH:MM
    #[arg(long, value_name = "HH:MM", requires = "end")]
    pub start: Option<MinuteOfDay>,
    /// Window end, 24-hour HH:MM (exclusive; before start wraps midnight)
    #[arg(long, value_name = "HH:MM", requires = "start")]
    pub end: Option<MinuteOfDay>,
}

/// Constant flags shared by `profiles add` and `profiles edit`.
#[derive(Args, Debug, Default)]
pub struct ConstantArgs {
    #[arg(long, value_name = "GRAMS")]
    pub carb_ratio: Option<f64>,
    /// Display unit
    #[arg(long, value_name = "VALUE")]
    pub correction_factor: Option<f64>,
    /// Display unit
    #[arg(long, value_name = "VALUE")]
    pub target: Option<f64>,
}

#[derive(Subcommand, Debug)]
pub enum ProfileCmd {
    /// List profiles
    List,
    /// Create a profile (named "Profile N" unless --name is given)
    Add {
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        window: WindowArgs,
        #[command(flatten)]
        constants: ConstantArgs,
    },
    /// Change a profile
    Edit {
        /// Profile id or name
        profile: String,
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        window: WindowArgs,
        /// Remove the time window
        #[arg(long, action = ArgAction::SetTrue, conflicts_with_all = ["start", "end"])]
        no_window: bool,
        #[command(flatten)]
        constants: ConstantArgs,
    },
    /// Delete a profile (the last one cannot be deleted)
    Delete {
        /// Profile id or name
        profile: String,
    },
    /// Make a profile active
    Switch {
        /// Profile id or name
        profile: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum TrendCmd {
    /// Select a trend arrow
    Set {
        /// rapidly-falling | falling | slowly-falling | steady | slowly-rising | rising | rapidly-rising
        arrow: TrendArrow,
    },
    /// Remove the trend adjustment
    Clear,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum UnitArg {
    /// mg/dL
    Mgdl,
    /// mmol/L
    Mmol,
}

impl From<UnitArg> for GlucoseUnit {
    fn from(u: UnitArg) -> Self {
        match u {
            UnitArg::Mgdl => GlucoseUnit::MgDl,
            UnitArg::Mmol => GlucoseUnit::MmolL,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ThemeArg {
    System,
    Light,
    Dark,
}

impl From<ThemeArg> for insulin_config::Theme {
    fn from(t: ThemeArg) -> Self {
        match t {
            ThemeArg::System => insulin_config::Theme::System,
            ThemeArg::Light => insulin_config::Theme::Light,
            ThemeArg::Dark => insulin_config::Theme::Dark,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ConstantArg {
    CarbRatio,
    CorrectionFactor,
    Target,
}

impl From<ConstantArg> for Constant {
    fn from(c: ConstantArg) -> Self {
        match c {
            ConstantArg::CarbRatio => Constant::CarbRatio,
            ConstantArg::CorrectionFactor => Constant::CorrectionFactor,
            ConstantArg::Target => Constant::Target,
        }
    }
}
