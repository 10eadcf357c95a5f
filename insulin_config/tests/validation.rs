use insulin_config::{Theme, Units, load_toml};
use rstest::rstest;

#[test]
fn empty_config_uses_defaults() {
    let cfg = load_toml("").expect("parse TOML");
    cfg.validate().expect("defaults should validate");
    assert_eq!(cfg.defaults.units, Units::Mgdl);
    assert_eq!(cfg.defaults.theme, Theme::System);
    assert!((cfg.defaults.rounding - 0.5).abs() < f64::EPSILON);
    assert_eq!(cfg.storage.path.to_str(), Some("insulin_state.json"));
}

#[test]
fn accepts_full_config() {
    let toml = r#"
[defaults]
units = "mmol"
rounding = 0.05
theme = "dark"

[storage]
path = "/tmp/insulin/state.json"

[logging]
file = "insulin.log"
level = "debug"
rotation = "daily"
"#;

    let cfg = load_toml(toml).expect("parse TOML");
    cfg.validate().expect("valid config should pass");
    assert_eq!(cfg.defaults.units, Units::Mmol);
    assert_eq!(cfg.defaults.theme, Theme::Dark);
    assert_eq!(cfg.logging.file.as_deref(), Some("insulin.log"));
}

#[rstest]
#[case("[defaults]\nrounding = 0.0\n", "defaults.rounding must be > 0")]
#[case("[defaults]\nrounding = -0.5\n", "defaults.rounding must be > 0")]
#[case("[defaults]\nrounding = 25.0\n", "unreasonably large")]
#[case("[storage]\npath = \"\"\n", "storage.path must not be empty")]
#[case("[logging]\nlevel = \"loud\"\n", "logging.level must be one of")]
#[case("[logging]\nrotation = \"weekly\"\n", "logging.rotation must be one of")]
fn rejects_invalid_values(#[case] toml: &str, #[case] needle: &str) {
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject");
    assert!(
        format!("{err}").contains(needle),
        "error '{err}' should mention '{needle}'"
    );
}

#[test]
fn unknown_unit_is_a_parse_error() {
    let err = load_toml("[defaults]\nunits = \"grains\"\n").expect_err("unknown unit");
    assert!(err.to_string().contains("unknown variant"));
}
