#![no_main]
use insulin_config::MemoryStore;
use insulin_config::persisted::{KEY_ACTIVE_PROFILE, KEY_LEGACY_DAY, KEY_PROFILES, KEY_SETTINGS};
use insulin_core::AppState;
use insulin_traits::FixedClock;
use libfuzzer_sys::{arbitrary, fuzz_target};

#[derive(Debug, arbitrary::Arbitrary)]
struct Stored {
    profiles: Option<String>,
    settings: Option<String>,
    active: Option<String>,
    legacy_day: Option<String>,
    minute: u16,
}

fuzz_target!(|input: Stored| {
    let entries = [
        (KEY_PROFILES, input.profiles),
        (KEY_SETTINGS, input.settings),
        (KEY_ACTIVE_PROFILE, input.active),
        (KEY_LEGACY_DAY, input.legacy_day),
    ];
    let mut store = MemoryStore::with_entries(
        entries
            .into_iter()
            .filter_map(|(k, v)| v.map(|v| (k.to_string(), v))),
    );
    let clock = FixedClock::new(input.minute % 1440);
    // Whatever is stored, loading repairs it into a usable state.
    let state = AppState::load(&mut store, &clock, &insulin_config::Settings::default())
        .expect("in-memory load never fails");
    assert!(!state.profiles().is_empty());
    assert!(state.profile(state.active_id()).is_some());
});
