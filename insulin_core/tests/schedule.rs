use insulin_core::{MinuteOfDay, ProfileId, ProfileWindow, TimeWindow, resolve_active, timeline};
use proptest::prelude::*;
use rstest::rstest;

fn at(s: &str) -> MinuteOfDay {
    s.parse().unwrap()
}

fn timed(id: &str, start: &str, end: &str) -> ProfileWindow {
    ProfileWindow {
        id: ProfileId::from(id),
        window: Some(TimeWindow::parse(start, end).unwrap()),
    }
}

fn untimed(id: &str) -> ProfileWindow {
    ProfileWindow {
        id: ProfileId::from(id),
        window: None,
    }
}

fn day_night() -> Vec<ProfileWindow> {
    vec![timed("day", "06:00", "20:00"), timed("night", "20:00", "06:00")]
}

#[rstest]
#[case("06:00", Some("day"))]
#[case("12:00", Some("day"))]
#[case("19:59", Some("day"))]
#[case("20:00", Some("night"))]
#[case("23:59", Some("night"))]
#[case("00:00", Some("night"))]
#[case("05:59", Some("night"))]
fn day_and_night_cover_the_clock(#[case] now: &str, #[case] expected: Option<&str>) {
    let profiles = day_night();
    let got = resolve_active(&profiles, at(now)).map(ProfileId::as_str);
    assert_eq!(got, expected);
}

#[rstest]
#[case("11:00", Some("lunch"))]
#[case("13:59", Some("lunch"))]
#[case("14:00", Some("day"))]
#[case("10:59", Some("day"))]
fn nested_window_beats_the_broad_one(#[case] now: &str, #[case] expected: Option<&str>) {
    let profiles = vec![
        timed("day", "06:00", "20:00"),
        timed("lunch", "11:00", "14:00"),
    ];
    let got = resolve_active(&profiles, at(now)).map(ProfileId::as_str);
    assert_eq!(got, expected);
}

#[test]
fn most_recent_start_wins_across_midnight() {
    // At 01:00 "late" opened 1h ago, "night" 5h ago.
    let profiles = vec![timed("night", "20:00", "06:00"), timed("late", "00:00", "03:00")];
    assert_eq!(resolve_active(&profiles, at("01:00")).map(ProfileId::as_str), Some("late"));
    assert_eq!(resolve_active(&profiles, at("23:00")).map(ProfileId::as_str), Some("night"));
}

#[test]
fn equal_starts_keep_list_order() {
    let profiles = vec![timed("a", "08:00", "12:00"), timed("b", "08:00", "10:00")];
    assert_eq!(resolve_active(&profiles, at("09:00")).map(ProfileId::as_str), Some("a"));
}

#[test]
fn empty_and_untimed_sets_resolve_to_none() {
    let empty: Vec<ProfileWindow> = Vec::new();
    assert_eq!(resolve_active(&empty, at("12:00")), None);
    let profiles = vec![untimed("x"), untimed("y")];
    assert_eq!(resolve_active(&profiles, at("12:00")), None);
}

#[test]
fn gap_between_windows_resolves_to_none() {
    let profiles = vec![timed("breakfast", "07:00", "09:00")];
    assert_eq!(resolve_active(&profiles, at("09:00")), None);
    assert_eq!(resolve_active(&profiles, at("06:59")), None);
}

#[test]
fn zero_length_window_never_matches() {
    let profiles = vec![timed("never", "08:00", "08:00")];
    for now in ["00:00", "07:59", "08:00", "08:01", "23:59"] {
        assert_eq!(resolve_active(&profiles, at(now)), None, "{now}");
    }
}

#[test]
fn timeline_splits_overnight_windows() {
    let mut profiles = day_night();
    profiles.insert(1, untimed("snack"));
    let segs = timeline(&profiles);
    let flat: Vec<(&str, usize, u16, u16)> = segs
        .iter()
        .map(|s| (s.id.as_str(), s.lane, s.from, s.to))
        .collect();
    assert_eq!(
        flat,
        vec![
            ("day", 0, 360, 1200),
            ("night", 1, 1200, 1440),
            ("night", 1, 0, 360),
        ]
    );
}

fn window_strategy() -> impl Strategy<Value = (u16, u16)> {
    (0u16..1440, 0u16..1440)
}

proptest! {
    #[test]
    fn window_membership_matches_definition((s, e) in window_strategy(), n in 0u16..1440) {
        let w = TimeWindow::new(MinuteOfDay::new(s).unwrap(), MinuteOfDay::new(e).unwrap());
        let now = MinuteOfDay::new(n).unwrap();
        let expected = if s < e {
            s <= n && n < e
        } else if s > e {
            n >= s || n < e
        } else {
            false
        };
        prop_assert_eq!(w.contains(now), expected);
    }

    #[test]
    fn resolved_profile_covers_now_and_started_last(
        windows in prop::collection::vec(window_strategy(), 0..8),
        n in 0u16..1440,
    ) {
        let profiles: Vec<ProfileWindow> = windows
            .iter()
            .enumerate()
            .map(|(i, &(s, e))| ProfileWindow {
                id: ProfileId::from(format!("p{i}")),
                window: Some(TimeWindow::new(MinuteOfDay::new(s).unwrap(), MinuteOfDay::new(e).unwrap())),
            })
            .collect();
        let now = MinuteOfDay::new(n).unwrap();
        let covering: Vec<&ProfileWindow> = profiles
            .iter()
            .filter(|p| p.window.is_some_and(|w| w.contains(now)))
            .collect();
        match resolve_active(&profiles, now) {
            None => prop_assert!(covering.is_empty()),
            Some(id) => {
                let chosen = covering.iter().find(|p| &p.id == id).unwrap();
                let since = chosen.window.unwrap().minutes_since_start(now);
                for other in &covering {
                    prop_assert!(since <= other.window.unwrap().minutes_since_start(now));
                }
                let first_with_same = covering
                    .iter()
                    .find(|p| p.window.unwrap().minutes_since_start(now) == since)
                    .unwrap();
                prop_assert_eq!(&first_with_same.id, id);
            }
        }
    }

    #[test]
    fn timeline_covers_exactly_the_window(s in 0u16..1440, e in 0u16..1440) {
        let w = TimeWindow::new(MinuteOfDay::new(s).unwrap(), MinuteOfDay::new(e).unwrap());
        let covered: u32 = w.segments().iter().map(|(from, to)| u32::from(to - from)).sum();
        let expected = (0..1440u16).filter(|&m| w.contains(MinuteOfDay::new(m).unwrap())).count();
        prop_assert_eq!(covered as usize, expected);
    }
}
