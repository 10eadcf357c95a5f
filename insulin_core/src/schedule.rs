//! Time-of-day profile selection.
//!
//! Only profiles carrying a window take part. When several windows cover the
//! same minute, the one that opened most recently wins, so a short meal-time
//! window beats a broad background window it sits inside.

use crate::profile::{MinuteOfDay, Profile, ProfileId, TimeWindow};

/// Anything that can be auto-selected by time of day.
pub trait Scheduled {
    fn id(&self) -> &ProfileId;
    fn window(&self) -> Option<TimeWindow>;
}

impl Scheduled for Profile {
    #[inline]
    fn id(&self) -> &ProfileId {
        &self.id
    }

    #[inline]
    fn window(&self) -> Option<TimeWindow> {
        self.window
    }
}

/// Minimal scheduling view of a profile: its id and optional window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileWindow {
    pub id: ProfileId,
    pub window: Option<TimeWindow>,
}

impl Scheduled for ProfileWindow {
    #[inline]
    fn id(&self) -> &ProfileId {
        &self.id
    }

    #[inline]
    fn window(&self) -> Option<TimeWindow> {
        self.window
    }
}

impl From<&Profile> for ProfileWindow {
    fn from(p: &Profile) -> Self {
        Self {
            id: p.id.clone(),
            window: p.window,
        }
    }
}

/// Resolve the profile active at `now`.
///
/// Returns `None` when no timed window covers `now`; the caller then falls
/// back to its remembered or first profile. Among active windows the smallest
/// `(now - start) mod 1440` wins; exact ties keep the earlier profile.
pub fn resolve_active<P: Scheduled>(profiles: &[P], now: MinuteOfDay) -> Option<&ProfileId> {
    let mut best: Option<(&ProfileId, u16)> = None;
    for p in profiles {
        let Some(window) = p.window() else {
            continue;
        };
        if !window.contains(now) {
            continue;
        }
        let since = window.minutes_since_start(now);
        if best.is_none_or(|(_, best_since)| since < best_since) {
            best = Some((p.id(), since));
        }
    }
    match best {
        Some((id, since)) => {
            tracing::debug!(%now, profile = %id, started_min_ago = since, "time window matched");
            Some(id)
        }
        None => {
            tracing::debug!(%now, "no time window matched");
            None
        }
    }
}

/// One drawable stretch of a profile's window on a 24-hour track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineSegment {
    pub id: ProfileId,
    /// Position of the profile among timed profiles (stable colour index).
    pub lane: usize,
    /// Inclusive start minute.
    pub from: u16,
    /// Exclusive end minute, up to 1440.
    pub to: u16,
}

/// Segments for every timed profile, in profile order. Overnight windows
/// contribute two segments.
pub fn timeline<P: Scheduled>(profiles: &[P]) -> Vec<TimelineSegment> {
    profiles
        .iter()
        .filter_map(|p| p.window().map(|w| (p.id(), w)))
        .enumerate()
        .flat_map(|(lane, (id, window))| {
            window
                .segments()
                .into_iter()
                .map(move |(from, to)| TimelineSegment {
                    id: id.clone(),
                    lane,
                    from,
                    to,
                })
        })
        .collect()
}
