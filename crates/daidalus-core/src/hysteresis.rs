//! C8: hysteresis — smooths alert levels and bands output across refreshes
//! so that single-sample noise in the input state doesn't flicker the
//! advisory the pilot sees (§4.9 "Hysteresis").
//!
//! Two independent mechanisms, both keyed per traffic aircraft:
//! an M-of-N debounce on the raw alert level, and a minimum-persistence
//! timer once a level (or a green band) has been shown.

use crate::bands::Region;
use crate::kinematics::Dimension;
use std::collections::{HashMap, VecDeque};

fn dimension_index(dimension: Dimension) -> usize {
    match dimension {
        Dimension::Direction => 0,
        Dimension::HorizontalSpeed => 1,
        Dimension::VerticalSpeed => 2,
        Dimension::Altitude => 3,
    }
}

/// M-of-N circular buffer plus a persistence timer for one traffic
/// aircraft's alert level, and one persisted green band per dimension.
#[derive(Debug, Clone)]
struct AircraftHysteresis {
    raw_history: VecDeque<(f64, usize)>,
    displayed_level: usize,
    displayed_region: Region,
    last_change_time: f64,
    green_bands: [Option<(GreenBand, f64)>; 4],
}

impl AircraftHysteresis {
    fn new() -> Self {
        AircraftHysteresis {
            raw_history: VecDeque::new(),
            displayed_level: 0,
            displayed_region: Region::None,
            last_change_time: f64::NEG_INFINITY,
            green_bands: [None; 4],
        }
    }
}

/// Per-[`crate::core_state`] store of every tracked aircraft's hysteresis
/// state, keyed by aircraft id. Cleared whenever the core invalidates (new
/// ownship id, or a time jump larger than the staleness the source treats as
/// "a new encounter" — §4.9 Design Notes).
#[derive(Debug, Clone, Default)]
pub struct HysteresisStore {
    aircraft: HashMap<String, AircraftHysteresis>,
}

impl HysteresisStore {
    pub fn new() -> Self {
        HysteresisStore::default()
    }

    pub fn clear(&mut self) {
        self.aircraft.clear();
    }

    pub fn clear_aircraft(&mut self, id: &str) {
        self.aircraft.remove(id);
    }

    /// Feeds one refresh's raw `(level, region)` reading for `id` and
    /// returns the debounced, persistence-extended level/region to display.
    ///
    /// M-of-N: the raw level only changes the displayed level once it has
    /// been the most common reading at least `m` times among the samples
    /// taken in the last `n` reads AND within the last `hysteresis_time`
    /// seconds (`alerting_m`/`alerting_n`, `0` disabling the debounce
    /// entirely so the raw level passes straight through; `hysteresis_time
    /// <= 0` disables the time-based eviction, leaving a plain N-sample
    /// window). Persistence: once displayed, a level cannot be downgraded
    /// for `persistence_time` seconds even if the raw reading already
    /// cleared, unless the raw reading escalates (escalation is never
    /// delayed).
    pub fn update(
        &mut self,
        id: &str,
        raw_level: usize,
        raw_region: Region,
        now: f64,
        alerting_m: u32,
        alerting_n: u32,
        hysteresis_time: f64,
        persistence_time: f64,
    ) -> (usize, Region) {
        let state = self.aircraft.entry(id.to_string()).or_insert_with(AircraftHysteresis::new);

        if alerting_n > 0 {
            state.raw_history.push_back((now, raw_level));
            while state.raw_history.len() > alerting_n as usize {
                state.raw_history.pop_front();
            }
            if hysteresis_time > 0.0 {
                while state.raw_history.front().map(|&(t, _)| now - t > hysteresis_time).unwrap_or(false) {
                    state.raw_history.pop_front();
                }
            }
        }

        let debounced_level = if alerting_n == 0 || alerting_m == 0 {
            raw_level
        } else {
            let count = state.raw_history.iter().filter(|&(_, l)| *l == raw_level).count();
            if count as u32 >= alerting_m {
                raw_level
            } else {
                state.displayed_level
            }
        };

        if debounced_level > state.displayed_level {
            state.displayed_level = debounced_level;
            state.displayed_region = raw_region;
            state.last_change_time = now;
        } else if debounced_level < state.displayed_level {
            if now - state.last_change_time >= persistence_time {
                state.displayed_level = debounced_level;
                state.displayed_region = if debounced_level == 0 { Region::None } else { raw_region };
                state.last_change_time = now;
            }
        }

        (state.displayed_level, state.displayed_region)
    }

    /// Applies the §4.9 Open Question (c) persistence check to one
    /// dimension's just-computed green band for `id`. Returns `candidate`
    /// unchanged if it is fresh (see [`is_fresh_green_band`]) or there was no
    /// prior band; otherwise returns the previously displayed band as long as
    /// it is still within `persistence_time`, after which the candidate is
    /// accepted regardless so a changed band can't be held forever.
    pub fn persist_green_band(
        &mut self,
        id: &str,
        dimension: Dimension,
        candidate: GreenBand,
        current_value: f64,
        persistence_preferred: f64,
        persistence_time: f64,
        now: f64,
    ) -> GreenBand {
        let state = self.aircraft.entry(id.to_string()).or_insert_with(AircraftHysteresis::new);
        let idx = dimension_index(dimension);
        let prev = state.green_bands[idx];
        let previous_band = prev.map(|(band, _)| band);

        if is_fresh_green_band(previous_band, candidate, current_value, persistence_preferred) {
            state.green_bands[idx] = Some((candidate, now));
            return candidate;
        }
        match prev {
            Some((band, last_time)) if now - last_time < persistence_time => band,
            _ => {
                state.green_bands[idx] = Some((candidate, now));
                candidate
            }
        }
    }
}

/// A single green (conflict-free) band interval under consideration for the
/// "fresh" persistence check (§4.9 Open Question (c)): a band is "fresh" —
/// eligible to replace a previously shown green band immediately rather than
/// waiting out `persistence_time` — only if it has the same sign (same side
/// of the current value) as the previously shown one, its boundary has moved
/// by no more than `persistence_preferred`, and the current value still
/// falls inside it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GreenBand {
    pub low: f64,
    pub up: f64,
}

pub fn is_fresh_green_band(previous: Option<GreenBand>, candidate: GreenBand, current_value: f64, persistence_preferred: f64) -> bool {
    if current_value < candidate.low || current_value > candidate.up {
        return false;
    }
    let Some(prev) = previous else { return true };
    let same_sign = (prev.low - current_value).signum() == (candidate.low - current_value).signum()
        || (prev.up - current_value).signum() == (candidate.up - current_value).signum();
    let low_shift = (candidate.low - prev.low).abs();
    let up_shift = (candidate.up - prev.up).abs();
    same_sign && low_shift <= persistence_preferred && up_shift <= persistence_preferred
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debounce_requires_m_of_n_before_escalating() {
        let mut store = HysteresisStore::new();
        // 2-of-3: a single high reading shouldn't escalate immediately.
        let (level, _) = store.update("a", 3, Region::Near, 0.0, 2, 3, 0.0, 0.0);
        assert_eq!(level, 0, "one matching sample can't satisfy m=2 yet");
        let (level2, _) = store.update("a", 3, Region::Near, 1.0, 2, 3, 0.0, 0.0);
        assert_eq!(level2, 3, "a second matching sample within the window satisfies m=2");
    }

    #[test]
    fn stale_samples_outside_hysteresis_time_are_evicted_before_counting() {
        let mut store = HysteresisStore::new();
        // 2-of-3, but only the last 2s of samples count: the first high
        // reading ages out before the second arrives 10s later, so it can't
        // combine with it to satisfy m=2.
        store.update("a", 3, Region::Near, 0.0, 2, 3, 2.0, 0.0);
        let (level, _) = store.update("a", 3, Region::Near, 10.0, 2, 3, 2.0, 0.0);
        assert_eq!(level, 0, "the stale first reading must not count toward m=2");
        let (level2, _) = store.update("a", 3, Region::Near, 10.5, 2, 3, 2.0, 0.0);
        assert_eq!(level2, 3, "two readings within the 2s window satisfy m=2");
    }

    #[test]
    fn persistence_delays_downgrade() {
        let mut store = HysteresisStore::new();
        store.update("a", 3, Region::Near, 0.0, 0, 0, 0.0, 10.0);
        let (level, _) = store.update("a", 0, Region::None, 1.0, 0, 0, 0.0, 10.0);
        assert_eq!(level, 3, "downgrade within persistence_time should be suppressed");
        let (level2, _) = store.update("a", 0, Region::None, 11.0, 0, 0, 0.0, 10.0);
        assert_eq!(level2, 0, "downgrade should apply once persistence_time has elapsed");
    }

    #[test]
    fn escalation_is_never_delayed_by_persistence() {
        let mut store = HysteresisStore::new();
        store.update("a", 1, Region::Far, 0.0, 0, 0, 0.0, 100.0);
        let (level, _) = store.update("a", 3, Region::Near, 0.5, 0, 0, 0.0, 100.0);
        assert_eq!(level, 3);
    }

    #[test]
    fn fresh_green_band_requires_same_side_and_small_shift() {
        let prev = GreenBand { low: -1.0, up: 5.0 };
        let close = GreenBand { low: -1.2, up: 5.1 };
        let far = GreenBand { low: -10.0, up: 5.0 };
        assert!(is_fresh_green_band(Some(prev), close, 0.0, 1.0));
        assert!(!is_fresh_green_band(Some(prev), far, 0.0, 1.0));
    }

    #[test]
    fn persisted_green_band_holds_until_a_fresh_one_or_persistence_elapses() {
        let mut store = HysteresisStore::new();
        let first = GreenBand { low: -1.0, up: 5.0 };
        let held = store.persist_green_band("a", Dimension::Direction, first, 0.0, 1.0, 10.0, 0.0);
        assert_eq!(held, first, "the first reading has nothing to compare against");

        let jump = GreenBand { low: -10.0, up: 5.0 };
        let held2 = store.persist_green_band("a", Dimension::Direction, jump, 0.0, 1.0, 10.0, 1.0);
        assert_eq!(held2, first, "a non-fresh jump is suppressed within persistence_time");

        let held3 = store.persist_green_band("a", Dimension::Direction, jump, 0.0, 1.0, 10.0, 11.0);
        assert_eq!(held3, jump, "once persistence_time elapses the new band is accepted regardless");
    }
}
