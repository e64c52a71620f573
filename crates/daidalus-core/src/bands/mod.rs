//! Shared types for the band-search/assembly pipeline (C5/C6): the severity
//! [`Region`] hierarchy, integer-step intervals, real-valued output ranges,
//! and the breakpoint list used to assemble them.

pub mod integer_bands;
pub mod real_bands;
pub mod recovery;

use serde::{Deserialize, Serialize};

/// A band's severity tag (§3 "Band Interval"). Ordered from least to most
/// severe for the three corrective-eligible regions; `Recovery` and
/// `Unknown` sit outside that ordering (§3 invariant (iii) only claims
/// monotonicity among `Far`/`Mid`/`Near`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    None,
    Far,
    Mid,
    Near,
    Recovery,
    Unknown,
}

impl Region {
    /// Severity rank among the three conflict regions; `None` for `Recovery`
    /// and `Unknown`, which are not part of the alerter severity ladder.
    pub fn severity(&self) -> Option<u8> {
        match self {
            Region::None => Some(0),
            Region::Far => Some(1),
            Region::Mid => Some(2),
            Region::Near => Some(3),
            Region::Recovery | Region::Unknown => None,
        }
    }

    /// True for `Far`/`Mid`/`Near`: the regions a `corrective_region`
    /// parameter may name and that count as "in conflict" for alerting.
    pub fn is_conflict_region(&self) -> bool {
        self.severity().map(|s| s > 0).unwrap_or(false)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::None => "NONE",
            Region::Far => "FAR",
            Region::Mid => "MID",
            Region::Near => "NEAR",
            Region::Recovery => "RECOVERY",
            Region::Unknown => "UNKNOWN",
        }
    }

    pub fn parse(s: &str) -> Option<Region> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NONE" => Some(Region::None),
            "FAR" => Some(Region::Far),
            "MID" => Some(Region::Mid),
            "NEAR" => Some(Region::Near),
            "RECOVERY" => Some(Region::Recovery),
            "UNKNOWN" => Some(Region::Unknown),
            _ => None,
        }
    }
}

/// A closed integer interval `[lo, up]` of admissible kinematic-projector
/// steps (§4.5). Mirrors the source's `Integerval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Integerval {
    pub lo: i64,
    pub up: i64,
}

impl Integerval {
    pub fn new(lo: i64, up: i64) -> Self {
        Integerval { lo, up }
    }
}

/// A single output interval of a real control dimension (§3 "Band
/// Interval"). `low <= up`; on the direction dimension the interval may wrap
/// (see [`real_bands`] for the wrap convention).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandsRange {
    pub low: f64,
    pub up: f64,
    pub region: Region,
}

/// An intermediate breakpoint on the real line (or circle) used while
/// assembling [`BandsRange`]s from several regions' green sets (§4.6 "Output
/// assembly").
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorValue {
    pub value: f64,
    pub region: Region,
}

/// Severity rank used when composing several already-tagged range lists
/// (one per alert level, or one per traffic aircraft) into a single result:
/// the highest-ranked region at any given point wins (§4.6 steps 3-4).
/// `Recovery` ranks above `None` but below every conflict region — a
/// recovery interval only ever appears once the conflict regions at a point
/// have already saturated it (see [`real_bands::assemble`]'s recovery
/// overlay), so it should never be outranked by a plain clear reading from
/// another list, but also never displace a genuine conflict region.
pub fn severity_rank(region: Region) -> u8 {
    match region {
        Region::None => 0,
        Region::Recovery => 1,
        Region::Far => 2,
        Region::Mid => 3,
        Region::Near => 4,
        Region::Unknown => 0,
    }
}

fn region_at(ranges: &[BandsRange], value: f64) -> Region {
    for r in ranges {
        if value >= r.low && value <= r.up {
            return r.region;
        }
    }
    Region::None
}

/// Composes several range lists that each cover the same absolute domain
/// into one list, taking the most severe region at every point. Used both
/// to compose one intruder's per-alert-level regions and to compose several
/// intruders' already-composed results (§4.6 steps 3-4).
pub fn compose_max_severity(lists: &[Vec<BandsRange>]) -> Vec<BandsRange> {
    let lists: Vec<&Vec<BandsRange>> = lists.iter().filter(|l| !l.is_empty()).collect();
    let Some(first) = lists.first() else { return Vec::new() };
    let lo = first.first().unwrap().low;
    let hi = first.last().unwrap().up;

    let mut breakpoints: Vec<f64> = vec![lo, hi];
    for list in &lists {
        for r in list.iter() {
            breakpoints.push(r.low);
            breakpoints.push(r.up);
        }
    }
    breakpoints.sort_by(|a, b| a.partial_cmp(b).unwrap());
    breakpoints.dedup_by(|a, b| (*a - *b).abs() < 1e-9);

    let mut points = Vec::new();
    for w in breakpoints.windows(2) {
        let (a, b) = (w[0], w[1]);
        if b <= a {
            continue;
        }
        let mid = (a + b) / 2.0;
        let region = lists
            .iter()
            .map(|list| region_at(list, mid))
            .max_by_key(|r| severity_rank(*r))
            .unwrap_or(Region::None);
        points.push(ColorValue { value: a, region });
        points.push(ColorValue { value: b, region });
    }
    merge_breakpoints(points)
}

/// Merges adjacent `(value, region)` breakpoints with identical regions into
/// the final `BandsRange[]`, enforcing §8 P1 (sorted, contiguous, shared
/// endpoints).
pub fn merge_breakpoints(mut points: Vec<ColorValue>) -> Vec<BandsRange> {
    points.sort_by(|a, b| a.value.partial_cmp(&b.value).unwrap());
    let mut out: Vec<BandsRange> = Vec::new();
    for w in points.windows(2) {
        let (a, b) = (w[0], w[1]);
        if b.value <= a.value {
            continue;
        }
        if let Some(last) = out.last_mut() {
            if last.region == a.region && last.up == a.value {
                last.up = b.value;
                continue;
            }
        }
        out.push(BandsRange { low: a.value, up: b.value, region: a.region });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_orders_conflict_regions() {
        assert!(Region::Far.severity() < Region::Mid.severity());
        assert!(Region::Mid.severity() < Region::Near.severity());
        assert_eq!(Region::Recovery.severity(), None);
    }

    #[test]
    fn merge_breakpoints_collapses_equal_adjacent_regions() {
        let points = vec![
            ColorValue { value: 0.0, region: Region::None },
            ColorValue { value: 5.0, region: Region::None },
            ColorValue { value: 10.0, region: Region::Mid },
            ColorValue { value: 15.0, region: Region::Mid },
            ColorValue { value: 20.0, region: Region::Mid },
        ];
        let ranges = merge_breakpoints(points);
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0], BandsRange { low: 0.0, up: 5.0, region: Region::None });
        assert_eq!(ranges[1], BandsRange { low: 10.0, up: 20.0, region: Region::Mid });
    }
}
