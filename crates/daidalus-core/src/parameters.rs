//! §3 Parameter Block and §6 parameter/alerter file format.
//!
//! The in-memory round trip (`to_string`/`parse`) is core (P3); reading the
//! resulting text from a filesystem path is an external concern the façade
//! does not perform (SPEC_FULL.md §10.3).

use crate::bands::Region;
use crate::error::ParameterError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Write as _;

/// One severity level within an [`Alerter`] (§3 "AlertThreshold").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertThreshold {
    /// Registered id of the detector this level uses (see
    /// `crate::detector::DetectorRegistry`).
    pub detector: String,
    pub alerting_time: f64,
    pub early_alerting_time: f64,
    pub region: Region,
    pub spread_hdir: f64,
    pub spread_hs: f64,
    pub spread_vs: f64,
    pub spread_alt: f64,
}

impl AlertThreshold {
    pub fn new(detector: impl Into<String>, alerting_time: f64, region: Region) -> Self {
        AlertThreshold {
            detector: detector.into(),
            alerting_time,
            early_alerting_time: alerting_time,
            region,
            spread_hdir: 0.0,
            spread_hs: 0.0,
            spread_vs: 0.0,
            spread_alt: 0.0,
        }
    }
}

/// An ordered list of [`AlertThreshold`]s, 1-indexed at the public boundary
/// (§3). Invariant: nested detection volumes (level `i+1` implies level
/// `i`), at least one non-`None` region, increasing severity with level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Alerter {
    pub name: String,
    pub levels: Vec<AlertThreshold>,
}

impl Alerter {
    pub fn new(name: impl Into<String>) -> Self {
        Alerter { name: name.into(), levels: Vec::new() }
    }

    /// 1-based accessor, as the rest of the public API indexes alert levels.
    pub fn level(&self, i: usize) -> Option<&AlertThreshold> {
        if i == 0 {
            return None;
        }
        self.levels.get(i - 1)
    }

    /// §3 invariant check: levels ordered by non-decreasing severity, with
    /// at least one non-`None` region. Returns the first violation found.
    pub fn validate(&self) -> Result<(), String> {
        if self.levels.iter().all(|l| l.region == Region::None) {
            return Err(format!("alerter {:?} has no non-NONE level", self.name));
        }
        let mut last_severity = -1i16;
        for (i, level) in self.levels.iter().enumerate() {
            let sev = level.region.severity().map(|s| s as i16).unwrap_or(-1);
            if sev < last_severity {
                return Err(format!(
                    "alerter {:?} level {} is less severe than level {}",
                    self.name,
                    i + 1,
                    i
                ));
            }
            last_severity = sev;
        }
        Ok(())
    }
}

/// DTA (DAA Terminal Area) logic mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DtaMode {
    /// Alternative alerter/resolution logic applies only inside the cylinder.
    Inside,
    Disabled,
    /// Alternative logic applies only outside the cylinder.
    Outside,
}

/// §3 Parameter Block. Invariant across a façade invocation; mutating any
/// field through [`Daidalus`](crate::daidalus::Daidalus) bumps the
/// generation counter and invalidates all caches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    pub lookahead_time: f64,

    pub left_hdir: f64,
    pub right_hdir: f64,

    pub min_hs: f64,
    pub max_hs: f64,
    pub min_vs: f64,
    pub max_vs: f64,
    pub min_alt: f64,
    pub max_alt: f64,

    pub below_relative_hs: f64,
    pub above_relative_hs: f64,
    pub below_relative_vs: f64,
    pub above_relative_vs: f64,
    pub below_relative_alt: f64,
    pub above_relative_alt: f64,

    pub step_hdir: f64,
    pub step_hs: f64,
    pub step_vs: f64,
    pub step_alt: f64,

    pub horizontal_accel: f64,
    pub vertical_accel: f64,
    pub turn_rate: f64,
    pub bank_angle: f64,
    pub vertical_rate: f64,

    pub min_horizontal_recovery: f64,
    pub min_vertical_recovery: f64,
    pub recovery_stability_time: f64,
    pub recovery_hdir: bool,
    pub recovery_hs: bool,
    pub recovery_vs: bool,
    pub recovery_alt: bool,

    pub ca_bands: bool,
    pub ca_factor: f64,
    pub horizontal_nmac: f64,
    pub vertical_nmac: f64,

    pub hysteresis_time: f64,
    pub persistence_time: f64,
    pub bands_persistence: bool,
    pub persistence_preferred_hdir: f64,
    pub persistence_preferred_hs: f64,
    pub persistence_preferred_vs: f64,
    pub persistence_preferred_alt: f64,
    pub alerting_m: u32,
    pub alerting_n: u32,

    pub conflict_crit: bool,
    pub recovery_crit: bool,

    pub h_pos_z_score: f64,
    pub h_vel_z_score_min: f64,
    pub h_vel_z_score_max: f64,
    pub h_vel_z_distance: f64,
    pub v_pos_z_score: f64,
    pub v_vel_z_score: f64,

    pub contour_thr: f64,

    pub dta_mode: DtaMode,
    pub dta_latitude: f64,
    pub dta_longitude: f64,
    pub dta_radius: f64,
    pub dta_height: f64,
    pub dta_alerter: usize,

    pub ownship_centric_alerting: bool,
    pub corrective_region: Region,

    pub alerters: Vec<Alerter>,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            lookahead_time: 180.0,
            left_hdir: std::f64::consts::PI,
            right_hdir: std::f64::consts::PI,
            min_hs: 0.0,
            max_hs: 308.0,
            min_vs: -15.24,
            max_vs: 15.24,
            min_alt: 0.0,
            max_alt: 15_240.0,
            below_relative_hs: 0.0,
            above_relative_hs: 0.0,
            below_relative_vs: 0.0,
            above_relative_vs: 0.0,
            below_relative_alt: 0.0,
            above_relative_alt: 0.0,
            step_hdir: 1.0_f64.to_radians(),
            step_hs: 0.514_444, // 1 kt
            step_vs: 0.0508, // 10 fpm
            step_alt: 30.48, // 100 ft
            horizontal_accel: 2.0,
            vertical_accel: 2.0,
            turn_rate: 3.0_f64.to_radians(),
            bank_angle: 0.0,
            vertical_rate: 2.54, // 500 fpm
            min_horizontal_recovery: 1_222.0, // 0.66 NM
            min_vertical_recovery: 137.16, // 450 ft
            recovery_stability_time: 2.0,
            recovery_hdir: true,
            recovery_hs: true,
            recovery_vs: true,
            recovery_alt: true,
            ca_bands: true,
            ca_factor: 0.2,
            horizontal_nmac: 185.2, // 0.1 NM
            vertical_nmac: 45.72, // 150 ft
            hysteresis_time: 5.0,
            persistence_time: 10.0,
            bands_persistence: false,
            persistence_preferred_hdir: 15.0_f64.to_radians(),
            persistence_preferred_hs: 2.572, // 5 kt
            persistence_preferred_vs: 1.016, // 200 fpm
            persistence_preferred_alt: 60.96, // 200 ft
            alerting_m: 0,
            alerting_n: 0,
            conflict_crit: false,
            recovery_crit: false,
            h_pos_z_score: 1.645,
            h_vel_z_score_min: 0.5,
            h_vel_z_score_max: 1.0,
            h_vel_z_distance: 0.0,
            v_pos_z_score: 1.645,
            v_vel_z_score: 0.0,
            contour_thr: std::f64::consts::PI,
            dta_mode: DtaMode::Disabled,
            dta_latitude: 0.0,
            dta_longitude: 0.0,
            dta_radius: 0.0,
            dta_height: 0.0,
            dta_alerter: 0,
            ownship_centric_alerting: true,
            corrective_region: Region::Mid,
            alerters: vec![default_alerter()],
        }
    }
}

fn default_alerter() -> Alerter {
    let mut a = Alerter::new("default");
    a.levels.push(AlertThreshold::new("cylinder", 55.0, Region::Far));
    a.levels.push(AlertThreshold::new("cylinder", 55.0, Region::Mid));
    a.levels.push(AlertThreshold::new("cylinder", 25.0, Region::Near));
    a
}

impl Parameters {
    /// Implements the §3 relative-band-override convention verbatim
    /// (`original_source/Modules/ACCoRD/inc/DaidalusParameters.h` lines
    /// 42-46): in general `[val-below, val+above]`; a negative `below`
    /// (resp. `above`) means "extend to the absolute minimum (resp.
    /// maximum)"; both `== 0` disables the override (absolute range).
    pub fn relative_range(min_val: f64, max_val: f64, current: f64, below: f64, above: f64) -> (f64, f64) {
        if below == 0.0 && above == 0.0 {
            return (min_val, max_val);
        }
        let lo = if below < 0.0 { min_val } else { current - below };
        let hi = if above < 0.0 { max_val } else { current + above };
        (lo.max(min_val), hi.min(max_val))
    }

    pub fn hs_range(&self, current_hs: f64) -> (f64, f64) {
        Self::relative_range(self.min_hs, self.max_hs, current_hs, self.below_relative_hs, self.above_relative_hs)
    }

    pub fn vs_range(&self, current_vs: f64) -> (f64, f64) {
        Self::relative_range(self.min_vs, self.max_vs, current_vs, self.below_relative_vs, self.above_relative_vs)
    }

    pub fn alt_range(&self, current_alt: f64) -> (f64, f64) {
        Self::relative_range(self.min_alt, self.max_alt, current_alt, self.below_relative_alt, self.above_relative_alt)
    }

    /// Validates and applies a single numeric field, by canonical key name.
    /// Rejects (returns `Err` without mutating) on an out-of-range or
    /// otherwise invalid value (§7 `ParameterError`).
    pub fn set(&mut self, key: &str, value: f64) -> Result<(), ParameterError> {
        let key = canonical_key(key);
        macro_rules! non_negative {
            ($field:ident) => {{
                if value < 0.0 {
                    return Err(ParameterError::Negative { key: key.to_string(), value });
                }
                self.$field = value;
                Ok(())
            }};
        }
        match key {
            "lookahead_time" => non_negative!(lookahead_time),
            "left_hdir" => in_range(value, 0.0, std::f64::consts::PI, &key).map(|v| self.left_hdir = v),
            "right_hdir" => in_range(value, 0.0, std::f64::consts::PI, &key).map(|v| self.right_hdir = v),
            "min_hs" => non_negative!(min_hs),
            "max_hs" => non_negative!(max_hs),
            "min_vs" => {
                self.min_vs = value;
                Ok(())
            }
            "max_vs" => {
                self.max_vs = value;
                Ok(())
            }
            "min_alt" => non_negative!(min_alt),
            "max_alt" => non_negative!(max_alt),
            "step_hdir" | "trk_step" => non_negative!(step_hdir),
            "step_hs" | "gs_step" => non_negative!(step_hs),
            "step_vs" => non_negative!(step_vs),
            "step_alt" => non_negative!(step_alt),
            "horizontal_accel" => non_negative!(horizontal_accel),
            "vertical_accel" => non_negative!(vertical_accel),
            "turn_rate" => non_negative!(turn_rate),
            "bank_angle" => non_negative!(bank_angle),
            "vertical_rate" => non_negative!(vertical_rate),
            "min_horizontal_recovery" => non_negative!(min_horizontal_recovery),
            "min_vertical_recovery" => non_negative!(min_vertical_recovery),
            "recovery_stability_time" => non_negative!(recovery_stability_time),
            "ca_factor" => in_range(value, f64::EPSILON, 1.0, &key).map(|v| self.ca_factor = v),
            "horizontal_nmac" => non_negative!(horizontal_nmac),
            "vertical_nmac" => non_negative!(vertical_nmac),
            "hysteresis_time" => non_negative!(hysteresis_time),
            "persistence_time" => non_negative!(persistence_time),
            "persistence_preferred_hdir" => non_negative!(persistence_preferred_hdir),
            "persistence_preferred_hs" => non_negative!(persistence_preferred_hs),
            "persistence_preferred_vs" => non_negative!(persistence_preferred_vs),
            "persistence_preferred_alt" => non_negative!(persistence_preferred_alt),
            "contour_thr" => in_range(value, 0.0, std::f64::consts::PI, &key).map(|v| self.contour_thr = v),
            "dta_radius" => non_negative!(dta_radius),
            "dta_height" => non_negative!(dta_height),
            _ => Err(ParameterError::UnknownEnum { key: key.to_string(), value: value.to_string() }),
        }
    }

    /// Serializes to the §6 key/value text format, including a version
    /// header and the alerter-list blocks, in a form `Parameters::parse`
    /// reads back exactly (P3).
    pub fn to_config_string(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "V-2.0");
        macro_rules! kv {
            ($key:literal, $val:expr) => {
                let _ = writeln!(out, "{} = {}", $key, $val);
            };
        }
        kv!("lookahead_time", self.lookahead_time);
        kv!("left_hdir", self.left_hdir);
        kv!("right_hdir", self.right_hdir);
        kv!("min_hs", self.min_hs);
        kv!("max_hs", self.max_hs);
        kv!("min_vs", self.min_vs);
        kv!("max_vs", self.max_vs);
        kv!("min_alt", self.min_alt);
        kv!("max_alt", self.max_alt);
        kv!("below_relative_hs", self.below_relative_hs);
        kv!("above_relative_hs", self.above_relative_hs);
        kv!("below_relative_vs", self.below_relative_vs);
        kv!("above_relative_vs", self.above_relative_vs);
        kv!("below_relative_alt", self.below_relative_alt);
        kv!("above_relative_alt", self.above_relative_alt);
        kv!("step_hdir", self.step_hdir);
        kv!("step_hs", self.step_hs);
        kv!("step_vs", self.step_vs);
        kv!("step_alt", self.step_alt);
        kv!("horizontal_accel", self.horizontal_accel);
        kv!("vertical_accel", self.vertical_accel);
        kv!("turn_rate", self.turn_rate);
        kv!("bank_angle", self.bank_angle);
        kv!("vertical_rate", self.vertical_rate);
        kv!("min_horizontal_recovery", self.min_horizontal_recovery);
        kv!("min_vertical_recovery", self.min_vertical_recovery);
        kv!("recovery_stability_time", self.recovery_stability_time);
        kv!("recovery_hdir", self.recovery_hdir);
        kv!("recovery_hs", self.recovery_hs);
        kv!("recovery_vs", self.recovery_vs);
        kv!("recovery_alt", self.recovery_alt);
        kv!("ca_bands", self.ca_bands);
        kv!("ca_factor", self.ca_factor);
        kv!("horizontal_nmac", self.horizontal_nmac);
        kv!("vertical_nmac", self.vertical_nmac);
        kv!("hysteresis_time", self.hysteresis_time);
        kv!("persistence_time", self.persistence_time);
        kv!("bands_persistence", self.bands_persistence);
        kv!("persistence_preferred_hdir", self.persistence_preferred_hdir);
        kv!("persistence_preferred_hs", self.persistence_preferred_hs);
        kv!("persistence_preferred_vs", self.persistence_preferred_vs);
        kv!("persistence_preferred_alt", self.persistence_preferred_alt);
        kv!("alerting_m", self.alerting_m);
        kv!("alerting_n", self.alerting_n);
        kv!("conflict_crit", self.conflict_crit);
        kv!("recovery_crit", self.recovery_crit);
        kv!("h_pos_z_score", self.h_pos_z_score);
        kv!("h_vel_z_score_min", self.h_vel_z_score_min);
        kv!("h_vel_z_score_max", self.h_vel_z_score_max);
        kv!("h_vel_z_distance", self.h_vel_z_distance);
        kv!("v_pos_z_score", self.v_pos_z_score);
        kv!("v_vel_z_score", self.v_vel_z_score);
        kv!("contour_thr", self.contour_thr);
        kv!("dta_latitude", self.dta_latitude);
        kv!("dta_longitude", self.dta_longitude);
        kv!("dta_radius", self.dta_radius);
        kv!("dta_height", self.dta_height);
        kv!("dta_alerter", self.dta_alerter);
        kv!("ownship_centric_alerting", self.ownship_centric_alerting);
        let _ = writeln!(out, "corrective_region = {}", self.corrective_region.as_str());
        let _ = writeln!(
            out,
            "dta_mode = {}",
            match self.dta_mode {
                DtaMode::Inside => "1",
                DtaMode::Disabled => "0",
                DtaMode::Outside => "-1",
            }
        );
        let names: Vec<&str> = self.alerters.iter().map(|a| a.name.as_str()).collect();
        let _ = writeln!(out, "alerters = {}", names.join(","));
        for alerter in &self.alerters {
            for (i, level) in alerter.levels.iter().enumerate() {
                let k = i + 1;
                let _ = writeln!(out, "{}_alert_{}_detector = {}", alerter.name, k, level.detector);
                let _ = writeln!(out, "{}_alert_{}_alerting_time = {}", alerter.name, k, level.alerting_time);
                let _ = writeln!(
                    out,
                    "{}_alert_{}_early_alerting_time = {}",
                    alerter.name, k, level.early_alerting_time
                );
                let _ = writeln!(out, "{}_alert_{}_region = {}", alerter.name, k, level.region.as_str());
                if level.spread_hdir != 0.0 {
                    let _ = writeln!(out, "{}_alert_{}_spread_hdir = {}", alerter.name, k, level.spread_hdir);
                }
                if level.spread_hs != 0.0 {
                    let _ = writeln!(out, "{}_alert_{}_spread_hs = {}", alerter.name, k, level.spread_hs);
                }
                if level.spread_vs != 0.0 {
                    let _ = writeln!(out, "{}_alert_{}_spread_vs = {}", alerter.name, k, level.spread_vs);
                }
                if level.spread_alt != 0.0 {
                    let _ = writeln!(out, "{}_alert_{}_spread_alt = {}", alerter.name, k, level.spread_alt);
                }
            }
        }
        out
    }

    /// Parses the §6 key/value text format. Unknown keys are collected as
    /// warnings rather than rejected (§6); deprecated aliases (e.g.
    /// `trk_step`) are rewritten to their canonical name transparently.
    pub fn parse(text: &str) -> (Parameters, Vec<String>) {
        let mut params = Parameters::default();
        let mut warnings = Vec::new();
        let mut alerter_names: Vec<String> = Vec::new();
        let mut alerters: HashMap<String, Alerter> = HashMap::new();

        for raw_line in text.lines() {
            let line = raw_line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with("V-") {
                continue;
            }
            let Some((key_raw, value)) = line.split_once('=') else {
                warnings.push(format!("ignoring malformed line: {:?}", raw_line));
                continue;
            };
            let key_raw = key_raw.trim();
            let value = value.trim();

            if key_raw == "alerters" {
                alerter_names = value.split(',').map(|s| s.trim().to_string()).collect();
                for name in &alerter_names {
                    alerters.entry(name.clone()).or_insert_with(|| Alerter::new(name.clone()));
                }
                continue;
            }
            if key_raw == "corrective_region" {
                match Region::parse(value) {
                    Some(r) => params.corrective_region = r,
                    None => warnings.push(format!("unknown region {:?}", value)),
                }
                continue;
            }
            if key_raw == "dta_mode" {
                params.dta_mode = match value {
                    "1" => DtaMode::Inside,
                    "-1" => DtaMode::Outside,
                    _ => DtaMode::Disabled,
                };
                continue;
            }

            if let Some(caps) = ALERT_KEY_RE.captures(key_raw) {
                let name = caps[1].to_string();
                let level: usize = caps[2].parse().unwrap_or(0);
                let field = &caps[3];
                if !alerter_names.contains(&name) {
                    alerter_names.push(name.clone());
                }
                let alerter = alerters.entry(name.clone()).or_insert_with(|| Alerter::new(name));
                apply_alerter_field(alerter, level, field, value, &mut warnings);
                continue;
            }

            if let Some(v) = parse_bool(value) {
                apply_bool_field_value(&mut params, key_raw, v, &mut warnings);
                continue;
            }

            match value.parse::<f64>() {
                Ok(num) => {
                    if let Err(e) = params.set(key_raw, num) {
                        warnings.push(format!("rejected {}: {}", key_raw, e));
                    }
                }
                Err(_) => warnings.push(format!("unrecognised key or value: {} = {}", key_raw, value)),
            }
        }

        if !alerter_names.is_empty() {
            params.alerters = alerter_names
                .iter()
                .filter_map(|n| alerters.remove(n))
                .collect();
        }
        (params, warnings)
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn apply_bool_field_value(params: &mut Parameters, key: &str, v: bool, warnings: &mut Vec<String>) {
    match canonical_key(key) {
        "recovery_hdir" | "recovery_trk" => params.recovery_hdir = v,
        "recovery_hs" | "recovery_gs" => params.recovery_hs = v,
        "recovery_vs" => params.recovery_vs = v,
        "recovery_alt" => params.recovery_alt = v,
        "ca_bands" => params.ca_bands = v,
        "bands_persistence" => params.bands_persistence = v,
        "conflict_crit" => params.conflict_crit = v,
        "recovery_crit" => params.recovery_crit = v,
        "ownship_centric_alerting" => params.ownship_centric_alerting = v,
        other => warnings.push(format!("unknown boolean key: {}", other)),
    }
}

fn in_range(value: f64, min: f64, max: f64, key: &str) -> Result<f64, ParameterError> {
    if value < min || value > max {
        Err(ParameterError::OutOfRange { key: key.to_string(), value, min, max })
    } else {
        Ok(value)
    }
}

/// Maps deprecated §9 aliases (`*Track*`, `*GroundSpeed*` style names used by
/// the source's parameter-file layer) to the canonical field name. The
/// public API (`Parameters::set`, the struct fields) only ever uses
/// canonical names; aliasing is purely a file-format concern.
static ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("trk_step", "step_hdir");
    m.insert("gs_step", "step_hs");
    m.insert("track_step", "step_hdir");
    m.insert("ground_speed_step", "step_hs");
    m.insert("left_trk", "left_hdir");
    m.insert("right_trk", "right_hdir");
    m.insert("min_gs", "min_hs");
    m.insert("max_gs", "max_hs");
    m.insert("recovery_trk", "recovery_hdir");
    m.insert("recovery_gs", "recovery_hs");
    m
});

fn canonical_key(key: &str) -> &str {
    ALIASES.get(key).copied().unwrap_or(key)
}

/// Matches `<alerter>_alert_<level>_<field>`, e.g. `default_alert_2_region`.
static ALERT_KEY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\w+)_alert_(\d+)_(\w+)$").unwrap());

fn apply_alerter_field(alerter: &mut Alerter, level: usize, field: &str, value: &str, warnings: &mut Vec<String>) {
    if level == 0 {
        warnings.push(format!("alert level must be >= 1, got {}_alert_0_{}", alerter.name, field));
        return;
    }
    while alerter.levels.len() < level {
        alerter.levels.push(AlertThreshold::new("cylinder", 0.0, Region::None));
    }
    let threshold = &mut alerter.levels[level - 1];
    match field {
        "detector" => threshold.detector = value.to_string(),
        "region" => match Region::parse(value) {
            Some(r) => threshold.region = r,
            None => warnings.push(format!("unknown region {:?} for {}_alert_{}", value, alerter.name, level)),
        },
        "alerting_time" => parse_into(value, &mut threshold.alerting_time, warnings),
        "early_alerting_time" => parse_into(value, &mut threshold.early_alerting_time, warnings),
        "spread_hdir" => parse_into(value, &mut threshold.spread_hdir, warnings),
        "spread_hs" => parse_into(value, &mut threshold.spread_hs, warnings),
        "spread_vs" => parse_into(value, &mut threshold.spread_vs, warnings),
        "spread_alt" => parse_into(value, &mut threshold.spread_alt, warnings),
        other => warnings.push(format!("unknown alerter field: {}", other)),
    }
}

fn parse_into(value: &str, slot: &mut f64, warnings: &mut Vec<String>) {
    match value.parse::<f64>() {
        Ok(v) => *slot = v,
        Err(_) => warnings.push(format!("expected a number, got {:?}", value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_range_absolute_when_disabled() {
        assert_eq!(Parameters::relative_range(0.0, 100.0, 50.0, 0.0, 0.0), (0.0, 100.0));
    }

    #[test]
    fn relative_range_general_case() {
        assert_eq!(Parameters::relative_range(0.0, 100.0, 50.0, 10.0, 20.0), (40.0, 70.0));
    }

    #[test]
    fn relative_range_negative_below_extends_to_min() {
        assert_eq!(Parameters::relative_range(0.0, 100.0, 50.0, -1.0, 20.0), (0.0, 70.0));
    }

    #[test]
    fn relative_range_negative_above_extends_to_max() {
        assert_eq!(Parameters::relative_range(0.0, 100.0, 50.0, 10.0, -1.0), (40.0, 100.0));
    }

    #[test]
    fn set_rejects_out_of_range_and_keeps_prior_value() {
        let mut p = Parameters::default();
        let prior = p.left_hdir;
        let err = p.set("left_hdir", 10.0).unwrap_err();
        assert!(matches!(err, ParameterError::OutOfRange { .. }));
        assert_eq!(p.left_hdir, prior);
    }

    #[test]
    fn deprecated_alias_is_rewritten() {
        let mut p = Parameters::default();
        p.set("trk_step", 0.1).unwrap();
        assert_eq!(p.step_hdir, 0.1);
    }

    #[test]
    fn round_trip_numeric_fields() {
        let mut p = Parameters::default();
        p.lookahead_time = 123.0;
        p.min_horizontal_recovery = 999.0;
        let text = p.to_config_string();
        let (p2, warnings) = Parameters::parse(&text);
        assert!(warnings.is_empty(), "unexpected warnings: {:?}", warnings);
        assert_eq!(p.lookahead_time, p2.lookahead_time);
        assert_eq!(p.min_horizontal_recovery, p2.min_horizontal_recovery);
        assert_eq!(p.corrective_region, p2.corrective_region);
    }
}
