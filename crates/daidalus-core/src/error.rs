//! §7 error taxonomy.
//!
//! Parameter and state errors are reported through a per-instance log
//! (`Daidalus::error_log`) and reject the offending mutation; no pure query
//! ever returns an `Err` or panics — failure modes there resolve to the
//! sentinels each component documents (`NaN`, empty bands, `UNKNOWN`,
//! `INVALID`).

use thiserror::Error;

/// A rejected parameter mutation. The prior value is always retained.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    #[error("{key}: {value} is out of range [{min}, {max}]")]
    OutOfRange {
        key: String,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("{key}: unit {unit:?} is incompatible with this option")]
    IncompatibleUnit { key: String, unit: String },
    #[error("{key}: {value:?} is not a recognised value")]
    UnknownEnum { key: String, value: String },
    #[error("{key}: {value} must be non-negative")]
    Negative { key: String, value: f64 },
    #[error("{key}: min ({min}) must not exceed max ({max})")]
    MinExceedsMax { key: String, min: f64, max: f64 },
}

/// A mutation that leaves the core state inconsistent. Affected queries
/// degrade to `INVALID`/`NaN` on the next read rather than panicking.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StateError {
    #[error("ownship must be set before traffic can be added")]
    OwnshipNotSet,
    #[error("cannot mix geodetic and Euclidean positions in one state set")]
    MixedPositionFrames,
    #[error("no traffic aircraft with id {0:?}")]
    UnknownTraffic(String),
    #[error("traffic index {0} out of range (1..={1})")]
    IndexOutOfRange(usize, usize),
}

/// A 1-based traffic index outside `[1, traffic_count]`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("traffic index {0} out of range")]
pub struct IndexError(pub usize);
