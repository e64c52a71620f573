#![allow(rustdoc::broken_intra_doc_links)]
#![doc = include_str!("../readme.md")]

pub mod alerting;
pub mod bands;
pub mod core_state;
pub mod criteria;
pub mod daidalus;
pub mod detector;
pub mod error;
pub mod geometry;
pub mod hysteresis;
pub mod kinematics;
pub mod parameters;
pub mod state;

pub mod prelude {
    pub use crate::bands::{BandsRange, Region};
    pub use crate::daidalus::Daidalus;
    pub use crate::error::{IndexError, ParameterError, StateError};
    pub use crate::geometry::{LatLonAlt, Vect2, Vect3};
    pub use crate::parameters::{AlertThreshold, Alerter, Parameters};
    pub use crate::state::{AircraftState, Wind};
}
