//! Helpers shared by the feature modules.

pub mod coerce;
pub mod openapi;
