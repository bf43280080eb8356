//! Data structures for sensor readings.
//!
//! Contains the reading model, its plausibility bounds and the assembler
//! that turns decoded fields into a [`Reading`].

pub mod reading;

pub use reading::{
    assemble, DecodedFields, Reading, BATTERY_RANGE, HUMIDITY_RANGE, TEMPERATURE_RANGE,
};
