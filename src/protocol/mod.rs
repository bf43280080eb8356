//! Protocol module for decoding advertisement payloads.
//!
//! This module contains:
//! - Firmware payload layout tables
//! - The payload decoder

pub mod decoder;
pub mod layout;

pub use decoder::PayloadDecoder;
pub use layout::{ByteOrder, FieldEncoding, FieldSpec, FirmwareLayout, PayloadLayout, Scale};
