//! The decode pipeline.
//!
//! One call per observed advertisement: address gate, payload decode, reading
//! assembly. The pipeline holds only immutable configuration.

use tracing::trace;

use crate::ble::address::{matches, DeviceAddress};
use crate::ble::advertising::AdvertisementEvent;
use crate::data::{assemble, Reading};
use crate::error::DecodeRejected;
use crate::protocol::PayloadDecoder;

/// Result of running one advertisement through the pipeline.
pub type DecodeOutcome = std::result::Result<Reading, DecodeRejected>;

/// Turns advertisements from one configured device into readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodePipeline {
    configured: DeviceAddress,
    decoder: PayloadDecoder,
}

impl DecodePipeline {
    /// Create a pipeline for the given device and decoder.
    pub fn new(configured: DeviceAddress, decoder: PayloadDecoder) -> Self {
        Self {
            configured,
            decoder,
        }
    }

    /// The device this pipeline accepts advertisements from.
    pub fn configured_address(&self) -> DeviceAddress {
        self.configured
    }

    /// The payload decoder in use.
    pub fn decoder(&self) -> &PayloadDecoder {
        &self.decoder
    }

    /// Process one advertisement.
    ///
    /// Advertisements from other devices are rejected before the payload is
    /// looked at. Decoder rejections are returned unchanged; otherwise the
    /// decoded fields are stamped with the event's source and receive time.
    pub fn process(&self, event: &AdvertisementEvent) -> DecodeOutcome {
        if !matches(&self.configured, &event.source) {
            return Err(DecodeRejected::AddressMismatch {
                expected: self.configured,
                observed: event.source,
            });
        }

        let fields = self.decoder.decode(event.payload()).map_err(|e| {
            trace!("Rejected advertisement from {}: {}", event.source, e);
            e
        })?;

        Ok(assemble(event.source, event.received_at, fields))
    }
}
