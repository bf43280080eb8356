//! Advertisement source abstraction.
//!
//! Anything that can observe advertisements (a local radio via
//! [`BleScanner`](crate::ble::BleScanner), a remote scanning proxy, a replay
//! of captured packets) implements [`AdvertisementSource`] and can drive a
//! [`SensorMonitor`](crate::SensorMonitor).

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::ble::advertising::AdvertisementEvent;
use crate::error::Result;

/// A producer of [`AdvertisementEvent`]s.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AdvertisementSource: Send + Sync {
    /// Begin delivering advertisements. Calling this while running is a no-op.
    async fn start(&self) -> Result<()>;

    /// Stop delivering advertisements. Calling this while stopped is a no-op.
    async fn stop(&self) -> Result<()>;

    /// Subscribe to observed advertisements.
    fn subscribe(&self) -> broadcast::Receiver<AdvertisementEvent>;
}
