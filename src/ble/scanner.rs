//! BLE scanning functionality.
//!
//! Passively scans with the first available adapter and forwards every
//! advertisement that carries Inkbird manufacturer data.

use async_trait::async_trait;
use btleplug::api::{
    Central, CentralEvent, Manager as _, Peripheral as _, PeripheralProperties, ScanFilter,
};
use btleplug::platform::{Adapter, Manager, PeripheralId};
use chrono::{DateTime, Utc};
use futures::stream::StreamExt;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, error, info, trace};

use crate::ble::address::DeviceAddress;
use crate::ble::advertising::AdvertisementEvent;
use crate::ble::source::AdvertisementSource;
use crate::ble::uuids::{is_inkbird_service, INKBIRD_MANUFACTURER_ID};
use crate::error::{Error, Result};

/// Capacity of the advertisement broadcast channel.
const EVENT_CHANNEL_CAPACITY: usize = 100;

/// BLE scanner producing Inkbird advertisement events.
pub struct BleScanner {
    /// The BLE adapter to use for scanning.
    adapter: Adapter,
    /// Company identifier whose manufacturer data is forwarded.
    company_id: u16,
    /// Whether scanning is currently active.
    is_scanning: Arc<AtomicBool>,
    /// Channel for advertisement events.
    event_tx: broadcast::Sender<AdvertisementEvent>,
    /// Handle to the scanning task.
    scan_handle: RwLock<Option<tokio::task::JoinHandle<()>>>,
}

impl BleScanner {
    /// Create a new BLE scanner on the first available adapter.
    ///
    /// # Errors
    ///
    /// Returns an error if Bluetooth is not available.
    pub async fn new() -> Result<Self> {
        let manager = Manager::new()
            .await
            .map_err(|_e| Error::BluetoothUnavailable)?;

        let adapters = manager.adapters().await.map_err(Error::Bluetooth)?;

        let adapter = adapters
            .into_iter()
            .next()
            .ok_or(Error::BluetoothUnavailable)?;

        info!(
            "Using Bluetooth adapter: {:?}",
            adapter.adapter_info().await.ok()
        );

        Ok(Self::with_adapter(adapter))
    }

    /// Create a new BLE scanner with a specific adapter.
    pub fn with_adapter(adapter: Adapter) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            adapter,
            company_id: INKBIRD_MANUFACTURER_ID,
            is_scanning: Arc::new(AtomicBool::new(false)),
            event_tx,
            scan_handle: RwLock::new(None),
        }
    }

    /// Forward manufacturer data for a different company identifier.
    pub fn with_company_id(mut self, company_id: u16) -> Self {
        self.company_id = company_id;
        self
    }

    /// Check if currently scanning.
    pub fn is_scanning(&self) -> bool {
        self.is_scanning.load(Ordering::SeqCst)
    }

    /// Get the underlying adapter.
    pub fn adapter(&self) -> &Adapter {
        &self.adapter
    }

    /// Start scanning.
    ///
    /// # Errors
    ///
    /// Returns an error if scanning cannot be started.
    pub async fn start_scanning(&self) -> Result<()> {
        if self.is_scanning() {
            debug!("Already scanning, ignoring start request");
            return Ok(());
        }

        info!(
            "Starting BLE scan for manufacturer id {:#06x}",
            self.company_id
        );

        // Subscribe before scanning so no early advertisement is missed
        let mut events = self.adapter.events().await.map_err(Error::Bluetooth)?;

        self.adapter
            .start_scan(ScanFilter::default())
            .await
            .map_err(Error::Bluetooth)?;

        self.is_scanning.store(true, Ordering::SeqCst);

        let adapter = self.adapter.clone();
        let company_id = self.company_id;
        let is_scanning = self.is_scanning.clone();
        let event_tx = self.event_tx.clone();

        let handle = tokio::spawn(async move {
            while is_scanning.load(Ordering::SeqCst) {
                tokio::select! {
                    event = events.next() => {
                        match event {
                            Some(event) => {
                                Self::handle_event(event, &adapter, company_id, &event_tx).await;
                            }
                            None => {
                                error!("Adapter event stream ended");
                                break;
                            }
                        }
                    }
                    _ = tokio::time::sleep(Duration::from_millis(100)) => {}
                }
            }

            debug!("Scan event loop ended");
        });

        *self.scan_handle.write() = Some(handle);

        Ok(())
    }

    /// Stop scanning.
    pub async fn stop_scanning(&self) -> Result<()> {
        if !self.is_scanning() {
            debug!("Not scanning, ignoring stop request");
            return Ok(());
        }

        info!("Stopping BLE scan");

        self.is_scanning.store(false, Ordering::SeqCst);

        self.adapter.stop_scan().await.map_err(Error::Bluetooth)?;

        // Wait for the scan task to complete
        let handle = self.scan_handle.write().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }

        Ok(())
    }

    /// Subscribe to advertisement events.
    pub fn subscribe(&self) -> broadcast::Receiver<AdvertisementEvent> {
        self.event_tx.subscribe()
    }

    /// Handle a BLE central event.
    async fn handle_event(
        event: CentralEvent,
        adapter: &Adapter,
        company_id: u16,
        event_tx: &broadcast::Sender<AdvertisementEvent>,
    ) {
        match event {
            CentralEvent::ManufacturerDataAdvertisement {
                id,
                manufacturer_data,
            } => {
                if manufacturer_data.contains_key(&company_id) {
                    Self::forward_advertisement(adapter, id, &manufacturer_data, company_id, event_tx)
                        .await;
                }
            }
            CentralEvent::ServicesAdvertisement { id, services } => {
                // Some backends deliver the vendor service before the manufacturer data
                if services.iter().any(is_inkbird_service) {
                    trace!("Inkbird service advertised by {:?}", id);
                    Self::process_peripheral(adapter, id, company_id, event_tx).await;
                }
            }
            CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id) => {
                Self::process_peripheral(adapter, id, company_id, event_tx).await;
            }
            CentralEvent::DeviceConnected(id) => {
                debug!("Device connected: {:?}", id);
            }
            CentralEvent::DeviceDisconnected(id) => {
                debug!("Device disconnected: {:?}", id);
            }
            CentralEvent::ServiceDataAdvertisement { .. } => {}
            CentralEvent::StateUpdate(_) => {}
        }
    }

    /// Forward the manufacturer data cached in a peripheral's properties.
    async fn process_peripheral(
        adapter: &Adapter,
        id: PeripheralId,
        company_id: u16,
        event_tx: &broadcast::Sender<AdvertisementEvent>,
    ) {
        let peripheral = match adapter.peripheral(&id).await {
            Ok(p) => p,
            Err(e) => {
                trace!("Failed to get peripheral: {}", e);
                return;
            }
        };

        let properties = match peripheral.properties().await {
            Ok(Some(props)) => props,
            _ => return,
        };

        if let Some(event) = event_from_properties(&properties, company_id, Utc::now()) {
            Self::publish(event, event_tx);
        }
    }

    /// Resolve the peripheral's address and publish the advertisement.
    async fn forward_advertisement(
        adapter: &Adapter,
        id: PeripheralId,
        manufacturer_data: &HashMap<u16, Vec<u8>>,
        company_id: u16,
        event_tx: &broadcast::Sender<AdvertisementEvent>,
    ) {
        let peripheral = match adapter.peripheral(&id).await {
            Ok(p) => p,
            Err(e) => {
                trace!("Failed to get peripheral: {}", e);
                return;
            }
        };

        let source = DeviceAddress::from(peripheral.address());
        let rssi = match peripheral.properties().await {
            Ok(Some(props)) => props.rssi,
            _ => None,
        };

        match AdvertisementEvent::from_manufacturer_data(
            source,
            manufacturer_data,
            company_id,
            Utc::now(),
        ) {
            Ok(event) => Self::publish(event.with_rssi(rssi), event_tx),
            Err(e) => trace!("Skipping advertisement from {}: {}", source, e),
        }
    }

    fn publish(event: AdvertisementEvent, event_tx: &broadcast::Sender<AdvertisementEvent>) {
        trace!(
            "Advertisement from {} ({} bytes, RSSI {:?})",
            event.source,
            event.manufacturer_data.len(),
            event.rssi
        );

        // No receivers is fine; nobody is listening yet
        let _ = event_tx.send(event);
    }
}

/// Build an event from a peripheral's cached properties.
///
/// Returns `None` unless the properties carry manufacturer data for
/// `company_id`.
fn event_from_properties(
    properties: &PeripheralProperties,
    company_id: u16,
    received_at: DateTime<Utc>,
) -> Option<AdvertisementEvent> {
    AdvertisementEvent::from_manufacturer_data(
        DeviceAddress::from(properties.address),
        &properties.manufacturer_data,
        company_id,
        received_at,
    )
    .ok()
    .map(|event| event.with_rssi(properties.rssi))
}

#[async_trait]
impl AdvertisementSource for BleScanner {
    async fn start(&self) -> Result<()> {
        self.start_scanning().await
    }

    async fn stop(&self) -> Result<()> {
        self.stop_scanning().await
    }

    fn subscribe(&self) -> broadcast::Receiver<AdvertisementEvent> {
        BleScanner::subscribe(self)
    }
}

impl Drop for BleScanner {
    fn drop(&mut self) {
        self.is_scanning.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scanner_is_advertisement_source() {
        fn assert_source<T: AdvertisementSource>() {}
        assert_source::<BleScanner>();
    }

    #[test]
    fn test_event_from_properties() {
        use btleplug::api::BDAddr;
        use chrono::TimeZone;

        let at = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        let mut properties = PeripheralProperties {
            address: BDAddr::from([0x49, 0x22, 0x05, 0x17, 0x2C, 0x01]),
            rssi: Some(-71),
            ..Default::default()
        };

        // No manufacturer data cached yet
        assert!(event_from_properties(&properties, INKBIRD_MANUFACTURER_ID, at).is_none());

        properties.manufacturer_data.insert(0x004C, vec![0x02, 0x15]);
        assert!(event_from_properties(&properties, INKBIRD_MANUFACTURER_ID, at).is_none());

        properties
            .manufacturer_data
            .insert(INKBIRD_MANUFACTURER_ID, vec![0xA1, 0x00, 0xE7, 0x03, 0x57]);
        let event = event_from_properties(&properties, INKBIRD_MANUFACTURER_ID, at).unwrap();

        assert_eq!(event.source.to_string(), "49:22:05:17:2C:01");
        assert_eq!(event.payload(), &[0xA1, 0x00, 0xE7, 0x03, 0x57]);
        assert_eq!(event.rssi, Some(-71));
        assert_eq!(event.received_at, at);
    }

    #[test]
    fn test_advertisement_event_clone() {
        fn assert_clone<T: Clone + Send + 'static>() {}
        assert_clone::<AdvertisementEvent>();
    }
}
