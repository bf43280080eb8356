//! Sensor monitor for one configured device.
//!
//! The monitor subscribes to an [`AdvertisementSource`], runs every
//! advertisement through the [`DecodePipeline`] and keeps the latest merged
//! state of the sensor. Readings are fanned out to subscribers and callbacks.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, trace, warn};

use crate::ble::advertising::AdvertisementEvent;
use crate::ble::scanner::BleScanner;
use crate::ble::source::AdvertisementSource;
use crate::config::SensorConfig;
use crate::data::Reading;
use crate::error::{DecodeRejected, Result};
use crate::pipeline::DecodePipeline;
use crate::utils::to_hex_string;

/// Interval between stale checks in the background task.
const STALE_CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// Keeps a reading callback registered.
///
/// The callback runs on its own task; dropping the handle or calling
/// [`unregister`](Self::unregister) aborts that task.
#[must_use = "dropping the handle unregisters the callback"]
pub struct CallbackHandle {
    id: u64,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl CallbackHandle {
    fn new(id: u64, task: tokio::task::JoinHandle<()>) -> Self {
        Self {
            id,
            task: Some(task),
        }
    }

    /// Stop invoking the callback.
    pub fn unregister(mut self) {
        self.abort();
    }

    /// Registration order of the callback on its monitor.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Check if the callback task is still alive.
    ///
    /// The task ends on its own once the monitor is dropped.
    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    fn abort(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for CallbackHandle {
    fn drop(&mut self) {
        self.abort();
    }
}

/// Latest known state of the monitored sensor.
///
/// Partial readings only overwrite the fields they carry, so a temporarily
/// implausible humidity does not erase the last good value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SensorState {
    /// Last plausible temperature in tenths of a degree Celsius.
    pub temperature: Option<i16>,
    /// Last plausible humidity in tenths of a percent.
    pub humidity: Option<u16>,
    /// Last plausible battery level in percent.
    pub battery: Option<u8>,
    /// When the last reading with at least one field was observed.
    pub last_seen: Option<DateTime<Utc>>,
    /// Signal strength of the last accepted advertisement.
    pub last_rssi: Option<i16>,
    /// Hex dump of the last accepted payload.
    pub raw_manufacturer: Option<String>,
    /// Number of readings accepted so far.
    pub readings_received: u64,
    /// Rejections since the last accepted reading (address mismatches excluded).
    pub consecutive_rejections: u32,
    /// The most recent rejection, if any.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub last_rejection: Option<DecodeRejected>,
    stale_reported: bool,
}

impl SensorState {
    /// Merge a reading decoded from `event` into the state.
    pub fn apply(&mut self, event: &AdvertisementEvent, reading: &Reading) {
        if let Some(t) = reading.temperature {
            self.temperature = Some(t);
        }
        if let Some(h) = reading.humidity {
            self.humidity = Some(h);
        }
        if let Some(b) = reading.battery {
            self.battery = Some(b);
        }

        // A reading with nothing plausible in it does not prove the sensor is alive
        if !reading.is_empty() {
            self.last_seen = Some(reading.observed_at);
            self.stale_reported = false;
        }

        if event.rssi.is_some() {
            self.last_rssi = event.rssi;
        }
        self.raw_manufacturer = Some(to_hex_string(event.payload()));
        self.readings_received += 1;
        self.consecutive_rejections = 0;
    }

    /// Record a rejected advertisement.
    ///
    /// Returns `false` for address mismatches, which are ordinary traffic
    /// from other devices and are not counted.
    pub fn record_rejection(&mut self, rejection: &DecodeRejected) -> bool {
        if rejection.is_address_mismatch() {
            return false;
        }
        self.consecutive_rejections = self.consecutive_rejections.saturating_add(1);
        self.last_rejection = Some(rejection.clone());
        true
    }

    /// Check staleness at a given time.
    ///
    /// A sensor that has never produced a reading is stale.
    pub fn is_stale_at(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        match self.last_seen {
            Some(last_seen) => (now - last_seen)
                .to_std()
                .map(|age| age > timeout)
                .unwrap_or(false),
            None => true,
        }
    }

    /// Temperature in degrees Celsius.
    pub fn temperature_celsius(&self) -> Option<f64> {
        self.temperature.map(|t| f64::from(t) / 10.0)
    }

    /// Relative humidity in percent.
    pub fn humidity_percent(&self) -> Option<f64> {
        self.humidity.map(|h| f64::from(h) / 10.0)
    }
}

/// Monitors one configured sensor.
pub struct SensorMonitor {
    /// Monitor configuration.
    config: SensorConfig,
    /// Decode pipeline built from the configuration.
    pipeline: DecodePipeline,
    /// Where advertisements come from.
    source: Arc<dyn AdvertisementSource>,
    /// Latest sensor state.
    state: Arc<RwLock<SensorState>>,
    /// Reading update channel.
    reading_tx: broadcast::Sender<Reading>,
    /// Callback ID counter.
    callback_counter: AtomicU64,
    /// Background task handle.
    background_handle: RwLock<Option<tokio::task::JoinHandle<()>>>,
    /// Running flag.
    is_running: Arc<AtomicBool>,
}

impl SensorMonitor {
    /// Create a monitor fed by an arbitrary advertisement source.
    pub fn new(config: SensorConfig, source: Arc<dyn AdvertisementSource>) -> Self {
        let (reading_tx, _) = broadcast::channel(64);

        Self {
            pipeline: config.pipeline(),
            config,
            source,
            state: Arc::new(RwLock::new(SensorState::default())),
            reading_tx,
            callback_counter: AtomicU64::new(0),
            background_handle: RwLock::new(None),
            is_running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create a monitor fed by the local Bluetooth adapter.
    ///
    /// # Errors
    ///
    /// Returns an error if Bluetooth is not available.
    pub async fn with_ble(config: SensorConfig) -> Result<Self> {
        let scanner = BleScanner::new().await?;
        Ok(Self::new(config, Arc::new(scanner)))
    }

    /// Start the source and begin processing advertisements.
    pub async fn start(&self) -> Result<()> {
        if self.is_running.load(Ordering::SeqCst) {
            debug!("Monitor already running");
            return Ok(());
        }

        info!(
            "Starting monitor for {} ({}, layout {})",
            self.config.name, self.config.address, self.config.layout
        );

        let mut rx = self.source.subscribe();
        self.source.start().await?;
        self.is_running.store(true, Ordering::SeqCst);

        let pipeline = self.pipeline;
        let state = self.state.clone();
        let reading_tx = self.reading_tx.clone();
        let is_running = self.is_running.clone();
        let stale_timeout = self.config.stale_timeout;
        let name = self.config.name.clone();

        let handle = tokio::spawn(async move {
            while is_running.load(Ordering::SeqCst) {
                tokio::select! {
                    received = rx.recv() => {
                        match received {
                            Ok(event) => Self::handle_event(&pipeline, &state, &reading_tx, event),
                            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                                warn!("Monitor lagged behind, skipped {} advertisements", skipped);
                            }
                            Err(broadcast::error::RecvError::Closed) => {
                                debug!("Advertisement source closed");
                                break;
                            }
                        }
                    }
                    _ = tokio::time::sleep(STALE_CHECK_INTERVAL) => {
                        Self::check_stale(&name, &state, stale_timeout);
                    }
                }
            }

            debug!("Monitor background task ended");
        });

        *self.background_handle.write() = Some(handle);

        Ok(())
    }

    /// Stop the source and the processing task.
    pub async fn stop(&self) -> Result<()> {
        if !self.is_running.load(Ordering::SeqCst) {
            return Ok(());
        }

        info!("Stopping monitor for {}", self.config.name);

        self.is_running.store(false, Ordering::SeqCst);
        self.source.stop().await?;

        let handle = self.background_handle.write().take();
        if let Some(handle) = handle {
            handle.abort();
            let _ = handle.await;
        }

        Ok(())
    }

    /// Check if the monitor is running.
    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::SeqCst)
    }

    /// The monitor configuration.
    pub fn config(&self) -> &SensorConfig {
        &self.config
    }

    /// Snapshot of the latest sensor state.
    pub fn state(&self) -> SensorState {
        self.state.read().clone()
    }

    /// Check if no reading arrived within the configured stale timeout.
    pub fn is_stale(&self) -> bool {
        self.state
            .read()
            .is_stale_at(Utc::now(), self.config.stale_timeout)
    }

    /// Subscribe to readings.
    pub fn subscribe_readings(&self) -> broadcast::Receiver<Reading> {
        self.reading_tx.subscribe()
    }

    /// Register a callback invoked for every reading.
    pub fn on_reading<F>(&self, callback: F) -> CallbackHandle
    where
        F: Fn(Reading) + Send + Sync + 'static,
    {
        let callback_id = self.callback_counter.fetch_add(1, Ordering::SeqCst);
        let mut rx = self.reading_tx.subscribe();

        let handle = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(reading) => callback(reading),
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        CallbackHandle::new(callback_id, handle)
    }

    /// Run one advertisement through the pipeline and update state.
    fn handle_event(
        pipeline: &DecodePipeline,
        state: &Arc<RwLock<SensorState>>,
        reading_tx: &broadcast::Sender<Reading>,
        event: AdvertisementEvent,
    ) {
        match pipeline.process(&event) {
            Ok(reading) => {
                if reading.is_empty() {
                    debug!(
                        "No plausible fields in payload from {}: {}",
                        event.source,
                        to_hex_string(event.payload())
                    );
                } else {
                    debug!(
                        "Reading from {}: temperature={:?} humidity={:?} battery={:?}",
                        event.source, reading.temperature, reading.humidity, reading.battery
                    );
                }

                state.write().apply(&event, &reading);
                let _ = reading_tx.send(reading);
            }
            Err(rejection) => {
                let counted = {
                    let mut state = state.write();
                    state
                        .record_rejection(&rejection)
                        .then_some(state.consecutive_rejections)
                };
                match counted {
                    Some(count) => debug!(
                        "Rejected advertisement from {}: {} ({} consecutive)",
                        event.source, rejection, count
                    ),
                    None => trace!("Ignoring advertisement from {}", event.source),
                }
            }
        }
    }

    /// Log once when the sensor goes stale.
    fn check_stale(name: &str, state: &Arc<RwLock<SensorState>>, timeout: Duration) {
        let mut state = state.write();
        if state.last_seen.is_some()
            && !state.stale_reported
            && state.is_stale_at(Utc::now(), timeout)
        {
            warn!("No reading from {} for more than {:?}", name, timeout);
            state.stale_reported = true;
        }
    }
}

impl Drop for SensorMonitor {
    fn drop(&mut self) {
        self.is_running.store(false, Ordering::SeqCst);
    }
}
