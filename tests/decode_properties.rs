//! Property tests for the decode pipeline.

use chrono::{TimeZone, Utc};
use inkbird_rust_ble::data::{BATTERY_RANGE, HUMIDITY_RANGE, TEMPERATURE_RANGE};
use inkbird_rust_ble::{
    AdvertisementEvent, DecodePipeline, DecodeRejected, DeviceAddress, FirmwareLayout,
    PayloadDecoder,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn layout() -> impl Strategy<Value = FirmwareLayout> {
    prop_oneof![Just(FirmwareLayout::Compact), Just(FirmwareLayout::Ith11B)]
}

fn compact_payload(temperature: i16, humidity: u16, battery: u8) -> Vec<u8> {
    let mut payload = Vec::with_capacity(6);
    payload.extend_from_slice(&temperature.to_le_bytes());
    payload.extend_from_slice(&humidity.to_le_bytes());
    payload.push(battery);
    payload.push(0x00);
    payload
}

proptest! {
    #[test]
    fn short_payloads_are_rejected(layout in layout(), payload in prop::collection::vec(any::<u8>(), 0..9)) {
        let decoder = PayloadDecoder::new(layout);
        prop_assume!(payload.len() < decoder.min_len());

        prop_assert_eq!(
            decoder.decode(&payload),
            Err(DecodeRejected::PayloadTooShort { len: payload.len(), min: decoder.min_len() })
        );
    }

    #[test]
    fn long_enough_payloads_decode_within_bounds(
        layout in layout(),
        payload in prop::collection::vec(any::<u8>(), 9..64),
    ) {
        let fields = PayloadDecoder::new(layout).decode(&payload).unwrap();

        if let Some(t) = fields.temperature {
            prop_assert!(TEMPERATURE_RANGE.contains(&t));
        }
        if let Some(h) = fields.humidity {
            prop_assert!(HUMIDITY_RANGE.contains(&h));
        }
        if let Some(b) = fields.battery {
            prop_assert!(BATTERY_RANGE.contains(&b));
        }
    }

    #[test]
    fn decode_is_idempotent(layout in layout(), payload in prop::collection::vec(any::<u8>(), 0..32)) {
        let decoder = PayloadDecoder::new(layout);
        prop_assert_eq!(decoder.decode(&payload), decoder.decode(&payload));
    }

    #[test]
    fn temperature_is_scaled_or_absent(raw in any::<i16>()) {
        let fields = PayloadDecoder::default()
            .decode(&compact_payload(raw, 450, 50))
            .unwrap();

        // Range is checked on the encoded hundredths, rounding only happens inside it
        let expected = (-4000..=12500)
            .contains(&raw)
            .then(|| (f64::from(raw) / 10.0).round() as i16);
        prop_assert_eq!(fields.temperature, expected);
        // Other fields are unaffected
        prop_assert_eq!(fields.humidity, Some(450));
        prop_assert_eq!(fields.battery, Some(50));
    }

    #[test]
    fn humidity_and_battery_are_absent_out_of_range(humidity in any::<u16>(), battery in any::<u8>()) {
        let fields = PayloadDecoder::default()
            .decode(&compact_payload(2000, humidity, battery))
            .unwrap();

        prop_assert_eq!(fields.temperature, Some(200));
        prop_assert_eq!(fields.humidity, (humidity <= 1000).then_some(humidity));
        prop_assert_eq!(fields.battery, (battery <= 100).then_some(battery));
    }

    #[test]
    fn address_formats_match(octets in any::<[u8; 6]>()) {
        let addr = DeviceAddress::new(octets);
        let upper: DeviceAddress = addr.to_string().parse().unwrap();
        let bare: DeviceAddress = addr.to_string().replace(':', "").to_lowercase().parse().unwrap();
        let dashed: DeviceAddress = addr.to_string().replace(':', "-").parse().unwrap();

        prop_assert!(inkbird_rust_ble::matches(&upper, &bare));
        prop_assert!(inkbird_rust_ble::matches(&upper, &dashed));
        prop_assert_eq!(upper.octets(), octets);
    }

    #[test]
    fn other_devices_are_always_rejected(
        configured in any::<[u8; 6]>(),
        observed in any::<[u8; 6]>(),
        payload in prop::collection::vec(any::<u8>(), 0..16),
    ) {
        prop_assume!(configured != observed);
        let pipeline = DecodePipeline::new(DeviceAddress::new(configured), PayloadDecoder::default());
        let event = AdvertisementEvent::new(DeviceAddress::new(observed), payload, Utc::now());

        let is_mismatch = matches!(
            pipeline.process(&event),
            Err(DecodeRejected::AddressMismatch { .. })
        );
        prop_assert!(is_mismatch);
    }
}

#[test]
fn scenario_too_short() {
    let result = PayloadDecoder::default().decode(&[0x64, 0x00, 0x90, 0x01, 0x3C]);
    assert_eq!(result, Err(DecodeRejected::PayloadTooShort { len: 5, min: 6 }));
}

#[test]
fn scenario_full_reading() {
    let configured: DeviceAddress = "AA:BB:CC:DD:EE:FF".parse().unwrap();
    let pipeline = DecodePipeline::new(configured, PayloadDecoder::default());
    let at = Utc.with_ymd_and_hms(2024, 12, 24, 18, 0, 0).unwrap();
    let event = AdvertisementEvent::new(configured, compact_payload(2500, 450, 78), at);

    let reading = pipeline.process(&event).unwrap();

    assert_eq!(reading.temperature, Some(250));
    assert_eq!(reading.humidity, Some(450));
    assert_eq!(reading.battery, Some(78));
    assert_eq!(reading.source, configured);
    assert_eq!(reading.observed_at, at);
}

#[test]
fn scenario_temperature_one_unit_past_bounds() {
    let decoder = PayloadDecoder::default();

    for (hundredths, expected) in [(12500, Some(1250)), (12501, None), (-4000, Some(-400)), (-4001, None)] {
        let fields = decoder.decode(&compact_payload(hundredths, 450, 78)).unwrap();
        assert_eq!(fields.temperature, expected, "raw {}", hundredths);
        assert_eq!(fields.humidity, Some(450));
    }
}

#[test]
fn scenario_battery_out_of_range() {
    let fields = PayloadDecoder::default()
        .decode(&compact_payload(2500, 450, 255))
        .unwrap();

    assert_eq!(fields.temperature, Some(250));
    assert_eq!(fields.humidity, Some(450));
    assert_eq!(fields.battery, None);
}

#[test]
fn scenario_address_mismatch() {
    let configured: DeviceAddress = "AA:BB:CC:DD:EE:FF".parse().unwrap();
    let observed: DeviceAddress = "11:22:33:44:55:66".parse().unwrap();
    let pipeline = DecodePipeline::new(configured, PayloadDecoder::default());
    let event = AdvertisementEvent::new(observed, compact_payload(2500, 450, 78), Utc::now());

    assert_eq!(
        pipeline.process(&event),
        Err(DecodeRejected::AddressMismatch { expected: configured, observed })
    );
}

#[test]
fn ith11b_capture() {
    let configured: DeviceAddress = "49:22:05:17:2c:01".parse().unwrap();
    let pipeline = DecodePipeline::new(configured, PayloadDecoder::new(FirmwareLayout::Ith11B));
    // 16.1 °C, 99.9 %, battery 87
    let payload = vec![0x00, 0x00, 0x00, 0x00, 0xA1, 0x00, 0xE7, 0x03, 0x57];
    let event = AdvertisementEvent::new(configured, payload, Utc::now());

    let reading = pipeline.process(&event).unwrap();

    assert_eq!(reading.temperature_celsius(), Some(16.1));
    assert_eq!(reading.humidity_percent(), Some(99.9));
    assert_eq!(reading.battery, Some(87));
}
