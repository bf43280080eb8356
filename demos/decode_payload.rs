//! Decode a captured payload from the command line
//!
//! Useful when reverse-engineering a new firmware: paste the manufacturer
//! data bytes (company id stripped) as hex and see what each layout makes
//! of them.
//!
//! Run with: cargo run --example decode_payload -- 00000000a100e70357

use inkbird_rust_ble::{Error, FirmwareLayout, PayloadDecoder, Result};

fn parse_hex(text: &str) -> Result<Vec<u8>> {
    let text: String = text.chars().filter(|c| c.is_ascii_hexdigit()).collect();
    if text.len() % 2 != 0 {
        return Err(Error::InvalidParameter {
            name: "payload".to_string(),
            value: text,
        });
    }

    (0..text.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&text[i..i + 2], 16).map_err(|_| Error::InvalidParameter {
                name: "payload".to_string(),
                value: text.clone(),
            })
        })
        .collect()
}

fn main() -> Result<()> {
    let arg = std::env::args().nth(1).ok_or_else(|| Error::MissingConfig {
        name: "payload hex".to_string(),
    })?;
    let payload = parse_hex(&arg)?;

    println!("Payload: {} bytes", payload.len());

    for layout in FirmwareLayout::ALL {
        let decoder = PayloadDecoder::new(layout);
        match decoder.decode(&payload) {
            Ok(fields) => println!(
                "  {:<8} temperature={:?} humidity={:?} battery={:?}",
                layout.name(),
                fields.temperature.map(|t| f64::from(t) / 10.0),
                fields.humidity.map(|h| f64::from(h) / 10.0),
                fields.battery
            ),
            Err(e) => println!("  {:<8} rejected: {}", layout.name(), e),
        }
    }

    Ok(())
}
