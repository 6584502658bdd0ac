// crates/data-console-tools/src/weather.rs
// ============================================================================
// Module: Weather Tool
// Description: Mock weather lookup for a named city.
// Purpose: Serve plausible weather readings without an external service.
// Dependencies: data-console-core, rand, serde_json
// ============================================================================

//! ## Overview
//! Readings are drawn from a seedable RNG: temperature 20-35 C rounded to two
//! decimals, humidity 40-80 %, and one of three conditions. A fixed seed makes
//! the sequence reproducible across runs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Mutex;

use data_console_core::OperationError;
use data_console_core::OperationRequest;
use data_console_core::ToolOperation;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Conditions a reading may report.
const CONDITIONS: [&str; 3] = ["Sunny", "Cloudy", "Rainy"];

// ============================================================================
// SECTION: Operation
// ============================================================================

/// Mock weather lookup.
pub struct WeatherOperation {
    /// Reading generator.
    rng: Mutex<StdRng>,
}

impl WeatherOperation {
    /// Creates the operation; `None` seeds from OS entropy.
    #[must_use]
    pub fn new(seed: Option<u64>) -> Self {
        let rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        Self {
            rng: Mutex::new(rng),
        }
    }
}

impl ToolOperation for WeatherOperation {
    fn execute(&self, request: &OperationRequest) -> Result<Value, OperationError> {
        let city = request.required_str("city")?;
        if city.is_empty() {
            return Err(OperationError::Rejected("Invalid city name".to_string()));
        }
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| OperationError::internal("weather rng mutex poisoned"))?;
        let temperature: f64 = rng.gen_range(20.0 ..= 35.0);
        let humidity: u8 = rng.gen_range(40 ..= 80);
        let condition = CONDITIONS.choose(&mut *rng).copied().unwrap_or(CONDITIONS[0]);
        drop(rng);
        Ok(json!({
            "city": city,
            "temperature_celsius": (temperature * 100.0).round() / 100.0,
            "humidity": humidity,
            "condition": condition,
        }))
    }

    fn render_markdown(&self, output: &Value) -> Option<String> {
        let temperature = output.get("temperature_celsius")?.as_f64()?;
        Some(format!(
            "# Weather for {}\n\n**Temperature:** {temperature:.2}°C\n**Humidity:** {}%\n**Condition:** {}",
            output.get("city")?.as_str()?,
            output.get("humidity")?,
            output.get("condition")?.as_str()?,
        ))
    }
}
