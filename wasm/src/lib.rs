//! WebAssembly module for the Abpack platform
//!
//! Provides client-side computation for:
//! - Needed-amount calculation (tolerance formula)
//! - Package validation before an order is submitted
//! - Depletion projection for dashboard previews
//!
//! The browser client calls these so that what it displays while a form
//! is being filled in matches exactly what the backend will compute.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::packaging::*;
pub use shared::validation::*;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    // Set up panic hook for better error messages in browser console
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn decimal_from_f64(value: f64, what: &str) -> Result<Decimal, JsValue> {
    Decimal::try_from(value).map_err(|e| JsValue::from_str(&format!("Invalid {}: {}", what, e)))
}

/// Grams needed for `quantity` units of `size_g` grams each, including
/// the 0.3 g per-unit tolerance.
#[wasm_bindgen]
pub fn calculate_needed_amount(size_g: f64, quantity: u32) -> Result<f64, JsValue> {
    let size = decimal_from_f64(size_g, "package size")?;
    let needed = shared::packaging::needed_amount(size, quantity);
    Ok(needed.to_f64().unwrap_or(0.0))
}

/// Total grams needed for an order, from a JSON array of packages.
#[wasm_bindgen]
pub fn calculate_order_needed_amount(packages_json: &str) -> Result<f64, JsValue> {
    let packages: Vec<Package> = serde_json::from_str(packages_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid packages JSON: {}", e)))?;
    let needed = shared::packaging::order_needed_amount(&packages);
    Ok(needed.to_f64().unwrap_or(0.0))
}

/// Validate a single package line; returns an error message or null.
#[wasm_bindgen]
pub fn validate_package_line(size_g: f64, quantity: u32) -> Option<String> {
    let size = match Decimal::try_from(size_g) {
        Ok(s) => s,
        Err(_) => return Some("Invalid package size".to_string()),
    };
    let package = Package {
        size_g: size,
        quantity,
        is_custom: false,
        packaging_type: None,
    };
    shared::validation::validate_package(&package)
        .err()
        .map(|e| e.to_string())
}

/// Whole days until a product runs empty at the observed consumption,
/// or -1 when there is no consumption in the window.
#[wasm_bindgen]
pub fn project_days_remaining(
    on_hand_g: f64,
    consumed_g: f64,
    window_days: u32,
) -> Result<i64, JsValue> {
    let on_hand = decimal_from_f64(on_hand_g, "quantity on hand")?;
    let consumed = decimal_from_f64(consumed_g, "consumed quantity")?;
    let rate = shared::forecast::daily_rate(consumed, window_days);
    Ok(shared::forecast::days_remaining(on_hand, rate).unwrap_or(-1))
}
