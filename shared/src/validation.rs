//! Validation helpers shared between backend services and the WASM shim

use rust_decimal::Decimal;

use crate::models::Package;

/// Validate a single package line: positive fill size, at least one unit.
pub fn validate_package(package: &Package) -> Result<(), &'static str> {
    if package.size_g <= Decimal::ZERO {
        return Err("Package size must be positive");
    }
    if package.quantity == 0 {
        return Err("Package quantity must be at least 1");
    }
    Ok(())
}

/// Validate an order's package list: non-empty, every line valid.
pub fn validate_packages(packages: &[Package]) -> Result<(), &'static str> {
    if packages.is_empty() {
        return Err("At least one package is required");
    }
    for package in packages {
        validate_package(package)?;
    }
    Ok(())
}

/// Validate a stock item id (1-64 chars, uppercase alphanumeric plus underscore).
pub fn validate_strain_id(id: &str) -> Result<(), &'static str> {
    if id.is_empty() {
        return Err("Strain id cannot be empty");
    }
    if id.len() > 64 {
        return Err("Strain id must be at most 64 characters");
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
    {
        return Err("Strain id must be uppercase alphanumeric or underscore");
    }
    Ok(())
}

/// Validate a received or adjusted quantity: strictly positive.
pub fn validate_positive_quantity(quantity_g: Decimal) -> Result<(), &'static str> {
    if quantity_g <= Decimal::ZERO {
        return Err("Quantity must be positive");
    }
    Ok(())
}

/// Validate a measured remainder: any non-negative absolute value.
pub fn validate_measured_remainder(remainder_g: Decimal) -> Result<(), &'static str> {
    if remainder_g < Decimal::ZERO {
        return Err("Measured remainder cannot be negative");
    }
    Ok(())
}

/// Validate username format (3-64 lowercase alphanumeric, dot, dash, underscore).
pub fn validate_username(username: &str) -> Result<(), &'static str> {
    if username.len() < 3 {
        return Err("Username must be at least 3 characters");
    }
    if username.len() > 64 {
        return Err("Username must be at most 64 characters");
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '-' | '_'))
    {
        return Err("Username must be lowercase alphanumeric, dot, dash or underscore");
    }
    Ok(())
}

/// Validate password strength.
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn package(size: &str, quantity: u32) -> Package {
        Package {
            size_g: dec(size),
            quantity,
            is_custom: false,
            packaging_type: None,
        }
    }

    #[test]
    fn rejects_empty_and_invalid_packages() {
        assert!(validate_packages(&[]).is_err());
        assert!(validate_package(&package("0", 1)).is_err());
        assert!(validate_package(&package("-1", 1)).is_err());
        assert!(validate_package(&package("5", 0)).is_err());
        assert!(validate_package(&package("5", 2)).is_ok());
    }

    #[test]
    fn strain_id_format() {
        assert!(validate_strain_id("MJ1").is_ok());
        assert!(validate_strain_id("SB_POPCORN").is_ok());
        assert!(validate_strain_id("420MIX").is_ok());
        assert!(validate_strain_id("").is_err());
        assert!(validate_strain_id("mj1").is_err());
        assert!(validate_strain_id("MJ 1").is_err());
    }

    #[test]
    fn remainder_allows_zero() {
        assert!(validate_measured_remainder(Decimal::ZERO).is_ok());
        assert!(validate_measured_remainder(dec("-0.1")).is_err());
    }
}
