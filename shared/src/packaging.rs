//! Needed-amount calculation for packaging orders
//!
//! Each packed unit loses a fixed tolerance of material on top of its
//! nominal fill weight. The per-package amount is rounded to one decimal
//! place before package amounts are summed into the order total.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::Package;

/// Packaging loss allowance per packed unit, in grams (0.3 g).
pub const TOLERANCE_PER_UNIT_G: Decimal = Decimal::from_parts(3, 0, 0, false, 1);

/// Round to one decimal place, half away from zero.
pub fn round1(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

/// Grams required for `quantity` units of `size_g` grams each,
/// including the per-unit tolerance:
///
/// `round1(size * quantity + quantity * 0.3)`
pub fn needed_amount(size_g: Decimal, quantity: u32) -> Decimal {
    let qty = Decimal::from(quantity);
    round1(size_g * qty + qty * TOLERANCE_PER_UNIT_G)
}

/// Total grams required for an order: the sum of the per-package amounts,
/// each rounded individually. The sum itself is not rounded again.
pub fn order_needed_amount(packages: &[Package]) -> Decimal {
    packages
        .iter()
        .map(|p| needed_amount(p.size_g, p.quantity))
        .sum()
}
