//! Value types shared across the storefront features.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier of a catalog product
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(u32);

impl ProductId {
    /// Creates a product id
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw id
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Order number shown in the admin panel (`ORD-001`, `ORD-002`, ...)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Creates an order id from its sequence number
    #[must_use]
    pub fn from_sequence(sequence: u32) -> Self {
        Self(format!("ORD-{sequence:03}"))
    }

    /// Wraps an existing order number
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the order number
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a license key in the admin inventory
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyId(u64);

impl KeyId {
    /// Creates a key id
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a customer review
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewId(u64);

impl ReviewId {
    /// Creates a review id
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ReviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Money Value Object (minor units to avoid floating point errors)
// ============================================================================

/// An amount of money in the smallest currency unit
///
/// Arithmetic saturates instead of overflowing: cart totals are display
/// values and must never panic.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    /// Zero
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from minor units
    #[must_use]
    pub const fn from_minor(amount: u64) -> Self {
        Self(amount)
    }

    /// Returns the amount in minor units
    #[must_use]
    pub const fn minor(self) -> u64 {
        self.0
    }

    /// Checks if the amount is zero
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Adds two amounts, saturating at `u64::MAX`
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Subtracts, saturating at zero
    #[must_use]
    pub const fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Multiplies a unit price by a quantity, saturating at `u64::MAX`
    #[must_use]
    pub const fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(quantity as u64))
    }

    /// A fraction of this amount given in basis points (1/100 of a percent),
    /// rounded half-up to a whole minor unit
    #[must_use]
    pub fn basis_points(self, bps: u32) -> Self {
        let scaled = u128::from(self.0) * u128::from(bps) + 5_000;
        Self(u64::try_from(scaled / 10_000).unwrap_or(u64::MAX))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Self::saturating_add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ₽", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_id_is_zero_padded() {
        assert_eq!(OrderId::from_sequence(4).as_str(), "ORD-004");
        assert_eq!(OrderId::from_sequence(1234).as_str(), "ORD-1234");
    }

    #[test]
    fn test_money_times_saturates() {
        assert_eq!(Money::from_minor(4990).times(2), Money::from_minor(9980));
        assert_eq!(Money::from_minor(u64::MAX).times(2), Money::from_minor(u64::MAX));
    }

    #[test]
    fn test_basis_points_round_half_up() {
        // 2.5% of 4990 = 124.75
        assert_eq!(Money::from_minor(4990).basis_points(250), Money::from_minor(125));
        // 0.8% of 6250 = 50.0
        assert_eq!(Money::from_minor(6250).basis_points(80), Money::from_minor(50));
        // 1.5% of 100 = 1.5
        assert_eq!(Money::from_minor(100).basis_points(150), Money::from_minor(2));
        assert_eq!(Money::from_minor(4990).basis_points(0), Money::ZERO);
    }

    #[test]
    fn test_money_sum() {
        let total: Money = [Money::from_minor(7990), Money::from_minor(12990)]
            .into_iter()
            .sum();
        assert_eq!(total, Money::from_minor(20980));
        assert_eq!(total.to_string(), "20980 ₽");
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let json = serde_json::to_string(&ProductId::new(2)).unwrap_or_default();
        assert_eq!(json, "2");
        let json = serde_json::to_string(&OrderId::from_sequence(1)).unwrap_or_default();
        assert_eq!(json, "\"ORD-001\"");
    }
}
