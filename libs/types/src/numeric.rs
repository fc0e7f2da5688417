//! Fixed-point decimal types for prices and quantities
//!
//! Uses rust_decimal for deterministic arithmetic; no floating point is
//! allowed anywhere in the engine. Both types serialize as canonical decimal
//! strings (normalized, no trailing zeros) to avoid JSON number precision
//! loss and to keep snapshots byte-stable across round trips.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

/// Price with fixed-point decimal representation.
///
/// Must always be strictly positive. Orders over the total order of `Price`
/// keys back the book's sorted ladders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(Decimal);

impl Price {
    /// Create a new Price from a Decimal.
    ///
    /// # Panics
    /// Panics if the price is negative or zero.
    pub fn new(value: Decimal) -> Self {
        assert!(value > Decimal::ZERO, "Price must be positive");
        Self(value.normalize())
    }

    /// Try to create a Price, returning None if invalid.
    pub fn try_new(value: Decimal) -> Option<Self> {
        if value > Decimal::ZERO {
            Some(Self(value.normalize()))
        } else {
            None
        }
    }

    /// Create from integer (for testing/convenience).
    pub fn from_u64(value: u64) -> Self {
        Self::new(Decimal::from(value))
    }

    /// Get the inner decimal value.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl FromStr for Price {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decimal = Decimal::from_str(s)?;
        Ok(Self::new(decimal))
    }
}

// Custom serialization to preserve precision
impl Serialize for Price {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0.normalize().to_string())
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let decimal = Decimal::from_str(&s).map_err(serde::de::Error::custom)?;
        Self::try_new(decimal).ok_or_else(|| serde::de::Error::custom("Price must be positive"))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Quantity with fixed-point decimal representation.
///
/// Zero is representable (fully filled orders); negative quantities are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quantity(Decimal);

impl Quantity {
    /// Create a new Quantity from a Decimal.
    ///
    /// # Panics
    /// Panics if the quantity is negative or zero.
    pub fn new(value: Decimal) -> Self {
        assert!(value > Decimal::ZERO, "Quantity must be positive");
        Self(value.normalize())
    }

    /// Try to create a Quantity, returning None unless strictly positive.
    pub fn try_new(value: Decimal) -> Option<Self> {
        if value > Decimal::ZERO {
            Some(Self(value.normalize()))
        } else {
            None
        }
    }

    /// Zero quantity (filled-out remainders, empty totals).
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Create from integer (for testing/convenience).
    pub fn from_u64(value: u64) -> Self {
        Self::new(Decimal::from(value))
    }

    /// Get the inner decimal value.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == Decimal::ZERO
    }

    /// The smaller of two quantities.
    pub fn min(self, other: Self) -> Self {
        if self.0 <= other.0 {
            self
        } else {
            other
        }
    }
}

impl FromStr for Quantity {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decimal = Decimal::from_str(s)?;
        Ok(Self::new(decimal))
    }
}

impl Add for Quantity {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self((self.0 + rhs.0).normalize())
    }
}

impl Sub for Quantity {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        assert!(
            self.0 >= rhs.0,
            "Quantity subtraction would result in negative"
        );
        Self((self.0 - rhs.0).normalize())
    }
}

// Custom serialization to preserve precision
impl Serialize for Quantity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0.normalize().to_string())
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let decimal = Decimal::from_str(&s).map_err(serde::de::Error::custom)?;
        // Allow zero (fully filled remainders round-trip through snapshots)
        if decimal >= Decimal::ZERO {
            Ok(Self(decimal.normalize()))
        } else {
            Err(serde::de::Error::custom("Quantity cannot be negative"))
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Number of significant digits of a decimal value.
pub fn significant_digits(value: Decimal) -> u32 {
    let mantissa = value.normalize().mantissa().unsigned_abs();
    if mantissa == 0 {
        return 1;
    }
    let mut digits = 0;
    let mut m = mantissa;
    while m > 0 {
        digits += 1;
        m /= 10;
    }
    digits
}

/// Number of fractional digits of a decimal value, trailing zeros excluded.
pub fn fractional_digits(value: Decimal) -> u32 {
    value.normalize().scale()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_creation() {
        let price = Price::from_u64(50000);
        assert_eq!(price.as_decimal(), Decimal::from(50000));
    }

    #[test]
    #[should_panic(expected = "Price must be positive")]
    fn test_price_negative_panics() {
        Price::new(Decimal::from(-100));
    }

    #[test]
    fn test_price_ordering() {
        let lo: Price = "29999.5".parse().unwrap();
        let hi = Price::from_u64(30000);
        assert!(lo < hi);
    }

    #[test]
    fn test_price_serialization_is_canonical() {
        let price: Price = "30000.500".parse().unwrap();
        let json = serde_json::to_string(&price).unwrap();
        assert_eq!(json, "\"30000.5\"");

        let back: Price = serde_json::from_str(&json).unwrap();
        assert_eq!(price, back);
    }

    #[test]
    fn test_quantity_zero() {
        let qty = Quantity::zero();
        assert!(qty.is_zero());
        assert_eq!(serde_json::to_string(&qty).unwrap(), "\"0\"");
    }

    #[test]
    fn test_quantity_arithmetic() {
        let q1: Quantity = "2.5".parse().unwrap();
        let q2: Quantity = "1.5".parse().unwrap();

        assert_eq!((q1 + q2).as_decimal(), Decimal::from(4));
        assert_eq!((q1 - q2).as_decimal(), Decimal::from(1));
    }

    #[test]
    #[should_panic(expected = "negative")]
    fn test_quantity_underflow_panics() {
        let q1: Quantity = "1".parse().unwrap();
        let q2: Quantity = "2".parse().unwrap();
        let _ = q1 - q2;
    }

    #[test]
    fn test_quantity_min() {
        let q1: Quantity = "1.5".parse().unwrap();
        let q2: Quantity = "0.7".parse().unwrap();
        assert_eq!(q1.min(q2), q2);
    }

    #[test]
    fn test_deserialize_zero_quantity() {
        let qty: Quantity = serde_json::from_str("\"0\"").unwrap();
        assert!(qty.is_zero());
        assert!(serde_json::from_str::<Quantity>("\"-1\"").is_err());
    }

    #[test]
    fn test_significant_digits() {
        assert_eq!(significant_digits("30000".parse().unwrap()), 5);
        assert_eq!(significant_digits("0.00012345".parse().unwrap()), 5);
        assert_eq!(significant_digits("12000.000".parse().unwrap()), 5);
        assert_eq!(significant_digits(Decimal::ZERO), 1);
    }

    #[test]
    fn test_fractional_digits() {
        assert_eq!(fractional_digits("0.12345678".parse().unwrap()), 8);
        assert_eq!(fractional_digits("5.000".parse().unwrap()), 0);
        assert_eq!(fractional_digits("30000".parse().unwrap()), 0);
    }
}
