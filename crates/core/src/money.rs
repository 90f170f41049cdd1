//! Fixed-point money.
//!
//! All balance storage and arithmetic happens in integer minor units
//! (cents). Floats appear only at the wire boundary: the intent payload
//! carries `amount` as a JSON number of major units, so serde conversions
//! go through checked constructors that reject sub-cent precision instead
//! of silently rounding.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DomainError;

const MINOR_PER_MAJOR: i64 = 100;

/// An amount of money in minor units (cents).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_minor_units(units: i64) -> Self {
        Self(units)
    }

    /// Convert a wire amount (major units, float64) into minor units.
    ///
    /// Rejects non-finite values, values with sub-cent precision, and
    /// values outside the representable range.
    pub fn from_major(value: f64) -> Result<Self, DomainError> {
        if !value.is_finite() {
            return Err(DomainError::validation("amount must be a finite number"));
        }
        let scaled = value * MINOR_PER_MAJOR as f64;
        if scaled.abs() >= i64::MAX as f64 {
            return Err(DomainError::validation("amount out of range"));
        }
        let rounded = scaled.round();
        if (scaled - rounded).abs() > 1e-6 {
            return Err(DomainError::validation(format!(
                "amount {value} has sub-cent precision"
            )));
        }
        Ok(Self(rounded as i64))
    }

    pub const fn minor_units(&self) -> i64 {
        self.0
    }

    /// Major-unit representation for the wire payload.
    pub fn to_major(&self) -> f64 {
        self.0 as f64 / MINOR_PER_MAJOR as f64
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(
            f,
            "{sign}{}.{:02}",
            abs / MINOR_PER_MAJOR as u64,
            abs % MINOR_PER_MAJOR as u64
        )
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_major())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Money::from_major(value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_major_converts_exact_cents() {
        assert_eq!(Money::from_major(100.0).unwrap().minor_units(), 10_000);
        assert_eq!(Money::from_major(0.01).unwrap().minor_units(), 1);
        assert_eq!(Money::from_major(-5.0).unwrap().minor_units(), -500);
    }

    #[test]
    fn from_major_rejects_sub_cent_precision() {
        let err = Money::from_major(1.001).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn from_major_rejects_non_finite() {
        assert!(Money::from_major(f64::NAN).is_err());
        assert!(Money::from_major(f64::INFINITY).is_err());
    }

    #[test]
    fn display_formats_major_units() {
        assert_eq!(Money::from_minor_units(10_050).to_string(), "100.50");
        assert_eq!(Money::from_minor_units(-5).to_string(), "-0.05");
        assert_eq!(Money::ZERO.to_string(), "0.00");
    }

    #[test]
    fn serde_round_trips_as_major_units() {
        let money = Money::from_minor_units(3_000);
        let json = serde_json::to_string(&money).unwrap();
        assert_eq!(json, "30.0");
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(back, money);
    }

    #[test]
    fn checked_arithmetic_catches_overflow() {
        let max = Money::from_minor_units(i64::MAX);
        assert!(max.checked_add(Money::from_minor_units(1)).is_none());
        assert!(
            Money::from_minor_units(i64::MIN)
                .checked_sub(Money::from_minor_units(1))
                .is_none()
        );
    }
}
