//! Resource quantity parsing and representation.
//!
//! Supports Kubernetes-style resource quantities:
//! - CPU: "500m" (millicores), "2" (cores), "0.5" (half core)
//! - Memory: "128Mi", "1Gi", "512M", "1G", "1024" (bytes)
//!
//! Every quantity is held in milli-units so CPU and memory share one
//! representation; callers pick [`Quantity::milli_value`] for CPU and
//! [`Quantity::value`] for byte counts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PodletError, PodletResult};

/// Binary suffixes (powers of 1024).
const BINARY_SUFFIXES: [(&str, i64); 4] = [
    ("Ki", 1 << 10),
    ("Mi", 1 << 20),
    ("Gi", 1 << 30),
    ("Ti", 1 << 40),
];

/// Decimal suffixes (powers of 1000).
const DECIMAL_SUFFIXES: [(&str, i64); 4] = [
    ("k", 1_000),
    ("M", 1_000_000),
    ("G", 1_000_000_000),
    ("T", 1_000_000_000_000),
];

/// A resource amount stored in milli-units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Quantity {
    milli: i64,
}

impl Quantity {
    /// The zero quantity.
    pub const ZERO: Self = Self { milli: 0 };

    /// Create a quantity from milli-units (millicores for CPU).
    #[must_use]
    pub const fn from_milli(milli: i64) -> Self {
        Self { milli }
    }

    /// Create a quantity from whole units (cores, bytes).
    #[must_use]
    pub const fn from_value(value: i64) -> Self {
        Self {
            milli: value.saturating_mul(1000),
        }
    }

    /// The amount in milli-units.
    #[must_use]
    pub const fn milli_value(&self) -> i64 {
        self.milli
    }

    /// The amount in whole units, rounded up.
    #[must_use]
    pub const fn value(&self) -> i64 {
        if self.milli % 1000 == 0 {
            self.milli / 1000
        } else {
            self.milli / 1000 + 1
        }
    }

    /// Returns true if the quantity is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.milli == 0
    }

    /// Parse a quantity string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a non-negative quantity.
    pub fn parse(s: &str) -> PodletResult<Self> {
        let s = s.trim();
        let invalid = || PodletError::InvalidResourceQuantity {
            value: s.to_string(),
        };

        if let Some(stripped) = s.strip_suffix('m') {
            let milli: i64 = stripped.parse().map_err(|_| invalid())?;
            if milli < 0 {
                return Err(invalid());
            }
            return Ok(Self::from_milli(milli));
        }

        for (suffix, multiplier) in BINARY_SUFFIXES.into_iter().chain(DECIMAL_SUFFIXES) {
            if let Some(stripped) = s.strip_suffix(suffix) {
                let value: i64 = stripped.parse().map_err(|_| invalid())?;
                if value < 0 {
                    return Err(invalid());
                }
                return value
                    .checked_mul(multiplier)
                    .map(Self::from_value)
                    .ok_or_else(invalid);
            }
        }

        // Plain number, possibly fractional (e.g. "0.5" cores)
        let units: f64 = s.parse().map_err(|_| invalid())?;
        if !units.is_finite() || units < 0.0 {
            return Err(invalid());
        }
        #[allow(clippy::cast_possible_truncation)]
        let milli = (units * 1000.0).round() as i64;
        Ok(Self::from_milli(milli))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.milli % 1000 != 0 {
            return write!(f, "{}m", self.milli);
        }
        let value = self.milli / 1000;
        for (suffix, multiplier) in BINARY_SUFFIXES.iter().rev() {
            if value >= *multiplier && value % multiplier == 0 {
                return write!(f, "{}{suffix}", value / multiplier);
            }
        }
        write!(f, "{value}")
    }
}

impl FromStr for Quantity {
    type Err = PodletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Quantity {
    type Error = PodletError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Quantity> for String {
    fn from(quantity: Quantity) -> Self {
        quantity.to_string()
    }
}
