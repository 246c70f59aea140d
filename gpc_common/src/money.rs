use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const DEFAULT_CURRENCY: &str = "BRL";
pub const DEFAULT_CURRENCY_LOWER: &str = "brl";

//--------------------------------------       Cents        ---------------------------------------------------------
/// A monetary amount in minor currency units.
///
/// All gateway amounts are integers in cents; fractional currency never enters the core. Negative
/// values are representable because refunds and reversals are expressed as signed deltas in a few
/// places, but aggregate invariants keep persisted totals non-negative.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Cents(i64);

op!(binary Cents, Add, add);
op!(binary Cents, Sub, sub);
op!(inplace Cents, AddAssign, add_assign);
op!(inplace Cents, SubAssign, sub_assign);
op!(unary Cents, Neg, neg);

impl Mul<i64> for Cents {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Cents {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in minor currency units: {0}")]
pub struct CentsConversionError(String);

impl From<i64> for Cents {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Cents {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Cents {}

impl TryFrom<u64> for Cents {
    type Error = CentsConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(CentsConversionError(format!("Value {} is too large to convert to Cents", value)))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

/// Renders as major units with two decimals, the format used in platform-facing history comments.
impl Display for Cents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:0.2}", self.to_major())
    }
}

impl Cents {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn from_major(units: i64) -> Self {
        Self(units * 100)
    }

    pub fn to_major(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn displays_in_major_units() {
        assert_eq!(Cents::from(1234).to_string(), "12.34");
        assert_eq!(Cents::from(200).to_string(), "2.00");
        assert_eq!(Cents::from(5).to_string(), "0.05");
    }

    #[test]
    fn arithmetic_delegates_to_inner_value() {
        let a = Cents::from(1000);
        let b = Cents::from(250);
        assert_eq!(a + b, Cents::from(1250));
        assert_eq!(a - b, Cents::from(750));
        assert_eq!(-b, Cents::from(-250));
        assert_eq!(b * 4, Cents::from(1000));
        let mut c = a;
        c += b;
        c -= Cents::from(50);
        assert_eq!(c, Cents::from(1200));
        assert_eq!([a, b].into_iter().sum::<Cents>(), Cents::from(1250));
    }

    #[test]
    fn u64_conversion_guards_overflow() {
        assert!(Cents::try_from(u64::MAX).is_err());
        assert_eq!(Cents::try_from(42u64).unwrap(), Cents::from(42));
    }
}
