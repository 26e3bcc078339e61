//! Fixed-point money values with two decimal places.
//!
//! Money is stored in the database as a whole number of cents so that balance
//! adjustments can be done exactly with integer arithmetic inside SQL
//! statements. [rust_decimal::Decimal] is used at the API boundary.

use std::fmt::Display;

use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Serialize, Serializer};

use crate::Error;

/// The number of decimal places used for all money values.
pub const DECIMAL_PLACES: u32 = 2;

/// An amount of money, positive or negative, in cents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    /// Zero dollars.
    pub const ZERO: Money = Money(0);

    /// Create a money value from a whole number of cents.
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Convert a decimal into money.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidAmount] if `value` has more than two significant
    /// decimal places (e.g. `1.005`) or is too large to store.
    /// Trailing zeros are ignored, so `1.500` is accepted.
    pub fn from_decimal(value: Decimal) -> Result<Self, Error> {
        if value.normalize().scale() > DECIMAL_PLACES {
            return Err(Error::InvalidAmount(value.to_string()));
        }

        value
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|cents| cents.to_i64())
            .map(Self)
            .ok_or_else(|| Error::InvalidAmount(value.to_string()))
    }

    /// The amount as a whole number of cents.
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// The amount as a decimal with exactly two decimal places.
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, DECIMAL_PLACES)
    }

    /// Subtract `other` from this amount, returning `None` on overflow.
    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Self)
    }

    /// Flip the sign of the amount, returning `None` on overflow.
    pub fn checked_neg(self) -> Option<Money> {
        self.0.checked_neg().map(Self)
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

impl Serialize for Money {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        Serialize::serialize(&self.to_decimal(), serializer)
    }
}

impl ToSql for Money {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0))
    }
}

impl FromSql for Money {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        i64::column_result(value).map(Self)
    }
}

/// A strictly positive amount of money, as recorded on an operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(Money);

impl Amount {
    /// Validate a decimal as an operation amount.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidAmount] if `value` is not a valid [Money] value
    /// and [Error::NonPositiveAmount] if it is zero or negative.
    pub fn new(value: Decimal) -> Result<Self, Error> {
        Self::from_money(Money::from_decimal(value)?)
    }

    /// Validate that `money` is greater than zero.
    ///
    /// # Errors
    ///
    /// Returns [Error::NonPositiveAmount] if `money` is zero or negative.
    pub fn from_money(money: Money) -> Result<Self, Error> {
        if money > Money::ZERO {
            Ok(Self(money))
        } else {
            Err(Error::NonPositiveAmount)
        }
    }

    /// Create an amount without validation.
    ///
    /// The caller should ensure that `cents` is greater than zero.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if the positive invariant is violated it will cause incorrect behaviour but not affect memory safety.
    pub const fn new_unchecked(cents: i64) -> Self {
        Self(Money(cents))
    }

    /// The amount as money.
    pub const fn money(&self) -> Money {
        self.0
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl ToSql for Amount {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        self.0.to_sql()
    }
}

impl FromSql for Amount {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Money::column_result(value).map(Self)
    }
}
