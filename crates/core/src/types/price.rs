//! Type-safe price representation using decimal arithmetic.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative")]
    Negative,
    /// The amount has more than [`Price::SCALE`] significant decimal places.
    #[error("price must have at most {max} decimal places")]
    TooPrecise {
        /// Maximum allowed decimal places.
        max: u32,
    },
    /// The amount does not fit the stored `NUMERIC(12, 2)` column.
    #[error("price must be less than {max}")]
    TooLarge {
        /// Exclusive upper bound.
        max: Decimal,
    },
}

/// A non-negative unit price for an inventory item.
///
/// Stored as `NUMERIC(12, 2)`, so the amount is held at exactly two decimal
/// places and must stay below 10^10. Currency is a shop-level display concern
/// and is not tracked per item.
///
/// ```
/// use rust_decimal::Decimal;
/// use stockmate_core::Price;
///
/// assert!(Price::new(Decimal::new(1999, 2)).is_ok());
/// assert!(Price::new(Decimal::new(-1, 0)).is_err());
/// assert!(Price::new(Decimal::new(19_999, 3)).is_err());
/// assert_eq!(Price::new(Decimal::new(45, 1)).unwrap().amount().to_string(), "4.50");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Decimal places kept.
    pub const SCALE: u32 = 2;

    /// Integer digits allowed by the column (`NUMERIC(12, 2)` leaves ten).
    const INTEGER_DIGITS: u32 = 10;

    /// Create a new price, rescaled to [`Self::SCALE`] places.
    ///
    /// Trailing zeros beyond two places are accepted (`4.500` is `4.50`);
    /// any other extra precision is rejected rather than rounded.
    ///
    /// # Errors
    ///
    /// - `PriceError::Negative` if `amount` is below zero
    /// - `PriceError::TooPrecise` if it has more than two significant places
    /// - `PriceError::TooLarge` if it is 10^10 or more
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        if amount.normalize().scale() > Self::SCALE {
            return Err(PriceError::TooPrecise { max: Self::SCALE });
        }
        let max = Decimal::from(10_i64.pow(Self::INTEGER_DIGITS));
        if amount >= max {
            return Err(PriceError::TooLarge { max });
        }

        let mut amount = amount;
        amount.rescale(Self::SCALE);
        Ok(Self(amount))
    }

    /// Get the underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(amount)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_valid() {
        assert_eq!(Price::new(Decimal::ZERO).unwrap(), Price::ZERO);
    }

    #[test]
    fn test_negative_rejected() {
        assert_eq!(Price::new(Decimal::new(-5, 1)), Err(PriceError::Negative));
    }

    #[test]
    fn test_extra_precision_rejected() {
        assert_eq!(
            Price::new(Decimal::new(19_999, 3)),
            Err(PriceError::TooPrecise { max: 2 })
        );
    }

    #[test]
    fn test_trailing_zeros_accepted() {
        let price = Price::new(Decimal::new(4_500, 3)).unwrap();
        assert_eq!(price.amount().to_string(), "4.50");
    }

    #[test]
    fn test_column_bound() {
        let largest = Decimal::new(999_999_999_999, 2);
        assert_eq!(Price::new(largest).unwrap().amount(), largest);
        assert!(matches!(
            Price::new(Decimal::new(10_000_000_000, 0)),
            Err(PriceError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_amount_held_at_two_places() {
        let whole: Price = serde_json::from_str("\"7\"").unwrap();
        assert_eq!(serde_json::to_string(&whole).unwrap(), "\"7.00\"");
    }

    #[test]
    fn test_display_two_places() {
        let price = Price::new(Decimal::new(125, 1)).unwrap();
        assert_eq!(price.to_string(), "12.50");
    }

    #[test]
    fn test_deserialize_from_number_and_string() {
        let from_number: Price = serde_json::from_str("19.99").unwrap();
        let from_string: Price = serde_json::from_str("\"19.99\"").unwrap();
        assert_eq!(from_number, from_string);
        assert_eq!(from_number.amount(), Decimal::new(1999, 2));
    }

    #[test]
    fn test_deserialize_negative_fails() {
        assert!(serde_json::from_str::<Price>("-1").is_err());
    }
}
