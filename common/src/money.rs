//! [`Money`]-related definitions.

use std::{fmt, str::FromStr};

use rust_decimal::{prelude::ToPrimitive as _, Decimal, RoundingStrategy};

/// Amount of money in some [`Currency`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Money {
    /// Amount of this [`Money`].
    pub amount: Decimal,

    /// [`Currency`] of this amount.
    pub currency: Currency,
}

impl Money {
    /// Rounds this [`Money`] to the nearest whole unit of its [`Currency`].
    ///
    /// Midpoint values round away from zero, so `121.5` becomes `122`.
    #[must_use]
    pub fn round_whole(self) -> Self {
        Self {
            amount: self
                .amount
                .round_dp_with_strategy(
                    0,
                    RoundingStrategy::MidpointAwayFromZero,
                )
                .normalize(),
            currency: self.currency,
        }
    }

    /// Indicates whether the amount of this [`Money`] is greater than zero.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { amount, currency } = self;
        if amount.is_integer() {
            write!(f, "{}{currency}", amount.to_i128().expect("integer"))
        } else {
            write!(f, "{amount}{currency}")
        }
    }
}

impl FromStr for Money {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() < 4 {
            return Err("too short");
        }

        let (amount, currency) = s.split_at(s.len() - 3);
        let amount = Decimal::from_str(amount).map_err(|_| "invalid amount")?;
        let currency =
            Currency::from_str(currency).map_err(|_| "invalid currency")?;

        Ok(Self { amount, currency })
    }
}

/// Currency of a [`Money`] amount.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(u8)]
pub enum Currency {
    /// US Dollar.
    Usd = 1,

    /// Kenyan Shilling.
    Kes = 2,
}

impl Currency {
    /// Returns the three-letter code of this [`Currency`].
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Kes => "KES",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USD" => Ok(Self::Usd),
            "KES" => Ok(Self::Kes),
            _ => Err("unknown currency code"),
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use rust_decimal::Decimal;

    use super::{Currency, Money};

    fn decimal(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn from_str() {
        assert_eq!(
            Money::from_str("123.45USD").unwrap(),
            Money {
                amount: decimal("123.45"),
                currency: Currency::Usd,
            },
        );

        assert_eq!(
            Money::from_str("19500KES").unwrap(),
            Money {
                amount: decimal("19500"),
                currency: Currency::Kes,
            },
        );

        assert!(Money::from_str("123.45").is_err());
        assert!(Money::from_str("123.45Us").is_err());
        assert!(Money::from_str("123.45Shillings").is_err());

        assert!(Money::from_str("123.00USD").is_ok());
        assert!(Money::from_str("123.0KES").is_ok());
        assert!(Money::from_str("123USD").is_ok());
    }

    #[test]
    fn to_string() {
        assert_eq!(
            Money {
                amount: decimal("123.45"),
                currency: Currency::Usd,
            }
            .to_string(),
            "123.45USD",
        );

        assert_eq!(
            Money {
                amount: decimal("19500"),
                currency: Currency::Kes,
            }
            .to_string(),
            "19500KES",
        );

        assert_eq!(
            Money {
                amount: decimal("123.00"),
                currency: Currency::Usd,
            }
            .to_string(),
            "123USD",
        );
    }

    #[test]
    fn rounds_midpoint_away_from_zero() {
        for (given, expected) in [
            ("121.5", "122"),
            ("121.49", "121"),
            ("105", "105"),
            ("0.5", "1"),
            ("13650.0", "13650"),
        ] {
            assert_eq!(
                Money {
                    amount: decimal(given),
                    currency: Currency::Usd,
                }
                .round_whole()
                .amount,
                decimal(expected),
                "rounding {given}",
            );
        }
    }
}
