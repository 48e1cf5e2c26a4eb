//! Price [`Quote`] computation for a [`Booking`].
//!
//! Pure arithmetic: no I/O and no side effects. The resulting [`Quote`] is
//! snapshotted into the [`Booking`] at creation time and never recomputed.

use std::sync::LazyLock;

use common::{money::Currency, Money, Percent};
use derive_more::{Display, Error as StdError};
use rust_decimal::Decimal;

#[cfg(doc)]
use crate::domain::{Booking, CatalogItem};

use super::{Adults, Children};

/// Share of the adult unit price charged for a child.
static CHILD_RATE: LazyLock<Percent> = LazyLock::new(|| {
    Percent::new(Decimal::from(70_u8)).expect("70 is a valid percent")
});

/// Share of a total required upfront as a deposit.
static DEPOSIT_SHARE: LazyLock<Percent> = LazyLock::new(|| {
    Percent::new(Decimal::from(30_u8)).expect("30 is a valid percent")
});

/// Priced-out trip of a [`Booking`] being created.
#[derive(Clone, Copy, Debug)]
pub struct Quote {
    /// Total price in [`Currency::Usd`].
    pub total_usd: Money,

    /// Total price in [`Currency::Kes`].
    ///
    /// Computed from the item's own KES unit price, not converted from
    /// [`Quote::total_usd`], so the two totals may drift by rounding.
    pub total_kes: Money,

    /// Upfront deposit in [`Currency::Usd`].
    pub deposit: Money,

    /// Remaining balance in [`Currency::Usd`].
    ///
    /// Always equals [`Quote::total_usd`] minus [`Quote::deposit`] exactly.
    pub balance: Money,
}

impl Quote {
    /// Computes a new [`Quote`] out of the [`CatalogItem`]'s unit prices and
    /// the party size.
    ///
    /// # Errors
    ///
    /// Rejects the computation before producing any numbers if a unit price
    /// is not positive or is nominated in an unexpected [`Currency`].
    pub fn compute(
        price_usd: Money,
        price_kes: Money,
        adults: Adults,
        children: Children,
    ) -> Result<Self, Error> {
        use Error as E;

        for (unit, currency) in
            [(price_usd, Currency::Usd), (price_kes, Currency::Kes)]
        {
            if unit.currency != currency {
                return Err(E::WrongCurrency {
                    expected: currency,
                    actual: unit.currency,
                });
            }
            if !unit.is_positive() {
                return Err(E::NonPositiveUnitPrice(currency));
            }
        }

        let total_usd = total(price_usd, adults, children);
        let total_kes = total(price_kes, adults, children);
        let (deposit, balance) = split_deposit(total_usd);

        Ok(Self {
            total_usd,
            total_kes,
            deposit,
            balance,
        })
    }
}

/// Totals the provided per-adult `unit` price for the given party size.
///
/// Each child is charged 70% of the adult unit price, rounded to the
/// nearest whole unit before being multiplied, and the final sum is rounded
/// to the nearest whole unit again.
fn total(unit: Money, adults: Adults, children: Children) -> Money {
    let per_child = Money {
        amount: CHILD_RATE.of(unit.amount),
        currency: unit.currency,
    }
    .round_whole();

    Money {
        amount: Decimal::from(adults.get()) * unit.amount
            + Decimal::from(children.get()) * per_child.amount,
        currency: unit.currency,
    }
    .round_whole()
}

/// Splits the provided `total` into a 30% deposit and the remaining
/// balance.
///
/// Both parts derive from the already rounded `total`, so they always sum
/// back to it exactly.
#[must_use]
pub fn split_deposit(total: Money) -> (Money, Money) {
    let deposit = Money {
        amount: DEPOSIT_SHARE.of(total.amount),
        currency: total.currency,
    }
    .round_whole();
    let balance = Money {
        amount: total.amount - deposit.amount,
        currency: total.currency,
    };

    (deposit, balance)
}

/// Error of computing a [`Quote`].
#[derive(Clone, Copy, Debug, Display, StdError)]
pub enum Error {
    /// Unit price is zero or negative.
    #[display("non-positive `{_0}` unit price")]
    NonPositiveUnitPrice(#[error(not(source))] Currency),

    /// Unit price is nominated in an unexpected [`Currency`].
    #[display("expected a `{expected}` unit price, got `{actual}`")]
    WrongCurrency {
        /// Expected [`Currency`].
        expected: Currency,

        /// Actually provided [`Currency`].
        actual: Currency,
    },
}

#[cfg(test)]
mod spec {
    use common::{money::Currency, Money};
    use rust_decimal::Decimal;

    use crate::domain::booking::{Adults, Children};

    use super::{split_deposit, Quote};

    fn usd(s: &str) -> Money {
        Money {
            amount: s.parse().unwrap(),
            currency: Currency::Usd,
        }
    }

    fn kes(s: &str) -> Money {
        Money {
            amount: s.parse().unwrap(),
            currency: Currency::Kes,
        }
    }

    fn adults(n: u16) -> Adults {
        Adults::new(n).unwrap()
    }

    #[test]
    fn two_adults_one_child_at_150() {
        let quote = Quote::compute(
            usd("150"),
            kes("19500"),
            adults(2),
            Children::from(1),
        )
        .unwrap();

        // 2 * 150 + round(150 * 0.7) = 300 + 105
        assert_eq!(quote.total_usd, usd("405"));
        // 2 * 19500 + round(19500 * 0.7) = 39000 + 13650
        assert_eq!(quote.total_kes, kes("52650"));
        // round(405 * 0.3) = round(121.5), midpoint away from zero
        assert_eq!(quote.deposit, usd("122"));
        assert_eq!(quote.balance, usd("283"));
    }

    #[test]
    fn deposit_and_balance_sum_back_to_any_total() {
        for total in 1_u32..=5_000 {
            let total = usd(&total.to_string());
            let (deposit, balance) = split_deposit(total);

            assert_eq!(
                deposit.amount + balance.amount,
                total.amount,
                "deposit {deposit} + balance {balance} != total {total}",
            );
            assert!(deposit.amount >= Decimal::ZERO);
            assert!(deposit.amount <= total.amount);
        }
    }

    #[test]
    fn child_contribution_is_the_rounded_child_rate() {
        // round(99.99 * 0.7) = round(69.993) = 70 per child.
        let quote = Quote::compute(
            usd("99.99"),
            kes("12000"),
            adults(1),
            Children::from(3),
        )
        .unwrap();

        // round(99.99 + 3 * 70) = round(309.99) = 310.
        assert_eq!(quote.total_usd, usd("310"));
    }

    #[test]
    fn no_children_totals_adults_only() {
        let quote = Quote::compute(
            usd("150"),
            kes("19500"),
            adults(3),
            Children::default(),
        )
        .unwrap();

        assert_eq!(quote.total_usd, usd("450"));
        assert_eq!(quote.total_kes, kes("58500"));
    }

    #[test]
    fn rejects_non_positive_unit_prices() {
        assert!(Quote::compute(
            usd("0"),
            kes("19500"),
            adults(1),
            Children::default(),
        )
        .is_err());

        assert!(Quote::compute(
            usd("150"),
            kes("-19500"),
            adults(1),
            Children::default(),
        )
        .is_err());
    }

    #[test]
    fn rejects_swapped_currencies() {
        assert!(Quote::compute(
            kes("19500"),
            usd("150"),
            adults(1),
            Children::default(),
        )
        .is_err());
    }
}
