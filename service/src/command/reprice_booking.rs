//! [`Command`] for repricing a [`Booking`].

use common::{money::Currency, operations::{By, Select, Update}, Money};
use derive_more::{Display, Error, From};
use rust_decimal::Decimal;
use tracerr::Traced;

use crate::{
    domain::{booking, Booking},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for repricing a [`Booking`].
///
/// A back-office correction of the money snapshot. Both currency totals and
/// the deposit are always replaced together, so the snapshot never ends up
/// with one currency adjusted and the other stale.
#[derive(Clone, Copy, Debug)]
pub struct RepriceBooking {
    /// ID of the [`Booking`] to reprice.
    pub booking_id: booking::Id,

    /// New total price in [`Currency::Usd`].
    pub total_usd: Money,

    /// New total price in [`Currency::Kes`].
    pub total_kes: Money,

    /// New deposit in [`Currency::Usd`].
    pub deposit: Money,
}

impl<Db> Command<RepriceBooking> for Service<Db>
where
    Db: Database<
            Select<By<Option<Booking>, booking::Id>>,
            Ok = Option<Booking>,
            Err = Traced<database::Error>,
        > + Database<Update<Booking>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Booking;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: RepriceBooking,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RepriceBooking {
            booking_id,
            total_usd,
            total_kes,
            deposit,
        } = cmd;

        for (money, currency) in [
            (total_usd, Currency::Usd),
            (total_kes, Currency::Kes),
            (deposit, Currency::Usd),
        ] {
            if money.currency != currency {
                return Err(tracerr::new!(E::WrongCurrency {
                    expected: currency,
                    actual: money.currency,
                }));
            }
            if money.amount < Decimal::ZERO {
                return Err(tracerr::new!(E::NegativeAmount(currency)));
            }
        }
        if deposit.amount > total_usd.amount {
            return Err(tracerr::new!(E::DepositExceedsTotal {
                deposit,
                total: total_usd,
            }));
        }

        let mut booking = self
            .database()
            .execute(Select(By::<Option<Booking>, _>::new(booking_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::BookingNotExists(booking_id))
            .map_err(tracerr::wrap!())?;

        booking.total_usd = total_usd;
        booking.total_kes = total_kes;
        booking.deposit = deposit;

        self.database()
            .execute(Update(booking.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tracing::info!(
            booking_id = %booking_id,
            total_usd = %total_usd,
            total_kes = %total_kes,
            "booking repriced",
        );

        Ok(booking)
    }
}

/// Error of [`RepriceBooking`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Booking`] with the provided ID does not exist.
    #[display("`Booking(id: {_0})` does not exist")]
    BookingNotExists(#[error(not(source))] booking::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Deposit exceeding the total is not representable.
    #[display("deposit {deposit} exceeds total {total}")]
    DepositExceedsTotal {
        /// Rejected deposit.
        deposit: Money,

        /// Total the deposit was checked against.
        total: Money,
    },

    /// Negative money amount provided.
    #[display("negative `{_0}` amount")]
    #[from(ignore)]
    NegativeAmount(#[error(not(source))] Currency),

    /// Money nominated in an unexpected [`Currency`] provided.
    #[display("expected a `{expected}` amount, got `{actual}`")]
    WrongCurrency {
        /// Expected [`Currency`].
        expected: Currency,

        /// Actually provided [`Currency`].
        actual: Currency,
    },
}

#[cfg(test)]
mod spec {
    use common::{money::Currency, Handler as _, Money};

    use crate::{testing, Service};

    use super::{ExecutionError, RepriceBooking};

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

    #[tokio::test]
    async fn replaces_both_currencies_together() {
        let booking = testing::pending_booking();
        let id = booking.id;
        let db = testing::StubDb::default().with_booking(booking);
        let service = Service::new(testing::config(), db.clone());

        let updated = service
            .execute(RepriceBooking {
                booking_id: id,
                total_usd: usd("500"),
                total_kes: kes("65000"),
                deposit: usd("150"),
            })
            .await
            .unwrap();

        assert_eq!(updated.total_usd, usd("500"));
        assert_eq!(updated.total_kes, kes("65000"));
        assert_eq!(updated.deposit, usd("150"));
        assert_eq!(db.booking(id).unwrap().total_kes, kes("65000"));
    }

    #[tokio::test]
    async fn rejects_deposit_above_total() {
        let booking = testing::pending_booking();
        let id = booking.id;
        let db = testing::StubDb::default().with_booking(booking);
        let service = Service::new(testing::config(), db);

        let err = service
            .execute(RepriceBooking {
                booking_id: id,
                total_usd: usd("100"),
                total_kes: kes("13000"),
                deposit: usd("101"),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::DepositExceedsTotal { .. },
        ));
    }
}
