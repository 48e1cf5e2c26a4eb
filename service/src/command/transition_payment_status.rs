//! [`Command`] for changing the [`PaymentStatus`] of a [`Booking`].

use common::operations::{By, Select, Update};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        booking::{
            self, status::InvalidTransition, PaymentStatus, PaymentTransition,
        },
        Booking,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for changing the [`PaymentStatus`] of a [`Booking`].
///
/// The change is validated against the currently persisted
/// [`PaymentStatus`] and applied as a guarded update, so a concurrent
/// change of the same [`Booking`] makes the loser fail with
/// [`ExecutionError::LostRace`] instead of overwriting the winner's result.
#[derive(Clone, Copy, Debug)]
pub struct TransitionPaymentStatus {
    /// ID of the [`Booking`] to change.
    pub booking_id: booking::Id,

    /// [`PaymentStatus`] to change the [`Booking`] into.
    pub to: PaymentStatus,
}

impl<Db> Command<TransitionPaymentStatus> for Service<Db>
where
    Db: Database<
            Select<By<Option<Booking>, booking::Id>>,
            Ok = Option<Booking>,
            Err = Traced<database::Error>,
        > + Database<
            Update<PaymentTransition>,
            Ok = u64,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Booking;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: TransitionPaymentStatus,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let TransitionPaymentStatus { booking_id, to } = cmd;

        let mut booking = self
            .database()
            .execute(Select(By::<Option<Booking>, _>::new(booking_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::BookingNotExists(booking_id))
            .map_err(tracerr::wrap!())?;

        let from = booking.payment_status;
        booking.payment_status =
            from.transition(to).map_err(tracerr::from_and_wrap!(=> E))?;

        let affected = self
            .database()
            .execute(Update(PaymentTransition {
                booking_id,
                from,
                to,
            }))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if affected == 0 {
            // The precondition held on read but not on write: a concurrent
            // transition got there first.
            return Err(tracerr::new!(E::LostRace(booking_id)));
        }

        tracing::info!(
            booking_id = %booking_id,
            from = %from,
            to = %to,
            "booking payment status changed",
        );

        Ok(booking)
    }
}

/// Error of [`TransitionPaymentStatus`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Booking`] with the provided ID does not exist.
    #[display("`Booking(id: {_0})` does not exist")]
    BookingNotExists(#[error(not(source))] booking::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Requested change is not legal for the current [`PaymentStatus`].
    #[display("{_0}")]
    InvalidTransition(InvalidTransition<PaymentStatus>),

    /// A concurrent change of the same [`Booking`] won the race.
    #[display("`Booking(id: {_0})` was changed concurrently")]
    #[from(ignore)]
    LostRace(#[error(not(source))] booking::Id),
}

#[cfg(test)]
mod spec {
    use common::Handler as _;

    use crate::{
        domain::booking::PaymentStatus,
        testing, Service,
    };

    use super::{ExecutionError, TransitionPaymentStatus};

    #[tokio::test]
    async fn collects_and_refunds() {
        let booking = testing::pending_booking();
        let id = booking.id;
        let db = testing::StubDb::default().with_booking(booking);
        let service = Service::new(testing::config(), db);

        for to in [
            PaymentStatus::PartiallyPaid,
            PaymentStatus::Paid,
            PaymentStatus::Refunded,
        ] {
            let booking = service
                .execute(TransitionPaymentStatus { booking_id: id, to })
                .await
                .unwrap();
            assert_eq!(booking.payment_status, to);
        }
    }

    #[tokio::test]
    async fn loser_of_a_race_observes_the_conflict() {
        let booking = testing::pending_booking();
        let id = booking.id;
        let db = testing::StubDb::default().with_booking(booking);
        let service = Service::new(testing::config(), db.clone());

        // Simulate the race of two concurrent `unpaid -> *` requests: the
        // loser reads `unpaid`, but by the time it writes, the winner has
        // already persisted `paid`.
        drop(
            service
                .execute(TransitionPaymentStatus {
                    booking_id: id,
                    to: PaymentStatus::Paid,
                })
                .await
                .unwrap(),
        );

        db.override_next_payment_read(PaymentStatus::Unpaid);
        let err = service
            .execute(TransitionPaymentStatus {
                booking_id: id,
                to: PaymentStatus::PartiallyPaid,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::LostRace(_)));
        assert_eq!(
            db.booking(id).unwrap().payment_status,
            PaymentStatus::Paid,
        );
    }

    #[tokio::test]
    async fn paid_only_leaves_through_refunded() {
        let booking = testing::pending_booking();
        let id = booking.id;
        let db = testing::StubDb::default().with_booking(booking);
        let service = Service::new(testing::config(), db);

        drop(
            service
                .execute(TransitionPaymentStatus {
                    booking_id: id,
                    to: PaymentStatus::Paid,
                })
                .await
                .unwrap(),
        );

        let err = service
            .execute(TransitionPaymentStatus {
                booking_id: id,
                to: PaymentStatus::Unpaid,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::InvalidTransition(t)
                if t.from == PaymentStatus::Paid
                    && t.to == PaymentStatus::Unpaid,
        ));
    }
}
