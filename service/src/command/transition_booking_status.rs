//! [`Command`] for changing the fulfillment [`Status`] of a [`Booking`].

use common::operations::{By, Select, Update};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        booking::{self, status::InvalidTransition, Status, StatusTransition},
        Booking,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for changing the fulfillment [`Status`] of a [`Booking`].
///
/// The change is validated against the currently persisted [`Status`] and
/// applied as a guarded update, so a concurrent change of the same
/// [`Booking`] makes the loser fail with [`ExecutionError::LostRace`]
/// instead of overwriting the winner's result.
#[derive(Clone, Copy, Debug)]
pub struct TransitionBookingStatus {
    /// ID of the [`Booking`] to change.
    pub booking_id: booking::Id,

    /// [`Status`] to change the [`Booking`] into.
    pub to: Status,
}

impl<Db> Command<TransitionBookingStatus> for Service<Db>
where
    Db: Database<
            Select<By<Option<Booking>, booking::Id>>,
            Ok = Option<Booking>,
            Err = Traced<database::Error>,
        > + Database<
            Update<StatusTransition>,
            Ok = u64,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Booking;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: TransitionBookingStatus,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let TransitionBookingStatus { booking_id, to } = cmd;

        let mut booking = self
            .database()
            .execute(Select(By::<Option<Booking>, _>::new(booking_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::BookingNotExists(booking_id))
            .map_err(tracerr::wrap!())?;

        let from = booking.status;
        booking.status =
            from.transition(to).map_err(tracerr::from_and_wrap!(=> E))?;

        let affected = self
            .database()
            .execute(Update(StatusTransition {
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
            "booking status changed",
        );

        Ok(booking)
    }
}

/// Error of [`TransitionBookingStatus`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Booking`] with the provided ID does not exist.
    #[display("`Booking(id: {_0})` does not exist")]
    BookingNotExists(#[error(not(source))] booking::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Requested change is not legal for the current [`Status`].
    #[display("{_0}")]
    InvalidTransition(InvalidTransition<Status>),

    /// A concurrent change of the same [`Booking`] won the race.
    #[display("`Booking(id: {_0})` was changed concurrently")]
    #[from(ignore)]
    LostRace(#[error(not(source))] booking::Id),
}

#[cfg(test)]
mod spec {
    use common::Handler as _;

    use crate::{
        domain::booking::Status,
        testing, Service,
    };

    use super::{ExecutionError, TransitionBookingStatus};

    #[tokio::test]
    async fn walks_the_legal_chain_and_stops_at_terminal() {
        let booking = testing::pending_booking();
        let id = booking.id;
        let db = testing::StubDb::default().with_booking(booking);
        let service = Service::new(testing::config(), db.clone());

        let confirmed = service
            .execute(TransitionBookingStatus {
                booking_id: id,
                to: Status::Confirmed,
            })
            .await
            .unwrap();
        assert_eq!(confirmed.status, Status::Confirmed);

        let cancelled = service
            .execute(TransitionBookingStatus {
                booking_id: id,
                to: Status::Cancelled,
            })
            .await
            .unwrap();
        assert_eq!(cancelled.status, Status::Cancelled);

        // No way out of `cancelled`.
        let err = service
            .execute(TransitionBookingStatus {
                booking_id: id,
                to: Status::Pending,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::InvalidTransition(t)
                if t.from == Status::Cancelled && t.to == Status::Pending,
        ));

        assert_eq!(db.booking(id).unwrap().status, Status::Cancelled);
    }

    #[tokio::test]
    async fn rejects_unconfirming() {
        let booking = testing::pending_booking();
        let id = booking.id;
        let db = testing::StubDb::default().with_booking(booking);
        let service = Service::new(testing::config(), db);

        drop(
            service
                .execute(TransitionBookingStatus {
                    booking_id: id,
                    to: Status::Confirmed,
                })
                .await
                .unwrap(),
        );

        let err = service
            .execute(TransitionBookingStatus {
                booking_id: id,
                to: Status::Pending,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::InvalidTransition(_),
        ));
    }
}
