//! [`Command`] for rescheduling a [`Booking`].

use common::operations::{By, Select, Update};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{booking, Booking},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for rescheduling a [`Booking`] to another travel date.
///
/// A back-office operation: customers cannot move their own trips.
#[derive(Clone, Copy, Debug)]
pub struct RescheduleBooking {
    /// ID of the [`Booking`] to reschedule.
    pub booking_id: booking::Id,

    /// New [`booking::TravelDateTime`] of the trip.
    pub travel_date: booking::TravelDateTime,
}

impl<Db> Command<RescheduleBooking> for Service<Db>
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
        cmd: RescheduleBooking,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RescheduleBooking {
            booking_id,
            travel_date,
        } = cmd;

        let mut booking = self
            .database()
            .execute(Select(By::<Option<Booking>, _>::new(booking_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::BookingNotExists(booking_id))
            .map_err(tracerr::wrap!())?;

        booking.travel_date = travel_date;

        self.database()
            .execute(Update(booking.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(booking)
    }
}

/// Error of [`RescheduleBooking`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Booking`] with the provided ID does not exist.
    #[display("`Booking(id: {_0})` does not exist")]
    BookingNotExists(#[error(not(source))] booking::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),
}
