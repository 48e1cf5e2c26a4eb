//! [`Command`] for amending details of a [`Booking`].

use common::operations::{By, Select, Update};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{booking, Booking},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for amending back-office details of a [`Booking`].
///
/// [`None`] fields are left unchanged. Money and status fields are out of
/// reach on purpose: those go through their dedicated [`Command`]s.
#[derive(Clone, Debug)]
pub struct AmendBooking {
    /// ID of the [`Booking`] to amend.
    pub booking_id: booking::Id,

    /// New [`booking::SpecialRequests`] of the [`Booking`].
    pub special_requests: Option<booking::SpecialRequests>,

    /// New value of the deposit-received indicator.
    pub deposit_paid: Option<bool>,
}

impl<Db> Command<AmendBooking> for Service<Db>
where
    Db: Database<
            Select<By<Option<Booking>, booking::Id>>,
            Ok = Option<Booking>,
            Err = Traced<database::Error>,
        > + Database<Update<Booking>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Booking;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: AmendBooking) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AmendBooking {
            booking_id,
            special_requests,
            deposit_paid,
        } = cmd;

        let mut booking = self
            .database()
            .execute(Select(By::<Option<Booking>, _>::new(booking_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::BookingNotExists(booking_id))
            .map_err(tracerr::wrap!())?;

        if let Some(requests) = special_requests {
            booking.special_requests = Some(requests);
        }
        if let Some(paid) = deposit_paid {
            booking.deposit_paid = paid;
        }

        self.database()
            .execute(Update(booking.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(booking)
    }
}

/// Error of [`AmendBooking`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Booking`] with the provided ID does not exist.
    #[display("`Booking(id: {_0})` does not exist")]
    BookingNotExists(#[error(not(source))] booking::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),
}
