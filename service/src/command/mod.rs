//! [`Command`] definition.

pub mod amend_booking;
pub mod authorize_user_session;
pub mod create_booking;
pub mod create_user;
pub mod create_user_session;
pub mod reprice_booking;
pub mod reschedule_booking;
pub mod transition_booking_status;
pub mod transition_payment_status;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    amend_booking::AmendBooking, authorize_user_session::AuthorizeUserSession,
    create_booking::CreateBooking, create_user::CreateUser,
    create_user_session::CreateUserSession, reprice_booking::RepriceBooking,
    reschedule_booking::RescheduleBooking,
    transition_booking_status::TransitionBookingStatus,
    transition_payment_status::TransitionPaymentStatus,
};
