//! [`Booking`] lifecycle statuses and their legal transitions.
//!
//! A [`Booking`] carries two independent status axes: the fulfillment
//! [`Status`] of the trip itself and the [`PaymentStatus`] of the money
//! collected for it. Each axis is a closed state machine, and every change
//! after creation must pass through [`Status::transition()`] (or its
//! [`PaymentStatus`] counterpart) before being persisted.

use common::define_kind;
use derive_more::{Display, Error};

#[cfg(doc)]
use crate::domain::Booking;

use super::Id;

define_kind! {
    #[doc = "Fulfillment status of a [`Booking`]."]
    enum Status {
        #[doc = "The trip awaits confirmation."]
        Pending = 1,

        #[doc = "The trip is confirmed."]
        Confirmed = 2,

        #[doc = "The trip is cancelled. Terminal."]
        Cancelled = 3,
    }
}

impl Status {
    /// Checks whether this [`Status`] may change into the `next` one.
    ///
    /// `Cancelled` is terminal, and a `Confirmed` [`Booking`] cannot be
    /// un-confirmed, only cancelled. Self-transitions are not legal.
    #[must_use]
    pub fn can_become(self, next: Self) -> bool {
        use Status as S;

        matches!(
            (self, next),
            (S::Pending, S::Confirmed)
                | (S::Pending, S::Cancelled)
                | (S::Confirmed, S::Cancelled)
        )
    }

    /// Validates the change of this [`Status`] into the `next` one.
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidTransition`] carrying the rejected pair if the
    /// change is not legal.
    pub fn transition(self, next: Self) -> Result<Self, InvalidTransition<Self>> {
        self.can_become(next)
            .then_some(next)
            .ok_or(InvalidTransition {
                from: self,
                to: next,
            })
    }
}

define_kind! {
    #[doc = "Payment status of a [`Booking`]."]
    enum PaymentStatus {
        #[doc = "Nothing collected yet."]
        Unpaid = 1,

        #[doc = "Deposit (or another part) collected."]
        PartiallyPaid = 2,

        #[doc = "Full total collected."]
        Paid = 3,

        #[doc = "Collected money returned. Terminal."]
        Refunded = 4,
    }
}

impl PaymentStatus {
    /// Checks whether this [`PaymentStatus`] may change into the `next` one.
    ///
    /// `Refunded` is terminal, and captured money never silently un-pays:
    /// leaving `Paid` is only possible through `Refunded`. Skipping straight
    /// from `Unpaid` to `Refunded` is not legal either, as there is nothing
    /// to return. Self-transitions are not legal.
    #[must_use]
    pub fn can_become(self, next: Self) -> bool {
        use PaymentStatus as S;

        matches!(
            (self, next),
            (S::Unpaid, S::PartiallyPaid)
                | (S::Unpaid, S::Paid)
                | (S::PartiallyPaid, S::Paid)
                | (S::PartiallyPaid, S::Refunded)
                | (S::Paid, S::Refunded)
        )
    }

    /// Validates the change of this [`PaymentStatus`] into the `next` one.
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidTransition`] carrying the rejected pair if the
    /// change is not legal.
    pub fn transition(
        self,
        next: Self,
    ) -> Result<Self, InvalidTransition<Self>> {
        self.can_become(next)
            .then_some(next)
            .ok_or(InvalidTransition {
                from: self,
                to: next,
            })
    }

    /// Checks whether this [`PaymentStatus`] is acceptable for a [`Booking`]
    /// entering the system.
    ///
    /// The checkout flow may have captured the deposit already, so both
    /// `Unpaid` and `PartiallyPaid` are valid entry states; `Paid` and
    /// `Refunded` are not.
    #[must_use]
    pub fn is_entry(self) -> bool {
        matches!(self, Self::Unpaid | Self::PartiallyPaid)
    }
}

/// Rejected change between two states of one status axis.
#[derive(Clone, Copy, Debug, Display, Error)]
#[display("transition from `{from}` to `{to}` is not allowed")]
pub struct InvalidTransition<S: 'static> {
    /// State the change was attempted from.
    pub from: S,

    /// State the change was attempted to.
    pub to: S,
}

/// Guarded change of a [`Booking`]'s fulfillment [`Status`].
///
/// Applied as a single compare-and-set against the persisted state: the
/// write only happens while the current state still equals `from`.
#[derive(Clone, Copy, Debug)]
pub struct StatusTransition {
    /// ID of the [`Booking`] to change.
    pub booking_id: Id,

    /// [`Status`] the [`Booking`] is expected to be in.
    pub from: Status,

    /// [`Status`] to change the [`Booking`] into.
    pub to: Status,
}

/// Guarded change of a [`Booking`]'s [`PaymentStatus`].
///
/// Applied as a single compare-and-set against the persisted state: the
/// write only happens while the current state still equals `from`.
#[derive(Clone, Copy, Debug)]
pub struct PaymentTransition {
    /// ID of the [`Booking`] to change.
    pub booking_id: Id,

    /// [`PaymentStatus`] the [`Booking`] is expected to be in.
    pub from: PaymentStatus,

    /// [`PaymentStatus`] to change the [`Booking`] into.
    pub to: PaymentStatus,
}

#[cfg(test)]
mod spec {
    use super::{PaymentStatus, Status};

    const STATUSES: [Status; 3] =
        [Status::Pending, Status::Confirmed, Status::Cancelled];

    const PAYMENT_STATUSES: [PaymentStatus; 4] = [
        PaymentStatus::Unpaid,
        PaymentStatus::PartiallyPaid,
        PaymentStatus::Paid,
        PaymentStatus::Refunded,
    ];

    #[test]
    fn fulfillment_table_is_exhaustive() {
        use Status as S;

        let legal = [
            (S::Pending, S::Confirmed),
            (S::Pending, S::Cancelled),
            (S::Confirmed, S::Cancelled),
        ];

        for from in STATUSES {
            for to in STATUSES {
                assert_eq!(
                    from.can_become(to),
                    legal.contains(&(from, to)),
                    "{from} -> {to}",
                );
            }
        }
    }

    #[test]
    fn payment_table_is_exhaustive() {
        use PaymentStatus as S;

        let legal = [
            (S::Unpaid, S::PartiallyPaid),
            (S::Unpaid, S::Paid),
            (S::PartiallyPaid, S::Paid),
            (S::PartiallyPaid, S::Refunded),
            (S::Paid, S::Refunded),
        ];

        for from in PAYMENT_STATUSES {
            for to in PAYMENT_STATUSES {
                assert_eq!(
                    from.can_become(to),
                    legal.contains(&(from, to)),
                    "{from} -> {to}",
                );
            }
        }
    }

    #[test]
    fn cancelled_and_refunded_are_terminal() {
        for to in STATUSES {
            assert!(!Status::Cancelled.can_become(to), "cancelled -> {to}");
        }
        for to in PAYMENT_STATUSES {
            assert!(
                !PaymentStatus::Refunded.can_become(to),
                "refunded -> {to}",
            );
        }
    }

    #[test]
    fn paid_never_silently_unpays() {
        assert!(!PaymentStatus::Paid.can_become(PaymentStatus::Unpaid));
        assert!(!PaymentStatus::Paid.can_become(PaymentStatus::PartiallyPaid));
    }

    #[test]
    fn unpaid_cannot_skip_to_refunded() {
        assert!(!PaymentStatus::Unpaid.can_become(PaymentStatus::Refunded));
    }

    #[test]
    fn rejection_reports_the_attempted_pair() {
        let err = Status::Cancelled.transition(Status::Pending).unwrap_err();

        assert_eq!(err.from, Status::Cancelled);
        assert_eq!(err.to, Status::Pending);
        assert_eq!(
            err.to_string(),
            "transition from `cancelled` to `pending` is not allowed",
        );
    }

    #[test]
    fn entry_states() {
        assert!(PaymentStatus::Unpaid.is_entry());
        assert!(PaymentStatus::PartiallyPaid.is_entry());
        assert!(!PaymentStatus::Paid.is_entry());
        assert!(!PaymentStatus::Refunded.is_entry());
    }
}
