//! [`Query`] collection related to [`Booking`]s.

use common::operations::By;

use crate::domain::{booking, user, Booking};
#[cfg(doc)]
use crate::{domain::User, Query};

use super::DatabaseQuery;

/// Queries a [`Booking`] by its [`booking::Id`].
pub type ById = DatabaseQuery<By<Option<Booking>, booking::Id>>;

/// Queries all [`Booking`]s owned by the [`User`] with the given
/// [`user::Id`], newest first.
pub type OwnedBy = DatabaseQuery<By<Vec<Booking>, user::Id>>;
