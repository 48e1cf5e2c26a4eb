//! [`Booking`] definitions.

pub mod quote;
pub mod status;

use common::{define_kind, unit, DateTimeOf, Money};
#[cfg(doc)]
use common::{money::Currency, DateTime};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{catalog, user};
#[cfg(doc)]
use crate::domain::{CatalogItem, User};

pub use self::{
    quote::Quote,
    status::{PaymentStatus, PaymentTransition, Status, StatusTransition},
};

/// Reservation of a [`CatalogItem`] made by a [`User`].
#[derive(Clone, Debug)]
pub struct Booking {
    /// ID of this [`Booking`].
    pub id: Id,

    /// ID of the [`User`] owning this [`Booking`].
    pub user_id: user::Id,

    /// ID of the booked [`CatalogItem`].
    pub item_id: catalog::Id,

    /// [`catalog::Kind`] of the booked [`CatalogItem`].
    pub item_kind: catalog::Kind,

    /// [`DateTime`] of the booked trip.
    pub travel_date: TravelDateTime,

    /// Number of travelling [`Adults`].
    pub adults: Adults,

    /// Number of travelling [`Children`].
    pub children: Children,

    /// [`Accommodation`] tier of the trip.
    ///
    /// Only meaningful for [`catalog::Kind::Safari`] bookings.
    pub accommodation: Option<Accommodation>,

    /// Total price of this [`Booking`] in [`Currency::Usd`].
    ///
    /// Snapshotted at creation time and authoritative ever since: catalog
    /// price changes never alter it.
    pub total_usd: Money,

    /// Total price of this [`Booking`] in [`Currency::Kes`].
    ///
    /// An independent snapshot, not a conversion of
    /// [`Booking::total_usd`].
    pub total_kes: Money,

    /// Upfront deposit of this [`Booking`] in [`Currency::Usd`].
    ///
    /// Never exceeds [`Booking::total_usd`].
    pub deposit: Money,

    /// Indicator whether the deposit has been received.
    pub deposit_paid: bool,

    /// Fulfillment [`Status`] of this [`Booking`].
    pub status: Status,

    /// [`PaymentStatus`] of this [`Booking`].
    ///
    /// Independent of the fulfillment [`Status`]: a confirmed [`Booking`]
    /// may still be unpaid.
    pub payment_status: PaymentStatus,

    /// Free-text [`SpecialRequests`] of the customer.
    pub special_requests: Option<SpecialRequests>,

    /// [`DateTime`] when this [`Booking`] was created.
    pub created_at: CreationDateTime,
}

/// ID of a [`Booking`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Number of adults travelling in a [`Booking`].
///
/// Always at least `1`.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Into, Ord, PartialEq, PartialOrd)]
pub struct Adults(u16);

impl Adults {
    /// Creates a new [`Adults`] count if the given `count` is at least `1`.
    #[must_use]
    pub fn new(count: u16) -> Option<Self> {
        (count >= 1).then_some(Self(count))
    }

    /// Returns this [`Adults`] count as a plain number.
    #[must_use]
    pub const fn get(self) -> u16 {
        self.0
    }
}

/// Number of children travelling in a [`Booking`].
#[derive(
    Clone, Copy, Debug, Default, Display, Eq, From, Hash, Into, Ord, PartialEq,
    PartialOrd,
)]
pub struct Children(u16);

impl Children {
    /// Returns this [`Children`] count as a plain number.
    #[must_use]
    pub const fn get(self) -> u16 {
        self.0
    }
}

define_kind! {
    #[doc = "Accommodation tier of a safari [`Booking`]."]
    enum Accommodation {
        #[doc = "Standard tented camp."]
        Standard = 1,

        #[doc = "Deluxe lodge."]
        Deluxe = 2,

        #[doc = "Luxury lodge."]
        Luxury = 3,
    }
}

/// Free-text special requests of a [`Booking`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct SpecialRequests(String);

impl SpecialRequests {
    /// Creates a new [`SpecialRequests`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `text` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Creates new [`SpecialRequests`] if the given `text` is valid.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        Self::check(&text).then_some(Self(text))
    }

    /// Checks whether the given `text` is valid [`SpecialRequests`] content.
    fn check(text: impl AsRef<str>) -> bool {
        let text = text.as_ref();
        text.trim() == text && !text.is_empty() && text.len() <= 2048
    }
}

impl FromStr for SpecialRequests {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `SpecialRequests`")
    }
}

/// Marker type indicating the travel day of a [`Booking`].
#[derive(Clone, Copy, Debug)]
pub struct Travel;

/// [`DateTime`] of a [`Booking`]'s trip.
///
/// [`DateTime`]: common::DateTime
pub type TravelDateTime = DateTimeOf<(Booking, Travel)>;

/// [`DateTime`] when a [`Booking`] was created.
///
/// [`DateTime`]: common::DateTime
pub type CreationDateTime = DateTimeOf<(Booking, unit::Creation)>;

#[cfg(feature = "postgres")]
mod postgres {
    //! Module providing integration with PostgreSQL types.

    use std::error::Error as StdError;

    use postgres_types::{
        accepts, private::BytesMut, to_sql_checked, FromSql, IsNull, ToSql,
        Type,
    };

    use super::{Adults, Children};

    impl FromSql<'_> for Adults {
        accepts!(INT2);

        fn from_sql(
            ty: &Type,
            raw: &[u8],
        ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
            let count = u16::try_from(i16::from_sql(ty, raw)?)?;
            Self::new(count).ok_or_else(|| "zero `Adults` count".into())
        }
    }

    impl ToSql for Adults {
        accepts!(INT2);
        to_sql_checked!();

        fn to_sql(
            &self,
            ty: &Type,
            w: &mut BytesMut,
        ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
            i16::try_from(self.0)?.to_sql(ty, w)
        }
    }

    impl FromSql<'_> for Children {
        accepts!(INT2);

        fn from_sql(
            ty: &Type,
            raw: &[u8],
        ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
            Ok(Self(u16::try_from(i16::from_sql(ty, raw)?)?))
        }
    }

    impl ToSql for Children {
        accepts!(INT2);
        to_sql_checked!();

        fn to_sql(
            &self,
            ty: &Type,
            w: &mut BytesMut,
        ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
            i16::try_from(self.0)?.to_sql(ty, w)
        }
    }
}
