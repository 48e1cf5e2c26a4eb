//! [`CatalogItem`] definitions.

use common::{define_kind, unit, DateTimeOf, Money};
#[cfg(doc)]
use common::{money::Currency, DateTime};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(doc)]
use crate::domain::Booking;

/// Bookable attraction or safari of the catalog.
///
/// Read-only from the booking core's perspective: its prices are snapshotted
/// into a [`Booking`] at creation time and never consulted again for that
/// [`Booking`].
#[derive(Clone, Debug)]
pub struct CatalogItem {
    /// ID of this [`CatalogItem`].
    pub id: Id,

    /// [`Kind`] of this [`CatalogItem`].
    pub kind: Kind,

    /// [`Title`] of this [`CatalogItem`].
    pub title: Title,

    /// Per-adult price of this [`CatalogItem`] in [`Currency::Usd`].
    pub price_usd: Money,

    /// Per-adult price of this [`CatalogItem`] in [`Currency::Kes`].
    ///
    /// Stored independently of [`CatalogItem::price_usd`], not derived from
    /// it via an exchange rate.
    pub price_kes: Money,

    /// Indicator whether this [`CatalogItem`] is featured on the landing
    /// page.
    pub is_featured: bool,

    /// [`DateTime`] when this [`CatalogItem`] was created.
    pub created_at: CreationDateTime,
}

/// ID of a [`CatalogItem`].
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

/// Title of a [`CatalogItem`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Title(String);

impl Title {
    /// Creates a new [`Title`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `title` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(title: impl Into<String>) -> Self {
        Self(title.into())
    }

    /// Creates a new [`Title`] if the given `title` is valid.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Option<Self> {
        let title = title.into();
        Self::check(&title).then_some(Self(title))
    }

    /// Checks whether the given `title` is a valid [`Title`].
    fn check(title: impl AsRef<str>) -> bool {
        let title = title.as_ref();
        title.trim() == title && !title.is_empty() && title.len() <= 512
    }
}

impl FromStr for Title {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Title`")
    }
}

define_kind! {
    #[doc = "Kind of a [`CatalogItem`]."]
    enum Kind {
        #[doc = "A single attraction visit."]
        Attraction = 1,

        #[doc = "A multi-day safari."]
        Safari = 2,
    }
}

/// [`DateTime`] when a [`CatalogItem`] was created.
///
/// [`DateTime`]: common::DateTime
pub type CreationDateTime = DateTimeOf<(CatalogItem, unit::Creation)>;
