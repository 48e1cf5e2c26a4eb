//! In-memory [`Database`] fixtures for [`Command`] tests.
//!
//! [`Command`]: crate::Command

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use common::{
    money::Currency,
    operations::{By, Commit, Insert, Select, Transact, Update},
    DateTime, Money,
};
use tracerr::Traced;

use crate::{
    domain::{
        booking::{
            self, PaymentStatus, PaymentTransition, Status, StatusTransition,
        },
        catalog, user, Booking, CatalogItem, User,
    },
    infra::{database, Database},
    Config,
};

/// Creates a [`Config`] with a throwaway JWT secret.
pub(crate) fn config() -> Config {
    Config {
        jwt_encoding_key: jsonwebtoken::EncodingKey::from_secret(
            b"test-secret",
        ),
        jwt_decoding_key: jsonwebtoken::DecodingKey::from_secret(
            b"test-secret",
        ),
    }
}

/// ID of the safari seeded by [`StubDb::with_safari()`].
pub(crate) fn safari_id() -> catalog::Id {
    "5e1b8a47-7c2d-4b0e-9f3a-6d1c2b9e8f01".parse().unwrap()
}

/// ID of the attraction seeded by [`StubDb::with_attraction()`].
pub(crate) fn attraction_id() -> catalog::Id {
    "2f6d0c13-9a8b-4e5f-b7d1-0e3a4c5b6d02".parse().unwrap()
}

/// A travel date a month from now.
pub(crate) fn travel_date() -> booking::TravelDateTime {
    (DateTime::now() + Duration::from_secs(30 * 24 * 60 * 60)).coerce()
}

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

/// A [`User`] registered with the password `hunter22`.
pub(crate) fn registered_user(email: &str) -> User {
    User {
        id: user::Id::new(),
        name: "Jane Doe".parse().unwrap(),
        email: email.parse().unwrap(),
        phone: None,
        role: user::Role::Customer,
        password_hash: Some(user::PasswordHash::new(&"hunter22".into())),
        created_at: DateTime::now().coerce(),
    }
}

/// A [`User`] created implicitly by an anonymous booking, with no password.
pub(crate) fn implicit_user(email: &str) -> User {
    User {
        password_hash: None,
        ..registered_user(email)
    }
}

/// A freshly created safari [`Booking`] of 2 adults and 1 child.
pub(crate) fn pending_booking() -> Booking {
    Booking {
        id: booking::Id::new(),
        user_id: user::Id::new(),
        item_id: safari_id(),
        item_kind: catalog::Kind::Safari,
        travel_date: travel_date(),
        adults: booking::Adults::new(2).unwrap(),
        children: booking::Children::from(1),
        accommodation: Some(booking::Accommodation::Standard),
        total_usd: usd("405"),
        total_kes: kes("52650"),
        deposit: usd("122"),
        deposit_paid: false,
        status: Status::Pending,
        payment_status: PaymentStatus::Unpaid,
        special_requests: None,
        created_at: DateTime::now().coerce(),
    }
}

/// In-memory [`Database`] stub.
///
/// Cloning shares the underlying state, which also makes it serve as its own
/// transaction.
#[derive(Clone, Debug, Default)]
pub(crate) struct StubDb {
    /// Stored entities.
    state: Arc<Mutex<State>>,

    /// [`PaymentStatus`] to report on the next [`Booking`] read, simulating
    /// a stale read racing a concurrent writer.
    payment_read_override: Arc<Mutex<Option<PaymentStatus>>>,
}

/// Stored entities of a [`StubDb`].
#[derive(Debug, Default)]
struct State {
    /// Stored [`User`]s.
    users: HashMap<user::Id, User>,

    /// Stored [`CatalogItem`]s.
    items: HashMap<catalog::Id, CatalogItem>,

    /// Stored [`Booking`]s.
    bookings: HashMap<booking::Id, Booking>,
}

impl StubDb {
    /// Seeds a safari priced at 150 USD / 19500 KES per adult.
    pub(crate) fn with_safari(self) -> Self {
        let item = CatalogItem {
            id: safari_id(),
            kind: catalog::Kind::Safari,
            title: "Masai Mara Classic Safari".parse().unwrap(),
            price_usd: usd("150"),
            price_kes: kes("19500"),
            is_featured: true,
            created_at: DateTime::now().coerce(),
        };
        drop(self.lock().items.insert(item.id, item));
        self
    }

    /// Seeds an attraction priced at 50 USD / 6500 KES per adult.
    pub(crate) fn with_attraction(self) -> Self {
        let item = CatalogItem {
            id: attraction_id(),
            kind: catalog::Kind::Attraction,
            title: "Nairobi National Park Day Trip".parse().unwrap(),
            price_usd: usd("50"),
            price_kes: kes("6500"),
            is_featured: false,
            created_at: DateTime::now().coerce(),
        };
        drop(self.lock().items.insert(item.id, item));
        self
    }

    /// Seeds the provided [`User`].
    pub(crate) fn with_user(self, user: User) -> Self {
        drop(self.lock().users.insert(user.id, user));
        self
    }

    /// Seeds the provided [`Booking`].
    pub(crate) fn with_booking(self, booking: Booking) -> Self {
        drop(self.lock().bookings.insert(booking.id, booking));
        self
    }

    /// Returns all stored [`User`]s.
    pub(crate) fn users(&self) -> Vec<User> {
        self.lock().users.values().cloned().collect()
    }

    /// Returns the stored [`Booking`] with the provided ID.
    pub(crate) fn booking(&self, id: booking::Id) -> Option<Booking> {
        self.lock().bookings.get(&id).cloned()
    }

    /// Makes the next [`Booking`] read report the provided
    /// [`PaymentStatus`] instead of the stored one.
    pub(crate) fn override_next_payment_read(&self, status: PaymentStatus) {
        *self.payment_read_override.lock().unwrap() = Some(status);
    }

    /// Locks the stored entities.
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }
}

impl Database<Select<By<Option<User>, user::Id>>> for StubDb {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.lock().users.get(&by.into_inner()).cloned())
    }
}

impl<'e> Database<Select<By<Option<User>, &'e user::Email>>> for StubDb {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, &'e user::Email>>,
    ) -> Result<Self::Ok, Self::Err> {
        let email = by.into_inner();
        Ok(self
            .lock()
            .users
            .values()
            .find(|u| &u.email == email)
            .cloned())
    }
}

impl Database<Insert<User>> for StubDb {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(user): Insert<User>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut state = self.lock();
        // Unique email: a lost insert race is a no-op.
        if state.users.values().all(|u| u.email != user.email) {
            drop(state.users.insert(user.id, user));
        }
        Ok(())
    }
}

impl Database<Update<User>> for StubDb {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(user): Update<User>,
    ) -> Result<Self::Ok, Self::Err> {
        drop(self.lock().users.insert(user.id, user));
        Ok(())
    }
}

impl Database<Select<By<Option<CatalogItem>, catalog::Id>>> for StubDb {
    type Ok = Option<CatalogItem>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<CatalogItem>, catalog::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.lock().items.get(&by.into_inner()).cloned())
    }
}

impl Database<Select<By<Option<Booking>, booking::Id>>> for StubDb {
    type Ok = Option<Booking>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Booking>, booking::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut booking = self.lock().bookings.get(&by.into_inner()).cloned();
        if let Some(b) = &mut booking {
            if let Some(stale) = self.payment_read_override.lock().unwrap().take()
            {
                b.payment_status = stale;
            }
        }
        Ok(booking)
    }
}

impl Database<Insert<Booking>> for StubDb {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(booking): Insert<Booking>,
    ) -> Result<Self::Ok, Self::Err> {
        drop(self.lock().bookings.insert(booking.id, booking));
        Ok(())
    }
}

impl Database<Update<Booking>> for StubDb {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(booking): Update<Booking>,
    ) -> Result<Self::Ok, Self::Err> {
        drop(self.lock().bookings.insert(booking.id, booking));
        Ok(())
    }
}

impl Database<Update<StatusTransition>> for StubDb {
    type Ok = u64;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(t): Update<StatusTransition>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut state = self.lock();
        Ok(match state.bookings.get_mut(&t.booking_id) {
            Some(b) if b.status == t.from => {
                b.status = t.to;
                1
            }
            Some(_) | None => 0,
        })
    }
}

impl Database<Update<PaymentTransition>> for StubDb {
    type Ok = u64;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(t): Update<PaymentTransition>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut state = self.lock();
        Ok(match state.bookings.get_mut(&t.booking_id) {
            Some(b) if b.payment_status == t.from => {
                b.payment_status = t.to;
                1
            }
            Some(_) | None => 0,
        })
    }
}

impl Database<Transact> for StubDb {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(self.clone())
    }
}

impl Database<Commit> for StubDb {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}
