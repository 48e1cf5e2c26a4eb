//! [`Command`] for creating a new [`Booking`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::booking::Quote;
use crate::{
    domain::{
        booking::{self, quote},
        catalog, user, Booking, CatalogItem, User,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Booking`].
///
/// The money snapshot of the [`Booking`] is always the server-computed
/// [`Quote`] of the booked [`CatalogItem`]'s stored unit prices: totals
/// proposed by a client are never persisted.
///
/// The owning [`User`] is resolved inside the same transaction the
/// [`Booking`] is inserted in: an authorized initiator directly, an email
/// already on file by lookup, and an unknown email by creating the customer
/// record first. The persisted [`Booking`] always references the definitive
/// stored ID.
#[derive(Clone, Debug)]
pub struct CreateBooking {
    /// ID of the authorized [`User`] submitting the [`Booking`], if any.
    pub initiator: Option<user::Id>,

    /// Contact [`user::Email`] of the customer.
    ///
    /// Identifies (or creates) the owning [`User`] for anonymous
    /// submissions.
    pub email: user::Email,

    /// [`catalog::Kind`] of the [`CatalogItem`] to book.
    pub item_kind: catalog::Kind,

    /// ID of the [`CatalogItem`] to book.
    pub item_id: catalog::Id,

    /// Requested [`booking::TravelDateTime`] of the trip.
    pub travel_date: booking::TravelDateTime,

    /// Number of travelling adults.
    pub adults: booking::Adults,

    /// Number of travelling children.
    pub children: booking::Children,

    /// Requested [`booking::Accommodation`] tier, safaris only.
    pub accommodation: Option<booking::Accommodation>,

    /// [`booking::SpecialRequests`] of the customer.
    pub special_requests: Option<booking::SpecialRequests>,

    /// Indicator whether the checkout flow has captured the deposit.
    pub deposit_paid: bool,

    /// Entry [`booking::Status`] decided by the checkout flow.
    pub status: booking::Status,

    /// Entry [`booking::PaymentStatus`] decided by the checkout flow.
    pub payment_status: booking::PaymentStatus,
}

impl<Db> Command<CreateBooking> for Service<Db>
where
    Db: Database<
            Select<By<Option<CatalogItem>, catalog::Id>>,
            Ok = Option<CatalogItem>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + for<'e> Database<
            Select<By<Option<User>, &'e user::Email>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Insert<User>, Err = Traced<database::Error>>
        + Database<Insert<Booking>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Booking;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateBooking) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateBooking {
            initiator,
            email,
            item_kind,
            item_id,
            travel_date,
            adults,
            children,
            accommodation,
            special_requests,
            deposit_paid,
            status,
            payment_status,
        } = cmd;

        if !payment_status.is_entry() {
            return Err(tracerr::new!(E::NonEntryPaymentStatus(
                payment_status
            )));
        }

        let item = self
            .database()
            .execute(Select(By::<Option<CatalogItem>, _>::new(item_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .filter(|i| i.kind == item_kind)
            .ok_or(E::ItemNotExists(item_id))
            .map_err(tracerr::wrap!())?;

        if item.kind == catalog::Kind::Attraction && accommodation.is_some() {
            return Err(tracerr::new!(E::AccommodationNotApplicable));
        }

        let quote = booking::Quote::compute(
            item.price_usd,
            item.price_kes,
            adults,
            children,
        )
        .map_err(tracerr::from_and_wrap!(=> E))?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let owner = match initiator {
            Some(user_id) => tx
                .execute(Select(By::<Option<User>, _>::new(user_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or(E::UserNotExists(user_id))
                .map_err(tracerr::wrap!())?,
            None => {
                resolve_by_email(&tx, email)
                    .await
                    .map_err(tracerr::wrap!())?
            }
        };

        let booking = Booking {
            id: booking::Id::new(),
            user_id: owner.id,
            item_id: item.id,
            item_kind: item.kind,
            travel_date,
            adults,
            children,
            accommodation,
            total_usd: quote.total_usd,
            total_kes: quote.total_kes,
            deposit: quote.deposit,
            deposit_paid,
            status,
            payment_status,
            special_requests,
            created_at: DateTime::now().coerce(),
        };

        tx.execute(Insert(booking.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tracing::info!(
            booking_id = %booking.id,
            user_id = %booking.user_id,
            "created booking",
        );

        Ok(booking)
    }
}

/// Resolves the owning [`User`] of an anonymous [`Booking`] by its contact
/// `email`, creating the customer record first when the `email` is not on
/// file yet.
async fn resolve_by_email<Tx>(
    tx: &Tx,
    email: user::Email,
) -> Result<User, Traced<ExecutionError>>
where
    Tx: for<'e> Database<
            Select<By<Option<User>, &'e user::Email>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Insert<User>, Err = Traced<database::Error>>,
{
    use ExecutionError as E;

    if let Some(user) = tx
        .execute(Select(By::new(&email)))
        .await
        .map_err(tracerr::map_from_and_wrap!(=> E))?
    {
        return Ok(user);
    }

    let name = match user::Name::new(email.local_part()) {
        Some(name) => name,
        // SAFETY: The fallback satisfies all `Name` invariants.
        #[expect(unsafe_code, reason = "invariants are preserved")]
        None => unsafe { user::Name::new_unchecked("Guest") },
    };
    tx.execute(Insert(User {
        id: user::Id::new(),
        name,
        email: email.clone(),
        phone: None,
        role: user::Role::Customer,
        password_hash: None,
        created_at: DateTime::now().coerce(),
    }))
    .await
    .map_err(tracerr::map_from_and_wrap!(=> E))
    .map(drop)?;

    // Re-read instead of trusting the candidate row: a concurrent
    // submission may have won the insert, and the `Booking` must reference
    // whichever ID is actually on file.
    let user = tx
        .execute(Select(By::new(&email)))
        .await
        .map_err(tracerr::map_from_and_wrap!(=> E))?
        .ok_or(E::UserResolutionFailed)
        .map_err(tracerr::wrap!())?;

    tracing::info!(user_id = %user.id, "implicitly created customer");

    Ok(user)
}

/// Error of [`CreateBooking`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// Accommodation tier requested for a [`CatalogItem`] not supporting it.
    #[display("accommodation tier is only applicable to safari bookings")]
    AccommodationNotApplicable,

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`CatalogItem`] with the provided ID does not exist.
    #[display("`CatalogItem(id: {_0})` does not exist")]
    ItemNotExists(#[error(not(source))] catalog::Id),

    /// Provided [`booking::PaymentStatus`] is not a valid entry state.
    #[display("`{_0}` is not a valid payment status for a new booking")]
    NonEntryPaymentStatus(#[error(not(source))] booking::PaymentStatus),

    /// [`Quote`] computation failed.
    #[display("failed to compute a quote: {_0}")]
    #[from]
    Quote(quote::Error),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    #[from(ignore)]
    UserNotExists(#[error(not(source))] user::Id),

    /// Owning [`User`] could not be resolved.
    #[display("failed to resolve the owning `User`")]
    UserResolutionFailed,
}

#[cfg(test)]
mod spec {
    use common::Handler as _;

    use crate::{
        domain::{booking, catalog, user},
        testing, Service,
    };

    use super::CreateBooking;

    fn cmd(email: &str) -> CreateBooking {
        CreateBooking {
            initiator: None,
            email: email.parse().unwrap(),
            item_kind: catalog::Kind::Safari,
            item_id: testing::safari_id(),
            travel_date: testing::travel_date(),
            adults: booking::Adults::new(2).unwrap(),
            children: booking::Children::from(1),
            accommodation: Some(booking::Accommodation::Deluxe),
            special_requests: None,
            deposit_paid: false,
            status: booking::Status::Pending,
            payment_status: booking::PaymentStatus::Unpaid,
        }
    }

    #[tokio::test]
    async fn snapshots_the_server_computed_quote() {
        let db = testing::StubDb::default().with_safari();
        let service = Service::new(testing::config(), db);

        let booking = service.execute(cmd("jane@example.com")).await.unwrap();

        // Safari unit prices are 150 USD / 19500 KES per adult.
        assert_eq!(booking.total_usd.amount, "405".parse().unwrap());
        assert_eq!(booking.total_kes.amount, "52650".parse().unwrap());
        assert_eq!(booking.deposit.amount, "122".parse().unwrap());
    }

    #[tokio::test]
    async fn unknown_email_creates_exactly_one_user() {
        let db = testing::StubDb::default().with_safari();
        let service = Service::new(testing::config(), db.clone());

        let booking = service.execute(cmd("jane@example.com")).await.unwrap();

        let users = db.users();
        assert_eq!(users.len(), 1);
        let owner = &users[0];
        assert_eq!(booking.user_id, owner.id);
        assert_eq!(owner.email.to_string(), "jane@example.com");
        assert_eq!(owner.role, user::Role::Customer);
        assert!(owner.password_hash.is_none());
    }

    #[tokio::test]
    async fn known_email_reuses_the_stored_user() {
        let db = testing::StubDb::default().with_safari();
        let service = Service::new(testing::config(), db.clone());

        let first = service.execute(cmd("jane@example.com")).await.unwrap();
        let second = service.execute(cmd("jane@example.com")).await.unwrap();

        assert_eq!(db.users().len(), 1);
        assert_eq!(first.user_id, second.user_id);
    }

    #[tokio::test]
    async fn rejects_paid_as_an_entry_state() {
        let db = testing::StubDb::default().with_safari();
        let service = Service::new(testing::config(), db);

        let mut cmd = cmd("jane@example.com");
        cmd.payment_status = booking::PaymentStatus::Paid;

        assert!(service.execute(cmd).await.is_err());
    }

    #[tokio::test]
    async fn rejects_accommodation_for_attractions() {
        let db = testing::StubDb::default().with_attraction();
        let service = Service::new(testing::config(), db);

        let mut cmd = cmd("jane@example.com");
        cmd.item_kind = catalog::Kind::Attraction;
        cmd.item_id = testing::attraction_id();
        cmd.accommodation = Some(booking::Accommodation::Standard);

        assert!(service.execute(cmd).await.is_err());
    }
}
