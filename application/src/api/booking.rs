//! [`Booking`]-related endpoints.
//!
//! [`Booking`]: service::domain::Booking

use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use common::DateTime;
use http::StatusCode;
use rust_decimal::Decimal;
use service::{
    command::{self, Command as _},
    domain::{booking, catalog, user, Booking},
    query, Query as _,
};

use crate::{AsError, Auth, AuthError, Error, MaybeAuth, Service};

/// Body of a [`create`] request.
///
/// Field spellings, including the `USD`/`KES` suffixes, follow the checkout
/// page's payload.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    /// Client-proposed owner ID.
    ///
    /// Accepted for compatibility but deliberately never trusted: the owner
    /// is resolved from the session or the email instead, so a forged value
    /// cannot fabricate ownership of someone else's account.
    pub user_id: Option<String>,

    /// Contact email of the customer.
    pub email: String,

    /// Kind of the booked item: `attraction` or `safari`.
    pub booking_type: String,

    /// ID of the booked item.
    pub item_id: String,

    /// [RFC 3339] date of the trip.
    ///
    /// [RFC 3339]: https://tools.ietf.org/html/rfc3339
    pub travel_date: String,

    /// Number of travelling adults.
    pub adults: i64,

    /// Number of travelling children.
    #[serde(default)]
    pub children: i64,

    /// Accommodation tier, safaris only.
    pub accommodation_type: Option<String>,

    /// Client-computed USD total, validated but recomputed server-side.
    #[serde(rename = "totalPriceUSD")]
    pub total_price_usd: Decimal,

    /// Client-computed KES total, validated but recomputed server-side.
    #[serde(rename = "totalPriceKES")]
    pub total_price_kes: Decimal,

    /// Client-computed deposit, validated but recomputed server-side.
    pub deposit_amount: Decimal,

    /// Indicator whether the checkout flow has captured the deposit.
    #[serde(default)]
    pub deposit_paid: bool,

    /// Entry fulfillment status decided by the checkout flow.
    pub status: String,

    /// Entry payment status decided by the checkout flow.
    pub payment_status: String,

    /// Free-text special requests.
    pub special_requests: Option<String>,
}

/// Body of an [`update`] request.
///
/// All fields are optional; the price triplet is only accepted as a whole.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    /// New [RFC 3339] date of the trip.
    ///
    /// [RFC 3339]: https://tools.ietf.org/html/rfc3339
    pub travel_date: Option<String>,

    /// New free-text special requests.
    pub special_requests: Option<String>,

    /// New value of the deposit-received indicator.
    pub deposit_paid: Option<bool>,

    /// New USD total.
    #[serde(rename = "totalPriceUSD")]
    pub total_price_usd: Option<Decimal>,

    /// New KES total.
    #[serde(rename = "totalPriceKES")]
    pub total_price_kes: Option<Decimal>,

    /// New deposit.
    pub deposit_amount: Option<Decimal>,

    /// New fulfillment status, routed through the state machine.
    pub status: Option<String>,

    /// New payment status, routed through the state machine.
    pub payment_status: Option<String>,
}

/// Query parameters of a [`list`] request.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    /// ID of the user whose bookings to list.
    ///
    /// Defaults to the authorized user.
    pub user_id: Option<String>,
}

/// `Booking` of a response.
#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    /// ID of the booking.
    pub id: String,

    /// ID of the owning user.
    pub user_id: String,

    /// Kind of the booked item.
    pub booking_type: String,

    /// ID of the booked item.
    pub item_id: String,

    /// [RFC 3339] date of the trip.
    ///
    /// [RFC 3339]: https://tools.ietf.org/html/rfc3339
    pub travel_date: String,

    /// Number of travelling adults.
    pub adults: u16,

    /// Number of travelling children.
    pub children: u16,

    /// Accommodation tier, safaris only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accommodation_type: Option<String>,

    /// USD total of the money snapshot.
    #[serde(rename = "totalPriceUSD")]
    pub total_price_usd: Decimal,

    /// KES total of the money snapshot.
    #[serde(rename = "totalPriceKES")]
    pub total_price_kes: Decimal,

    /// Deposit of the money snapshot.
    pub deposit_amount: Decimal,

    /// Indicator whether the deposit has been received.
    pub deposit_paid: bool,

    /// Fulfillment status.
    pub status: String,

    /// Payment status.
    pub payment_status: String,

    /// Free-text special requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_requests: Option<String>,

    /// [RFC 3339] timestamp of the booking creation.
    ///
    /// [RFC 3339]: https://tools.ietf.org/html/rfc3339
    pub booking_date: String,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        Self {
            id: booking.id.to_string(),
            user_id: booking.user_id.to_string(),
            booking_type: booking.item_kind.to_string(),
            item_id: booking.item_id.to_string(),
            travel_date: booking.travel_date.to_rfc3339(),
            adults: booking.adults.get(),
            children: booking.children.get(),
            accommodation_type: booking.accommodation.map(|a| a.to_string()),
            total_price_usd: booking.total_usd.amount,
            total_price_kes: booking.total_kes.amount,
            deposit_amount: booking.deposit.amount,
            deposit_paid: booking.deposit_paid,
            status: booking.status.to_string(),
            payment_status: booking.payment_status.to_string(),
            special_requests: booking.special_requests.map(|r| r.to_string()),
            booking_date: booking.created_at.to_rfc3339(),
        }
    }
}

/// `POST /bookings`
///
/// Creates a new booking, resolving the owning user from the session or the
/// provided email and snapshotting the server-computed quote.
#[tracing::instrument(skip_all, fields(http.route = "POST /bookings"))]
pub async fn create(
    Extension(service): Extension<Service>,
    MaybeAuth(session): MaybeAuth,
    Json(req): Json<CreateRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), Error> {
    let email = req
        .email
        .parse::<user::Email>()
        .map_err(|_| Error::validation(&"email is not a valid address"))?;
    let item_kind = req.booking_type.parse::<catalog::Kind>().map_err(|_| {
        Error::validation(&"bookingType must be `attraction` or `safari`")
    })?;
    let item_id = req
        .item_id
        .parse::<catalog::Id>()
        .map_err(|_| Error::validation(&"itemId is not a valid id"))?;
    let travel_date = DateTime::from_rfc3339(&req.travel_date)
        .map_err(|_| {
            Error::validation(&"travelDate is not a valid RFC 3339 date")
        })?
        .coerce();
    let adults = u16::try_from(req.adults)
        .ok()
        .and_then(booking::Adults::new)
        .ok_or_else(|| Error::validation(&"adults must be at least 1"))?;
    let children = u16::try_from(req.children)
        .map(booking::Children::from)
        .map_err(|_| Error::validation(&"children must not be negative"))?;
    let accommodation = req
        .accommodation_type
        .as_deref()
        .map(|tier| {
            tier.parse::<booking::Accommodation>().map_err(|_| {
                Error::validation(
                    &"accommodationType must be `standard`, `deluxe` or \
                      `luxury`",
                )
            })
        })
        .transpose()?;
    let special_requests = req
        .special_requests
        .as_deref()
        .map(|text| {
            text.parse::<booking::SpecialRequests>().map_err(|_| {
                Error::validation(
                    &"specialRequests must not be empty or exceed 2048 \
                      characters",
                )
            })
        })
        .transpose()?;
    let status = parse_status(&req.status)?;
    let payment_status = parse_payment_status(&req.payment_status)?;

    for (field, amount) in [
        ("totalPriceUSD", req.total_price_usd),
        ("totalPriceKES", req.total_price_kes),
        ("depositAmount", req.deposit_amount),
    ] {
        if amount < Decimal::ZERO {
            return Err(Error::validation(&format!(
                "{field} must not be negative",
            )));
        }
    }

    service
        .execute(command::CreateBooking {
            initiator: session.map(|s| s.user_id),
            email,
            item_kind,
            item_id,
            travel_date,
            adults,
            children,
            accommodation,
            special_requests,
            deposit_paid: req.deposit_paid,
            status,
            payment_status,
        })
        .await
        .map(|booking| (StatusCode::CREATED, Json(booking.into())))
        .map_err(AsError::into_error)
}

/// `GET /bookings/{id}`
///
/// Returns the booking to its owner or to an admin.
#[tracing::instrument(skip_all, fields(http.route = "GET /bookings/:id"))]
pub async fn find(
    Extension(service): Extension<Service>,
    Auth(session): Auth,
    Path(id): Path<String>,
) -> Result<Json<BookingResponse>, Error> {
    let booking_id = parse_booking_id(&id)?;

    let booking = service
        .execute(query::booking::ById::by(booking_id))
        .await
        .map_err(AsError::into_error)?
        .ok_or_else(|| Error::not_found(&"booking not found"))?;

    // Non-owners learn nothing, not even existence.
    if session.role != user::Role::Admin && booking.user_id != session.user_id
    {
        return Err(Error::not_found(&"booking not found"));
    }

    Ok(Json(booking.into()))
}

/// `GET /bookings?userId=`
///
/// Lists the bookings of the authorized user, or of any user for an admin.
#[tracing::instrument(skip_all, fields(http.route = "GET /bookings"))]
pub async fn list(
    Extension(service): Extension<Service>,
    Auth(session): Auth,
    Query(params): Query<ListQuery>,
) -> Result<Json<Vec<BookingResponse>>, Error> {
    let target = params
        .user_id
        .map(|id| {
            id.parse::<user::Id>()
                .map_err(|_| Error::validation(&"userId is not a valid id"))
        })
        .transpose()?
        .unwrap_or(session.user_id);

    if session.role != user::Role::Admin && target != session.user_id {
        return Err(AuthError::Forbidden.into());
    }

    service
        .execute(query::booking::OwnedBy::by(target))
        .await
        .map(|bookings| {
            Json(bookings.into_iter().map(Into::into).collect())
        })
        .map_err(AsError::into_error)
}

/// `PUT /bookings/{id}`
///
/// Admin-only partial update. Status fields are routed through the state
/// machine, the price triplet is only replaced as a whole, and the rest go
/// through their dedicated commands.
#[tracing::instrument(skip_all, fields(http.route = "PUT /bookings/:id"))]
pub async fn update(
    Extension(service): Extension<Service>,
    Auth(session): Auth,
    Path(id): Path<String>,
    Json(req): Json<UpdateRequest>,
) -> Result<Json<BookingResponse>, Error> {
    if session.role != user::Role::Admin {
        return Err(AuthError::Forbidden.into());
    }

    let booking_id = parse_booking_id(&id)?;

    match (req.total_price_usd, req.total_price_kes, req.deposit_amount) {
        (None, None, None) => {}
        (Some(total_usd), Some(total_kes), Some(deposit)) => {
            drop(
                service
                    .execute(command::RepriceBooking {
                        booking_id,
                        total_usd: usd(total_usd),
                        total_kes: kes(total_kes),
                        deposit: usd(deposit),
                    })
                    .await
                    .map_err(AsError::into_error)?,
            );
        }
        (_, _, _) => {
            return Err(Error::validation(
                &"totalPriceUSD, totalPriceKES and depositAmount must be \
                  updated together",
            ));
        }
    }

    if let Some(travel_date) = req.travel_date {
        let travel_date = DateTime::from_rfc3339(&travel_date)
            .map_err(|_| {
                Error::validation(&"travelDate is not a valid RFC 3339 date")
            })?
            .coerce();
        drop(
            service
                .execute(command::RescheduleBooking {
                    booking_id,
                    travel_date,
                })
                .await
                .map_err(AsError::into_error)?,
        );
    }

    if req.special_requests.is_some() || req.deposit_paid.is_some() {
        let special_requests = req
            .special_requests
            .as_deref()
            .map(|text| {
                text.parse::<booking::SpecialRequests>().map_err(|_| {
                    Error::validation(
                        &"specialRequests must not be empty or exceed 2048 \
                          characters",
                    )
                })
            })
            .transpose()?;
        drop(
            service
                .execute(command::AmendBooking {
                    booking_id,
                    special_requests,
                    deposit_paid: req.deposit_paid,
                })
                .await
                .map_err(AsError::into_error)?,
        );
    }

    if let Some(status) = req.status.as_deref() {
        drop(
            service
                .execute(command::TransitionBookingStatus {
                    booking_id,
                    to: parse_status(status)?,
                })
                .await
                .map_err(AsError::into_error)?,
        );
    }

    if let Some(payment_status) = req.payment_status.as_deref() {
        drop(
            service
                .execute(command::TransitionPaymentStatus {
                    booking_id,
                    to: parse_payment_status(payment_status)?,
                })
                .await
                .map_err(AsError::into_error)?,
        );
    }

    service
        .execute(query::booking::ById::by(booking_id))
        .await
        .map_err(AsError::into_error)?
        .ok_or_else(|| Error::not_found(&"booking not found"))
        .map(|booking| Json(booking.into()))
}

/// Parses a [`booking::Id`] out of a path segment.
fn parse_booking_id(id: &str) -> Result<booking::Id, Error> {
    id.parse()
        .map_err(|_| Error::validation(&"booking id is not a valid id"))
}

/// Parses a [`booking::Status`] out of its wire name.
fn parse_status(status: &str) -> Result<booking::Status, Error> {
    status.parse().map_err(|_| {
        Error::validation(
            &"status must be `pending`, `confirmed` or `cancelled`",
        )
    })
}

/// Parses a [`booking::PaymentStatus`] out of its wire name.
fn parse_payment_status(status: &str) -> Result<booking::PaymentStatus, Error> {
    status.parse().map_err(|_| {
        Error::validation(
            &"paymentStatus must be `unpaid`, `partially_paid`, `paid` or \
              `refunded`",
        )
    })
}

/// Wraps a [`Decimal`] amount as USD [`Money`].
///
/// [`Money`]: common::Money
fn usd(amount: Decimal) -> common::Money {
    common::Money {
        amount,
        currency: common::money::Currency::Usd,
    }
}

/// Wraps a [`Decimal`] amount as KES [`Money`].
///
/// [`Money`]: common::Money
fn kes(amount: Decimal) -> common::Money {
    common::Money {
        amount,
        currency: common::money::Currency::Kes,
    }
}

impl AsError for command::create_booking::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::AccommodationNotApplicable
            | Self::NonEntryPaymentStatus(_)
            | Self::Quote(_) => Some(Error::validation(&self)),
            Self::Db(e) => e.try_as_error(),
            Self::ItemNotExists(_) | Self::UserNotExists(_) => {
                Some(Error::not_found(&self))
            }
            Self::UserResolutionFailed => None,
        }
    }
}

impl AsError for command::transition_booking_status::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::BookingNotExists(_) => Some(Error::not_found(&self)),
            Self::Db(e) => e.try_as_error(),
            Self::InvalidTransition(_) => {
                Some(Error::invalid_transition(&self))
            }
            Self::LostRace(_) => Some(Error::conflict(&self)),
        }
    }
}

impl AsError for command::transition_payment_status::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::BookingNotExists(_) => Some(Error::not_found(&self)),
            Self::Db(e) => e.try_as_error(),
            Self::InvalidTransition(_) => {
                Some(Error::invalid_transition(&self))
            }
            Self::LostRace(_) => Some(Error::conflict(&self)),
        }
    }
}

impl AsError for command::reschedule_booking::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::BookingNotExists(_) => Some(Error::not_found(&self)),
            Self::Db(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::reprice_booking::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::BookingNotExists(_) => Some(Error::not_found(&self)),
            Self::Db(e) => e.try_as_error(),
            Self::DepositExceedsTotal { .. }
            | Self::NegativeAmount(_)
            | Self::WrongCurrency { .. } => Some(Error::validation(&self)),
        }
    }
}

impl AsError for command::amend_booking::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::BookingNotExists(_) => Some(Error::not_found(&self)),
            Self::Db(e) => e.try_as_error(),
        }
    }
}
