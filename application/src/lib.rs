//! Application provides the REST API for interacting with the [`Service`].

#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod api;
pub mod args;
pub mod config;
pub mod error;

use axum::{async_trait, extract::FromRequestParts};
use axum_extra::extract::cookie::CookieJar;
use service::{
    command::{self, Command as _},
    domain::user::{session, Session},
};
// Used in binary.
use axum_client_ip as _;
use refinery as _;
use tower_http as _;
use tracing_subscriber as _;

pub use self::{
    args::Args,
    config::Config,
    error::{AsError, Error},
};

/// [`Service`] with filled infrastructure dependencies.
///
/// [`Service`]: service::Service
pub type Service = service::Service<service::infra::Postgres>;

/// Name of the cookie carrying the [`session::Token`].
///
/// The cookie is HTTP-only and `SameSite=Lax`, so page scripts cannot read
/// it; the token value itself is never logged and never appears in a URL.
pub const AUTH_COOKIE: &str = "auth_token";

/// Extractor of the authorized [`Session`].
///
/// Rejects the request when no valid session cookie is presented.
#[derive(Clone, Copy, Debug)]
pub struct Auth(pub Session);

#[async_trait]
impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _: &S,
    ) -> Result<Self, Self::Rejection> {
        let service = service_of(parts)?;

        let jar = CookieJar::from_headers(&parts.headers);
        let Some(cookie) = jar.get(AUTH_COOKIE) else {
            return Err(AuthError::AuthorizationRequired.into());
        };

        #[expect(unsafe_code, reason = "cookie carries an opaque token")]
        let token =
            unsafe { session::Token::new_unchecked(cookie.value().to_owned()) };

        service
            .execute(command::AuthorizeUserSession { token })
            .await
            .map(Self)
            .map_err(AsError::into_error)
    }
}

/// Extractor of an optional [`Session`].
///
/// Resolves to [`None`] when no valid session cookie is presented, letting
/// anonymous browsing proceed. Only an unavailable backing store is reported
/// as an error.
#[derive(Clone, Copy, Debug)]
pub struct MaybeAuth(pub Option<Session>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeAuth
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _: &S,
    ) -> Result<Self, Self::Rejection> {
        use command::authorize_user_session::ExecutionError as E;

        let service = service_of(parts)?;

        let jar = CookieJar::from_headers(&parts.headers);
        let Some(cookie) = jar.get(AUTH_COOKIE) else {
            return Ok(Self(None));
        };

        #[expect(unsafe_code, reason = "cookie carries an opaque token")]
        let token =
            unsafe { session::Token::new_unchecked(cookie.value().to_owned()) };

        match service
            .execute(command::AuthorizeUserSession { token })
            .await
        {
            Ok(session) => Ok(Self(Some(session))),
            Err(e) => match e.as_ref() {
                E::Db(_) => Err(AsError::into_error(e)),
                E::JsonWebTokenDecodeError(_) | E::UserNotExists(_) => {
                    Ok(Self(None))
                }
            },
        }
    }
}

/// Returns the [`Service`] instance provided to the request.
fn service_of(parts: &http::request::Parts) -> Result<Service, Error> {
    parts
        .extensions
        .get::<Service>()
        .cloned()
        .ok_or_else(|| Error::internal(&"missing `Service` extension"))
}

impl AsError for command::authorize_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::JsonWebTokenDecodeError(_) | Self::UserNotExists(_) => {
                Some(AuthError::InvalidSession.into())
            }
        }
    }
}

crate::define_error! {
    enum AuthError {
        #[code = "AUTHORIZATION_REQUIRED"]
        #[status = UNAUTHORIZED]
        #[message = "Authorization required"]
        AuthorizationRequired,

        #[code = "INVALID_SESSION"]
        #[status = UNAUTHORIZED]
        #[message = "Session is invalid or expired"]
        InvalidSession,

        #[code = "FORBIDDEN"]
        #[status = FORBIDDEN]
        #[message = "Insufficient permissions"]
        Forbidden,
    }
}
