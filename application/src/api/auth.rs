//! Identity lifecycle endpoints.

use axum::{Extension, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use common::DateTime;
use http::StatusCode;
use secrecy::SecretBox;
use service::{
    command::{self, Command as _},
    domain::{
        user::{self, session},
        User,
    },
};

use crate::{define_error, AsError, Error, Service, AUTH_COOKIE};

/// Body of a [`register`] request.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Display name of the new user.
    pub name: String,

    /// Unique email address of the new user.
    pub email: String,

    /// Contact phone number of the new user.
    pub phone: Option<String>,

    /// Password of the new user.
    pub password: String,
}

/// Body of a [`login`] request.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Email address to log in with.
    pub email: String,

    /// Password to log in with.
    pub password: String,
}

/// `User` of an authentication response.
#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    /// ID of the user.
    pub id: String,

    /// Display name of the user.
    pub name: String,

    /// Email address of the user.
    pub email: String,

    /// Contact phone number of the user, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// Role of the user.
    pub role: String,

    /// [RFC 3339] timestamp of the user creation.
    ///
    /// [RFC 3339]: https://tools.ietf.org/html/rfc3339
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name.to_string(),
            email: user.email.to_string(),
            phone: user.phone.map(|p| p.to_string()),
            role: user.role.to_string(),
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// `POST /auth/register`
///
/// Creates a new customer account and logs it in right away.
#[tracing::instrument(skip_all, fields(http.route = "/auth/register"))]
pub async fn register(
    Extension(service): Extension<Service>,
    jar: CookieJar,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, CookieJar, Json<UserResponse>), Error> {
    let RegisterRequest {
        name,
        email,
        phone,
        password,
    } = req;

    let name = name
        .parse::<user::Name>()
        .map_err(|_| Error::validation(&"name must not be empty"))?;
    let email = email
        .parse::<user::Email>()
        .map_err(|_| Error::validation(&"email is not a valid address"))?;
    let phone = phone
        .map(|p| {
            p.parse::<user::Phone>().map_err(|_| {
                Error::validation(&"phone is not a valid number")
            })
        })
        .transpose()?;
    let password = password.parse::<user::Password>().map_err(|_| {
        Error::validation(&"password must be between 2 and 128 characters")
    })?;

    let user = service
        .execute(command::CreateUser {
            name,
            email,
            password: SecretBox::init_with(move || password),
            phone,
        })
        .await
        .map_err(AsError::into_error)?;

    let output = service
        .execute(command::CreateUserSession::ByUserId(user.id))
        .await
        .map_err(AsError::into_error)?;

    Ok((
        StatusCode::CREATED,
        jar.add(session_cookie(&output.token, output.expires_at)),
        Json(output.user.into()),
    ))
}

/// `POST /auth/login`
///
/// Issues a new session for the provided credentials.
#[tracing::instrument(skip_all, fields(http.route = "/auth/login"))]
pub async fn login(
    Extension(service): Extension<Service>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<UserResponse>), Error> {
    let LoginRequest { email, password } = req;

    // Malformed credentials get the very same generic error as wrong ones:
    // no way to probe which emails are on file.
    let email = email
        .parse::<user::Email>()
        .map_err(|_| Error::from(LoginError::InvalidCredentials))?;
    let password = password
        .parse::<user::Password>()
        .map_err(|_| Error::from(LoginError::InvalidCredentials))?;

    let output = service
        .execute(command::CreateUserSession::ByCredentials {
            email,
            password: SecretBox::init_with(move || password),
        })
        .await
        .map_err(AsError::into_error)?;

    Ok((
        jar.add(session_cookie(&output.token, output.expires_at)),
        Json(output.user.into()),
    ))
}

/// `POST /auth/logout`
///
/// Drops the session cookie. Stateless tokens cannot be revoked server-side,
/// so the remaining validity window is bounded by the 7-day expiry.
#[tracing::instrument(skip_all, fields(http.route = "/auth/logout"))]
pub async fn logout(jar: CookieJar) -> (StatusCode, CookieJar) {
    let removal = Cookie::build((AUTH_COOKIE, "")).path("/").build();
    (StatusCode::NO_CONTENT, jar.remove(removal))
}

/// Builds the session [`Cookie`] carrying the provided [`session::Token`].
fn session_cookie(
    token: &session::Token,
    expires_at: session::ExpirationDateTime,
) -> Cookie<'static> {
    let ttl = expires_at.coerce::<()>() - DateTime::now();

    Cookie::build((AUTH_COOKIE, token.to_string()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(ttl.try_into().unwrap_or(time::Duration::ZERO))
        .build()
}

impl AsError for command::create_user::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::EmailOccupied(_) => Some(Error {
                code: "EMAIL_OCCUPIED",
                status_code: StatusCode::CONFLICT,
                message: self.to_string(),
                backtrace: None,
            }),
        }
    }
}

impl AsError for command::create_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::JsonWebTokenEncodeError(_) | Self::UserNotExists(_) => None,
            Self::WrongCredentials => {
                Some(LoginError::InvalidCredentials.into())
            }
        }
    }
}

define_error! {
    enum LoginError {
        #[code = "INVALID_CREDENTIALS"]
        #[status = UNAUTHORIZED]
        #[message = "Invalid email or password"]
        InvalidCredentials,
    }
}
