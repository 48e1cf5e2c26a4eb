//! [`Session`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::DateTimeOf;
use derive_more::{AsRef, Display, FromStr};
use serde::{Deserialize, Serialize};

#[cfg(doc)]
use crate::domain::User;
use crate::domain::user;

/// User session carried by a signed token.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct Session {
    /// ID of the [`User`] this [`Session`] belongs to.
    #[serde(rename = "sub")]
    pub user_id: user::Id,

    /// [`user::Role`] of the [`User`] at the moment of issuance.
    #[serde(with = "role_name")]
    pub role: user::Role,

    /// [`DateTime`] when this [`Session`] was issued.
    #[serde(rename = "iat", with = "common::datetime::serde::unix_timestamp")]
    pub issued_at: IssueDateTime,

    /// [`DateTime`] when this [`Session`] expires.
    #[serde(rename = "exp", with = "common::datetime::serde::unix_timestamp")]
    pub expires_at: ExpirationDateTime,
}

/// Access token of a [`Session`].
#[derive(AsRef, Clone, Debug, Display, FromStr)]
pub struct Token(String);

impl Token {
    /// Creates a new [`Token`] without checking its contents.
    ///
    /// # Safety
    ///
    /// The provided `token` must be a valid [`Token`] representation.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub const unsafe fn new_unchecked(token: String) -> Self {
        Self(token)
    }
}

/// Marker type indicating [`Session`] issuance.
#[derive(Clone, Copy, Debug)]
pub struct Issuance;

/// Marker type indicating [`Session`] expiration.
#[derive(Clone, Copy, Debug)]
pub struct Expiration;

/// [`DateTime`] of a [`Session`] issuance.
pub type IssueDateTime = DateTimeOf<(Session, Issuance)>;

/// [`DateTime`] of a [`Session`] expiration.
pub type ExpirationDateTime = DateTimeOf<(Session, Expiration)>;

mod role_name {
    //! Serialization of a [`user::Role`] by its snake_case name.

    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    use crate::domain::user;

    /// Serializes the [`user::Role`] as its name.
    ///
    /// # Errors
    ///
    /// Never errors by itself.
    pub(super) fn serialize<S>(
        role: &user::Role,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&role.to_string())
    }

    /// Deserializes a [`user::Role`] from its name.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a known [`user::Role`] name.
    pub(super) fn deserialize<'de, D>(
        deserializer: D,
    ) -> Result<user::Role, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer)?
            .parse()
            .map_err(|_| Error::custom("unknown `Role` name"))
    }
}

#[cfg(test)]
mod spec {
    use common::DateTime;
    use jsonwebtoken::{
        errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation,
    };

    use crate::domain::user;

    use super::Session;

    const SECRET: &[u8] = b"test-secret";

    /// Creates claims expiring in `expires_in_secs` seconds (negative for
    /// already expired ones), with whole-second precision matching the wire
    /// format.
    fn session(expires_in_secs: i64) -> Session {
        let now = DateTime::now().unix_timestamp();
        Session {
            user_id: user::Id::new(),
            role: user::Role::Customer,
            issued_at: DateTime::from_unix_timestamp(now).unwrap().coerce(),
            expires_at: DateTime::from_unix_timestamp(now + expires_in_secs)
                .unwrap()
                .coerce(),
        }
    }

    fn encode(session: &Session) -> String {
        jsonwebtoken::encode(
            &Header::default(),
            session,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap()
    }

    fn decode(token: &str) -> jsonwebtoken::errors::Result<Session> {
        jsonwebtoken::decode::<Session>(
            token,
            &DecodingKey::from_secret(SECRET),
            &Validation::default(),
        )
        .map(|data| data.claims)
    }

    #[test]
    fn roundtrips() {
        let session = session(7 * 24 * 60 * 60);
        let decoded = decode(&encode(&session)).unwrap();

        assert_eq!(decoded.user_id, session.user_id);
        assert_eq!(decoded.role, session.role);
        assert_eq!(decoded.issued_at, session.issued_at);
        assert_eq!(decoded.expires_at, session.expires_at);
    }

    #[test]
    fn rejects_expired_token() {
        // An hour past expiry, well beyond any validation leeway.
        let session = session(-60 * 60);
        let token = encode(&session);

        let err = decode(&token).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ExpiredSignature));
    }

    #[test]
    fn rejects_tampered_token() {
        let session = session(60 * 60);
        let token = encode(&session);

        // Flip a single character of every position in turn: none of the
        // results may verify as any identity.
        for (i, c) in token.char_indices() {
            if c == '.' {
                continue;
            }
            let mut tampered = String::with_capacity(token.len());
            tampered.push_str(&token[..i]);
            tampered.push(if c == 'A' { 'B' } else { 'A' });
            tampered.push_str(&token[i + c.len_utf8()..]);
            if tampered == token {
                continue;
            }

            assert!(
                decode(&tampered).is_err(),
                "tampered token at position {i} verified",
            );
        }
    }
}
