//! [`Command`] for authorizing a [`User`].

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use jsonwebtoken::Validation;
use tracerr::Traced;

use crate::{
    domain::{
        user::{self, session, Session},
        User,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for authorizing a [`User`].
///
/// Verifies the signature and expiry of the provided [`session::Token`] and
/// confirms the [`User`] it was issued to still exists. Any forged,
/// malformed or expired token fails with a recoverable error, never a
/// different identity.
#[derive(Clone, Debug, From)]
pub struct AuthorizeUserSession {
    /// [`Session`] token to authorize.
    pub token: session::Token,
}

impl<Db> Command<AuthorizeUserSession> for Service<Db>
where
    Db: Database<
        Select<By<Option<User>, user::Id>>,
        Ok = Option<User>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Session;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AuthorizeUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AuthorizeUserSession { token } = cmd;

        let session = jsonwebtoken::decode::<Session>(
            token.as_ref(),
            &self.config.jwt_decoding_key,
            &Validation::default(),
        )
        .map_err(tracerr::from_and_wrap!(=> E))?
        .claims;

        drop(
            self.database()
                .execute(Select(By::new(session.user_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or_else(|| E::UserNotExists(session.user_id))
                .map_err(tracerr::wrap!())?,
        );

        Ok(session)
    }
}

/// Error of [`AuthorizeUserSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`jsonwebtoken`] decoding error.
    #[display("Failed to decode a JSON Web Token: {_0}")]
    JsonWebTokenDecodeError(jsonwebtoken::errors::Error),

    /// [`User`] the [`Session`] belongs to does not exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use common::Handler as _;
    use secrecy::SecretBox;

    use crate::{command::CreateUserSession, testing, Service};

    use super::{AuthorizeUserSession, ExecutionError};

    #[tokio::test]
    async fn authorizes_a_freshly_issued_token() {
        let user = testing::registered_user("jane@example.com");
        let user_id = user.id;
        let db = testing::StubDb::default().with_user(user);
        let service = Service::new(testing::config(), db);

        let output = service
            .execute(CreateUserSession::ByCredentials {
                email: "jane@example.com".parse().unwrap(),
                password: SecretBox::init_with(|| "hunter22".into()),
            })
            .await
            .unwrap();

        let session = service
            .execute(AuthorizeUserSession {
                token: output.token,
            })
            .await
            .unwrap();
        assert_eq!(session.user_id, user_id);
    }

    #[tokio::test]
    async fn rejects_a_token_of_an_unknown_user() {
        let user = testing::registered_user("jane@example.com");
        let db = testing::StubDb::default().with_user(user.clone());
        let service = Service::new(testing::config(), db);

        let output = service
            .execute(CreateUserSession::ByUserId(user.id))
            .await
            .unwrap();

        // The same token against a store that no longer has the user.
        let service =
            Service::new(testing::config(), testing::StubDb::default());
        let err = service
            .execute(AuthorizeUserSession {
                token: output.token,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::UserNotExists(_)));
    }

    #[tokio::test]
    async fn rejects_garbage_tokens() {
        let db = testing::StubDb::default();
        let service = Service::new(testing::config(), db);

        let err = service
            .execute(AuthorizeUserSession {
                token: "not-a-jwt".parse().unwrap(),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::JsonWebTokenDecodeError(_),
        ));
    }
}
