//! [`Command`] for creating a new [`User`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret, SecretBox};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::user::{Email, Name, Password, Phone};
use crate::{
    domain::{user, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`User`].
///
/// An [`Email`] already on file as an implicitly created booking [`User`]
/// (one without a password) is claimed by the registration instead of being
/// rejected; an [`Email`] backed by a password is occupied.
#[derive(Clone, Debug)]
pub struct CreateUser {
    /// [`Name`] of a new [`User`].
    pub name: user::Name,

    /// [`Email`] of a new [`User`].
    pub email: user::Email,

    /// [`Password`] of a new [`User`].
    pub password: SecretBox<user::Password>,

    /// [`Phone`] of a new [`User`].
    pub phone: Option<user::Phone>,
}

impl<Db> Command<CreateUser> for Service<Db>
where
    Db: for<'e> Database<
            Select<By<Option<User>, &'e user::Email>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<User>, Err = Traced<database::Error>>
        + Database<Update<User>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = User;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateUser) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateUser {
            name,
            email,
            password,
            phone,
        } = cmd;

        let existing = self
            .database()
            .execute(Select(By::new(&email)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let password_hash =
            Some(user::PasswordHash::new(password.expose_secret()));

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let user = match existing {
            Some(u) if u.password_hash.is_some() => {
                return Err(tracerr::new!(E::EmailOccupied(email)));
            }
            Some(u) => {
                // Claim the implicitly created booking account.
                let user = User {
                    name,
                    phone,
                    password_hash,
                    ..u
                };
                tx.execute(Update(user.clone()))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))
                    .map(drop)?;
                user
            }
            None => {
                let user = User {
                    id: user::Id::new(),
                    name,
                    email,
                    phone,
                    role: user::Role::Customer,
                    password_hash,
                    created_at: DateTime::now().coerce(),
                };
                tx.execute(Insert(user.clone()))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))
                    .map(drop)?;
                user
            }
        };

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(user)
    }
}

/// Error of [`CreateUser`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`user::Email`] is already occupied.
    #[display("`{_0}` email is occupied")]
    EmailOccupied(#[error(not(source))] user::Email),
}

#[cfg(test)]
mod spec {
    use common::Handler as _;
    use secrecy::SecretBox;

    use crate::{domain::user, testing, Service};

    use super::{CreateUser, ExecutionError};

    fn cmd(email: &str) -> CreateUser {
        CreateUser {
            name: "Jane Doe".parse().unwrap(),
            email: email.parse().unwrap(),
            password: SecretBox::init_with(|| "hunter22".into()),
            phone: None,
        }
    }

    #[tokio::test]
    async fn registers_a_customer() {
        let db = testing::StubDb::default();
        let service = Service::new(testing::config(), db);

        let created = service.execute(cmd("jane@example.com")).await.unwrap();

        assert_eq!(created.role, user::Role::Customer);
        assert!(created.password_hash.is_some());
    }

    #[tokio::test]
    async fn rejects_an_occupied_email() {
        let db = testing::StubDb::default()
            .with_user(testing::registered_user("jane@example.com"));
        let service = Service::new(testing::config(), db);

        let err = service
            .execute(cmd("jane@example.com"))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::EmailOccupied(_)));
    }

    #[tokio::test]
    async fn claims_an_implicit_booking_account() {
        let implicit = testing::implicit_user("jane@example.com");
        let implicit_id = implicit.id;
        let db = testing::StubDb::default().with_user(implicit);
        let service = Service::new(testing::config(), db.clone());

        let claimed = service.execute(cmd("jane@example.com")).await.unwrap();

        // Same account, now with credentials: no duplicate is created.
        assert_eq!(claimed.id, implicit_id);
        assert!(claimed.password_hash.is_some());
        assert_eq!(db.users().len(), 1);
    }
}
