//! [`User`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select, Update};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{user, User},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

/// Columns selected for a [`User`] row.
const COLUMNS: &str = "\
    id, name, \
    email, phone, \
    role, password_hash, \
    created_at";

/// Restores a [`User`] from the provided `row`.
fn from_row(row: &Row) -> User {
    User {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        phone: row.get("phone"),
        role: row.get("role"),
        password_hash: row.get("password_hash"),
        created_at: row.get("created_at"),
    }
}

impl<C> Database<Select<By<Option<User>, user::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: user::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM users \
             WHERE id = $1::UUID \
             LIMIT 1",
        );
        Ok(self
            .query_opt(&sql, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<'e, C> Database<Select<By<Option<User>, &'e user::Email>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, &'e user::Email>>,
    ) -> Result<Self::Ok, Self::Err> {
        let email = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM users \
             WHERE email = $1::VARCHAR \
             LIMIT 1",
        );
        Ok(self
            .query_opt(&sql, &[&email])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Insert<User>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(user): Insert<User>,
    ) -> Result<Self::Ok, Self::Err> {
        let User {
            id,
            name,
            email,
            phone,
            role,
            password_hash,
            created_at,
        } = user;

        // A lost insert race over the unique email is a no-op: the caller
        // re-reads to learn the winning row.
        const SQL: &str = "\
            INSERT INTO users (\
                id, name, \
                email, phone, \
                role, password_hash, \
                created_at\
            ) \
            VALUES (\
                $1::UUID, $2::VARCHAR, \
                $3::VARCHAR, $4::VARCHAR, \
                $5::INT2, $6::VARCHAR, \
                $7::TIMESTAMPTZ\
            ) \
            ON CONFLICT (email) DO NOTHING";
        self.exec(
            SQL,
            &[
                &id,
                &name,
                &email,
                &phone,
                &role,
                &password_hash,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Update<User>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(user): Update<User>,
    ) -> Result<Self::Ok, Self::Err> {
        let User {
            id,
            name,
            email,
            phone,
            role,
            password_hash,
            created_at: _,
        } = user;

        const SQL: &str = "\
            UPDATE users \
            SET name = $2::VARCHAR, \
                email = $3::VARCHAR, \
                phone = $4::VARCHAR, \
                role = $5::INT2, \
                password_hash = $6::VARCHAR \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id, &name, &email, &phone, &role, &password_hash])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
