//! [`Booking`]-related [`Database`] implementations.

use common::{
    money::Currency,
    operations::{By, Insert, Select, Update},
    Money,
};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{
        booking::{self, PaymentTransition, StatusTransition},
        user, Booking,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

/// Columns selected for a [`Booking`] row.
const COLUMNS: &str = "\
    id, user_id, \
    item_id, booking_type, \
    travel_date, adults, children, accommodation_type, \
    total_price_usd, total_price_kes, \
    deposit_amount, deposit_paid, \
    status, payment_status, \
    special_requests, booking_date";

/// Restores a [`Booking`] from the provided `row`.
fn from_row(row: &Row) -> Booking {
    Booking {
        id: row.get("id"),
        user_id: row.get("user_id"),
        item_id: row.get("item_id"),
        item_kind: row.get("booking_type"),
        travel_date: row.get("travel_date"),
        adults: row.get("adults"),
        children: row.get("children"),
        accommodation: row.get("accommodation_type"),
        total_usd: Money {
            amount: row.get("total_price_usd"),
            currency: Currency::Usd,
        },
        total_kes: Money {
            amount: row.get("total_price_kes"),
            currency: Currency::Kes,
        },
        deposit: Money {
            amount: row.get("deposit_amount"),
            currency: Currency::Usd,
        },
        deposit_paid: row.get("deposit_paid"),
        status: row.get("status"),
        payment_status: row.get("payment_status"),
        special_requests: row.get("special_requests"),
        created_at: row.get("booking_date"),
    }
}

impl<C> Database<Select<By<Option<Booking>, booking::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Booking>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Booking>, booking::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: booking::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM bookings \
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

impl<C> Database<Select<By<Vec<Booking>, user::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Booking>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Booking>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let user_id: user::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM bookings \
             WHERE user_id = $1::UUID \
             ORDER BY booking_date DESC",
        );
        Ok(self
            .query(&sql, &[&user_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Insert<Booking>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(booking): Insert<Booking>,
    ) -> Result<Self::Ok, Self::Err> {
        let Booking {
            id,
            user_id,
            item_id,
            item_kind,
            travel_date,
            adults,
            children,
            accommodation,
            total_usd,
            total_kes,
            deposit,
            deposit_paid,
            status,
            payment_status,
            special_requests,
            created_at,
        } = booking;

        const SQL: &str = "\
            INSERT INTO bookings (\
                id, user_id, \
                item_id, booking_type, \
                travel_date, adults, children, accommodation_type, \
                total_price_usd, total_price_kes, \
                deposit_amount, deposit_paid, \
                status, payment_status, \
                special_requests, booking_date\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, \
                $3::UUID, $4::INT2, \
                $5::TIMESTAMPTZ, $6::INT2, $7::INT2, $8::INT2, \
                $9::NUMERIC, $10::NUMERIC, \
                $11::NUMERIC, $12::BOOL, \
                $13::INT2, $14::INT2, \
                $15::VARCHAR, $16::TIMESTAMPTZ\
            )";
        self.exec(
            SQL,
            &[
                &id,
                &user_id,
                &item_id,
                &item_kind,
                &travel_date,
                &adults,
                &children,
                &accommodation,
                &total_usd.amount,
                &total_kes.amount,
                &deposit.amount,
                &deposit_paid,
                &status,
                &payment_status,
                &special_requests,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Update<Booking>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(booking): Update<Booking>,
    ) -> Result<Self::Ok, Self::Err> {
        let Booking {
            id,
            user_id: _,
            item_id: _,
            item_kind: _,
            travel_date,
            adults: _,
            children: _,
            accommodation: _,
            total_usd,
            total_kes,
            deposit,
            deposit_paid,
            status: _,
            payment_status: _,
            special_requests,
            created_at: _,
        } = booking;

        // Status columns are deliberately absent: those only ever change
        // through the guarded transition updates below.
        const SQL: &str = "\
            UPDATE bookings \
            SET travel_date = $2::TIMESTAMPTZ, \
                total_price_usd = $3::NUMERIC, \
                total_price_kes = $4::NUMERIC, \
                deposit_amount = $5::NUMERIC, \
                deposit_paid = $6::BOOL, \
                special_requests = $7::VARCHAR \
            WHERE id = $1::UUID";
        self.exec(
            SQL,
            &[
                &id,
                &travel_date,
                &total_usd.amount,
                &total_kes.amount,
                &deposit.amount,
                &deposit_paid,
                &special_requests,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Update<StatusTransition>> for Postgres<C>
where
    C: Connection,
{
    type Ok = u64;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(t): Update<StatusTransition>,
    ) -> Result<Self::Ok, Self::Err> {
        let StatusTransition {
            booking_id,
            from,
            to,
        } = t;

        // The `status` predicate makes the write a compare-and-set: of two
        // concurrent transitions from the same assumed state, only one can
        // match, and the loser observes zero affected rows.
        const SQL: &str = "\
            UPDATE bookings \
            SET status = $3::INT2 \
            WHERE id = $1::UUID \
              AND status = $2::INT2";
        self.exec(SQL, &[&booking_id, &from, &to])
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<PaymentTransition>> for Postgres<C>
where
    C: Connection,
{
    type Ok = u64;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(t): Update<PaymentTransition>,
    ) -> Result<Self::Ok, Self::Err> {
        let PaymentTransition {
            booking_id,
            from,
            to,
        } = t;

        // Same compare-and-set discipline as for the fulfillment status.
        const SQL: &str = "\
            UPDATE bookings \
            SET payment_status = $3::INT2 \
            WHERE id = $1::UUID \
              AND payment_status = $2::INT2";
        self.exec(SQL, &[&booking_id, &from, &to])
            .await
            .map_err(tracerr::wrap!())
    }
}
