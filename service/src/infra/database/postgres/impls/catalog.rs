//! [`CatalogItem`]-related [`Database`] implementations.

use common::{money::Currency, operations::{By, Select}, Money};
use tracerr::Traced;

use crate::{
    domain::{catalog, CatalogItem},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Select<By<Option<CatalogItem>, catalog::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<CatalogItem>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<CatalogItem>, catalog::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: catalog::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, kind, title, \
                   price_usd, price_kes, \
                   is_featured, created_at \
            FROM catalog_items \
            WHERE id = $1::UUID \
            LIMIT 1";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| CatalogItem {
                id: row.get("id"),
                kind: row.get("kind"),
                title: row.get("title"),
                price_usd: Money {
                    amount: row.get("price_usd"),
                    currency: Currency::Usd,
                },
                price_kes: Money {
                    amount: row.get("price_kes"),
                    currency: Currency::Kes,
                },
                is_featured: row.get("is_featured"),
                created_at: row.get("created_at"),
            }))
    }
}
