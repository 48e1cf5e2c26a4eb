//! [`CatalogItem`]-related endpoints.
//!
//! [`CatalogItem`]: service::domain::CatalogItem

use axum::{extract::Path, Extension, Json};
use rust_decimal::Decimal;
use service::{domain::CatalogItem, query, Query as _};

use crate::{AsError, Error, Service};

/// `CatalogItem` of a response.
#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemResponse {
    /// ID of the item.
    pub id: String,

    /// Kind of the item: `attraction` or `safari`.
    pub kind: String,

    /// Title of the item.
    pub title: String,

    /// Per-adult USD price.
    #[serde(rename = "priceUSD")]
    pub price_usd: Decimal,

    /// Per-adult KES price.
    #[serde(rename = "priceKES")]
    pub price_kes: Decimal,

    /// Indicator whether the item is featured.
    pub is_featured: bool,
}

impl From<CatalogItem> for ItemResponse {
    fn from(item: CatalogItem) -> Self {
        Self {
            id: item.id.to_string(),
            kind: item.kind.to_string(),
            title: item.title.to_string(),
            price_usd: item.price_usd.amount,
            price_kes: item.price_kes.amount,
            is_featured: item.is_featured,
        }
    }
}

/// `GET /items/{id}`
///
/// Read-only catalog projection, available anonymously.
#[tracing::instrument(skip_all, fields(http.route = "GET /items/:id"))]
pub async fn find(
    Extension(service): Extension<Service>,
    Path(id): Path<String>,
) -> Result<Json<ItemResponse>, Error> {
    let item_id = id
        .parse()
        .map_err(|_| Error::validation(&"item id is not a valid id"))?;

    service
        .execute(query::catalog::ById::by(item_id))
        .await
        .map_err(AsError::into_error)?
        .ok_or_else(|| Error::not_found(&"item not found"))
        .map(|item| Json(item.into()))
}
