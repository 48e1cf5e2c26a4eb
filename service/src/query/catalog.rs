//! [`Query`] collection related to [`CatalogItem`]s.

use common::operations::By;

use crate::domain::{catalog, CatalogItem};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`CatalogItem`] by its [`catalog::Id`].
pub type ById = DatabaseQuery<By<Option<CatalogItem>, catalog::Id>>;
