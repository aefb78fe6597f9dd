//! [`Query`] collection related to a single [`Listing`].

use common::operations::By;

use crate::domain::{listing, Listing};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`Listing`] by its [`listing::Id`].
pub type ById = DatabaseQuery<By<Option<Listing>, listing::Id>>;

/// Queries all [`listing::Photo`]s of a [`Listing`], ordered by position.
pub type Photos = DatabaseQuery<By<Vec<listing::Photo>, listing::Id>>;

/// Queries the [`listing::Availability`] of a [`Listing`].
pub type Availability =
    DatabaseQuery<By<Option<listing::Availability>, listing::Id>>;
