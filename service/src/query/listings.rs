//! [`Query`] collection related to multiple [`Listing`]s.

use common::operations::By;

#[cfg(doc)]
use crate::{domain::Listing, Query};
use crate::{domain::user, read};

use super::DatabaseQuery;

/// Searches [`Listing`]s satisfying a [`read::listing::search::Filter`],
/// newest first.
pub type Search = DatabaseQuery<
    By<Vec<read::listing::search::Item>, read::listing::search::Filter>,
>;

/// Queries the most recently created [`Listing`]s.
pub type Recent =
    DatabaseQuery<By<Vec<read::listing::search::Item>, read::listing::Recent>>;

/// Queries [`Listing`]s hosted by a [`user::Id`], newest first.
pub type Hosted =
    DatabaseQuery<By<Vec<read::listing::hosted::Item>, user::Id>>;
