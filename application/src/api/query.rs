//! GraphQL [`Query`]s definitions.

use common::DateTime;
use juniper::graphql_object;
use service::{query, read, Query as _};

use crate::{api, define_error, AsError, Context, Error};

/// Root of all GraphQL queries.
#[derive(Clone, Copy, Debug)]
pub struct Query;

impl Query {
    /// Name of the [`tracing::Span`] for the queries.
    pub(crate) const SPAN_NAME: &'static str = "GraphQL query";
}

#[graphql_object(context = Context)]
impl Query {
    /// Returns the currently authenticated `User`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - the request is not authenticated.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "myUser",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn my_user(ctx: &Context) -> Result<api::User, Error> {
        let my_id = ctx.current_session().await?.user_id;
        ctx.service()
            .execute(query::user::ById::by(my_id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| UserError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Searches `Listing`s free for the provided dates and matching the
    /// provided criteria, newest first.
    ///
    /// `destination` is looked up case-insensitively in the city, country,
    /// title and description of a `Listing`. `startDate` and `endDate` must
    /// be provided together.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVALID_SEARCH` - the search criteria are inconsistent.
    #[tracing::instrument(
        skip_all,
        fields(
            destination = ?destination,
            end_date = ?end_date,
            gql.name = "listings",
            guests = ?guests,
            otel.name = Self::SPAN_NAME,
            start_date = ?start_date,
        ),
    )]
    pub async fn listings(
        destination: Option<String>,
        start_date: Option<DateTime>,
        end_date: Option<DateTime>,
        guests: Option<i32>,
        ctx: &Context,
    ) -> Result<Vec<api::listing::search::Item>, Error> {
        let filter = read::listing::search::Filter::new(
            destination.as_deref(),
            start_date.map(DateTime::coerce),
            end_date.map(DateTime::coerce),
            guests,
        )
        .map_err(AsError::into_error)
        .map_err(ctx.error())?;

        ctx.service()
            .execute(query::listings::Search::by(filter))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|items| items.into_iter().map(Into::into).collect())
    }

    /// Returns the most recently published `Listing`s.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVALID_LIMIT` - the `limit` is not within `1..=100`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "recentListings",
            limit = ?limit,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn recent_listings(
        limit: Option<i32>,
        ctx: &Context,
    ) -> Result<Vec<api::listing::search::Item>, Error> {
        let recent = limit
            .map(|l| {
                read::listing::Recent::new(l)
                    .ok_or_else(|| ListingError::InvalidLimit.into())
            })
            .transpose()
            .map_err(ctx.error())?
            .unwrap_or_default();

        ctx.service()
            .execute(query::listings::Recent::by(recent))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|items| items.into_iter().map(Into::into).collect())
    }

    /// Returns the `Listing`s hosted by the authenticated `User`, newest
    /// first.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - the request is not authenticated.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "hostListings",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn host_listings(
        ctx: &Context,
    ) -> Result<Vec<api::listing::hosted::Item>, Error> {
        let session = ctx.current_session().await?;
        if !session.role.can_host() {
            return Ok(vec![]);
        }

        ctx.service()
            .execute(query::listings::Hosted::by(session.user_id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|items| items.into_iter().map(Into::into).collect())
    }

    /// Returns the `Listing` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `LISTING_NOT_EXISTS` - the `Listing` with the specified ID does not
    ///                          exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "listing",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn listing(
        id: api::listing::Id,
        ctx: &Context,
    ) -> Result<api::Listing, Error> {
        ctx.service()
            .execute(query::listing::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| ListingError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }
}

impl AsError for read::listing::search::FilterError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "INVALID_SEARCH"]
                #[status = BAD_REQUEST]
                #[message = "`startDate` and `endDate` must be provided \
                             together"]
                IncompleteStay,

                #[code = "INVALID_SEARCH"]
                #[status = BAD_REQUEST]
                #[message = "`endDate` must be after `startDate`"]
                EmptyStay,

                #[code = "INVALID_SEARCH"]
                #[status = BAD_REQUEST]
                #[message = "`guests` must be a positive integer"]
                InvalidGuests,

                #[code = "INVALID_SEARCH"]
                #[status = BAD_REQUEST]
                #[message = "`destination` is too long"]
                DestinationTooLong,
            }
        }

        Some(match self {
            Self::MissingEnd | Self::MissingStart => {
                Error::IncompleteStay.into()
            }
            Self::EmptyStay => Error::EmptyStay.into(),
            Self::InvalidGuests => Error::InvalidGuests.into(),
            Self::DestinationTooLong => Error::DestinationTooLong.into(),
        })
    }
}

define_error! {
    enum ListingError {
        #[code = "LISTING_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Listing` with the specified ID does not exist"]
        NotExists,

        #[code = "INVALID_LIMIT"]
        #[status = BAD_REQUEST]
        #[message = "`limit` must be within `1..=100`"]
        InvalidLimit,
    }
}

define_error! {
    enum UserError {
        #[code = "USER_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`User` with the specified ID does not exist"]
        NotExists,
    }
}

#[cfg(test)]
mod spec {
    use service::read::listing::search::FilterError;

    use crate::AsError as _;

    #[test]
    fn maps_search_errors_to_bad_request() {
        for err in [
            FilterError::MissingEnd,
            FilterError::MissingStart,
            FilterError::EmptyStay,
            FilterError::InvalidGuests,
            FilterError::DestinationTooLong,
        ] {
            let err = err.as_error();

            assert_eq!(err.code, "INVALID_SEARCH");
            assert_eq!(err.status_code, http::StatusCode::BAD_REQUEST);
        }
    }
}
