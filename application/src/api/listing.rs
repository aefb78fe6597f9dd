//! [`Listing`]-related definitions.

use common::{DateTime, Money};
use derive_more::{AsRef, Display, From, Into};
use futures::{future, TryFutureExt as _};
use juniper::{graphql_object, GraphQLObject, GraphQLScalar};
use service::{domain, query, read, Query as _};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{
    api::{self, scalar},
    AsError, Context, Error,
};

/// A stay offered by a host.
#[derive(Clone, Debug)]
pub struct Listing {
    /// ID of this [`Listing`].
    id: Id,

    /// Underlying [`domain::Listing`].
    listing: OnceCell<domain::Listing>,
}

impl From<domain::Listing> for Listing {
    fn from(listing: domain::Listing) -> Self {
        Self {
            id: listing.id.into(),
            listing: OnceCell::new_with(Some(listing)),
        }
    }
}

impl Listing {
    /// Creates a new [`Listing`] with the provided ID.
    ///
    /// # Safety
    ///
    /// Caller must ensure that [`Listing`] with the provided ID exists,
    /// otherwise accessing this [`Listing`] will result with an error.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            listing: OnceCell::new(),
        }
    }

    /// Returns the underlying [`domain::Listing`].
    ///
    /// # Errors
    ///
    /// Errors if the [`domain::Listing`] doesn't exist.
    async fn listing(&self, ctx: &Context) -> Result<&domain::Listing, Error> {
        let id = self.id.into();
        self.listing
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::listing::ById::by(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .and_then(|l| {
                        future::ready(l.ok_or_else(|| {
                            api::query::ListingError::NotExists.into()
                        }))
                    })
            })
            .await
    }
}

/// A stay offered by a host.
#[graphql_object(context = Context)]
impl Listing {
    /// Unique identifier of this `Listing`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Listing.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Title of this `Listing`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Listing.title",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn title(&self, ctx: &Context) -> Result<Title, Error> {
        Ok(self.listing(ctx).await?.title.clone().into())
    }

    /// Description of this `Listing`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Listing.description",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn description(
        &self,
        ctx: &Context,
    ) -> Result<Description, Error> {
        Ok(self.listing(ctx).await?.description.clone().into())
    }

    /// Kind of the property, like "Apartment" or "Villa".
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Listing.kind",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn kind(&self, ctx: &Context) -> Result<Kind, Error> {
        Ok(self.listing(ctx).await?.kind.clone().into())
    }

    /// Price of a single night in this `Listing`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Listing.price",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn price(&self, ctx: &Context) -> Result<Money, Error> {
        Ok(self.listing(ctx).await?.price)
    }

    /// Street address of this `Listing`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Listing.address",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn address(&self, ctx: &Context) -> Result<Address, Error> {
        Ok(self.listing(ctx).await?.address.clone().into())
    }

    /// City of this `Listing`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Listing.city",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn city(&self, ctx: &Context) -> Result<City, Error> {
        Ok(self.listing(ctx).await?.city.clone().into())
    }

    /// Country of this `Listing`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Listing.country",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn country(&self, ctx: &Context) -> Result<Country, Error> {
        Ok(self.listing(ctx).await?.country.clone().into())
    }

    /// Amenities provided by this `Listing`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Listing.amenities",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn amenities(&self, ctx: &Context) -> Result<Vec<Amenity>, Error> {
        Ok(self
            .listing(ctx)
            .await?
            .amenities
            .iter()
            .cloned()
            .map(Into::into)
            .collect())
    }

    /// Maximum number of guests this `Listing` accommodates.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Listing.maxGuests",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn max_guests(&self, ctx: &Context) -> Result<i32, Error> {
        Ok(u16::from(self.listing(ctx).await?.max_guests).into())
    }

    /// Number of bedrooms in this `Listing`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Listing.bedrooms",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn bedrooms(&self, ctx: &Context) -> Result<i32, Error> {
        Ok(self.listing(ctx).await?.bedrooms.into())
    }

    /// Number of bathrooms in this `Listing`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Listing.bathrooms",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn bathrooms(&self, ctx: &Context) -> Result<i32, Error> {
        Ok(self.listing(ctx).await?.bathrooms.into())
    }

    /// Public profile of the host of this `Listing`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Listing.host",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn host(
        &self,
        ctx: &Context,
    ) -> Result<api::user::Profile, Error> {
        let host_id = self.listing(ctx).await?.host_id;
        ctx.service()
            .execute(query::user::ById::by(host_id))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| api::query::UserError::NotExists.into())
            .map_err(ctx.error())
            .map(|host| read::user::Public::from(&host).into())
    }

    /// Photos of this `Listing` in their display order.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Listing.photos",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn photos(&self, ctx: &Context) -> Result<Vec<Photo>, Error> {
        ctx.service()
            .execute(query::listing::Photos::by(self.id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|photos| photos.into_iter().map(Into::into).collect())
    }

    /// Period this `Listing` is offered for, as declared by its host.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Listing.availability",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn availability(
        &self,
        ctx: &Context,
    ) -> Result<Option<Availability>, Error> {
        ctx.service()
            .execute(query::listing::Availability::by(self.id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|a| a.map(Into::into))
    }

    /// `DateTime` when this `Listing` was published.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Listing.createdAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn created_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.listing(ctx).await?.created_at.coerce())
    }
}

/// Photo of a `Listing`.
#[derive(Clone, Debug, GraphQLObject)]
#[graphql(name = "ListingPhoto")]
pub struct Photo {
    /// URL of the already uploaded image.
    pub url: PhotoUrl,

    /// Position of this `ListingPhoto` among the others, starting from zero.
    pub position: i32,
}

impl From<domain::listing::Photo> for Photo {
    fn from(photo: domain::listing::Photo) -> Self {
        Self {
            url: photo.url.into(),
            position: photo.position.into(),
        }
    }
}

/// Period a `Listing` is offered for.
#[derive(Clone, Copy, Debug, GraphQLObject)]
#[graphql(name = "ListingAvailability")]
pub struct Availability {
    /// `DateTime` the period starts at.
    pub start_date: DateTime,

    /// `DateTime` the period ends at, exclusively.
    pub end_date: DateTime,
}

impl From<domain::listing::Availability> for Availability {
    fn from(availability: domain::listing::Availability) -> Self {
        let period = availability.period;
        Self {
            start_date: period.start().coerce(),
            end_date: period.end().coerce(),
        }
    }
}

/// Unique identifier of a `Listing`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::listing::Id)]
#[into(domain::listing::Id)]
#[graphql(name = "ListingId", transparent)]
pub struct Id(Uuid);

/// Title of a `Listing`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "ListingTitle",
    with = scalar::Via::<domain::listing::Title>,
)]
pub struct Title(domain::listing::Title);

/// Description of a `Listing`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "ListingDescription",
    with = scalar::Via::<domain::listing::Description>,
)]
pub struct Description(domain::listing::Description);

/// Kind of the property offered by a `Listing`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "ListingKind",
    with = scalar::Via::<domain::listing::Kind>,
)]
pub struct Kind(domain::listing::Kind);

/// Street address of a `Listing`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "ListingAddress",
    with = scalar::Via::<domain::listing::Address>,
)]
pub struct Address(domain::listing::Address);

/// City of a `Listing`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "ListingCity",
    with = scalar::Via::<domain::listing::City>,
)]
pub struct City(domain::listing::City);

/// Country of a `Listing`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "ListingCountry",
    with = scalar::Via::<domain::listing::Country>,
)]
pub struct Country(domain::listing::Country);

/// Amenity provided by a `Listing`, like "Wifi" or "Pool".
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "ListingAmenity",
    with = scalar::Via::<domain::listing::Amenity>,
)]
pub struct Amenity(domain::listing::Amenity);

/// URL of an already uploaded `Listing` photo.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "ListingPhotoUrl",
    with = scalar::Via::<domain::listing::PhotoUrl>,
)]
pub struct PhotoUrl(domain::listing::PhotoUrl);

pub mod search {
    //! Definitions of [`Listing`]s found by a search.

    use juniper::GraphQLObject;
    use service::read;

    use crate::{api, Context};

    #[cfg(doc)]
    use super::Listing;
    use super::Photo;

    /// [`Listing`] found by a search.
    #[derive(Clone, Debug, GraphQLObject)]
    #[graphql(context = Context, name = "ListingSearchItem")]
    pub struct Item {
        /// Found `Listing`.
        pub listing: api::Listing,

        /// First photo of the `Listing`, if it has any.
        pub cover: Option<Photo>,

        /// Public profile of the `Listing`'s host.
        pub host: api::user::Profile,
    }

    impl From<read::listing::search::Item> for Item {
        fn from(item: read::listing::search::Item) -> Self {
            let read::listing::search::Item {
                listing,
                cover,
                host,
            } = item;
            Self {
                listing: listing.into(),
                cover: cover.map(Into::into),
                host: host.into(),
            }
        }
    }
}

pub mod hosted {
    //! Definitions of [`Listing`]s seen by their host.

    use juniper::GraphQLObject;
    use service::read;

    use crate::{api, Context};

    #[cfg(doc)]
    use super::Listing;
    use super::Photo;

    /// [`Listing`] along with the data only its host sees.
    #[derive(Clone, Debug, GraphQLObject)]
    #[graphql(context = Context, name = "HostedListing")]
    pub struct Item {
        /// Hosted `Listing`.
        pub listing: api::Listing,

        /// All photos of the `Listing` in their display order.
        pub photos: Vec<Photo>,

        /// Number of bookings made for the `Listing`.
        pub bookings_count: i32,
    }

    impl From<read::listing::hosted::Item> for Item {
        fn from(item: read::listing::hosted::Item) -> Self {
            let read::listing::hosted::Item {
                listing,
                photos,
                bookings_count,
            } = item;
            Self {
                listing: listing.into(),
                photos: photos.into_iter().map(Into::into).collect(),
                bookings_count: i32::try_from(bookings_count)
                    .unwrap_or(i32::MAX),
            }
        }
    }
}
