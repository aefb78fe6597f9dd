//! [`Command`] for creating a new [`Listing`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::listing::{
    Address, Amenity, City, Country, Description, Guests, Kind, PhotoUrl,
    Rooms, Title,
};
use crate::{
    domain::{listing, user, Listing, Stay, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for publishing a new [`Listing`] along with its
/// [`listing::Photo`]s and [`listing::Availability`].
///
/// Either everything is persisted, or nothing is.
#[derive(Clone, Debug)]
pub struct CreateListing {
    /// ID of the [`User`] hosting a new [`Listing`].
    pub host_id: user::Id,

    /// [`Title`] of a new [`Listing`].
    pub title: listing::Title,

    /// [`Description`] of a new [`Listing`].
    pub description: listing::Description,

    /// [`Kind`] of a new [`Listing`].
    pub kind: listing::Kind,

    /// Price of a single night in a new [`Listing`].
    pub price: Money,

    /// [`Address`] of a new [`Listing`].
    pub address: listing::Address,

    /// [`City`] of a new [`Listing`].
    pub city: listing::City,

    /// [`Country`] of a new [`Listing`].
    pub country: listing::Country,

    /// [`Amenity`]s of a new [`Listing`].
    pub amenities: Vec<listing::Amenity>,

    /// Maximum number of [`Guests`] in a new [`Listing`].
    pub max_guests: listing::Guests,

    /// Number of bedrooms in a new [`Listing`].
    pub bedrooms: listing::Rooms,

    /// Number of bathrooms in a new [`Listing`].
    pub bathrooms: listing::Rooms,

    /// [`PhotoUrl`]s of a new [`Listing`], the first one being its cover.
    pub photos: Vec<listing::PhotoUrl>,

    /// [`Stay`] period a new [`Listing`] is available for.
    pub availability: Stay,
}

impl<Db> Command<CreateListing> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<Listing>, Err = Traced<database::Error>>
        + Database<Insert<listing::Photo>, Err = Traced<database::Error>>
        + Database<Insert<listing::Availability>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Listing;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateListing) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateListing {
            host_id,
            title,
            description,
            kind,
            price,
            address,
            city,
            country,
            amenities,
            max_guests,
            bedrooms,
            bathrooms,
            photos,
            availability,
        } = cmd;

        let host = self
            .database()
            .execute(Select(By::new(host_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| E::UserNotExists(host_id))
            .map_err(tracerr::wrap!())?;
        if !host.role.can_host() {
            return Err(tracerr::new!(E::NotHost(host_id)));
        }
        if !price.is_positive() {
            return Err(tracerr::new!(E::NonPositivePrice(price)));
        }
        if !price.is_bounded() {
            return Err(tracerr::new!(E::PriceTooHigh(price)));
        }
        if photos.len() > usize::from(u16::MAX) {
            return Err(tracerr::new!(E::TooManyPhotos));
        }

        let listing = Listing {
            id: listing::Id::new(),
            host_id,
            title,
            description,
            kind,
            price,
            address,
            city,
            country,
            amenities,
            max_guests,
            bedrooms,
            bathrooms,
            created_at: DateTime::now().coerce(),
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Insert(listing.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        for (position, url) in (0..).zip(photos) {
            tx.execute(Insert(listing::Photo {
                listing_id: listing.id,
                url,
                position,
            }))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        }
        tx.execute(Insert(listing::Availability {
            listing_id: listing.id,
            period: availability,
        }))
        .await
        .map_err(tracerr::map_from_and_wrap!(=> E))
        .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tracing::info!(
            listing.id = %listing.id,
            listing.host_id = %listing.host_id,
            "listing created",
        );

        Ok(listing)
    }
}

/// Error of [`CreateListing`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),

    /// [`User`] is not allowed to host [`Listing`]s.
    #[display("`User(id: {_0})` is not a host")]
    NotHost(#[error(not(source))] user::Id),

    /// Price of a [`Listing`] is not positive.
    #[display("`Listing` price must be positive, got `{_0}`")]
    NonPositivePrice(#[error(not(source))] Money),

    /// Price of a [`Listing`] exceeds [`Money::max_amount()`].
    #[display("`Listing` price is too high, got `{_0}`")]
    PriceTooHigh(#[error(not(source))] Money),

    /// Too many [`listing::Photo`]s provided.
    #[display("Too many `Photo`s provided")]
    TooManyPhotos,
}
