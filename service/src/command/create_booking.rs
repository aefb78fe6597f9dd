//! [`Command`] for booking a [`Listing`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{booking, listing, stay, user, Booking, Listing, Stay},
    infra::{database, Database},
    read, Service,
};

use super::Command;

/// [`Command`] for booking a [`Listing`] for a [`Stay`].
///
/// The rules are checked in the following order, stopping at the first
/// failed one:
/// 1. The [`Listing`] exists.
/// 2. The booking [`User`] is not the [`Listing`]'s host.
/// 3. The [`Stay`] ends after it starts.
/// 4. No other [`Booking`] of the [`Listing`] overlaps the [`Stay`].
///
/// The overlap check and the insertion run in a single transaction holding
/// the [`Listing`] lock, so concurrent bookings of the same [`Listing`] are
/// serialized.
///
/// [`User`]: crate::domain::User
#[derive(Clone, Copy, Debug)]
pub struct CreateBooking {
    /// ID of the [`User`] making the [`Booking`].
    ///
    /// [`User`]: crate::domain::User
    pub user_id: user::Id,

    /// ID of the [`Listing`] to book.
    pub listing_id: listing::Id,

    /// Requested start of the [`Stay`].
    pub start: stay::StartDateTime,

    /// Requested end of the [`Stay`].
    pub end: stay::EndDateTime,
}

impl<Db> Command<CreateBooking> for Service<Db>
where
    Db: Database<
            Select<By<Option<Listing>, listing::Id>>,
            Ok = Option<Listing>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Listing, listing::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<read::booking::IsTaken, read::booking::Slot>>,
            Ok = read::booking::IsTaken,
            Err = Traced<database::Error>,
        > + Database<Insert<Booking>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Booking;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateBooking) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateBooking {
            user_id,
            listing_id,
            start,
            end,
        } = cmd;

        let listing = self
            .database()
            .execute(Select(By::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| E::ListingNotExists(listing_id))
            .map_err(tracerr::wrap!())?;
        if listing.host_id == user_id {
            return Err(tracerr::new!(E::SelfBooking(listing_id)));
        }
        let stay = Stay::new(start, end)
            .ok_or_else(|| E::InvalidStay)
            .map_err(tracerr::wrap!())?;
        let total_price = listing
            .price
            .times(stay.nights())
            .ok_or_else(|| E::PriceOverflow(listing.price))
            .map_err(tracerr::wrap!())?;

        let booking = Booking {
            id: booking::Id::new(),
            listing_id,
            user_id,
            stay,
            total_price,
            created_at: DateTime::now().coerce(),
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Serializes concurrent bookings of the same `Listing` until commit.
        tx.execute(Lock(By::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let taken = tx
            .execute(Select(By::new(read::booking::Slot { listing_id, stay })))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if *taken {
            return Err(tracerr::new!(E::DatesUnavailable(listing_id)));
        }

        let inserted = tx.execute(Insert(booking.clone())).await.map(drop);
        let committed = match inserted {
            Ok(()) => tx.execute(Commit).await.map(drop),
            Err(e) => Err(e),
        };
        if committed.as_ref().is_err_and(|e| e.as_ref().is_conflict()) {
            return Err(tracerr::new!(E::DatesUnavailable(listing_id)));
        }
        committed.map_err(tracerr::map_from_and_wrap!(=> E))?;

        tracing::info!(
            booking.id = %booking.id,
            listing.id = %listing_id,
            nights = stay.nights(),
            total_price = %booking.total_price,
            "listing booked",
        );

        Ok(booking)
    }
}

/// Error of [`CreateBooking`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Listing`] with the provided ID does not exist.
    #[display("`Listing(id: {_0})` does not exist")]
    ListingNotExists(#[error(not(source))] listing::Id),

    /// Host tries to book its own [`Listing`].
    #[display("Host cannot book its own `Listing(id: {_0})`")]
    SelfBooking(#[error(not(source))] listing::Id),

    /// [`Stay`] doesn't end after it starts.
    #[display("`Stay` must end after it starts")]
    InvalidStay,

    /// Requested [`Stay`] overlaps an existing [`Booking`].
    #[display("`Listing(id: {_0})` is already booked for these dates")]
    DatesUnavailable(#[error(not(source))] listing::Id),

    /// Total price of the [`Stay`] cannot be represented.
    #[display("Total price overflows for `{_0}` per night")]
    PriceOverflow(#[error(not(source))] Money),
}
