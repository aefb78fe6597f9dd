//! [`Database`] implementations of [`Memory`].

use std::{cmp::Reverse, collections::HashMap};

use common::operations::{By, Commit, Insert, Lock, Select, Transact, Update};
use tracerr::Traced;

use crate::{
    domain::{listing, user, Booking, Listing, User},
    infra::{database, Database},
    read,
};

use super::{Data, LockKey, Memory, Write};

impl Memory {
    /// Performs the provided [`Write`] wrapping its error.
    fn insert(&self, write: Write) -> Result<(), Traced<database::Error>> {
        self.write(write)
            .map_err(database::Error::from)
            .map_err(tracerr::wrap!())
    }

    /// Reads the committed [`Data`] with the provided function.
    fn read<R>(&self, f: impl FnOnce(&Data) -> R) -> R {
        f(&self.store.data())
    }
}

impl Data {
    /// Builds a [`read::listing::search::Item`] out of the provided
    /// [`Listing`], if its host exists.
    fn search_item(
        &self,
        listing: &Listing,
    ) -> Option<read::listing::search::Item> {
        let host = self.users.get(&listing.host_id)?;
        let cover = self
            .photos
            .iter()
            .filter(|p| p.listing_id == listing.id)
            .min_by_key(|p| p.position)
            .cloned();
        Some(read::listing::search::Item {
            listing: listing.clone(),
            cover,
            host: host.into(),
        })
    }

    /// Returns all the [`Listing`]s ordered from the most recent one.
    fn listings_by_recency(&self) -> Vec<&Listing> {
        let mut listings = self.listings.values().collect::<Vec<_>>();
        listings.sort_by_key(|l| (Reverse(l.created_at), l.id));
        listings
    }
}

impl Database<Transact> for Memory {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(if self.tx.is_some() {
            self.clone()
        } else {
            self.begin()
        })
    }
}

impl Database<Commit> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        self.commit()
            .map_err(database::Error::from)
            .map_err(tracerr::wrap!())
    }
}

impl<IDs> Database<Select<By<HashMap<user::Id, User>, IDs>>> for Memory
where
    IDs: AsRef<[user::Id]>,
{
    type Ok = HashMap<user::Id, User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<user::Id, User>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        Ok(self.read(|d| {
            ids.as_ref()
                .iter()
                .filter_map(|id| d.users.get(id).map(|u| (*id, u.clone())))
                .collect()
        }))
    }
}

impl Database<Select<By<Option<User>, user::Id>>> for Memory {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.read(|d| d.users.get(&id).cloned()))
    }
}

impl<'l> Database<Select<By<Option<User>, &'l user::Email>>>
    for Memory
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, &'l user::Email>>,
    ) -> Result<Self::Ok, Self::Err> {
        let email = by.into_inner();
        Ok(self.read(|d| d.users.values().find(|u| &u.email == email).cloned()))
    }
}

impl Database<Select<By<read::user::TotalCount, ()>>> for Memory {
    type Ok = read::user::TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<read::user::TotalCount, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.read(|d| d.users.len() as u64).into())
    }
}

impl Database<Insert<User>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(user): Insert<User>,
    ) -> Result<Self::Ok, Self::Err> {
        self.insert(Write::InsertUser(user))
    }
}

impl Database<Update<User>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(user): Update<User>,
    ) -> Result<Self::Ok, Self::Err> {
        self.insert(Write::UpsertUser(user))
    }
}

impl Database<Lock<By<User, user::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<User, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.lock(LockKey::User(by.into_inner())).await;
        Ok(())
    }
}

impl Database<Select<By<Option<Listing>, listing::Id>>>
    for Memory
{
    type Ok = Option<Listing>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Listing>, listing::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.read(|d| d.listings.get(&id).cloned()))
    }
}

impl Database<Insert<Listing>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(listing): Insert<Listing>,
    ) -> Result<Self::Ok, Self::Err> {
        self.insert(Write::InsertListing(listing))
    }
}

impl Database<Insert<listing::Photo>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(photo): Insert<listing::Photo>,
    ) -> Result<Self::Ok, Self::Err> {
        self.insert(Write::InsertPhoto(photo))
    }
}

impl Database<Insert<listing::Availability>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(availability): Insert<listing::Availability>,
    ) -> Result<Self::Ok, Self::Err> {
        self.insert(Write::InsertAvailability(availability))
    }
}

impl Database<Lock<By<Listing, listing::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Listing, listing::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.lock(LockKey::Listing(by.into_inner())).await;
        Ok(())
    }
}

impl Database<Select<By<Vec<listing::Photo>, listing::Id>>>
    for Memory
{
    type Ok = Vec<listing::Photo>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<listing::Photo>, listing::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        let mut photos = self.read(|d| {
            d.photos
                .iter()
                .filter(|p| p.listing_id == id)
                .cloned()
                .collect::<Vec<_>>()
        });
        photos.sort_by_key(|p| p.position);
        Ok(photos)
    }
}

impl Database<Select<By<Option<listing::Availability>, listing::Id>>>
    for Memory
{
    type Ok = Option<listing::Availability>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<listing::Availability>, listing::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.read(|d| d.availabilities.get(&id).copied()))
    }
}

impl Database<
        Select<
            By<Vec<read::listing::search::Item>, read::listing::search::Filter>,
        >,
    > for Memory
{
    type Ok = Vec<read::listing::search::Item>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<Vec<read::listing::search::Item>, read::listing::search::Filter>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let filter = by.into_inner();
        Ok(self.read(|d| {
            d.listings_by_recency()
                .into_iter()
                .filter(|l| {
                    let booked = d
                        .bookings
                        .iter()
                        .filter(|b| b.listing_id == l.id)
                        .map(|b| &b.stay);
                    filter.matches(l, booked)
                })
                .filter_map(|l| d.search_item(l))
                .collect()
        }))
    }
}

impl Database<Select<By<Vec<read::listing::search::Item>, read::listing::Recent>>>
    for Memory
{
    type Ok = Vec<read::listing::search::Item>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<Vec<read::listing::search::Item>, read::listing::Recent>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let recent = by.into_inner();
        Ok(self.read(|d| {
            d.listings_by_recency()
                .into_iter()
                .filter_map(|l| d.search_item(l))
                .take(recent.limit().into())
                .collect()
        }))
    }
}

impl Database<Select<By<Vec<read::listing::hosted::Item>, user::Id>>>
    for Memory
{
    type Ok = Vec<read::listing::hosted::Item>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<read::listing::hosted::Item>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let host_id = by.into_inner();
        Ok(self.read(|d| {
            d.listings_by_recency()
                .into_iter()
                .filter(|l| l.host_id == host_id)
                .map(|l| {
                    let mut photos = d
                        .photos
                        .iter()
                        .filter(|p| p.listing_id == l.id)
                        .cloned()
                        .collect::<Vec<_>>();
                    photos.sort_by_key(|p| p.position);
                    read::listing::hosted::Item {
                        listing: l.clone(),
                        photos,
                        bookings_count: d
                            .bookings
                            .iter()
                            .filter(|b| b.listing_id == l.id)
                            .count() as u64,
                    }
                })
                .collect()
        }))
    }
}

impl Database<Select<By<read::booking::IsTaken, read::booking::Slot>>>
    for Memory
{
    type Ok = read::booking::IsTaken;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::booking::IsTaken, read::booking::Slot>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::booking::Slot { listing_id, stay } = by.into_inner();
        Ok(read::booking::IsTaken(self.read(|d| {
            d.bookings
                .iter()
                .any(|b| b.listing_id == listing_id && b.stay.overlaps(&stay))
        })))
    }
}

impl Database<Insert<Booking>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(booking): Insert<Booking>,
    ) -> Result<Self::Ok, Self::Err> {
        self.insert(Write::InsertBooking(booking))
    }
}
