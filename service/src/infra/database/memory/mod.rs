//! In-memory [`Database`] implementation.
//!
//! Mirrors the guarantees of the PostgreSQL schema (unique emails and
//! non-overlapping bookings of a listing) and its transactional semantics:
//! writes of a transaction are buffered and applied atomically on commit,
//! while locks are held until the transaction is committed or dropped.

mod impls;

use std::{
    collections::HashMap,
    mem,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use derive_more::{Display, Error as StdError};
use tokio::sync::OwnedMutexGuard;

#[cfg(doc)]
use crate::infra::Database;
use crate::domain::{listing, user, Booking, Listing, User};

/// In-memory [`Database`] client.
///
/// A [`Memory`] client returned by [`Transact`] buffers its writes until
/// [`Commit`]. Any other one applies them immediately.
///
/// [`Commit`]: common::operations::Commit
/// [`Transact`]: common::operations::Transact
#[derive(Clone, Debug, Default)]
pub struct Memory {
    /// Shared [`Store`] of the data.
    store: Arc<Store>,

    /// State of the transaction, shared by its clones, if any.
    tx: Option<Arc<Mutex<Pending>>>,
}

impl Memory {
    /// Creates a new empty [`Memory`] database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new transaction over the same [`Store`].
    fn begin(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            tx: Some(Arc::new(Mutex::new(Pending::default()))),
        }
    }

    /// Returns the [`Pending`] state of the transaction, if any.
    fn pending(&self) -> Option<MutexGuard<'_, Pending>> {
        self.tx
            .as_ref()
            .map(|tx| tx.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Performs the provided [`Write`]: buffers it in the transaction, or
    /// applies it right away.
    ///
    /// # Errors
    ///
    /// If the applied [`Write`] violates a constraint.
    fn write(&self, write: Write) -> Result<(), Error> {
        if let Some(mut pending) = self.pending() {
            pending.writes.push(write);
            return Ok(());
        }
        self.store.data().apply(vec![write])
    }

    /// Acquires the lock identified by the provided [`LockKey`] until the
    /// transaction is committed or dropped.
    ///
    /// Outside a transaction the lock is released right away. Re-acquiring
    /// an already held lock is a no-op.
    async fn lock(&self, key: LockKey) {
        let lock = self.store.lock_of(key);
        let held = self.pending().is_some_and(|p| {
            p.guards
                .iter()
                .any(|g| Arc::ptr_eq(OwnedMutexGuard::mutex(g), &lock))
        });
        if held {
            return;
        }
        let guard = lock.lock_owned().await;
        if let Some(mut pending) = self.pending() {
            pending.guards.push(guard);
        }
    }

    /// Commits the transaction, applying all its buffered [`Write`]s
    /// atomically and releasing its locks.
    ///
    /// Committing outside a transaction is a no-op.
    ///
    /// # Errors
    ///
    /// If any buffered [`Write`] violates a constraint. Nothing is applied in
    /// such case.
    fn commit(&self) -> Result<(), Error> {
        let Some(Pending { writes, guards }) =
            self.pending().map(|mut p| mem::take(&mut *p))
        else {
            return Ok(());
        };
        let result = self.store.data().apply(writes);
        drop(guards);
        result
    }
}

/// Uncommitted state of a [`Memory`] transaction.
#[derive(Debug, Default)]
struct Pending {
    /// Buffered [`Write`]s, in their execution order.
    writes: Vec<Write>,

    /// Guards of the acquired locks.
    guards: Vec<OwnedMutexGuard<()>>,
}

/// Storage of all the [`Memory`] data.
#[derive(Debug, Default)]
struct Store {
    /// Committed [`Data`].
    data: Mutex<Data>,

    /// Locks of the entities, acquired by transactions.
    locks: Mutex<HashMap<LockKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl Store {
    /// Returns the committed [`Data`].
    fn data(&self) -> MutexGuard<'_, Data> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the lock of the entity identified by the provided
    /// [`LockKey`].
    fn lock_of(&self, key: LockKey) -> Arc<tokio::sync::Mutex<()>> {
        Arc::clone(
            self.locks
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(key)
                .or_default(),
        )
    }
}

/// Key identifying a lockable entity.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
enum LockKey {
    /// [`Listing`] lock.
    Listing(listing::Id),

    /// [`User`] lock.
    User(user::Id),
}

/// Committed data of a [`Memory`] database.
#[derive(Debug, Default)]
struct Data {
    /// Stored [`User`]s.
    users: HashMap<user::Id, User>,

    /// Stored [`Listing`]s.
    listings: HashMap<listing::Id, Listing>,

    /// Stored [`listing::Photo`]s.
    photos: Vec<listing::Photo>,

    /// Stored [`listing::Availability`]s.
    availabilities: HashMap<listing::Id, listing::Availability>,

    /// Stored [`Booking`]s.
    bookings: Vec<Booking>,
}

/// Single write into [`Data`].
#[derive(Clone, Debug)]
enum Write {
    /// Insertion of a new [`User`].
    InsertUser(User),

    /// Insertion or replacement of a [`User`].
    UpsertUser(User),

    /// Insertion of a new [`Listing`].
    InsertListing(Listing),

    /// Insertion of a new [`listing::Photo`].
    InsertPhoto(listing::Photo),

    /// Insertion of a new [`listing::Availability`].
    InsertAvailability(listing::Availability),

    /// Insertion of a new [`Booking`].
    InsertBooking(Booking),
}

impl Data {
    /// Applies all the provided [`Write`]s atomically: either all of them
    /// are applied, or none.
    ///
    /// # Errors
    ///
    /// If any [`Write`] violates a constraint.
    fn apply(&mut self, writes: Vec<Write>) -> Result<(), Error> {
        for (i, w) in writes.iter().enumerate() {
            self.check(w, &writes[..i])?;
        }
        for w in writes {
            self.apply_one(w);
        }
        Ok(())
    }

    /// Checks whether the provided [`Write`] satisfies all the constraints
    /// once the `preceding` [`Write`]s are applied.
    fn check(&self, write: &Write, preceding: &[Write]) -> Result<(), Error> {
        use Error as E;

        match write {
            Write::InsertUser(u) => {
                let id_taken = self.users.contains_key(&u.id)
                    || preceding.iter().any(|p| p.user().is_some_and(|p| p.id == u.id));
                if id_taken {
                    return Err(E::UniqueViolation("users_pkey"));
                }
                self.check_email(u, preceding)
            }
            Write::UpsertUser(u) => self.check_email(u, preceding),
            Write::InsertListing(l) => {
                if !self.users.contains_key(&l.host_id)
                    && !preceding
                        .iter()
                        .any(|p| p.user().is_some_and(|p| p.id == l.host_id))
                {
                    return Err(E::ForeignKeyViolation("listings_host_id_fkey"));
                }
                if self.listings.contains_key(&l.id) {
                    return Err(E::UniqueViolation("listings_pkey"));
                }
                Ok(())
            }
            Write::InsertPhoto(p) => {
                self.check_listing(p.listing_id, preceding, "photos")
            }
            Write::InsertAvailability(a) => {
                self.check_listing(a.listing_id, preceding, "availabilities")
            }
            Write::InsertBooking(b) => {
                self.check_listing(b.listing_id, preceding, "bookings")?;
                let overlaps = self
                    .bookings
                    .iter()
                    .chain(preceding.iter().filter_map(|p| match p {
                        Write::InsertBooking(b) => Some(b),
                        Write::InsertUser(_)
                        | Write::UpsertUser(_)
                        | Write::InsertListing(_)
                        | Write::InsertPhoto(_)
                        | Write::InsertAvailability(_) => None,
                    }))
                    .any(|o| {
                        o.listing_id == b.listing_id && o.stay.overlaps(&b.stay)
                    });
                if overlaps {
                    return Err(E::ExclusionViolation("bookings_no_overlap"));
                }
                Ok(())
            }
        }
    }

    /// Checks that the email of the provided [`User`] is not used by any
    /// other [`User`].
    fn check_email(&self, user: &User, preceding: &[Write]) -> Result<(), Error> {
        let occupied = self
            .users
            .values()
            .chain(preceding.iter().filter_map(Write::user))
            .any(|o| o.id != user.id && o.email == user.email);
        if occupied {
            return Err(Error::UniqueViolation("users_email_key"));
        }
        Ok(())
    }

    /// Checks that the referenced [`Listing`] exists.
    fn check_listing(
        &self,
        id: listing::Id,
        preceding: &[Write],
        table: &'static str,
    ) -> Result<(), Error> {
        let exists = self.listings.contains_key(&id)
            || preceding.iter().any(|p| {
                matches!(p, Write::InsertListing(l) if l.id == id)
            });
        if exists {
            Ok(())
        } else {
            Err(Error::ForeignKeyViolation(table))
        }
    }

    /// Applies the provided already checked [`Write`].
    fn apply_one(&mut self, write: Write) {
        match write {
            Write::InsertUser(u) | Write::UpsertUser(u) => {
                drop(self.users.insert(u.id, u));
            }
            Write::InsertListing(l) => drop(self.listings.insert(l.id, l)),
            Write::InsertPhoto(p) => self.photos.push(p),
            Write::InsertAvailability(a) => {
                drop(self.availabilities.insert(a.listing_id, a));
            }
            Write::InsertBooking(b) => self.bookings.push(b),
        }
    }
}

impl Write {
    /// Returns the [`User`] written by this [`Write`], if any.
    const fn user(&self) -> Option<&User> {
        match self {
            Self::InsertUser(u) | Self::UpsertUser(u) => Some(u),
            Self::InsertListing(_)
            | Self::InsertPhoto(_)
            | Self::InsertAvailability(_)
            | Self::InsertBooking(_) => None,
        }
    }
}

/// [`Memory`] database error.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, StdError)]
pub enum Error {
    /// Unique constraint is violated.
    #[display("Unique constraint `{_0}` is violated")]
    UniqueViolation(#[error(not(source))] &'static str),

    /// Exclusion constraint is violated.
    #[display("Exclusion constraint `{_0}` is violated")]
    ExclusionViolation(#[error(not(source))] &'static str),

    /// Foreign key constraint is violated.
    #[display("Foreign key of `{_0}` is violated")]
    ForeignKeyViolation(#[error(not(source))] &'static str),
}

impl Error {
    /// Indicates whether this [`Error`] is caused by a write clashing with
    /// the already stored data.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        match self {
            Self::UniqueViolation(_) | Self::ExclusionViolation(_) => true,
            Self::ForeignKeyViolation(_) => false,
        }
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::{
        operations::{By, Commit, Insert, Lock, Transact},
        DateTime,
    };

    use crate::{
        domain::{
            booking,
            listing::{self, Listing},
            user::{self, Role},
            Booking, Stay, User,
        },
        infra::{database, Database as _},
    };

    use super::{Error, Memory};

    fn user() -> User {
        User {
            id: user::Id::new(),
            email: user::Email::new("host@example.com").unwrap(),
            name: None,
            password_hash: user::PasswordHash::new(
                &user::Password::new("correct horse").unwrap(),
            )
            .unwrap(),
            role: Role::Host,
            avatar_url: None,
            phone: None,
            bio: None,
            created_at: DateTime::now().coerce(),
        }
    }

    fn listing(host_id: user::Id) -> Listing {
        Listing {
            id: listing::Id::new(),
            host_id,
            title: listing::Title::new("Loft").unwrap(),
            description: listing::Description::new("Bright").unwrap(),
            kind: listing::Kind::new("Apartment").unwrap(),
            price: "10USD".parse().unwrap(),
            address: listing::Address::new("1 Main street").unwrap(),
            city: listing::City::new("Goma").unwrap(),
            country: listing::Country::new("Congo").unwrap(),
            amenities: vec![],
            max_guests: listing::Guests::new(2).unwrap(),
            bedrooms: 1,
            bathrooms: 1,
            created_at: DateTime::now().coerce(),
        }
    }

    fn booking(listing_id: listing::Id, user_id: user::Id, from: i64) -> Booking {
        let day = 86_400;
        Booking {
            id: booking::Id::new(),
            listing_id,
            user_id,
            stay: Stay::new(
                DateTime::from_unix_timestamp(from * day).unwrap().coerce(),
                DateTime::from_unix_timestamp((from + 3) * day)
                    .unwrap()
                    .coerce(),
            )
            .unwrap(),
            total_price: "30USD".parse().unwrap(),
            created_at: DateTime::now().coerce(),
        }
    }

    async fn seeded() -> (Memory, User, Listing) {
        let db = Memory::new();
        let host = user();
        let listing = listing(host.id);
        db.execute(Insert(host.clone())).await.unwrap();
        db.execute(Insert(listing.clone())).await.unwrap();
        (db, host, listing)
    }

    #[tokio::test]
    async fn buffers_writes_until_commit() {
        let (db, host, listing) = seeded().await;

        let tx = db.execute(Transact).await.unwrap();
        tx.execute(Insert(booking(listing.id, host.id, 0)))
            .await
            .unwrap();
        assert!(db.store.data().bookings.is_empty());

        tx.execute(Commit).await.unwrap();
        assert_eq!(db.store.data().bookings.len(), 1);
    }

    #[tokio::test]
    async fn rejects_overlapping_commit_atomically() {
        let (db, host, listing) = seeded().await;
        db.execute(Insert(booking(listing.id, host.id, 0)))
            .await
            .unwrap();

        let tx = db.execute(Transact).await.unwrap();
        tx.execute(Insert(booking(listing.id, host.id, 10)))
            .await
            .unwrap();
        tx.execute(Insert(booking(listing.id, host.id, 2)))
            .await
            .unwrap();
        let err = tx.execute(Commit).await.unwrap_err();

        assert!(matches!(
            err.as_ref(),
            database::Error::Memory(Error::ExclusionViolation(_)),
        ));
        assert!(err.as_ref().is_conflict());
        assert_eq!(db.store.data().bookings.len(), 1);
    }

    #[tokio::test]
    async fn holds_lock_until_commit() {
        let (db, _, listing) = seeded().await;

        let first = db.execute(Transact).await.unwrap();
        first
            .execute(Lock(By::<Listing, _>::new(listing.id)))
            .await
            .unwrap();

        let second = db.execute(Transact).await.unwrap();
        let blocked = tokio::time::timeout(
            Duration::from_millis(50),
            second.execute(Lock(By::<Listing, _>::new(listing.id))),
        )
        .await;
        assert!(blocked.is_err(), "lock must be held by the first one");

        first.execute(Commit).await.unwrap();
        tokio::time::timeout(
            Duration::from_millis(50),
            second.execute(Lock(By::<Listing, _>::new(listing.id))),
        )
        .await
        .unwrap()
        .unwrap();
    }
}
