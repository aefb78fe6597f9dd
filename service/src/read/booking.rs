//! [`Booking`]-related read definitions.

use derive_more::Deref;

#[cfg(doc)]
use crate::domain::{Booking, Listing};
use crate::domain::{listing, Stay};

/// [`Stay`] in a specific [`Listing`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Slot {
    /// ID of the [`Listing`].
    pub listing_id: listing::Id,

    /// [`Stay`] in the [`Listing`].
    pub stay: Stay,
}

/// Indicator whether a [`Slot`] overlaps any existing [`Booking`].
#[derive(Clone, Copy, Debug, Deref, Eq, Hash, PartialEq)]
pub struct IsTaken(pub bool);

impl PartialEq<bool> for IsTaken {
    fn eq(&self, other: &bool) -> bool {
        self.0 == *other
    }
}
