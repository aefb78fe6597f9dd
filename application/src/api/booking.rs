//! [`Booking`]-related definitions.

use common::{DateTime, Money};
use derive_more::{Display, From, Into};
use juniper::{graphql_object, GraphQLScalar};
use service::domain;
use uuid::Uuid;

use crate::{api, Context};

/// Reservation of a `Listing` for a stay.
#[derive(Clone, Debug, From)]
pub struct Booking(domain::Booking);

/// Reservation of a `Listing` for a stay.
#[graphql_object(context = Context)]
impl Booking {
    /// Unique identifier of this `Booking`.
    #[must_use]
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// Booked `Listing`.
    #[must_use]
    pub fn listing(&self) -> api::Listing {
        #[expect(
            unsafe_code,
            reason = "`Booking` is only created for an existing `Listing`"
        )]
        unsafe {
            api::Listing::new_unchecked(self.0.listing_id)
        }
    }

    /// `DateTime` of the arrival.
    #[must_use]
    pub fn start_date(&self) -> DateTime {
        self.0.stay.start().coerce()
    }

    /// `DateTime` of the departure.
    #[must_use]
    pub fn end_date(&self) -> DateTime {
        self.0.stay.end().coerce()
    }

    /// Number of booked nights.
    #[must_use]
    pub fn nights(&self) -> i32 {
        i32::try_from(self.0.stay.nights()).unwrap_or(i32::MAX)
    }

    /// Price of the whole stay.
    #[must_use]
    pub fn total_price(&self) -> Money {
        self.0.total_price
    }

    /// `DateTime` when this `Booking` was made.
    #[must_use]
    pub fn created_at(&self) -> DateTime {
        self.0.created_at.coerce()
    }
}

/// Unique identifier of a `Booking`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::booking::Id)]
#[into(domain::booking::Id)]
#[graphql(name = "BookingId", transparent)]
pub struct Id(Uuid);
