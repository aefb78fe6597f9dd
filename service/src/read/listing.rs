//! [`Listing`]-related read definitions.

#[cfg(doc)]
use crate::domain::Listing;

/// Selector of the most recently created [`Listing`]s.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Recent {
    /// Maximum number of [`Listing`]s to select.
    limit: u16,
}

impl Recent {
    /// Default number of [`Listing`]s in a [`Recent`] selection.
    pub const DEFAULT_LIMIT: u16 = 4;

    /// Maximum allowed number of [`Listing`]s in a [`Recent`] selection.
    pub const MAX_LIMIT: u16 = 100;

    /// Creates a new [`Recent`] selector if the provided `limit` is within
    /// `1..=`[`Recent::MAX_LIMIT`].
    #[must_use]
    pub fn new(limit: i32) -> Option<Self> {
        let limit = u16::try_from(limit).ok()?;
        (1..=Self::MAX_LIMIT)
            .contains(&limit)
            .then_some(Self { limit })
    }

    /// Returns the maximum number of [`Listing`]s to select.
    #[must_use]
    pub const fn limit(&self) -> u16 {
        self.limit
    }
}

impl Default for Recent {
    fn default() -> Self {
        Self {
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

pub mod search {
    //! [`Listing`]s search definitions.

    use derive_more::{AsRef, Display, Error as StdError};

    use crate::{
        domain::{
            listing, stay, Listing, Stay,
        },
        read,
    };

    /// Criteria a [`Listing`] must satisfy to be found.
    ///
    /// Can only be constructed in a consistent state via [`Filter::new()`].
    #[derive(Clone, Debug, Default)]
    pub struct Filter {
        /// [`Destination`] to look for in the [`Listing`]'s text fields.
        destination: Option<Destination>,

        /// [`Stay`] the [`Listing`] must be free for.
        stay: Option<Stay>,

        /// Number of guests the [`Listing`] must accommodate.
        ///
        /// Not narrowed to [`listing::Guests`], so a party larger than any
        /// [`Listing`] matches nothing instead of being rejected.
        guests: Option<u32>,
    }

    impl Filter {
        /// Creates a new [`Filter`] out of the raw search criteria.
        ///
        /// A blank `destination` is treated as an absent one.
        ///
        /// # Errors
        ///
        /// - If only one of `start` and `end` is provided.
        /// - If `end` is not after `start`.
        /// - If `guests` is not a positive integer.
        /// - If `destination` is too long.
        pub fn new(
            destination: Option<&str>,
            start: Option<stay::StartDateTime>,
            end: Option<stay::EndDateTime>,
            guests: Option<i32>,
        ) -> Result<Self, FilterError> {
            use FilterError as E;

            let destination = destination
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(|d| Destination::new(d).ok_or(E::DestinationTooLong))
                .transpose()?;

            let stay = match (start, end) {
                (None, None) => None,
                (Some(_), None) => return Err(E::MissingEnd),
                (None, Some(_)) => return Err(E::MissingStart),
                (Some(start), Some(end)) => {
                    Some(Stay::new(start, end).ok_or(E::EmptyStay)?)
                }
            };

            let guests = guests
                .map(|g| {
                    u32::try_from(g)
                        .ok()
                        .filter(|g| *g > 0)
                        .ok_or(E::InvalidGuests)
                })
                .transpose()?;

            Ok(Self {
                destination,
                stay,
                guests,
            })
        }

        /// Returns the [`Destination`] of this [`Filter`], if any.
        #[must_use]
        pub const fn destination(&self) -> Option<&Destination> {
            self.destination.as_ref()
        }

        /// Returns the [`Stay`] of this [`Filter`], if any.
        #[must_use]
        pub const fn stay(&self) -> Option<&Stay> {
            self.stay.as_ref()
        }

        /// Returns the number of guests of this [`Filter`], if any.
        #[must_use]
        pub const fn guests(&self) -> Option<u32> {
            self.guests
        }

        /// Checks whether the provided [`Listing`] with the provided
        /// `booked` [`Stay`]s satisfies this [`Filter`].
        #[must_use]
        pub fn matches<'s>(
            &self,
            listing: &Listing,
            booked: impl IntoIterator<Item = &'s Stay>,
        ) -> bool {
            self.destination
                .as_ref()
                .map_or(true, |d| d.found_in(listing))
                && self.guests.map_or(true, |g| listing.accommodates(g))
                && self.stay.map_or(true, |s| {
                    booked.into_iter().all(|b| !b.overlaps(&s))
                })
        }
    }

    /// Error of creating a [`Filter`].
    #[derive(Clone, Copy, Debug, Display, Eq, PartialEq, StdError)]
    pub enum FilterError {
        /// End date is missing while start date is provided.
        #[display("`endDate` is required when `startDate` is provided")]
        MissingEnd,

        /// Start date is missing while end date is provided.
        #[display("`startDate` is required when `endDate` is provided")]
        MissingStart,

        /// End date is not after start date.
        #[display("`endDate` must be after `startDate`")]
        EmptyStay,

        /// Number of guests is not a positive integer.
        #[display("`guests` must be a positive integer")]
        InvalidGuests,

        /// Destination is too long.
        #[display("`destination` is too long")]
        DestinationTooLong,
    }

    /// Free text to look for in a [`Listing`]'s city, country, title or
    /// description, case-insensitively.
    #[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
    #[as_ref(forward)]
    pub struct Destination(String);

    impl Destination {
        /// Creates a new [`Destination`] if the provided `text` is not too
        /// long.
        #[must_use]
        pub fn new(text: impl Into<String>) -> Option<Self> {
            let text = text.into();
            (text.len() <= 256).then_some(Self(text))
        }

        /// Checks whether this [`Destination`] occurs in any text field of
        /// the provided [`Listing`].
        #[must_use]
        pub fn found_in(&self, listing: &Listing) -> bool {
            let needle = self.0.to_lowercase();
            let fields: [&str; 4] = [
                listing.city.as_ref(),
                listing.country.as_ref(),
                listing.title.as_ref(),
                listing.description.as_ref(),
            ];
            fields
                .into_iter()
                .any(|field| field.to_lowercase().contains(&needle))
        }
    }

    /// [`Listing`] found by a search.
    #[derive(Clone, Debug)]
    pub struct Item {
        /// Found [`Listing`].
        pub listing: Listing,

        /// Cover [`listing::Photo`] of the [`Listing`], if it has any.
        pub cover: Option<listing::Photo>,

        /// Public profile of the [`Listing`]'s host.
        pub host: read::user::Public,
    }
}

pub mod hosted {
    //! Definitions of [`Listing`]s from the host's perspective.

    use crate::domain::{listing, Listing};

    /// [`Listing`] along with the data only its host sees.
    #[derive(Clone, Debug)]
    pub struct Item {
        /// Hosted [`Listing`].
        pub listing: Listing,

        /// All [`listing::Photo`]s of the [`Listing`] ordered by position.
        pub photos: Vec<listing::Photo>,

        /// Number of bookings made for the [`Listing`].
        pub bookings_count: u64,
    }
}

#[cfg(test)]
mod spec {
    use common::DateTime;

    use super::{
        search::{Filter, FilterError},
        Recent,
    };

    fn at<Of: ?Sized>(s: &str) -> common::DateTimeOf<Of> {
        DateTime::from_rfc3339(s).unwrap().coerce()
    }

    #[test]
    fn filter_requires_both_dates() {
        assert_eq!(
            Filter::new(None, Some(at("2024-07-05T00:00:00Z")), None, None)
                .unwrap_err(),
            FilterError::MissingEnd,
        );
        assert_eq!(
            Filter::new(None, None, Some(at("2024-07-05T00:00:00Z")), None)
                .unwrap_err(),
            FilterError::MissingStart,
        );
    }

    #[test]
    fn filter_requires_positive_stay() {
        let err = Filter::new(
            None,
            Some(at("2024-07-08T00:00:00Z")),
            Some(at("2024-07-05T00:00:00Z")),
            None,
        )
        .unwrap_err();
        assert_eq!(err, FilterError::EmptyStay);

        let err = Filter::new(
            None,
            Some(at("2024-07-05T00:00:00Z")),
            Some(at("2024-07-05T00:00:00Z")),
            None,
        )
        .unwrap_err();
        assert_eq!(err, FilterError::EmptyStay);
    }

    #[test]
    fn filter_requires_positive_guests() {
        assert_eq!(
            Filter::new(None, None, None, Some(0)).unwrap_err(),
            FilterError::InvalidGuests,
        );
        assert_eq!(
            Filter::new(None, None, None, Some(-1)).unwrap_err(),
            FilterError::InvalidGuests,
        );
        assert!(Filter::new(None, None, None, Some(2)).is_ok());
    }

    #[test]
    fn filter_accepts_parties_larger_than_any_listing() {
        let filter = Filter::new(None, None, None, Some(70_000)).unwrap();

        assert_eq!(filter.guests(), Some(70_000));
    }

    #[test]
    fn blank_destination_is_ignored() {
        let filter = Filter::new(Some("   "), None, None, None).unwrap();
        assert!(filter.destination().is_none());

        let filter = Filter::new(Some(" Kinshasa "), None, None, None).unwrap();
        assert_eq!(filter.destination().unwrap().to_string(), "Kinshasa");
    }

    #[test]
    fn recent_limit_bounds() {
        assert_eq!(Recent::default().limit(), 4);
        assert!(Recent::new(0).is_none());
        assert!(Recent::new(101).is_none());
        assert_eq!(Recent::new(10).map(|r| r.limit()), Some(10));
    }
}
