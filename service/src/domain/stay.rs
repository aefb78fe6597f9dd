//! [`Stay`] definitions.

use common::{unit, DateTimeOf};

/// Half-open `[start, end)` period of a stay in a listing.
///
/// Back-to-back [`Stay`]s (one ending exactly when the other starts) do not
/// overlap.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Stay {
    /// First moment of this [`Stay`].
    start: StartDateTime,

    /// Moment this [`Stay`] ends (excluded from it).
    end: EndDateTime,
}

impl Stay {
    /// Creates a new [`Stay`] if `end` is strictly after `start`.
    #[must_use]
    pub fn new(start: StartDateTime, end: EndDateTime) -> Option<Self> {
        (start.until(&end).is_some()).then_some(Self { start, end })
    }

    /// Returns the start of this [`Stay`].
    #[must_use]
    pub const fn start(&self) -> StartDateTime {
        self.start
    }

    /// Returns the end of this [`Stay`].
    #[must_use]
    pub const fn end(&self) -> EndDateTime {
        self.end
    }

    /// Returns the number of nights in this [`Stay`], where any started day
    /// counts as a whole night.
    #[must_use]
    pub fn nights(&self) -> u64 {
        // Never zero, since `end` is after `start`.
        self.start.days_until(&self.end).unwrap_or(1)
    }

    /// Indicates whether this [`Stay`] shares any moment with the `other`
    /// one.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end.coerce() && other.start < self.end.coerce()
    }
}

/// [`DateTimeOf`] a [`Stay`] start.
pub type StartDateTime = DateTimeOf<(Stay, unit::Start)>;

/// [`DateTimeOf`] a [`Stay`] end.
pub type EndDateTime = DateTimeOf<(Stay, unit::End)>;

#[cfg(test)]
mod spec {
    use common::DateTime;

    use super::Stay;

    fn stay(start: &str, end: &str) -> Option<Stay> {
        Stay::new(
            DateTime::from_rfc3339(start).unwrap().coerce(),
            DateTime::from_rfc3339(end).unwrap().coerce(),
        )
    }

    #[test]
    fn requires_positive_duration() {
        assert!(stay("2024-06-01T00:00:00Z", "2024-06-01T00:00:00Z").is_none());
        assert!(stay("2024-06-04T00:00:00Z", "2024-06-01T00:00:00Z").is_none());
        assert!(stay("2024-06-01T00:00:00Z", "2024-06-01T00:00:01Z").is_some());
    }

    #[test]
    fn counts_started_nights() {
        let s = stay("2024-06-01T00:00:00Z", "2024-06-04T00:00:00Z").unwrap();
        assert_eq!(s.nights(), 3);

        let s = stay("2024-06-01T00:00:00Z", "2024-06-01T02:00:00Z").unwrap();
        assert_eq!(s.nights(), 1);

        let s = stay("2024-06-01T12:00:00Z", "2024-06-03T13:00:00Z").unwrap();
        assert_eq!(s.nights(), 3);
    }

    #[test]
    fn overlap_is_half_open() {
        let booked =
            stay("2024-07-01T00:00:00Z", "2024-07-10T00:00:00Z").unwrap();

        let inside =
            stay("2024-07-05T00:00:00Z", "2024-07-08T00:00:00Z").unwrap();
        let after =
            stay("2024-07-10T00:00:00Z", "2024-07-12T00:00:00Z").unwrap();
        let before =
            stay("2024-06-25T00:00:00Z", "2024-07-01T00:00:00Z").unwrap();
        let spanning =
            stay("2024-06-25T00:00:00Z", "2024-07-15T00:00:00Z").unwrap();

        assert!(booked.overlaps(&inside));
        assert!(inside.overlaps(&booked));
        assert!(booked.overlaps(&spanning));
        assert!(!booked.overlaps(&after));
        assert!(!booked.overlaps(&before));
    }
}
