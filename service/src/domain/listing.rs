//! [`Listing`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf, Money};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{stay::Stay, user};

/// Place offered by a host for paid stays.
#[derive(Clone, Debug)]
pub struct Listing {
    /// ID of this [`Listing`].
    pub id: Id,

    /// ID of the [`User`] hosting this [`Listing`].
    ///
    /// [`User`]: crate::domain::User
    pub host_id: user::Id,

    /// [`Title`] of this [`Listing`].
    pub title: Title,

    /// [`Description`] of this [`Listing`].
    pub description: Description,

    /// [`Kind`] of the property offered by this [`Listing`].
    pub kind: Kind,

    /// Price of a single night in this [`Listing`].
    pub price: Money,

    /// [`Address`] of this [`Listing`].
    pub address: Address,

    /// [`City`] this [`Listing`] is located in.
    pub city: City,

    /// [`Country`] this [`Listing`] is located in.
    pub country: Country,

    /// [`Amenity`]s offered by this [`Listing`].
    pub amenities: Vec<Amenity>,

    /// Maximum number of guests this [`Listing`] accommodates.
    pub max_guests: Guests,

    /// Number of bedrooms in this [`Listing`].
    pub bedrooms: Rooms,

    /// Number of bathrooms in this [`Listing`].
    pub bathrooms: Rooms,

    /// [`DateTime`] when this [`Listing`] was created.
    pub created_at: CreationDateTime,
}

impl Listing {
    /// Indicates whether this [`Listing`] accommodates the provided number
    /// of `guests`.
    #[must_use]
    pub fn accommodates(&self, guests: u32) -> bool {
        u32::from(u16::from(self.max_guests)) >= guests
    }
}

/// ID of a [`Listing`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Title of a [`Listing`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[as_ref(forward)]
pub struct Title(String);

impl Title {
    /// Creates a new [`Title`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `title` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(title: impl Into<String>) -> Self {
        Self(title.into())
    }

    /// Creates a new [`Title`] if the given `title` is valid.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Option<Self> {
        let title = title.into();
        Self::check(&title).then_some(Self(title))
    }

    /// Checks whether the given `title` is a valid [`Title`].
    fn check(title: impl AsRef<str>) -> bool {
        let title = title.as_ref();
        title.trim() == title && !title.is_empty() && title.len() <= 256
    }
}

impl FromStr for Title {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Title`")
    }
}

/// Description of a [`Listing`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[as_ref(forward)]
pub struct Description(String);

impl Description {
    /// Creates a new [`Description`] if the given `text` is valid.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        (!text.trim().is_empty() && text.len() <= 8192).then_some(Self(text))
    }
}

impl FromStr for Description {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Description`")
    }
}

/// Kind of the property offered by a [`Listing`] (`Apartment`, `Villa`,
/// etc).
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[as_ref(forward)]
pub struct Kind(String);

impl Kind {
    /// Creates a new [`Kind`] if the given `kind` is valid.
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Option<Self> {
        let kind = kind.into();
        (kind.trim() == kind && !kind.is_empty() && kind.len() <= 64)
            .then_some(Self(kind))
    }
}

impl FromStr for Kind {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Kind`")
    }
}

/// Street address of a [`Listing`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[as_ref(forward)]
pub struct Address(String);

impl Address {
    /// Creates a new [`Address`] if the given `address` is valid.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Option<Self> {
        let address = address.into();
        (address.trim() == address
            && !address.is_empty()
            && address.len() <= 512)
            .then_some(Self(address))
    }
}

impl FromStr for Address {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Address`")
    }
}

/// City a [`Listing`] is located in.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[as_ref(forward)]
pub struct City(String);

impl City {
    /// Creates a new [`City`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `city` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(city: impl Into<String>) -> Self {
        Self(city.into())
    }

    /// Creates a new [`City`] if the given `city` is valid.
    #[must_use]
    pub fn new(city: impl Into<String>) -> Option<Self> {
        let city = city.into();
        (city.trim() == city && !city.is_empty() && city.len() <= 256)
            .then_some(Self(city))
    }
}

impl FromStr for City {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `City`")
    }
}

/// Country a [`Listing`] is located in.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[as_ref(forward)]
pub struct Country(String);

impl Country {
    /// Creates a new [`Country`] if the given `country` is valid.
    #[must_use]
    pub fn new(country: impl Into<String>) -> Option<Self> {
        let country = country.into();
        (country.trim() == country
            && !country.is_empty()
            && country.len() <= 256)
            .then_some(Self(country))
    }
}

impl FromStr for Country {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Country`")
    }
}

/// Amenity offered by a [`Listing`] (`WiFi`, `Pool`, etc).
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[as_ref(forward)]
pub struct Amenity(String);

impl Amenity {
    /// Creates a new [`Amenity`] if the given `amenity` is valid.
    #[must_use]
    pub fn new(amenity: impl Into<String>) -> Option<Self> {
        let amenity = amenity.into();
        (amenity.trim() == amenity
            && !amenity.is_empty()
            && amenity.len() <= 64)
            .then_some(Self(amenity))
    }
}

impl FromStr for Amenity {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Amenity`")
    }
}

/// Positive number of guests.
#[derive(
    Clone, Copy, Debug, Display, Eq, Hash, Into, Ord, PartialEq, PartialOrd,
)]
pub struct Guests(u16);

impl Guests {
    /// Creates new [`Guests`] if the provided `count` is positive.
    #[must_use]
    pub const fn new(count: u16) -> Option<Self> {
        if count == 0 {
            None
        } else {
            Some(Self(count))
        }
    }
}

impl TryFrom<i32> for Guests {
    type Error = &'static str;

    fn try_from(count: i32) -> Result<Self, Self::Error> {
        u16::try_from(count)
            .ok()
            .and_then(Self::new)
            .ok_or("`Guests` must be a positive integer")
    }
}

/// Number of rooms of some kind in a [`Listing`].
pub type Rooms = u16;

/// Image of a [`Listing`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Photo {
    /// ID of the [`Listing`] this [`Photo`] belongs to.
    pub listing_id: Id,

    /// [`PhotoUrl`] of this [`Photo`].
    pub url: PhotoUrl,

    /// Position of this [`Photo`] among the [`Listing`] ones, starting from
    /// zero for the cover.
    pub position: u16,
}

/// URL of an already uploaded [`Photo`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[as_ref(forward)]
pub struct PhotoUrl(String);

impl PhotoUrl {
    /// Creates a new [`PhotoUrl`] if the given `url` is an HTTP(S) one.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Option<Self> {
        let url = url.into();
        crate::domain::is_http_url(&url).then_some(Self(url))
    }
}

impl FromStr for PhotoUrl {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `PhotoUrl`")
    }
}

/// Period a [`Listing`] was declared available by its host.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Availability {
    /// ID of the [`Listing`] this [`Availability`] belongs to.
    pub listing_id: Id,

    /// Available [`Stay`] period.
    pub period: Stay,
}

/// [`DateTime`] when a [`Listing`] was created.
pub type CreationDateTime = DateTimeOf<(Listing, unit::Creation)>;

#[cfg(test)]
mod spec {
    use super::{Amenity, Guests, PhotoUrl, Title};

    #[test]
    fn guests_are_positive() {
        assert!(Guests::new(0).is_none());
        assert_eq!(Guests::try_from(3_i32).map(u16::from), Ok(3));
        assert!(Guests::try_from(0_i32).is_err());
        assert!(Guests::try_from(-2_i32).is_err());
        assert!(Guests::try_from(70_000_i32).is_err());
    }

    #[test]
    fn text_fields_are_trimmed() {
        assert!(Title::new("Sunny loft").is_some());
        assert!(Title::new(" Sunny loft").is_none());
        assert!(Title::new("").is_none());
        assert!(Amenity::new("WiFi").is_some());
        assert!(Amenity::new("").is_none());
    }

    #[test]
    fn photo_url_is_http() {
        assert!(PhotoUrl::new("https://img.example.com/1.jpg").is_some());
        assert!(PhotoUrl::new("http://img.example.com/1.jpg").is_some());
        assert!(PhotoUrl::new("ftp://img.example.com/1.jpg").is_none());
        assert!(PhotoUrl::new("https://").is_none());
        assert!(PhotoUrl::new("https://img example.com").is_none());
    }
}
