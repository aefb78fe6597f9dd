//! [`User`] definitions.

pub mod session;

use std::sync::LazyLock;

use argon2::{
    password_hash::{self, PasswordHasher as _, PasswordVerifier as _, SaltString},
    Argon2,
};
#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;
use secrecy::{zeroize::Zeroize, CloneableSecret};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use self::session::Session;

/// Platform user: a traveller, a host or an administrator.
#[derive(Clone, Debug, From)]
pub struct User {
    /// ID of this [`User`]
    pub id: Id,

    /// [`Email`] of this [`User`], used as a login.
    pub email: Email,

    /// [`Name`] of this [`User`], if provided.
    pub name: Option<Name>,

    /// [`PasswordHash`] of this [`User`].
    pub password_hash: PasswordHash,

    /// [`Role`] of this [`User`].
    pub role: Role,

    /// [`AvatarUrl`] of this [`User`], if any.
    pub avatar_url: Option<AvatarUrl>,

    /// [`Phone`] of this [`User`], if any.
    pub phone: Option<Phone>,

    /// [`Bio`] of this [`User`], if any.
    pub bio: Option<Bio>,

    /// [`DateTime`] when this [`User`] was created.
    pub created_at: CreationDateTime,
}

/// ID of a [`User`].
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

define_kind! {
    #[doc = "Role of a [`User`] defining its privileges."]
    enum Role {
        #[doc = "Regular traveller able to book stays."]
        User = 1,

        #[doc = "Traveller also able to publish listings."]
        Host = 2,

        #[doc = "Administrator of the platform."]
        Admin = 3,

        #[doc = "Administrator able to manage other administrators."]
        SuperAdmin = 4,
    }
}

impl Role {
    /// Indicates whether this [`Role`] allows publishing listings.
    #[must_use]
    pub const fn can_host(self) -> bool {
        match self {
            Self::Host | Self::Admin | Self::SuperAdmin => true,
            Self::User => false,
        }
    }
}

/// Name of a [`User`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Name(String);

impl Name {
    /// Creates a new [`Name`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `name` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Creates a new [`Name`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        Self::check(&name).then_some(Self(name))
    }

    /// Checks whether the given `name` is a valid [`Name`].
    fn check(name: impl AsRef<str>) -> bool {
        let name = name.as_ref();
        name.trim() == name
            && name.chars().count() >= 2
            && name.len() <= 512
    }
}

impl FromStr for Name {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Name`")
    }
}

/// Password of a [`User`].
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub struct Password(String);

impl Password {
    /// Creates a new [`Password`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `password` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(password: impl Into<String>) -> Self {
        Self(password.into())
    }

    /// Creates a new [`Password`] if the given `password` is valid.
    #[must_use]
    pub fn new(password: impl Into<String>) -> Option<Self> {
        let password = password.into();
        Self::check(&password).then_some(Self(password))
    }

    /// Checks whether the given `password` is a valid [`Password`].
    fn check(password: impl AsRef<str>) -> bool {
        let len = password.as_ref().chars().count();
        (8..=128).contains(&len)
    }
}

impl FromStr for Password {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Password`")
    }
}

impl CloneableSecret for Password {}
impl Zeroize for Password {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

/// Password hash of a [`User`] in a [PHC string format][1].
///
/// [1]: https://github.com/P-H-C/phc-string-format
#[derive(Clone, Debug, Display, Eq, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Hashes the given [`Password`] with [Argon2] and a random salt.
    ///
    /// # Errors
    ///
    /// If [Argon2] fails to hash the [`Password`].
    ///
    /// [Argon2]: https://en.wikipedia.org/wiki/Argon2
    pub fn new(password: &Password) -> Result<Self, password_hash::Error> {
        let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes())?;
        Ok(Self(
            Argon2::default()
                .hash_password(password.0.as_bytes(), &salt)?
                .to_string(),
        ))
    }

    /// Checks whether the given [`Password`] matches this [`PasswordHash`].
    #[must_use]
    pub fn verify(&self, password: &Password) -> bool {
        password_hash::PasswordHash::new(&self.0).is_ok_and(|hash| {
            Argon2::default()
                .verify_password(password.0.as_bytes(), &hash)
                .is_ok()
        })
    }
}

/// Email address of a [`User`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Email(String);

impl Email {
    /// Creates a new [`Email`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `address` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Creates a new [`Email`] if the given `address` is valid.
    ///
    /// The address is lowercased, so lookups are case-insensitive.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Option<Self> {
        let address = address.into().to_lowercase();
        Self::check(&address).then_some(Self(address))
    }

    /// Checks whether the given `address` is a valid [`Email`].
    fn check(address: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Email`] format: a local part, the
        /// `@` sign and a dotted domain, without whitespace.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^[^\s@]{1,64}@[^\s@.]+(\.[^\s@.]+)+$")
                .expect("valid regex")
        });

        let address = address.as_ref();
        address.len() <= 254 && REGEX.is_match(address)
    }
}

impl FromStr for Email {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Email`")
    }
}

/// Phone number of a [`User`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Phone(String);

impl Phone {
    /// Creates a new [`Phone`] if the given `number` is valid.
    #[must_use]
    pub fn new(number: impl Into<String>) -> Option<Self> {
        let number = number.into();
        Self::check(&number).then_some(Self(number))
    }

    /// Checks whether the given `number` is a valid [`Phone`].
    fn check(number: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Phone`] format.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^[+]?\d{1,3}?[-\s]?(\d{2,4}[-\s]?){2,4}\d{2,4}$")
                .expect("valid regex")
        });

        REGEX.is_match(number.as_ref())
    }
}

impl FromStr for Phone {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Phone`")
    }
}

/// URL of a [`User`]'s avatar image.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct AvatarUrl(String);

impl AvatarUrl {
    /// Creates a new [`AvatarUrl`] if the given `url` is an HTTP(S) one.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Option<Self> {
        let url = url.into();
        crate::domain::is_http_url(&url).then_some(Self(url))
    }
}

impl FromStr for AvatarUrl {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `AvatarUrl`")
    }
}

/// Free-form biography of a [`User`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Bio(String);

impl Bio {
    /// Creates a new [`Bio`] if the given `text` is not too long.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        (text.len() <= 4096).then_some(Self(text))
    }
}

/// [`DateTime`] when a [`User`] was created.
pub type CreationDateTime = DateTimeOf<(User, unit::Creation)>;

#[cfg(test)]
mod spec {
    use super::{Email, Name, Password, PasswordHash, Phone, Role};

    #[test]
    fn email_is_normalized() {
        let email = Email::new("Jane.Doe@Example.COM").unwrap();

        assert_eq!(AsRef::<str>::as_ref(&email), "jane.doe@example.com");
        assert!(Email::new("jane@localhost").is_none());
        assert!(Email::new("jane doe@example.com").is_none());
        assert!(Email::new("@example.com").is_none());
    }

    #[test]
    fn name_and_password_bounds() {
        assert!(Name::new("Jo").is_some());
        assert!(Name::new("J").is_none());
        assert!(Name::new(" Jo").is_none());

        assert!(Password::new("12345678").is_some());
        assert!(Password::new("1234567").is_none());
        assert!(Password::new("x".repeat(129)).is_none());
    }

    #[test]
    fn phone_format() {
        assert!(Phone::new("+243 81 234 5678").is_some());
        assert!(Phone::new("555-123-4567").is_some());
        assert!(Phone::new("call me").is_none());
    }

    #[test]
    fn password_hash_verifies_only_its_password() {
        let password = Password::new("correct horse").unwrap();
        let hash = PasswordHash::new(&password).unwrap();

        assert!(hash.verify(&password));
        assert!(!hash.verify(&Password::new("battery staple").unwrap()));
        assert_ne!(hash, PasswordHash::new(&password).unwrap());
    }

    #[test]
    fn only_elevated_roles_host() {
        assert!(!Role::User.can_host());
        assert!(Role::Host.can_host());
        assert!(Role::Admin.can_host());
        assert!(Role::SuperAdmin.can_host());
        assert_eq!(Role::SuperAdmin.to_string(), "SUPER_ADMIN");
    }
}
