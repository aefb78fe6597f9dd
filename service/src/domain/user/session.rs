//! [`Session`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{AsRef, Display, FromStr};
use serde::{Deserialize, Serialize};

#[cfg(doc)]
use crate::domain::User;
use crate::domain::user::{self, Role};

/// Authenticated session of a [`User`].
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct Session {
    /// ID of the [`User`] this [`Session`] belongs to.
    pub user_id: user::Id,

    /// [`Role`] of the [`User`] at the moment this [`Session`] was issued.
    #[serde(with = "role_name")]
    pub role: Role,

    /// [`DateTime`] when this [`Session`] expires.
    #[serde(rename = "exp", with = "common::datetime::serde::unix_timestamp")]
    pub expires_at: ExpirationDateTime,
}

/// Access token of a [`Session`].
#[derive(AsRef, Clone, Debug, Display, FromStr)]
pub struct Token(String);

impl Token {
    /// Creates a new [`Token`] without checking its contents.
    ///
    /// # Safety
    ///
    /// The provided `token` must be a valid [`Token`] representation.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub const unsafe fn new_unchecked(token: String) -> Self {
        Self(token)
    }
}

/// [`DateTime`] of a [`Session`] expiration.
pub type ExpirationDateTime = DateTimeOf<(Session, unit::Expiration)>;

mod role_name {
    //! [`Role`] (de)serialization as its `SCREAMING_SNAKE_CASE` name.

    use std::str::FromStr as _;

    use serde::{de, Deserialize as _, Deserializer, Serializer};

    use super::Role;

    pub(super) fn serialize<S: Serializer>(
        role: &Role,
        ser: S,
    ) -> Result<S::Ok, S::Error> {
        ser.collect_str(role)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        de: D,
    ) -> Result<Role, D::Error> {
        let name = String::deserialize(de)?;
        Role::from_str(&name).map_err(de::Error::custom)
    }
}
