//! [`User`] read model definition.

use derive_more::{From, Into};

use crate::domain::{user, User};

/// Publicly visible part of a [`User`], safe to show to anyone.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Public {
    /// ID of the [`User`].
    pub id: user::Id,

    /// [`user::Name`] of the [`User`], if any.
    pub name: Option<user::Name>,

    /// [`user::AvatarUrl`] of the [`User`], if any.
    pub avatar_url: Option<user::AvatarUrl>,
}

impl From<&User> for Public {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            avatar_url: user.avatar_url.clone(),
        }
    }
}

/// Total count of registered [`User`]s.
#[derive(Clone, Copy, Debug, Eq, From, Hash, Into, PartialEq)]
pub struct TotalCount(u64);
