//! [`Command`] definition.

pub mod authorize_user_session;
pub mod create_booking;
pub mod create_listing;
pub mod create_user;
pub mod create_user_session;
pub mod upgrade_user_to_host;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    authorize_user_session::AuthorizeUserSession,
    create_booking::CreateBooking, create_listing::CreateListing,
    create_user::CreateUser, create_user_session::CreateUserSession,
    upgrade_user_to_host::UpgradeUserToHost,
};

#[cfg(test)]
mod spec;
