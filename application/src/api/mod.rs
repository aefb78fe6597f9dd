//! GraphQL API definitions.

pub mod booking;
pub mod listing;
mod mutation;
mod query;
pub mod scalar;
pub mod user;

pub use juniper::EmptySubscription;

pub use self::{
    booking::Booking, listing::Listing, mutation::Mutation, query::Query,
    user::User,
};

use crate::Context;

/// GraphQL schema.
pub type Schema =
    juniper::RootNode<'static, Query, Mutation, EmptySubscription<Context>>;
