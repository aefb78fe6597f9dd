//! Domain definitions.

pub mod booking;
pub mod listing;
pub mod stay;
pub mod user;

pub use self::{
    booking::Booking, listing::Listing, stay::Stay, user::User,
};

/// Checks whether the provided `url` looks like an absolute HTTP(S) URL.
pub(crate) fn is_http_url(url: &str) -> bool {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    rest.is_some_and(|r| {
        !r.is_empty()
            && !r.starts_with('/')
            && !r.chars().any(char::is_whitespace)
    }) && url.len() <= 2048
}
