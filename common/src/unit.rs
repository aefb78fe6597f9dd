//! Marker types.

/// Marker type describing an entity creation.
#[derive(Clone, Copy, Debug)]
pub struct Creation;

/// Marker type describing the beginning of a date range.
#[derive(Clone, Copy, Debug)]
pub struct Start;

/// Marker type describing the end of a date range.
#[derive(Clone, Copy, Debug)]
pub struct End;

/// Marker type describing an expiration.
#[derive(Clone, Copy, Debug)]
pub struct Expiration;
