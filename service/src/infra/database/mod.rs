//! [`Database`]-related implementations.

#[cfg(any(test, feature = "memory"))]
pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

use derive_more::{Display, Error as StdError, From};

#[cfg(any(test, feature = "memory"))]
pub use self::memory::Memory;
#[cfg(feature = "postgres")]
pub use self::postgres::Postgres;

/// Database operation.
pub use common::Handler as Database;

/// [`Database`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    #[cfg(feature = "postgres")]
    /// [`Postgres`] error.
    Postgres(postgres::Error),

    #[cfg(any(test, feature = "memory"))]
    /// [`Memory`] error.
    Memory(memory::Error),
}

impl Error {
    /// Indicates whether this [`Error`] is caused by a write clashing with
    /// the already stored data (a unique key or a non-overlapping range).
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        match *self {
            #[cfg(feature = "postgres")]
            Self::Postgres(ref e) => {
                e.is_unique_violation(None) || e.is_exclusion_violation(None)
            }
            #[cfg(any(test, feature = "memory"))]
            Self::Memory(ref e) => e.is_conflict(),
        }
    }
}
