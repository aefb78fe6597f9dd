//! [`LikePattern`] definition.

use derive_more::Display;
use postgres_types::{FromSql, ToSql};

/// SQL `LIKE` pattern matching any text containing the given input
/// literally.
#[derive(Clone, Debug, Display, Eq, FromSql, PartialEq, ToSql)]
#[postgres(transparent)]
pub struct LikePattern(String);

impl LikePattern {
    /// Creates a new [`LikePattern`] out of the given `input`, escaping all
    /// the `LIKE` wildcards in it.
    #[must_use]
    pub fn containing(input: &str) -> Self {
        let mut pattern = String::with_capacity(input.len() + 2);
        pattern.push('%');
        for c in input.chars() {
            if matches!(c, '\\' | '%' | '_') {
                pattern.push('\\');
            }
            pattern.push(c);
        }
        pattern.push('%');
        Self(pattern)
    }
}

#[cfg(test)]
mod spec {
    use super::LikePattern;

    #[test]
    fn escapes_wildcards() {
        assert_eq!(LikePattern::containing("Paris").to_string(), "%Paris%");
        assert_eq!(
            LikePattern::containing(r"100%_sea\view").to_string(),
            r"%100\%\_sea\\view%",
        );
    }
}
