//! GraphQL scalar definitions.

use std::{fmt, marker::PhantomData, str::FromStr};

use juniper::{
    GraphQLType, InputValue, ParseScalarResult, ParseScalarValue, ScalarToken,
    ScalarValue, Value,
};

/// Helper type to use in `#[graphql(with = ..)]` attribute.
///
/// Passes the GraphQL string through the [`FromStr`]/[`Display`] impls of the
/// `As` domain type, so the domain validation applies to every input.
///
/// Target type must implement [`TryFrom`] and [`AsRef`] for `As` type.
///
/// [`Display`]: fmt::Display
#[derive(Debug)]
pub struct Via<As>(PhantomData<As>);

impl<As> Via<As> {
    /// Convert the target type into scalar [`Value`] by using [`Display`] impl
    /// of `As` type.
    ///
    /// [`Display`]: fmt::Display
    pub fn to_output<T, S>(value: &T) -> Value<S>
    where
        As: fmt::Display,
        T: AsRef<As>,
        S: ScalarValue,
    {
        Value::from(value.as_ref().to_string())
    }

    /// Constructs the target type from scalar [`Value`] by using [`FromStr`]
    /// impl of `As` type.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the input value is not a string;
    /// - the input value cannot be parsed into `As` type;
    /// - the parsed value cannot be converted into the target type.
    pub fn from_input<T, S>(input: &InputValue<S>) -> Result<T, String>
    where
        As: FromStr,
        As::Err: fmt::Display,
        T: TryFrom<As> + GraphQLType<S, TypeInfo = ()>,
        T::Error: fmt::Display,
        S: ScalarValue,
    {
        let name = T::name(&()).unwrap_or("<unnamed>");
        let s = input.as_string_value().ok_or_else(|| {
            format!(
                "Cannot parse input scalar `{name}`: expected string input \
                 value, found: {input}",
            )
        })?;
        s.parse::<As>()
            .map_err(|e| {
                format!("Cannot parse input scalar `{name}` from \"{s}\": {e}")
            })?
            .try_into()
            .map_err(|e| format!("Cannot parse input scalar `{name}`: {e}"))
    }

    /// Parse the provided [`ScalarToken`].
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be parsed as [`String`].
    pub fn parse_token<S: ScalarValue>(
        value: ScalarToken<'_>,
    ) -> ParseScalarResult<S> {
        <String as ParseScalarValue<S>>::from_str(value)
    }
}

#[cfg(test)]
mod spec {
    use juniper::{DefaultScalarValue, InputValue};
    use service::domain;

    use crate::api::{listing, user};

    use super::Via;

    fn input(s: &str) -> InputValue<DefaultScalarValue> {
        InputValue::scalar(s.to_owned())
    }

    #[test]
    fn applies_domain_normalization() {
        let email: user::Email =
            Via::<domain::user::Email>::from_input(&input("Jane@Example.COM"))
                .unwrap();

        assert_eq!(email.to_string(), "jane@example.com");
    }

    #[test]
    fn rejects_invalid_values() {
        let err = Via::<domain::listing::Title>::from_input::<
            listing::Title,
            _,
        >(&input(" padded "))
        .unwrap_err();

        assert!(err.contains("ListingTitle"), "{err}");
    }

    #[test]
    fn rejects_non_string_values() {
        let err = Via::<domain::listing::City>::from_input::<listing::City, _>(
            &InputValue::<DefaultScalarValue>::scalar(42),
        )
        .unwrap_err();

        assert!(err.contains("expected string"), "{err}");
    }
}
