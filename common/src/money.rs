//! [`Money`]-related definitions.

use std::{fmt, str::FromStr};

use rust_decimal::{prelude::ToPrimitive as _, Decimal};

use crate::define_kind;

/// Amount of money in some [`Currency`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Money {
    /// Amount of this [`Money`].
    pub amount: Decimal,

    /// [`Currency`] of this amount.
    pub currency: Currency,
}

impl Money {
    /// Number of fractional digits kept by any [`Currency`].
    pub const SCALE: u32 = 2;

    /// Largest amount any [`Money`] is allowed to reach: 18 integral and
    /// [`Money::SCALE`] fractional digits.
    #[must_use]
    pub fn max_amount() -> Decimal {
        Decimal::from_i128_with_scale(99_999_999_999_999_999_999, Self::SCALE)
    }

    /// Indicates whether this [`Money`] amount doesn't exceed
    /// [`Money::max_amount()`] in magnitude.
    #[must_use]
    pub fn is_bounded(&self) -> bool {
        self.amount.abs() <= Self::max_amount()
    }

    /// Indicates whether this [`Money`] amount is strictly greater than zero.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    /// Multiplies this [`Money`] by the provided `factor`, keeping the
    /// [`Currency`] and rounding to the [`Money::SCALE`].
    ///
    /// [`None`] is returned if the result exceeds [`Money::max_amount()`].
    #[must_use]
    pub fn times(&self, factor: u64) -> Option<Self> {
        let amount = self
            .amount
            .checked_mul(Decimal::from(factor))?
            .round_dp(Self::SCALE);
        Some(Self {
            amount,
            currency: self.currency,
        })
        .filter(Self::is_bounded)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { amount, currency } = self;
        match amount.is_integer().then(|| amount.to_i128()).flatten() {
            Some(int) => write!(f, "{int}{currency}"),
            None => write!(f, "{}{currency}", amount.normalize()),
        }
    }
}

impl FromStr for Money {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() < 4 || !s.is_char_boundary(s.len() - 3) {
            return Err("too short");
        }

        let (amount, currency) = s.split_at(s.len() - 3);
        let amount = Decimal::from_str(amount).map_err(|_| "invalid amount")?;
        if amount.scale() > Self::SCALE {
            return Err("too many fractional digits");
        }
        let currency =
            Currency::from_str(currency).map_err(|_| "invalid currency")?;

        Ok(Self { amount, currency })
    }
}

define_kind! {
    #[doc = "Currency of a [`Money`] amount."]
    enum Currency {
        #[doc = "US Dollar."]
        Usd = 1,

        #[doc = "Euro."]
        Eur = 2,

        #[doc = "Congolese Franc."]
        Cdf = 3,
    }
}

#[cfg(feature = "juniper")]
mod juniper {
    //! Module providing integration with [`juniper`] crate.

    use std::str::FromStr as _;

    use juniper::{graphql_scalar, InputValue, ScalarValue, Value};

    /// Money in `{major}.{minor}{currency}` format, where:
    /// - `major` is an integer;
    /// - `minor` is an optional integer of at most two digits;
    /// - `currency` is a three-letter currency code.
    #[graphql_scalar(with = Self, parse_token(String))]
    type Money = super::Money;

    impl Money {
        fn to_output<S: ScalarValue>(m: &Money) -> Value<S> {
            Value::scalar(m.to_string())
        }

        fn from_input<S: ScalarValue>(
            input: &InputValue<S>,
        ) -> Result<Self, String> {
            input
                .as_string_value()
                .ok_or_else(|| {
                    format!(
                        "Cannot parse `Money` input scalar from \
                         non-string value: {input}",
                    )
                })
                .and_then(|s| {
                    Self::from_str(s).map_err(|e| {
                        format!("Cannot parse `Money` input scalar: {e}")
                    })
                })
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use rust_decimal::Decimal;

    use super::{Currency, Money};

    fn money(s: &str) -> Money {
        Money::from_str(s).unwrap()
    }

    #[test]
    fn from_str() {
        assert_eq!(
            money("123.45USD"),
            Money {
                amount: "123.45".parse().unwrap(),
                currency: Currency::Usd,
            },
        );
        assert_eq!(money("50CDF").currency, Currency::Cdf);
        assert_eq!(money("0.5EUR").amount, "0.5".parse::<Decimal>().unwrap());

        assert!(Money::from_str("123.45").is_err());
        assert!(Money::from_str("123.45Us").is_err());
        assert!(Money::from_str("123.45Usdollar").is_err());
        assert!(Money::from_str("1.005USD").is_err());
    }

    #[test]
    fn to_string() {
        assert_eq!(money("123.45EUR").to_string(), "123.45EUR");
        assert_eq!(money("123.00USD").to_string(), "123USD");
        assert_eq!(money("123.50USD").to_string(), "123.5USD");
        assert_eq!(money("7CDF").to_string(), "7CDF");
    }

    #[test]
    fn times_is_exact() {
        assert_eq!(money("100USD").times(3), Some(money("300USD")));
        assert_eq!(money("33.33EUR").times(3), Some(money("99.99EUR")));
        assert_eq!(money("49.99CDF").times(0), Some(money("0CDF")));
    }

    #[test]
    fn times_stays_within_bounds() {
        assert_eq!(
            money("99999999999999999.99USD").times(1),
            Some(money("99999999999999999.99USD")),
        );
        assert!(money("100000000000000000USD").times(20).is_none());
        assert!(money("99999999999999999.99USD").times(2).is_none());
    }

    #[test]
    fn bounds() {
        assert!(money("999999999999999999.99USD").is_bounded());
        assert!(!money("1000000000000000000USD").is_bounded());
        assert!(!money("-1000000000000000000USD").is_bounded());
    }

    #[test]
    fn positivity() {
        assert!(money("0.01USD").is_positive());
        assert!(!money("0USD").is_positive());
        assert!(!money("-5USD").is_positive());
    }
}
