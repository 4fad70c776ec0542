use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// ISO 4217 currency of a [`Money`](crate::core::money::Money) value.
///
/// The set is closed on purpose: amounts never cross currencies implicitly,
/// so there is no conversion table here. Arithmetic between two different
/// currencies fails with `CurrencyMismatch`.
///
/// # Examples
///
/// ```
/// use payoff_engine::core::currency::Currency;
///
/// let usd: Currency = "usd".parse().unwrap();
/// assert_eq!(usd, Currency::USD);
/// assert_eq!(usd.to_string(), "USD");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
    JPY,
    CHF,
    CNY,
}

/// Returned when a currency code is not one of the supported ISO codes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported currency code '{0}'")]
pub struct UnknownCurrency(pub String);

impl Currency {
    /// All supported currencies, in declaration order.
    pub const ALL: [Currency; 8] = [
        Currency::USD,
        Currency::EUR,
        Currency::GBP,
        Currency::CAD,
        Currency::AUD,
        Currency::JPY,
        Currency::CHF,
        Currency::CNY,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::CAD => "CAD",
            Currency::AUD => "AUD",
            Currency::JPY => "JPY",
            Currency::CHF => "CHF",
            Currency::CNY => "CNY",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = UnknownCurrency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Currency::ALL
            .iter()
            .copied()
            .find(|c| c.code() == upper)
            .ok_or(UnknownCurrency(s.to_string()))
    }
}
