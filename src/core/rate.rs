use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

/// Upper bound on any stated percentage (10,000% per period).
const MAX_PERCENTAGE: Decimal = dec!(10000);

const MONTHS_PER_YEAR: Decimal = dec!(12);
const DAYS_PER_YEAR: Decimal = dec!(365);

/// Errors arising from interest-rate construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RateError {
    #[error("interest rate must be non-negative, got {0}%")]
    Negative(Decimal),
    #[error("interest rate {0}% exceeds the supported maximum of 10000%")]
    OutOfRange(Decimal),
    #[error("cannot parse interest rate '{0}'")]
    Unparseable(String),
}

/// The compounding period a [`Rate`] is quoted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Period {
    Annual,
    Monthly,
    Daily,
}

/// A non-negative interest rate, stated as a percentage for a period.
///
/// `Rate::annual(dec!(18.99))` is an 18.99% APR. Simulations accrue interest
/// monthly using [`Rate::monthly_fraction`].
///
/// # Examples
///
/// ```
/// use payoff_engine::core::rate::{Period, Rate};
/// use rust_decimal_macros::dec;
///
/// let monthly = Rate::new(dec!(1), Period::Monthly).unwrap();
/// assert_eq!(monthly.annual_percentage(), dec!(12));
/// assert_eq!(Rate::annual(dec!(12)).unwrap().monthly_fraction(), dec!(0.01));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RateRepr")]
pub struct Rate {
    percentage: Decimal,
    period: Period,
}

#[derive(Deserialize)]
struct RateRepr {
    percentage: Decimal,
    period: Period,
}

impl TryFrom<RateRepr> for Rate {
    type Error = RateError;

    fn try_from(repr: RateRepr) -> Result<Self, Self::Error> {
        Rate::new(repr.percentage, repr.period)
    }
}

impl Rate {
    /// A percentage for `period`, rejected if negative or above 10000%.
    pub fn new(percentage: Decimal, period: Period) -> Result<Self, RateError> {
        if percentage < Decimal::ZERO {
            return Err(RateError::Negative(percentage));
        }
        if percentage > MAX_PERCENTAGE {
            return Err(RateError::OutOfRange(percentage));
        }
        Ok(Self {
            percentage: percentage.normalize(),
            period,
        })
    }

    /// An annual percentage rate.
    pub fn annual(percentage: Decimal) -> Result<Self, RateError> {
        Self::new(percentage, Period::Annual)
    }

    /// 0% APR.
    pub fn zero() -> Self {
        Self {
            percentage: Decimal::ZERO,
            period: Period::Annual,
        }
    }

    /// Parse a percentage literal such as `"18.99"` or `"18.99%"`.
    pub fn parse(literal: &str, period: Period) -> Result<Self, RateError> {
        let trimmed = literal.trim().trim_end_matches('%').trim();
        let percentage = Decimal::from_str_exact(trimmed)
            .map_err(|_| RateError::Unparseable(literal.to_string()))?;
        Self::new(percentage, period)
    }

    /// The stated percentage for [`Rate::period`].
    pub fn percentage(&self) -> Decimal {
        self.percentage
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn is_zero(&self) -> bool {
        self.percentage.is_zero()
    }

    /// The rate for its own period as a fraction (5% -> 0.05).
    pub fn as_fraction(&self) -> Decimal {
        self.percentage / dec!(100)
    }

    /// The simple (non-compounded) annual percentage equivalent.
    pub fn annual_percentage(&self) -> Decimal {
        match self.period {
            Period::Annual => self.percentage,
            Period::Monthly => self.percentage * MONTHS_PER_YEAR,
            Period::Daily => self.percentage * DAYS_PER_YEAR,
        }
    }

    /// Fraction of the balance accrued as interest each month.
    pub fn monthly_fraction(&self) -> Decimal {
        match self.period {
            Period::Monthly => self.as_fraction(),
            _ => self.annual_percentage() / dec!(100) / MONTHS_PER_YEAR,
        }
    }

    /// Restate the same simple rate for another period.
    pub fn convert_to(&self, period: Period) -> Rate {
        let annual = self.annual_percentage();
        let percentage = match period {
            Period::Annual => annual,
            Period::Monthly => annual / MONTHS_PER_YEAR,
            Period::Daily => annual / DAYS_PER_YEAR,
        };
        Rate {
            percentage: percentage.normalize(),
            period,
        }
    }

    /// Order two rates by their annualised value.
    pub fn cmp_annual(&self, other: &Rate) -> Ordering {
        self.annual_percentage().cmp(&other.annual_percentage())
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = match self.period {
            Period::Annual => "APR",
            Period::Monthly => "per month",
            Period::Daily => "per day",
        };
        write!(f, "{}% {}", self.percentage, suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_rate_rejected() {
        assert_eq!(
            Rate::annual(dec!(-1)).unwrap_err(),
            RateError::Negative(dec!(-1))
        );
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert!(matches!(
            Rate::annual(dec!(10000.01)),
            Err(RateError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_monthly_fraction_from_annual() {
        let rate = Rate::annual(dec!(24)).unwrap();
        assert_eq!(rate.monthly_fraction(), dec!(0.02));
    }

    #[test]
    fn test_monthly_to_annual_conversion() {
        let monthly = Rate::new(dec!(1.0), Period::Monthly).unwrap();
        let annual = monthly.convert_to(Period::Annual);
        assert_eq!(annual.as_fraction(), dec!(0.12));
        assert_eq!(annual.period(), Period::Annual);
    }

    #[test]
    fn test_daily_rate_annualises() {
        let daily = Rate::new(dec!(0.05), Period::Daily).unwrap();
        assert_eq!(daily.annual_percentage(), dec!(18.25));
    }

    #[test]
    fn test_parse_accepts_percent_sign() {
        let rate = Rate::parse("18.99%", Period::Annual).unwrap();
        assert_eq!(rate.percentage(), dec!(18.99));
        assert!(matches!(
            Rate::parse("eighteen", Period::Annual),
            Err(RateError::Unparseable(_))
        ));
    }

    #[test]
    fn test_cmp_annual_across_periods() {
        let monthly = Rate::new(dec!(2), Period::Monthly).unwrap(); // 24% APR
        let annual = Rate::annual(dec!(20)).unwrap();
        assert_eq!(monthly.cmp_annual(&annual), Ordering::Greater);
    }

    #[test]
    fn test_deserialize_rejects_negative() {
        let json = r#"{"percentage":"-5","period":"ANNUAL"}"#;
        assert!(serde_json::from_str::<Rate>(json).is_err());
        let ok = r#"{"percentage":"5.5","period":"ANNUAL"}"#;
        assert_eq!(
            serde_json::from_str::<Rate>(ok).unwrap(),
            Rate::annual(dec!(5.5)).unwrap()
        );
    }
}
