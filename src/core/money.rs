use crate::core::currency::Currency;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

/// Number of fraction digits every Money amount carries.
pub const SCALE: u32 = 4;

/// Largest representable magnitude: the bounds of a DECIMAL(19,4) column.
pub const MAX_AMOUNT: Decimal = dec!(999_999_999_999_999.9999);

/// Errors arising from Money construction and arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    #[error("invalid amount '{literal}': {reason}")]
    InvalidAmount {
        literal: String,
        reason: &'static str,
    },
    #[error("currency mismatch: {left} vs {right}")]
    CurrencyMismatch { left: Currency, right: Currency },
    #[error("division by zero")]
    DivisionByZero,
}

impl MoneyError {
    fn invalid(literal: impl Into<String>, reason: &'static str) -> Self {
        MoneyError::InvalidAmount {
            literal: literal.into(),
            reason,
        }
    }
}

/// An exact monetary amount in a single currency.
///
/// The amount is a base-10 [`Decimal`] held at exactly [`SCALE`] fraction
/// digits, rounded half-up (away from zero) after every operation and kept
/// within [`MAX_AMOUNT`]. Values are immutable; every operation returns a
/// new `Money`.
///
/// Comparison is exact. There is no epsilon anywhere, which is why the
/// classic binary-float error cannot occur:
///
/// ```
/// use payoff_engine::core::currency::Currency;
/// use payoff_engine::core::money::Money;
///
/// let a = Money::parse("0.1", Currency::USD).unwrap();
/// let b = Money::parse("0.2", Currency::USD).unwrap();
/// let c = Money::parse("0.3", Currency::USD).unwrap();
/// assert_eq!(a.add(&b).unwrap(), c);
/// assert_eq!(c.to_fixed_string(), "0.3000");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MoneyRepr", into = "MoneyRepr")]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

/// Wire and storage form: the amount as a fixed 4-digit string.
#[derive(Serialize, Deserialize)]
struct MoneyRepr {
    amount: String,
    currency: Currency,
}

impl From<Money> for MoneyRepr {
    fn from(m: Money) -> Self {
        MoneyRepr {
            amount: m.to_fixed_string(),
            currency: m.currency,
        }
    }
}

impl TryFrom<MoneyRepr> for Money {
    type Error = MoneyError;

    fn try_from(repr: MoneyRepr) -> Result<Self, Self::Error> {
        Money::parse(&repr.amount, repr.currency)
    }
}

/// Round half-up to [`SCALE`], enforce the bounds and pin the scale.
fn normalize(amount: Decimal) -> Result<Decimal, MoneyError> {
    let mut rounded = amount.round_dp_with_strategy(SCALE, RoundingStrategy::MidpointAwayFromZero);
    if rounded.abs() > MAX_AMOUNT {
        return Err(MoneyError::invalid(
            amount.to_string(),
            "magnitude exceeds 999999999999999.9999",
        ));
    }
    rounded.rescale(SCALE);
    if rounded.is_zero() {
        rounded.set_sign_positive(true);
    }
    Ok(rounded)
}

fn overflow(op: &'static str) -> MoneyError {
    MoneyError::invalid(op, "arithmetic overflow")
}

impl Money {
    /// Create a Money value from an exact decimal, rounding to 4 digits.
    pub fn new(amount: Decimal, currency: Currency) -> Result<Self, MoneyError> {
        Ok(Self {
            amount: normalize(amount)?,
            currency,
        })
    }

    /// Parse a decimal literal such as `"1234.56"` or `"-0.5"`.
    ///
    /// Exponent notation and literals with more precision than a 96-bit
    /// decimal can hold exactly are rejected rather than silently rounded.
    pub fn parse(literal: &str, currency: Currency) -> Result<Self, MoneyError> {
        let trimmed = literal.trim();
        if trimmed.is_empty() {
            return Err(MoneyError::invalid(literal, "empty literal"));
        }
        let amount = Decimal::from_str_exact(trimmed)
            .map_err(|_| MoneyError::invalid(literal, "not a decimal number"))?;
        Self::new(amount, currency).map_err(|_| {
            MoneyError::invalid(literal, "magnitude exceeds 999999999999999.9999")
        })
    }

    /// A whole number of currency units.
    pub fn from_integer(units: i64, currency: Currency) -> Result<Self, MoneyError> {
        Self::new(Decimal::from(units), currency)
    }

    /// Zero in `currency`, at scale 4.
    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: Decimal::new(0, SCALE),
            currency,
        }
    }

    /// The exact amount, always at scale 4.
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    fn same_currency(&self, other: &Money) -> Result<(), MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch {
                left: self.currency,
                right: other.currency,
            });
        }
        Ok(())
    }

    /// Sum of two same-currency amounts.
    ///
    /// Fails with `CurrencyMismatch` across currencies and `InvalidAmount`
    /// when the result leaves the representable range.
    pub fn add(&self, other: &Money) -> Result<Money, MoneyError> {
        self.same_currency(other)?;
        let sum = self
            .amount
            .checked_add(other.amount)
            .ok_or_else(|| overflow("add"))?;
        Money::new(sum, self.currency)
    }

    /// `self - other`, under the same rules as [`Money::add`].
    pub fn subtract(&self, other: &Money) -> Result<Money, MoneyError> {
        self.same_currency(other)?;
        let diff = self
            .amount
            .checked_sub(other.amount)
            .ok_or_else(|| overflow("subtract"))?;
        Money::new(diff, self.currency)
    }

    /// Scale by a unitless factor (a rate, a share, a count).
    pub fn multiply(&self, factor: Decimal) -> Result<Money, MoneyError> {
        let product = self
            .amount
            .checked_mul(factor)
            .ok_or_else(|| overflow("multiply"))?;
        Money::new(product, self.currency)
    }

    /// Divide by a unitless divisor.
    pub fn divide(&self, divisor: Decimal) -> Result<Money, MoneyError> {
        if divisor.is_zero() {
            return Err(MoneyError::DivisionByZero);
        }
        let quotient = self
            .amount
            .checked_div(divisor)
            .ok_or_else(|| overflow("divide"))?;
        Money::new(quotient, self.currency)
    }

    /// Unitless ratio `self / other`, e.g. a utilisation or a savings share.
    pub fn ratio(&self, other: &Money) -> Result<Decimal, MoneyError> {
        self.same_currency(other)?;
        if other.amount.is_zero() {
            return Err(MoneyError::DivisionByZero);
        }
        self.amount
            .checked_div(other.amount)
            .ok_or_else(|| overflow("ratio"))
    }

    /// Exact equality. Equivalent to `==`.
    pub fn equals(&self, other: &Money) -> bool {
        self == other
    }

    /// Exact `self > other`. Comparing across currencies is an error.
    pub fn greater_than(&self, other: &Money) -> Result<bool, MoneyError> {
        self.same_currency(other)?;
        Ok(self.amount > other.amount)
    }

    /// Exact `self < other`. Comparing across currencies is an error.
    pub fn less_than(&self, other: &Money) -> Result<bool, MoneyError> {
        self.same_currency(other)?;
        Ok(self.amount < other.amount)
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.amount < Decimal::ZERO
    }

    /// Magnitude without the sign.
    pub fn abs(&self) -> Money {
        Money {
            amount: self.amount.abs(),
            currency: self.currency,
        }
    }

    /// The same amount with the sign flipped. Zero stays unsigned.
    pub fn negate(&self) -> Money {
        if self.amount.is_zero() {
            return *self;
        }
        Money {
            amount: -self.amount,
            currency: self.currency,
        }
    }

    /// The smaller of two same-currency amounts.
    pub fn min_of(&self, other: &Money) -> Result<Money, MoneyError> {
        Ok(if self.less_than(other)? { *self } else { *other })
    }

    /// The larger of two same-currency amounts.
    pub fn max_of(&self, other: &Money) -> Result<Money, MoneyError> {
        Ok(if self.greater_than(other)? { *self } else { *other })
    }

    /// Left-to-right sum. An empty sequence sums to zero in `currency`.
    pub fn sum<'a, I>(items: I, currency: Currency) -> Result<Money, MoneyError>
    where
        I: IntoIterator<Item = &'a Money>,
    {
        items
            .into_iter()
            .try_fold(Money::zero(currency), |acc, m| acc.add(m))
    }

    /// Arithmetic mean, rounded half-up. An empty sequence averages to zero.
    pub fn average<'a, I>(items: I, currency: Currency) -> Result<Money, MoneyError>
    where
        I: IntoIterator<Item = &'a Money>,
    {
        let mut count = 0u64;
        let mut total = Money::zero(currency);
        for m in items {
            total = total.add(m)?;
            count += 1;
        }
        if count == 0 {
            return Ok(total);
        }
        total.divide(Decimal::from(count))
    }

    /// Largest element, or `None` for an empty sequence.
    pub fn max<'a, I>(items: I) -> Result<Option<Money>, MoneyError>
    where
        I: IntoIterator<Item = &'a Money>,
    {
        items.into_iter().try_fold(None, |best: Option<Money>, m| {
            Ok(Some(match best {
                None => *m,
                Some(b) => b.max_of(m)?,
            }))
        })
    }

    /// Smallest element, or `None` for an empty sequence.
    pub fn min<'a, I>(items: I) -> Result<Option<Money>, MoneyError>
    where
        I: IntoIterator<Item = &'a Money>,
    {
        items.into_iter().try_fold(None, |best: Option<Money>, m| {
            Ok(Some(match best {
                None => *m,
                Some(b) => b.min_of(m)?,
            }))
        })
    }

    /// Fixed 4-fraction-digit string, e.g. `"1234.5600"`. Never uses
    /// exponent notation.
    pub fn to_fixed_string(&self) -> String {
        self.amount.to_string()
    }
}

impl PartialOrd for Money {
    /// Amounts in different currencies are unordered.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.currency != other.currency {
            return None;
        }
        self.amount.partial_cmp(&other.amount)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.to_fixed_string(), self.currency)
    }
}
