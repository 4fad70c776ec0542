use crate::core::currency::Currency;
use crate::core::money::{Money, MoneyError};
use crate::core::rate::Rate;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier of a debt account within a portfolio.
///
/// # Examples
///
/// ```
/// use payoff_engine::core::debt::DebtId;
///
/// let visa = DebtId::new("visa");
/// assert_eq!(visa.as_str(), "visa");
/// assert_ne!(DebtId::generate(), DebtId::generate());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DebtId(String);

impl DebtId {
    /// Wrap a caller-chosen identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A fresh random (UUID v4) identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DebtId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DebtId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Category of a debt account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebtType {
    CreditCard,
    StudentLoan,
    Mortgage,
    PersonalLoan,
    AutoLoan,
    HomeEquityLoan,
    MedicalDebt,
    Other,
}

impl fmt::Display for DebtType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DebtType::CreditCard => "Credit Card",
            DebtType::StudentLoan => "Student Loan",
            DebtType::Mortgage => "Mortgage",
            DebtType::PersonalLoan => "Personal Loan",
            DebtType::AutoLoan => "Auto Loan",
            DebtType::HomeEquityLoan => "Home Equity Loan",
            DebtType::MedicalDebt => "Medical Debt",
            DebtType::Other => "Other",
        };
        write!(f, "{}", label)
    }
}

/// Errors arising from debt account and portfolio validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DebtError {
    #[error("invalid debt '{id}': {reason}")]
    InvalidDebt { id: DebtId, reason: &'static str },
    #[error("duplicate debt id '{0}'")]
    DuplicateId(DebtId),
    #[error("portfolio contains no debts")]
    EmptyPortfolio,
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// A single debt: what is owed, at what rate, and the required minimum.
///
/// Constructed only through [`DebtAccount::new`], which rejects negative
/// amounts and mixed currencies. Accounts are never mutated by the engine;
/// simulations track running balances separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DebtAccountRepr")]
pub struct DebtAccount {
    id: DebtId,
    name: String,
    debt_type: DebtType,
    balance: Money,
    interest_rate: Rate,
    minimum_payment: Money,
    credit_limit: Option<Money>,
    due_date: Option<NaiveDate>,
}

#[derive(Deserialize)]
struct DebtAccountRepr {
    id: DebtId,
    name: String,
    debt_type: DebtType,
    balance: Money,
    interest_rate: Rate,
    minimum_payment: Money,
    #[serde(default)]
    credit_limit: Option<Money>,
    #[serde(default)]
    due_date: Option<NaiveDate>,
}

impl TryFrom<DebtAccountRepr> for DebtAccount {
    type Error = DebtError;

    fn try_from(r: DebtAccountRepr) -> Result<Self, Self::Error> {
        let mut account = DebtAccount::new(
            r.id,
            r.name,
            r.debt_type,
            r.balance,
            r.interest_rate,
            r.minimum_payment,
        )?;
        if let Some(limit) = r.credit_limit {
            account = account.with_credit_limit(limit)?;
        }
        if let Some(date) = r.due_date {
            account = account.with_due_date(date);
        }
        Ok(account)
    }
}

impl DebtAccount {
    /// Validate and build an account.
    ///
    /// Balance and minimum must share a currency and must not be negative.
    pub fn new(
        id: DebtId,
        name: impl Into<String>,
        debt_type: DebtType,
        balance: Money,
        interest_rate: Rate,
        minimum_payment: Money,
    ) -> Result<Self, DebtError> {
        if balance.currency() != minimum_payment.currency() {
            return Err(MoneyError::CurrencyMismatch {
                left: balance.currency(),
                right: minimum_payment.currency(),
            }
            .into());
        }
        if balance.is_negative() {
            return Err(DebtError::InvalidDebt {
                id,
                reason: "balance must not be negative",
            });
        }
        if minimum_payment.is_negative() {
            return Err(DebtError::InvalidDebt {
                id,
                reason: "minimum payment must not be negative",
            });
        }
        Ok(Self {
            id,
            name: name.into(),
            debt_type,
            balance,
            interest_rate,
            minimum_payment,
            credit_limit: None,
            due_date: None,
        })
    }

    /// Attach a credit limit in the account's currency.
    pub fn with_credit_limit(mut self, limit: Money) -> Result<Self, DebtError> {
        if limit.currency() != self.balance.currency() {
            return Err(MoneyError::CurrencyMismatch {
                left: self.balance.currency(),
                right: limit.currency(),
            }
            .into());
        }
        if limit.is_negative() {
            return Err(DebtError::InvalidDebt {
                id: self.id,
                reason: "credit limit must not be negative",
            });
        }
        self.credit_limit = Some(limit);
        Ok(self)
    }

    /// Attach the next payment due date.
    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    // --- Accessors ---

    pub fn id(&self) -> &DebtId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn debt_type(&self) -> DebtType {
        self.debt_type
    }

    /// Outstanding principal.
    pub fn balance(&self) -> Money {
        self.balance
    }

    pub fn interest_rate(&self) -> Rate {
        self.interest_rate
    }

    /// Required payment each month.
    pub fn minimum_payment(&self) -> Money {
        self.minimum_payment
    }

    /// Credit limit for revolving accounts, if known.
    pub fn credit_limit(&self) -> Option<Money> {
        self.credit_limit
    }

    pub fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    /// Currency of every amount on the account.
    pub fn currency(&self) -> Currency {
        self.balance.currency()
    }

    /// Interest the current balance accrues in one month.
    pub fn monthly_interest_charge(&self) -> Result<Money, MoneyError> {
        self.balance
            .multiply(self.interest_rate.monthly_fraction())
    }

    /// Balance as a fraction of the credit limit, when a non-zero limit is known.
    pub fn utilization(&self) -> Result<Option<Decimal>, MoneyError> {
        match self.credit_limit {
            Some(limit) if !limit.is_zero() => self.balance.ratio(&limit).map(Some),
            _ => Ok(None),
        }
    }

    /// Whether a creditor is likely to negotiate on this debt: medical debt
    /// always, credit cards above 1000 and personal loans above 5000.
    pub fn qualifies_for_negotiation(&self) -> bool {
        let balance = self.balance.amount();
        match self.debt_type {
            DebtType::CreditCard => balance > Decimal::from(1000),
            DebtType::MedicalDebt => true,
            DebtType::PersonalLoan => balance > Decimal::from(5000),
            _ => false,
        }
    }

    /// Whether the minimum payment exceeds the first month's interest.
    ///
    /// Debts failing this check never pay off on minimums alone.
    pub fn covers_interest(&self) -> Result<bool, MoneyError> {
        if self.balance.is_zero() {
            return Ok(true);
        }
        let interest = self.monthly_interest_charge()?;
        self.minimum_payment.greater_than(&interest)
    }
}

/// A validated, single-currency set of debts with unique ids.
///
/// Every engine operation takes a portfolio, so the currency and identity
/// checks happen once at this boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DebtPortfolio {
    currency: Currency,
    debts: Vec<DebtAccount>,
}

impl DebtPortfolio {
    /// Validate a set of debts.
    ///
    /// Fails when the set is empty, mixes currencies or repeats an id.
    pub fn new(debts: Vec<DebtAccount>) -> Result<Self, DebtError> {
        let first = debts.first().ok_or(DebtError::EmptyPortfolio)?;
        let currency = first.currency();

        let mut seen = HashSet::new();
        for debt in &debts {
            if debt.currency() != currency {
                return Err(MoneyError::CurrencyMismatch {
                    left: currency,
                    right: debt.currency(),
                }
                .into());
            }
            if !seen.insert(debt.id().clone()) {
                return Err(DebtError::DuplicateId(debt.id().clone()));
            }
        }

        Ok(Self { currency, debts })
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Debts in the order they were supplied.
    pub fn debts(&self) -> &[DebtAccount] {
        &self.debts
    }

    pub fn len(&self) -> usize {
        self.debts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.debts.is_empty()
    }

    /// Look a debt up by id.
    pub fn get(&self, id: &DebtId) -> Option<&DebtAccount> {
        self.debts.iter().find(|d| d.id() == id)
    }

    /// Every debt id, in input order.
    pub fn ids(&self) -> Vec<DebtId> {
        self.debts.iter().map(|d| d.id().clone()).collect()
    }

    /// Sum of all balances.
    pub fn total_balance(&self) -> Result<Money, MoneyError> {
        let balances: Vec<Money> = self.debts.iter().map(|d| d.balance()).collect();
        Money::sum(&balances, self.currency)
    }

    /// Sum of all minimum payments.
    pub fn total_minimum_payment(&self) -> Result<Money, MoneyError> {
        let minimums: Vec<Money> = self.debts.iter().map(|d| d.minimum_payment()).collect();
        Money::sum(&minimums, self.currency)
    }

    /// Balance-weighted average APR. Zero when nothing is owed.
    pub fn weighted_average_rate(&self) -> Result<Rate, MoneyError> {
        let total = self.total_balance()?;
        if total.is_zero() {
            return Ok(Rate::zero());
        }
        let mut weighted = Decimal::ZERO;
        for debt in &self.debts {
            let weight = debt.balance().ratio(&total)?;
            weighted += weight * debt.interest_rate().annual_percentage();
        }
        Rate::annual(weighted.round_dp(6)).map_err(|_| MoneyError::InvalidAmount {
            literal: weighted.to_string(),
            reason: "weighted rate out of range",
        })
    }
}

impl TryFrom<Vec<DebtAccount>> for DebtPortfolio {
    type Error = DebtError;

    fn try_from(debts: Vec<DebtAccount>) -> Result<Self, Self::Error> {
        Self::new(debts)
    }
}
