use crate::core::debt::{DebtAccount, DebtId, DebtPortfolio};
use crate::simulation::amortization::{PaymentMode, PlanError};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A strategy name that is none of the known ones.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown strategy '{0}' (expected avalanche, snowball, minimum or custom:ID,...)")]
pub struct UnknownStrategy(pub String);

/// How extra payment capacity is prioritised across debts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "order", rename_all = "snake_case")]
pub enum DebtStrategy {
    /// Highest interest rate first; ties go to the larger balance.
    Avalanche,
    /// Smallest balance first; ties go to the higher interest rate.
    Snowball,
    /// Only minimum payments, no extra and no rollover.
    MinimumOnly,
    /// Caller-supplied order naming every debt exactly once.
    Custom(Vec<DebtId>),
}

impl DebtStrategy {
    /// How the amortization treats capacity freed by a paid-off debt.
    pub fn payment_mode(&self) -> PaymentMode {
        match self {
            DebtStrategy::MinimumOnly => PaymentMode::MinimumOnly,
            _ => PaymentMode::Rolling,
        }
    }
}

impl fmt::Display for DebtStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DebtStrategy::Avalanche => write!(f, "Debt Avalanche"),
            DebtStrategy::Snowball => write!(f, "Debt Snowball"),
            DebtStrategy::MinimumOnly => write!(f, "Minimum Payments Only"),
            DebtStrategy::Custom(order) => {
                let ids: Vec<&str> = order.iter().map(|id| id.as_str()).collect();
                write!(f, "Custom ({})", ids.join(" > "))
            }
        }
    }
}

impl FromStr for DebtStrategy {
    type Err = UnknownStrategy;

    /// Accepts `avalanche`, `snowball`, `minimum` or `custom:ID,ID,...`.
    ///
    /// A custom order is not checked against any portfolio here;
    /// [`prioritize`] reports a malformed one.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "avalanche" => Ok(DebtStrategy::Avalanche),
            "snowball" => Ok(DebtStrategy::Snowball),
            "minimum" | "minimum_only" | "minimum-only" => Ok(DebtStrategy::MinimumOnly),
            _ => match s.trim().split_once(':') {
                Some((kind, ids)) if kind.eq_ignore_ascii_case("custom") => Ok(
                    DebtStrategy::Custom(
                        ids.split(',')
                            .map(str::trim)
                            .filter(|id| !id.is_empty())
                            .map(DebtId::new)
                            .collect(),
                    ),
                ),
                _ => Err(UnknownStrategy(s.to_string())),
            },
        }
    }
}

fn avalanche_order(a: &DebtAccount, b: &DebtAccount) -> Ordering {
    b.interest_rate()
        .cmp_annual(&a.interest_rate())
        .then_with(|| b.balance().amount().cmp(&a.balance().amount()))
        .then_with(|| a.id().cmp(b.id()))
}

fn snowball_order(a: &DebtAccount, b: &DebtAccount) -> Ordering {
    a.balance()
        .amount()
        .cmp(&b.balance().amount())
        .then_with(|| b.interest_rate().cmp_annual(&a.interest_rate()))
        .then_with(|| a.id().cmp(b.id()))
}

/// Order the portfolio's debts, highest priority first.
///
/// Pure and deterministic: ties that survive the strategy's own tie-break
/// fall back to debt id order.
///
/// # Examples
///
/// ```
/// use payoff_engine::prelude::*;
/// use rust_decimal_macros::dec;
///
/// let usd = |s: &str| Money::parse(s, Currency::USD).unwrap();
/// let portfolio = DebtPortfolio::new(vec![
///     DebtAccount::new(DebtId::new("A"), "A", DebtType::CreditCard,
///         usd("1000"), Rate::annual(dec!(20)).unwrap(), usd("30")).unwrap(),
///     DebtAccount::new(DebtId::new("B"), "B", DebtType::CreditCard,
///         usd("500"), Rate::annual(dec!(10)).unwrap(), usd("20")).unwrap(),
/// ]).unwrap();
///
/// let avalanche = prioritize(&portfolio, &DebtStrategy::Avalanche).unwrap();
/// assert_eq!(avalanche[0].id().as_str(), "A");
/// let snowball = prioritize(&portfolio, &DebtStrategy::Snowball).unwrap();
/// assert_eq!(snowball[0].id().as_str(), "B");
/// ```
pub fn prioritize<'a>(
    portfolio: &'a DebtPortfolio,
    strategy: &DebtStrategy,
) -> Result<Vec<&'a DebtAccount>, PlanError> {
    let mut debts: Vec<&DebtAccount> = portfolio.debts().iter().collect();
    match strategy {
        DebtStrategy::Avalanche => debts.sort_by(|a, b| avalanche_order(a, b)),
        DebtStrategy::Snowball => debts.sort_by(|a, b| snowball_order(a, b)),
        DebtStrategy::MinimumOnly => {}
        DebtStrategy::Custom(order) => return custom_order(portfolio, order),
    }
    Ok(debts)
}

fn custom_order<'a>(
    portfolio: &'a DebtPortfolio,
    order: &[DebtId],
) -> Result<Vec<&'a DebtAccount>, PlanError> {
    if order.len() != portfolio.len() {
        return Err(PlanError::InvalidPriorityOrder {
            reason: format!(
                "order names {} debts but the portfolio holds {}",
                order.len(),
                portfolio.len()
            ),
        });
    }
    let mut seen = HashSet::new();
    let mut debts = Vec::with_capacity(order.len());
    for id in order {
        if !seen.insert(id) {
            return Err(PlanError::InvalidPriorityOrder {
                reason: format!("debt '{}' listed more than once", id),
            });
        }
        let debt = portfolio
            .get(id)
            .ok_or_else(|| PlanError::InvalidPriorityOrder {
                reason: format!("unknown debt '{}'", id),
            })?;
        debts.push(debt);
    }
    Ok(debts)
}
