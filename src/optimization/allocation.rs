//! Where this month's money goes: a per-debt split of the payment capacity
//! under one strategy, with the expected impact against paying minimums.

use crate::core::debt::{DebtId, DebtPortfolio};
use crate::core::money::Money;
use crate::optimization::payoff::PayoffEngine;
use crate::optimization::strategy::DebtStrategy;
use crate::simulation::amortization::PlanError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtAllocation {
    pub debt_id: DebtId,
    pub debt_name: String,
    pub minimum_payment: Money,
    /// First-month payment above the minimum.
    pub extra_payment: Money,
    pub monthly_payment: Money,
    /// Fraction of all extra payment this debt receives, 0 to 1.
    pub share_of_extra: Decimal,
    pub months_to_payoff: u32,
    pub total_interest: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedImpact {
    /// Interest avoided compared with paying minimums only. `None` when
    /// minimum payments alone never clear the portfolio.
    pub interest_savings: Option<Money>,
    pub time_savings_months: Option<u32>,
    pub total_interest: Money,
    pub months_to_debt_free: u32,
    pub debt_free_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentAllocation {
    pub strategy: DebtStrategy,
    pub total_monthly_payment: Money,
    /// Allocations in priority order.
    pub allocations: Vec<DebtAllocation>,
    pub expected_impact: ExpectedImpact,
}

impl PayoffEngine {
    /// Split the first month's payment capacity across debts under
    /// `strategy`.
    ///
    /// Fails only when `strategy` itself cannot clear the portfolio.
    pub fn optimize_payment_allocation(
        &self,
        portfolio: &DebtPortfolio,
        strategy: &DebtStrategy,
        extra: Money,
    ) -> Result<PaymentAllocation, PlanError> {
        let result = self.optimize(portfolio, strategy, extra)?;
        let currency = portfolio.currency();

        let mut allocations = Vec::with_capacity(result.payment_plans.len());
        for plan in &result.payment_plans {
            let minimum = portfolio
                .get(&plan.debt_id)
                .map(|d| d.minimum_payment())
                .unwrap_or_else(|| Money::zero(currency))
                .min_of(&plan.monthly_payment)?;
            allocations.push(DebtAllocation {
                debt_id: plan.debt_id.clone(),
                debt_name: plan.debt_name.clone(),
                minimum_payment: minimum,
                extra_payment: plan.monthly_payment.subtract(&minimum)?,
                monthly_payment: plan.monthly_payment,
                share_of_extra: Decimal::ZERO,
                months_to_payoff: plan.months_to_payoff,
                total_interest: plan.total_interest,
            });
        }

        let extra_total = Money::sum(allocations.iter().map(|a| &a.extra_payment), currency)?;
        if extra_total.is_positive() {
            for a in &mut allocations {
                a.share_of_extra = a.extra_payment.ratio(&extra_total)?.round_dp(4);
            }
        }

        Ok(PaymentAllocation {
            strategy: result.strategy,
            total_monthly_payment: result.total_monthly_payment,
            allocations,
            expected_impact: ExpectedImpact {
                interest_savings: result.interest_savings_vs_minimum,
                time_savings_months: result.time_savings_vs_minimum_months,
                total_interest: result.total_interest_paid,
                months_to_debt_free: result.total_time_to_payoff_months,
                debt_free_date: result.final_payoff_date,
            },
        })
    }
}

impl fmt::Display for PaymentAllocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Payment Allocation: {} ===", self.strategy)?;
        writeln!(f, "Total Monthly Payment: {}", self.total_monthly_payment)?;
        for a in &self.allocations {
            writeln!(
                f,
                "  {:<24} minimum {}  extra {}  total {}",
                a.debt_name, a.minimum_payment, a.extra_payment, a.monthly_payment
            )?;
        }
        let impact = &self.expected_impact;
        write!(
            f,
            "Debt free in {} months ({})",
            impact.months_to_debt_free, impact.debt_free_date
        )?;
        match (impact.interest_savings, impact.time_savings_months) {
            (Some(saved), Some(months)) => writeln!(
                f,
                ", {} interest saved, {} months sooner than minimums",
                saved, months
            ),
            _ => writeln!(f, "; minimum payments alone never clear these debts"),
        }
    }
}
