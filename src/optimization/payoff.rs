use crate::core::debt::{DebtId, DebtPortfolio};
use crate::core::money::Money;
use crate::optimization::strategy::{prioritize, DebtStrategy};
use crate::simulation::amortization::{
    simulate, DebtProgress, PaymentScheduleItem, PlanError, Simulation, SimulationConfig,
};
use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Payoff plan for a single debt under one strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentPlan {
    pub debt_id: DebtId,
    pub debt_name: String,
    /// Payment applied to this debt in the first month.
    pub monthly_payment: Money,
    pub total_paid: Money,
    pub total_interest: Money,
    pub months_to_payoff: u32,
    pub payoff_date: NaiveDate,
    pub schedule: Vec<PaymentScheduleItem>,
}

impl From<DebtProgress> for PaymentPlan {
    fn from(p: DebtProgress) -> Self {
        PaymentPlan {
            debt_id: p.debt_id,
            debt_name: p.debt_name,
            monthly_payment: p.monthly_payment,
            total_paid: p.total_paid,
            total_interest: p.total_interest,
            months_to_payoff: p.months_to_payoff,
            payoff_date: p.payoff_date,
            schedule: p.schedule,
        }
    }
}

/// Outcome of running one strategy over a portfolio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub strategy: DebtStrategy,
    /// Debt ids, highest priority first.
    pub priority_order: Vec<DebtId>,
    /// Debt ids in the order they were paid off.
    pub payoff_order: Vec<DebtId>,
    pub total_monthly_payment: Money,
    pub total_interest_paid: Money,
    pub total_paid: Money,
    pub total_time_to_payoff_months: u32,
    pub final_payoff_date: NaiveDate,
    /// Interest avoided compared with paying minimums only. `None` when
    /// minimum payments alone never clear the portfolio.
    pub interest_savings_vs_minimum: Option<Money>,
    /// `None` under the same condition as `interest_savings_vs_minimum`.
    pub time_savings_vs_minimum_months: Option<u32>,
    /// One plan per debt, in priority order.
    pub payment_plans: Vec<PaymentPlan>,
}

impl OptimizationResult {
    /// The plan for one debt, if it is part of this result.
    pub fn plan_for(&self, id: &DebtId) -> Option<&PaymentPlan> {
        self.payment_plans.iter().find(|p| &p.debt_id == id)
    }

    /// Number of debts cleared within the first `months` months.
    pub fn debts_cleared_within(&self, months: u32) -> usize {
        self.payment_plans
            .iter()
            .filter(|p| p.months_to_payoff <= months)
            .count()
    }
}

impl fmt::Display for OptimizationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== {} ===", self.strategy)?;
        writeln!(f, "Monthly Payment:   {}", self.total_monthly_payment)?;
        writeln!(f, "Total Interest:    {}", self.total_interest_paid)?;
        writeln!(f, "Total Paid:        {}", self.total_paid)?;
        writeln!(
            f,
            "Debt Free In:      {} months ({})",
            self.total_time_to_payoff_months, self.final_payoff_date
        )?;
        match (self.interest_savings_vs_minimum, self.time_savings_vs_minimum_months) {
            (Some(saved), Some(months)) => writeln!(
                f,
                "Vs Minimums:       {} interest saved, {} months sooner",
                saved, months
            )?,
            _ => writeln!(f, "Vs Minimums:       minimum payments never pay this off")?,
        }
        writeln!(f, "\nPayoff Plans:")?;
        for plan in &self.payment_plans {
            writeln!(
                f,
                "  {:<24} {} /mo  interest {}  paid off {} (month {})",
                plan.debt_name,
                plan.monthly_payment,
                plan.total_interest,
                plan.payoff_date,
                plan.months_to_payoff
            )?;
        }
        Ok(())
    }
}

/// The debt payoff optimization engine.
///
/// Stateless apart from its [`SimulationConfig`]; every call is a pure
/// function of its inputs, so one engine can serve any number of
/// independent requests.
#[derive(Debug, Clone, Default)]
pub struct PayoffEngine {
    config: SimulationConfig,
}

impl PayoffEngine {
    /// An engine that runs every simulation under `config`.
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    /// The start date and month ceiling in use.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Prioritise per `strategy` and amortize.
    pub fn simulate_strategy(
        &self,
        portfolio: &DebtPortfolio,
        strategy: &DebtStrategy,
        extra: Money,
    ) -> Result<Simulation, PlanError> {
        let ordered = prioritize(portfolio, strategy)?;
        debug!(
            "{}: priority {:?}",
            strategy,
            ordered.iter().map(|d| d.id().as_str()).collect::<Vec<_>>()
        );
        simulate(&ordered, extra, strategy.payment_mode(), &self.config)
    }

    /// Run `strategy` with `extra` on top of the minimums and measure it
    /// against paying minimums only.
    ///
    /// Only the requested strategy's own simulation can fail the call. When
    /// the minimum-only baseline exceeds the month ceiling the savings
    /// fields are `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use payoff_engine::prelude::*;
    /// use rust_decimal_macros::dec;
    ///
    /// let usd = |s: &str| Money::parse(s, Currency::USD).unwrap();
    /// let portfolio = DebtPortfolio::new(vec![
    ///     DebtAccount::new(DebtId::new("card"), "Card", DebtType::CreditCard,
    ///         usd("3000"), Rate::annual(dec!(22.9)).unwrap(), usd("90")).unwrap(),
    ///     DebtAccount::new(DebtId::new("car"), "Car", DebtType::AutoLoan,
    ///         usd("8000"), Rate::annual(dec!(6.5)).unwrap(), usd("250")).unwrap(),
    /// ]).unwrap();
    ///
    /// let engine = PayoffEngine::default();
    /// let result = engine.optimize(&portfolio, &DebtStrategy::Avalanche, usd("200")).unwrap();
    /// assert_eq!(result.priority_order[0].as_str(), "card");
    /// assert!(result.interest_savings_vs_minimum.unwrap().is_positive());
    /// ```
    pub fn optimize(
        &self,
        portfolio: &DebtPortfolio,
        strategy: &DebtStrategy,
        extra: Money,
    ) -> Result<OptimizationResult, PlanError> {
        let sim = self.simulate_strategy(portfolio, strategy, extra)?;
        let baseline = if *strategy == DebtStrategy::MinimumOnly {
            Some(sim.clone())
        } else {
            self.minimum_baseline(portfolio)?
        };
        self.build_result(strategy.clone(), sim, baseline.as_ref())
    }

    /// The minimum-only trajectory, or `None` if it never finishes.
    ///
    /// Any error other than the month ceiling still propagates.
    pub(crate) fn minimum_baseline(
        &self,
        portfolio: &DebtPortfolio,
    ) -> Result<Option<Simulation>, PlanError> {
        let zero = Money::zero(portfolio.currency());
        match self.simulate_strategy(portfolio, &DebtStrategy::MinimumOnly, zero) {
            Ok(sim) => Ok(Some(sim)),
            Err(PlanError::PayoffTimeoutExceeded { months }) => {
                debug!("minimum-only baseline does not converge within {} months", months);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub(crate) fn build_result(
        &self,
        strategy: DebtStrategy,
        sim: Simulation,
        baseline: Option<&Simulation>,
    ) -> Result<OptimizationResult, PlanError> {
        let interest_savings = baseline
            .map(|b| b.total_interest.subtract(&sim.total_interest))
            .transpose()?;
        let time_savings = baseline.map(|b| b.months.saturating_sub(sim.months));
        let priority_order = sim.progress.iter().map(|p| p.debt_id.clone()).collect();
        Ok(OptimizationResult {
            strategy,
            priority_order,
            payoff_order: sim.payoff_order,
            total_monthly_payment: sim.monthly_capacity,
            total_interest_paid: sim.total_interest,
            total_paid: sim.total_paid,
            total_time_to_payoff_months: sim.months,
            final_payoff_date: self.config.date_after(sim.months),
            interest_savings_vs_minimum: interest_savings,
            time_savings_vs_minimum_months: time_savings,
            payment_plans: sim.progress.into_iter().map(PaymentPlan::from).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::currency::Currency;
    use crate::core::debt::{DebtAccount, DebtType};
    use crate::core::rate::Rate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn usd(s: &str) -> Money {
        Money::parse(s, Currency::USD).unwrap()
    }

    fn debt(id: &str, balance: &str, apr: Decimal, min: &str) -> DebtAccount {
        DebtAccount::new(
            DebtId::new(id),
            id,
            DebtType::CreditCard,
            usd(balance),
            Rate::annual(apr).unwrap(),
            usd(min),
        )
        .unwrap()
    }

    fn two_debts() -> DebtPortfolio {
        DebtPortfolio::new(vec![
            debt("A", "1000", dec!(20), "30"),
            debt("B", "500", dec!(10), "20"),
        ])
        .unwrap()
    }

    fn engine() -> PayoffEngine {
        PayoffEngine::new(SimulationConfig::starting(
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        ))
    }

    #[test]
    fn test_avalanche_clears_high_rate_first() {
        let result = engine()
            .optimize(&two_debts(), &DebtStrategy::Avalanche, usd("100"))
            .unwrap();
        assert_eq!(result.priority_order, vec![DebtId::new("A"), DebtId::new("B")]);
        assert_eq!(result.payoff_order, vec![DebtId::new("A"), DebtId::new("B")]);
        let a = result.plan_for(&DebtId::new("A")).unwrap();
        let b = result.plan_for(&DebtId::new("B")).unwrap();
        assert!(b.months_to_payoff >= a.months_to_payoff);
        assert_eq!(a.monthly_payment, usd("130"));
    }

    #[test]
    fn test_snowball_clears_small_balance_first() {
        let result = engine()
            .optimize(&two_debts(), &DebtStrategy::Snowball, usd("100"))
            .unwrap();
        assert_eq!(result.priority_order[0], DebtId::new("B"));
        assert_eq!(result.payoff_order[0], DebtId::new("B"));
    }

    #[test]
    fn test_result_totals_are_consistent() {
        let result = engine()
            .optimize(&two_debts(), &DebtStrategy::Avalanche, usd("100"))
            .unwrap();
        assert_eq!(result.total_monthly_payment, usd("150"));
        let interest: Vec<Money> = result.payment_plans.iter().map(|p| p.total_interest).collect();
        assert_eq!(
            Money::sum(&interest, Currency::USD).unwrap(),
            result.total_interest_paid
        );
        // Everything borrowed plus interest is repaid.
        assert_eq!(
            result.total_paid,
            usd("1500").add(&result.total_interest_paid).unwrap()
        );
        assert!(result.interest_savings_vs_minimum.unwrap().is_positive());
        assert!(result.time_savings_vs_minimum_months.unwrap() > 0);
        assert_eq!(
            result.final_payoff_date,
            engine().config().date_after(result.total_time_to_payoff_months)
        );
    }

    #[test]
    fn test_minimum_only_has_no_savings() {
        let result = engine()
            .optimize(&two_debts(), &DebtStrategy::MinimumOnly, usd("100"))
            .unwrap();
        assert!(result.interest_savings_vs_minimum.unwrap().is_zero());
        assert_eq!(result.time_savings_vs_minimum_months, Some(0));
        assert_eq!(result.total_monthly_payment, usd("50"));
    }

    #[test]
    fn test_avalanche_pays_no_more_interest_than_snowball() {
        let portfolio = DebtPortfolio::new(vec![
            debt("card", "4000", dec!(24.99), "120"),
            debt("store", "600", dec!(12), "25"),
            debt("loan", "9000", dec!(7.5), "180"),
        ])
        .unwrap();
        let e = engine();
        let avalanche = e.optimize(&portfolio, &DebtStrategy::Avalanche, usd("300")).unwrap();
        let snowball = e.optimize(&portfolio, &DebtStrategy::Snowball, usd("300")).unwrap();
        assert!(avalanche.total_interest_paid <= snowball.total_interest_paid);
    }

    #[test]
    fn test_custom_order_flows_through() {
        let strategy = DebtStrategy::Custom(vec![DebtId::new("B"), DebtId::new("A")]);
        let result = engine().optimize(&two_debts(), &strategy, usd("100")).unwrap();
        assert_eq!(result.priority_order, vec![DebtId::new("B"), DebtId::new("A")]);
        assert_eq!(result.strategy, strategy);
    }

    #[test]
    fn test_non_convergent_minimum_only_fails() {
        let portfolio = DebtPortfolio::new(vec![debt("x", "10000", dec!(24), "100")]).unwrap();
        let err = engine()
            .optimize(&portfolio, &DebtStrategy::MinimumOnly, usd("0"))
            .unwrap_err();
        assert!(matches!(err, PlanError::PayoffTimeoutExceeded { .. }));
    }

    #[test]
    fn test_converging_strategy_survives_stuck_baseline() {
        // 36% APR on 5000 accrues 150 a month, more than the 100 minimum.
        let portfolio = DebtPortfolio::new(vec![debt("payday", "5000", dec!(36), "100")]).unwrap();
        let result = engine()
            .optimize(&portfolio, &DebtStrategy::Avalanche, usd("300"))
            .unwrap();
        assert_eq!(result.total_time_to_payoff_months, 16);
        assert_eq!(result.total_monthly_payment, usd("400"));
        assert_eq!(result.interest_savings_vs_minimum, None);
        assert_eq!(result.time_savings_vs_minimum_months, None);
        assert!(result.to_string().contains("never pay this off"));
    }
}
