use crate::core::debt::{DebtAccount, DebtError, DebtPortfolio, DebtType};
use crate::core::money::{Money, MoneyError};
use crate::core::rate::Rate;
use crate::optimization::payoff::PayoffEngine;
use crate::optimization::strategy::DebtStrategy;
use crate::simulation::amortization::PlanError;
use log::debug;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Longest loan term accepted, in months.
pub const MAX_TERM_MONTHS: u32 = 1200;

/// Kind of consolidation product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsolidationType {
    PersonalLoan,
    /// Moves credit card balances only.
    BalanceTransfer,
    HomeEquityLoan,
    DebtManagementPlan,
    RefinancingProgram,
}

impl ConsolidationType {
    /// Whether a debt of `debt_type` is rolled into this product.
    pub fn covers(&self, debt_type: DebtType) -> bool {
        match self {
            ConsolidationType::BalanceTransfer => debt_type == DebtType::CreditCard,
            _ => true,
        }
    }

    fn base_risk(&self) -> RiskLevel {
        match self {
            ConsolidationType::PersonalLoan | ConsolidationType::RefinancingProgram => {
                RiskLevel::Low
            }
            ConsolidationType::BalanceTransfer | ConsolidationType::DebtManagementPlan => {
                RiskLevel::Moderate
            }
            ConsolidationType::HomeEquityLoan => RiskLevel::High,
        }
    }

    fn inherent_pros_and_cons(&self) -> (&'static [&'static str], &'static [&'static str]) {
        match self {
            ConsolidationType::PersonalLoan => (
                &["Fixed interest rate", "Single predictable monthly payment"],
                &["Usually requires good credit", "Old accounts stay open and can be reused"],
            ),
            ConsolidationType::BalanceTransfer => (
                &["All card balances in one place"],
                &["Rate usually rises after the promotional period", "Old cards stay open and can be reused"],
            ),
            ConsolidationType::HomeEquityLoan => (
                &["Typically the lowest available rate"],
                &["Home is collateral and at risk on default", "Closing and appraisal costs"],
            ),
            ConsolidationType::DebtManagementPlan => (
                &["Creditors may agree to reduced rates", "Structured plan with counselling support"],
                &["Enrolled accounts are usually closed", "Monthly program fees are common"],
            ),
            ConsolidationType::RefinancingProgram => (
                &["Replaces existing terms with a new fixed schedule"],
                &["Eligibility depends on lender programs"],
            ),
        }
    }
}

impl fmt::Display for ConsolidationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConsolidationType::PersonalLoan => "Personal Loan",
            ConsolidationType::BalanceTransfer => "Balance Transfer",
            ConsolidationType::HomeEquityLoan => "Home Equity Loan",
            ConsolidationType::DebtManagementPlan => "Debt Management Plan",
            ConsolidationType::RefinancingProgram => "Refinancing Program",
        };
        write!(f, "{}", label)
    }
}

impl FromStr for ConsolidationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "personal_loan" => Ok(ConsolidationType::PersonalLoan),
            "balance_transfer" => Ok(ConsolidationType::BalanceTransfer),
            "home_equity_loan" | "home_equity" => Ok(ConsolidationType::HomeEquityLoan),
            "debt_management_plan" | "dmp" => Ok(ConsolidationType::DebtManagementPlan),
            "refinancing_program" | "refinance" => Ok(ConsolidationType::RefinancingProgram),
            _ => Err(format!("unknown consolidation type '{}'", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

/// A candidate consolidation loan supplied by the caller.
///
/// Eligibility requirements are lender policy and are passed through
/// untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidationOffer {
    pub consolidation_type: ConsolidationType,
    pub rate: Rate,
    pub term_months: u32,
    /// Percentage of the consolidated balance, added to the new loan.
    #[serde(default)]
    pub origination_fee_pct: Decimal,
    #[serde(default)]
    pub eligibility_requirements: Vec<String>,
}

impl ConsolidationOffer {
    /// An offer with no fee and no stated requirements.
    pub fn new(consolidation_type: ConsolidationType, rate: Rate, term_months: u32) -> Self {
        Self {
            consolidation_type,
            rate,
            term_months,
            origination_fee_pct: Decimal::ZERO,
            eligibility_requirements: Vec::new(),
        }
    }

    /// Fee charged up front, as a percentage of the consolidated balance.
    pub fn with_origination_fee(mut self, pct: Decimal) -> Self {
        self.origination_fee_pct = pct;
        self
    }

    /// Eligibility conditions, passed through to the analysis untouched.
    pub fn with_requirements<I, S>(mut self, requirements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.eligibility_requirements = requirements.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidationAnalysis {
    pub advantages: Vec<String>,
    pub disadvantages: Vec<String>,
    pub risk_assessment: RiskLevel,
    /// 0 to 100.
    pub recommendation_score: Decimal,
}

/// One offer measured against paying the covered debts' minimums.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidationOpportunity {
    pub consolidation_type: ConsolidationType,
    /// Covered balances plus the origination fee.
    pub consolidated_balance: Money,
    pub origination_fee: Money,
    pub new_rate: Rate,
    pub new_monthly_payment: Money,
    pub term_months: u32,
    pub new_total_interest: Money,
    /// Minimums currently due on the covered debts.
    pub current_monthly_payment: Money,
    pub current_total_interest: Money,
    pub current_months_to_payoff: u32,
    /// Current interest minus new interest and fee; negative when the offer costs more.
    pub total_interest_savings: Money,
    /// Negative when the new term runs longer than the current trajectory.
    pub time_savings_months: i32,
    pub eligibility_requirements: Vec<String>,
    pub pros_and_cons: ConsolidationAnalysis,
}

/// Level payment that retires `principal` over `term_months` at `rate`.
///
/// `P * r * (1 + r)^n / ((1 + r)^n - 1)` with `r` the monthly rate, or
/// `P / n` when the rate is zero.
pub fn amortized_payment(principal: Money, rate: Rate, term_months: u32) -> Result<Money, PlanError> {
    if term_months == 0 || term_months > MAX_TERM_MONTHS {
        return Err(PlanError::InvalidTerm);
    }
    let n = Decimal::from(term_months);
    let r = rate.monthly_fraction();
    if r.is_zero() {
        return Ok(principal.divide(n)?);
    }

    let overflow = || MoneyError::InvalidAmount {
        literal: principal.to_fixed_string(),
        reason: "amortization factor overflow",
    };
    let base = Decimal::ONE + r;
    let mut factor = Decimal::ONE;
    for _ in 0..term_months {
        factor = factor.checked_mul(base).ok_or_else(overflow)?;
    }
    let payment = principal
        .amount()
        .checked_mul(r)
        .and_then(|x| x.checked_mul(factor))
        .and_then(|x| x.checked_div(factor - Decimal::ONE))
        .ok_or_else(overflow)?;
    Ok(Money::new(payment, principal.currency())?)
}

impl PayoffEngine {
    /// Measure `offer` against the minimum-only trajectory of the debts it
    /// covers.
    pub fn analyze_consolidation(
        &self,
        portfolio: &DebtPortfolio,
        offer: &ConsolidationOffer,
    ) -> Result<ConsolidationOpportunity, PlanError> {
        let covered: Vec<DebtAccount> = portfolio
            .debts()
            .iter()
            .filter(|d| offer.consolidation_type.covers(d.debt_type()))
            .cloned()
            .collect();
        if covered.is_empty() {
            return Err(DebtError::EmptyPortfolio.into());
        }
        let covered = DebtPortfolio::new(covered)?;
        let currency = covered.currency();

        let current = self.simulate_strategy(
            &covered,
            &DebtStrategy::MinimumOnly,
            Money::zero(currency),
        )?;
        let current_monthly_payment = covered.total_minimum_payment()?;

        let balance = covered.total_balance()?;
        let origination_fee = balance.multiply(offer.origination_fee_pct / dec!(100))?;
        let consolidated_balance = balance.add(&origination_fee)?;
        let new_monthly_payment =
            amortized_payment(consolidated_balance, offer.rate, offer.term_months)?;
        let new_total_interest = new_monthly_payment
            .multiply(Decimal::from(offer.term_months))?
            .subtract(&consolidated_balance)?
            .max_of(&Money::zero(currency))?;

        let total_interest_savings = current
            .total_interest
            .subtract(&new_total_interest)?
            .subtract(&origination_fee)?;
        let time_savings_months = i64::from(current.months) - i64::from(offer.term_months);
        let time_savings_months =
            i32::try_from(time_savings_months).unwrap_or(if time_savings_months < 0 {
                i32::MIN
            } else {
                i32::MAX
            });

        let mut opportunity = ConsolidationOpportunity {
            consolidation_type: offer.consolidation_type,
            consolidated_balance,
            origination_fee,
            new_rate: offer.rate,
            new_monthly_payment,
            term_months: offer.term_months,
            new_total_interest,
            current_monthly_payment,
            current_total_interest: current.total_interest,
            current_months_to_payoff: current.months,
            total_interest_savings,
            time_savings_months,
            eligibility_requirements: offer.eligibility_requirements.clone(),
            pros_and_cons: ConsolidationAnalysis {
                advantages: Vec::new(),
                disadvantages: Vec::new(),
                risk_assessment: offer.consolidation_type.base_risk(),
                recommendation_score: Decimal::ZERO,
            },
        };
        opportunity.pros_and_cons = assess(&opportunity)?;

        debug!(
            "{} at {}: savings {}, score {}",
            offer.consolidation_type,
            offer.rate,
            opportunity.total_interest_savings,
            opportunity.pros_and_cons.recommendation_score
        );
        Ok(opportunity)
    }

    /// Analyse every offer, best recommendation first.
    pub fn analyze_offers(
        &self,
        portfolio: &DebtPortfolio,
        offers: &[ConsolidationOffer],
    ) -> Result<Vec<ConsolidationOpportunity>, PlanError> {
        let mut opportunities = offers
            .iter()
            .map(|offer| self.analyze_consolidation(portfolio, offer))
            .collect::<Result<Vec<_>, _>>()?;
        opportunities.sort_by(|a, b| {
            b.pros_and_cons
                .recommendation_score
                .cmp(&a.pros_and_cons.recommendation_score)
                .then_with(|| {
                    b.total_interest_savings
                        .amount()
                        .cmp(&a.total_interest_savings.amount())
                })
        });
        Ok(opportunities)
    }
}

fn assess(op: &ConsolidationOpportunity) -> Result<ConsolidationAnalysis, MoneyError> {
    let (pros, cons) = op.consolidation_type.inherent_pros_and_cons();
    let mut advantages: Vec<String> = pros.iter().map(|s| s.to_string()).collect();
    let mut disadvantages: Vec<String> = cons.iter().map(|s| s.to_string()).collect();

    let savings = op.total_interest_savings;
    if savings.is_positive() {
        advantages.push(format!("Saves {} in interest", savings));
    } else if savings.is_negative() {
        disadvantages.push(format!("Costs {} more in interest and fees", savings.abs()));
    }

    let payment_delta = op.current_monthly_payment.subtract(&op.new_monthly_payment)?;
    if payment_delta.is_positive() {
        advantages.push(format!("Lowers the monthly payment by {}", payment_delta));
    } else if payment_delta.is_negative() {
        disadvantages.push(format!("Raises the monthly payment by {}", payment_delta.abs()));
    }

    match op.time_savings_months {
        m if m > 0 => advantages.push(format!("Debt free {} months sooner", m)),
        m if m < 0 => disadvantages.push(format!("Extends repayment by {} months", -m)),
        _ => {}
    }

    if op.origination_fee.is_positive() {
        disadvantages.push(format!("Origination fee of {}", op.origination_fee));
    }

    let risk = op.consolidation_type.base_risk();
    let base = match risk {
        RiskLevel::Low => dec!(60),
        RiskLevel::Moderate => dec!(50),
        RiskLevel::High => dec!(35),
    };
    let savings_ratio = if op.current_total_interest.is_positive() {
        savings.ratio(&op.current_total_interest)?
    } else if savings.is_negative() {
        Decimal::NEGATIVE_ONE
    } else {
        Decimal::ZERO
    };
    let savings_score = savings_ratio.max(Decimal::NEGATIVE_ONE).min(Decimal::ONE) * dec!(30);
    let payment_score = if payment_delta.is_negative() { dec!(-10) } else { dec!(10) };
    let recommendation_score = (base + savings_score + payment_score)
        .max(Decimal::ZERO)
        .min(dec!(100))
        .round_dp(1);

    Ok(ConsolidationAnalysis {
        advantages,
        disadvantages,
        risk_assessment: risk,
        recommendation_score,
    })
}
