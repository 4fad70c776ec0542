//! Side-by-side comparison of avalanche, snowball and minimum-only payoff,
//! with a psychological scoring layer that can recommend snowball over the
//! mathematically optimal avalanche.
//!
//! All weights and thresholds live in [`ScoringPolicy`]; nothing here is
//! hard-wired beyond the policy defaults.

use crate::core::debt::{DebtId, DebtPortfolio};
use crate::core::money::Money;
use crate::optimization::payoff::{OptimizationResult, PayoffEngine};
use crate::optimization::strategy::DebtStrategy;
use crate::simulation::amortization::PlanError;
use log::debug;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// The borrower's stated inclination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PsychologicalPreference {
    /// Wants early visible victories.
    QuickWins,
    /// Wants the lowest total cost.
    Mathematical,
    Balanced,
}

/// Interest-savings tier: savings strictly above `min_interest_savings`
/// earn `score` for mathematical optimality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimalityTier {
    pub min_interest_savings: Decimal,
    pub score: Decimal,
}

/// Policy table for the psychological scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringPolicy {
    /// A debt cleared within this many months counts as a quick win.
    pub quick_win_window_months: u32,
    /// Snowball is recommended when its quick wins exceed this count.
    pub quick_win_threshold: usize,
    pub motivation_weight: Decimal,
    pub optimality_weight: Decimal,
    pub optimality_tiers: Vec<OptimalityTier>,
    /// Optimality score when no tier matches.
    pub baseline_optimality: Decimal,
    pub preference: PsychologicalPreference,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            quick_win_window_months: 6,
            quick_win_threshold: 2,
            motivation_weight: dec!(0.5),
            optimality_weight: dec!(0.5),
            optimality_tiers: vec![
                OptimalityTier {
                    min_interest_savings: dec!(1000),
                    score: dec!(0.9),
                },
                OptimalityTier {
                    min_interest_savings: dec!(500),
                    score: dec!(0.7),
                },
            ],
            baseline_optimality: dec!(0.4),
            preference: PsychologicalPreference::Balanced,
        }
    }
}

impl ScoringPolicy {
    /// Motivation and optimality weights scaled to sum to one.
    fn normalized_weights(&self) -> (Decimal, Decimal) {
        let m = self.motivation_weight.max(Decimal::ZERO);
        let o = self.optimality_weight.max(Decimal::ZERO);
        let total = m + o;
        if total.is_zero() {
            return (dec!(0.5), dec!(0.5));
        }
        (m / total, o / total)
    }

    fn optimality_for(&self, interest_saved: Decimal) -> Decimal {
        let mut tiers: Vec<&OptimalityTier> = self.optimality_tiers.iter().collect();
        tiers.sort_by(|a, b| b.min_interest_savings.cmp(&a.min_interest_savings));
        tiers
            .into_iter()
            .find(|t| interest_saved > t.min_interest_savings)
            .map(|t| t.score)
            .unwrap_or(self.baseline_optimality)
    }
}

/// Behavioural scoring behind a recommendation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PsychologicalFactors {
    /// Debts snowball clears inside the quick-win window.
    pub quick_wins_snowball: usize,
    /// Debts avalanche clears inside the quick-win window.
    pub quick_wins_avalanche: usize,
    /// Snowball interest minus avalanche interest.
    pub interest_saved_by_avalanche: Money,
    /// 1 to 10.
    pub motivation_score_snowball: u32,
    /// 1 to 10.
    pub motivation_score_avalanche: u32,
    /// 0 to 1.
    pub quick_wins_importance: Decimal,
    /// 0 to 1.
    pub mathematical_optimality: Decimal,
    /// Percentage, 50 to 95.
    pub estimated_success_probability: Decimal,
}

/// Motivation boost by how soon a debt is cleared: the first tier whose
/// month bound is not exceeded applies.
const MILESTONE_BOOSTS: [(u32, Decimal); 3] = [(6, dec!(10)), (12, dec!(7.5)), (24, dec!(5))];
const LATE_MILESTONE_BOOST: Decimal = dec!(2.5);

/// One debt cleared under a strategy, with the motivation it is worth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoffMilestone {
    pub debt_id: DebtId,
    pub debt_name: String,
    /// Month (1-based) in which the balance reaches zero.
    pub payoff_month: u32,
    /// 2.5 to 10; earlier payoffs score higher.
    pub motivation_boost: Decimal,
}

/// Motivation boost for a debt cleared in `month`.
pub fn motivation_boost(month: u32) -> Decimal {
    MILESTONE_BOOSTS
        .iter()
        .find(|(bound, _)| month <= *bound)
        .map(|(_, boost)| *boost)
        .unwrap_or(LATE_MILESTONE_BOOST)
}

impl OptimizationResult {
    /// Debts in the order they are paid off, each with its payoff month.
    pub fn milestones(&self) -> Vec<PayoffMilestone> {
        self.payoff_order
            .iter()
            .filter_map(|id| self.plan_for(id))
            .map(|plan| PayoffMilestone {
                debt_id: plan.debt_id.clone(),
                debt_name: plan.debt_name.clone(),
                payoff_month: plan.months_to_payoff,
                motivation_boost: motivation_boost(plan.months_to_payoff),
            })
            .collect()
    }
}

/// All three strategies over the same portfolio and extra payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyComparison {
    pub avalanche: OptimizationResult,
    pub snowball: OptimizationResult,
    /// `None` when minimum payments alone never clear the portfolio.
    pub minimum_only: Option<OptimizationResult>,
    pub avalanche_milestones: Vec<PayoffMilestone>,
    pub snowball_milestones: Vec<PayoffMilestone>,
    pub recommended_strategy: DebtStrategy,
    pub recommendation_reason: String,
    pub psychological_factors: PsychologicalFactors,
}

impl StrategyComparison {
    /// The result for the recommended strategy.
    pub fn recommended(&self) -> &OptimizationResult {
        match self.recommended_strategy {
            DebtStrategy::Snowball => &self.snowball,
            _ => &self.avalanche,
        }
    }
}

fn clamp_unit(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO).min(Decimal::ONE).round_dp(4)
}

fn clamp_score(value: i64) -> u32 {
    value.clamp(1, 10) as u32
}

impl PayoffEngine {
    /// Run avalanche, snowball and minimum-only over the same inputs and
    /// recommend one.
    ///
    /// Avalanche is recommended unless snowball clears more than
    /// `policy.quick_win_threshold` debts inside the quick-win window.
    /// A minimum-only baseline that never finishes leaves `minimum_only`
    /// empty instead of failing the comparison.
    pub fn compare_strategies(
        &self,
        portfolio: &DebtPortfolio,
        extra: Money,
        policy: &ScoringPolicy,
    ) -> Result<StrategyComparison, PlanError> {
        let avalanche_sim = self.simulate_strategy(portfolio, &DebtStrategy::Avalanche, extra)?;
        let snowball_sim = self.simulate_strategy(portfolio, &DebtStrategy::Snowball, extra)?;
        let baseline = self.minimum_baseline(portfolio)?;

        let avalanche =
            self.build_result(DebtStrategy::Avalanche, avalanche_sim, baseline.as_ref())?;
        let snowball = self.build_result(DebtStrategy::Snowball, snowball_sim, baseline.as_ref())?;
        let minimum_only = match baseline {
            Some(sim) => {
                let copy = sim.clone();
                Some(self.build_result(DebtStrategy::MinimumOnly, sim, Some(&copy))?)
            }
            None => None,
        };

        let mut factors = score(portfolio, &avalanche, &snowball, policy)?;

        let window = policy.quick_win_window_months;
        let (recommended_strategy, recommendation_reason) =
            if factors.quick_wins_snowball > policy.quick_win_threshold {
                (
                    DebtStrategy::Snowball,
                    format!(
                        "Snowball clears {} debts within {} months (threshold {}); \
                         the early wins are worth {} of extra interest over avalanche",
                        factors.quick_wins_snowball,
                        window,
                        policy.quick_win_threshold,
                        factors.interest_saved_by_avalanche
                    ),
                )
            } else {
                (
                    DebtStrategy::Avalanche,
                    format!(
                        "Avalanche minimises interest, saving {} over snowball; \
                         snowball clears only {} debts within {} months (threshold {})",
                        factors.interest_saved_by_avalanche,
                        factors.quick_wins_snowball,
                        window,
                        policy.quick_win_threshold
                    ),
                )
            };

        factors.estimated_success_probability =
            success_probability(&factors, &recommended_strategy, policy);

        debug!("recommending {}: {}", recommended_strategy, recommendation_reason);

        Ok(StrategyComparison {
            avalanche_milestones: avalanche.milestones(),
            snowball_milestones: snowball.milestones(),
            avalanche,
            snowball,
            minimum_only,
            recommended_strategy,
            recommendation_reason,
            psychological_factors: factors,
        })
    }
}

/// Everything but the success probability, which depends on the pick.
fn score(
    portfolio: &DebtPortfolio,
    avalanche: &OptimizationResult,
    snowball: &OptimizationResult,
    policy: &ScoringPolicy,
) -> Result<PsychologicalFactors, PlanError> {
    let window = policy.quick_win_window_months;
    let quick_wins_snowball = snowball.debts_cleared_within(window);
    let quick_wins_avalanche = avalanche.debts_cleared_within(window);
    let interest_saved = snowball
        .total_interest_paid
        .subtract(&avalanche.total_interest_paid)?;

    let (importance_bias, optimality_bias, base_snowball, base_avalanche) =
        match policy.preference {
            PsychologicalPreference::QuickWins => (dec!(0.2), dec!(-0.1), 9, 5),
            PsychologicalPreference::Mathematical => (dec!(-0.2), dec!(0.1), 5, 9),
            PsychologicalPreference::Balanced => (Decimal::ZERO, Decimal::ZERO, 7, 7),
        };

    let share = Decimal::from(quick_wins_snowball) / Decimal::from(portfolio.len().max(1));
    let quick_wins_importance = clamp_unit(share + importance_bias);
    let mathematical_optimality =
        clamp_unit(policy.optimality_for(interest_saved.amount()) + optimality_bias);

    let snowball_edge = i64::from(quick_wins_snowball > quick_wins_avalanche);
    let avalanche_edge = i64::from(interest_saved.is_positive());

    Ok(PsychologicalFactors {
        quick_wins_snowball,
        quick_wins_avalanche,
        interest_saved_by_avalanche: interest_saved,
        motivation_score_snowball: clamp_score(base_snowball + snowball_edge),
        motivation_score_avalanche: clamp_score(base_avalanche + avalanche_edge),
        quick_wins_importance,
        mathematical_optimality,
        estimated_success_probability: Decimal::ZERO,
    })
}

fn success_probability(
    factors: &PsychologicalFactors,
    recommended: &DebtStrategy,
    policy: &ScoringPolicy,
) -> Decimal {
    let (wm, wo) = policy.normalized_weights();
    let (motivation, fit) = match recommended {
        DebtStrategy::Snowball => (factors.motivation_score_snowball, factors.quick_wins_importance),
        _ => (
            factors.motivation_score_avalanche,
            factors.mathematical_optimality,
        ),
    };
    let weighted = wm * Decimal::from(motivation) / dec!(10) + wo * fit;
    (dec!(50) + dec!(45) * weighted).round_dp(2)
}
