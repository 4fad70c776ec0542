//! # payoff-engine
//!
//! Exact-decimal money and debt payoff optimization.
//!
//! Given a portfolio of debts in one currency and an extra monthly payment,
//! this engine orders the debts by strategy, amortizes them month by month
//! and reports payoff timelines, interest totals and savings against paying
//! minimums only.
//!
//! ## Architecture
//!
//! - **core**: Money, currencies, rates and debt accounts
//! - **simulation**: Month-by-month amortization and random portfolios
//! - **optimization**: Strategies, comparison, allocation, consolidation and
//!   negotiation suggestions

pub mod core;
pub mod optimization;
pub mod simulation;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::core::currency::Currency;
    pub use crate::core::debt::{DebtAccount, DebtError, DebtId, DebtPortfolio, DebtType};
    pub use crate::core::money::{Money, MoneyError};
    pub use crate::core::rate::{Period, Rate, RateError};
    pub use crate::optimization::allocation::{DebtAllocation, ExpectedImpact, PaymentAllocation};
    pub use crate::optimization::comparison::{
        PayoffMilestone, PsychologicalFactors, PsychologicalPreference, ScoringPolicy,
        StrategyComparison,
    };
    pub use crate::optimization::consolidation::{
        amortized_payment, ConsolidationOffer, ConsolidationOpportunity, ConsolidationType,
        RiskLevel,
    };
    pub use crate::optimization::negotiation::{NegotiationOpportunity, NegotiationType};
    pub use crate::optimization::payoff::{OptimizationResult, PayoffEngine, PaymentPlan};
    pub use crate::optimization::strategy::{prioritize, DebtStrategy, UnknownStrategy};
    pub use crate::simulation::amortization::{PlanError, SimulationConfig};
}
