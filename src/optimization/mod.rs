pub mod allocation;
pub mod comparison;
pub mod consolidation;
pub mod negotiation;
pub mod payoff;
pub mod strategy;
