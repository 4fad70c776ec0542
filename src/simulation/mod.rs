pub mod amortization;
pub mod portfolio_gen;
