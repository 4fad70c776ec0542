pub mod currency;
pub mod debt;
pub mod money;
pub mod rate;
