//! Avalanche versus snowball on a typical household portfolio.
//!
//! Shows the interest each strategy costs, how early the first debts are
//! cleared, and which one the scoring policy recommends.

use chrono::NaiveDate;
use payoff_engine::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn usd(s: &str) -> Money {
    Money::parse(s, Currency::USD).unwrap()
}

fn debt(id: &str, name: &str, kind: DebtType, balance: &str, apr: Decimal, min: &str) -> DebtAccount {
    DebtAccount::new(
        DebtId::new(id),
        name,
        kind,
        usd(balance),
        Rate::annual(apr).unwrap(),
        usd(min),
    )
    .unwrap()
}

fn main() {
    println!("╔════════════════════════════════════════════╗");
    println!("║  payoff-engine: Avalanche vs Snowball      ║");
    println!("╚════════════════════════════════════════════╝\n");

    let portfolio = DebtPortfolio::new(vec![
        debt("visa", "Visa", DebtType::CreditCard, "6200", dec!(24.99), "186"),
        debt("store", "Store Card", DebtType::CreditCard, "480", dec!(26.99), "25"),
        debt("dentist", "Dental Bill", DebtType::MedicalDebt, "350", dec!(0), "50"),
        debt("mc", "Mastercard", DebtType::CreditCard, "2300", dec!(19.49), "69"),
        debt("car", "Car Loan", DebtType::AutoLoan, "11400", dec!(6.9), "310"),
    ])
    .unwrap();

    println!(
        "Portfolio: {} debts, {} owed, {} due monthly, weighted rate {}\n",
        portfolio.len(),
        portfolio.total_balance().unwrap(),
        portfolio.total_minimum_payment().unwrap(),
        portfolio.weighted_average_rate().unwrap()
    );

    let engine = PayoffEngine::new(SimulationConfig::starting(
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
    ));
    let comparison = engine
        .compare_strategies(&portfolio, usd("300"), &ScoringPolicy::default())
        .unwrap();

    println!("━━━ Avalanche ━━━\n");
    println!("{}", comparison.avalanche);
    println!("━━━ Snowball ━━━\n");
    println!("{}", comparison.snowball);
    for m in &comparison.snowball_milestones {
        println!(
            "  month {:>3}: {} paid off (motivation {}/10)",
            m.payoff_month, m.debt_name, m.motivation_boost
        );
    }
    println!();

    let f = &comparison.psychological_factors;
    println!("━━━ Recommendation: {} ━━━\n", comparison.recommended_strategy);
    println!("{}", comparison.recommendation_reason);
    println!(
        "Quick wins in 6 months: snowball {}, avalanche {}",
        f.quick_wins_snowball, f.quick_wins_avalanche
    );
    println!(
        "Estimated success probability: {}%",
        f.estimated_success_probability
    );

    // A borrower who values early wins tips the scales.
    let eager = ScoringPolicy {
        quick_win_threshold: 1,
        preference: PsychologicalPreference::QuickWins,
        ..Default::default()
    };
    let again = engine
        .compare_strategies(&portfolio, usd("300"), &eager)
        .unwrap();
    println!(
        "\nWith a quick-wins policy (threshold 1): {}",
        again.recommended_strategy
    );
}
