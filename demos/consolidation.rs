//! Ranking consolidation offers for a card-heavy portfolio.

use payoff_engine::prelude::*;
use rust_decimal_macros::dec;

fn usd(s: &str) -> Money {
    Money::parse(s, Currency::USD).unwrap()
}

fn main() {
    println!("╔════════════════════════════════════════════╗");
    println!("║  payoff-engine: Consolidation Offers       ║");
    println!("╚════════════════════════════════════════════╝\n");

    let card = |id: &str, balance: &str, apr, min: &str| {
        DebtAccount::new(
            DebtId::new(id),
            id,
            DebtType::CreditCard,
            usd(balance),
            Rate::annual(apr).unwrap(),
            usd(min),
        )
        .unwrap()
    };
    let portfolio = DebtPortfolio::new(vec![
        card("visa", "5400", dec!(24.99), "162"),
        card("amex", "3100", dec!(21.24), "93"),
        card("store", "900", dec!(27.99), "35"),
    ])
    .unwrap();

    let offers = vec![
        ConsolidationOffer::new(
            ConsolidationType::PersonalLoan,
            Rate::annual(dec!(11.99)).unwrap(),
            36,
        )
        .with_origination_fee(dec!(2))
        .with_requirements(["Credit score 680+", "Debt-to-income below 36%"]),
        ConsolidationOffer::new(ConsolidationType::BalanceTransfer, Rate::zero(), 18)
            .with_origination_fee(dec!(3))
            .with_requirements(["Credit score 720+", "Transfer within 60 days"]),
        ConsolidationOffer::new(
            ConsolidationType::HomeEquityLoan,
            Rate::annual(dec!(8.25)).unwrap(),
            120,
        )
        .with_requirements(["At least 20% home equity"]),
    ];

    let engine = PayoffEngine::default();
    let ranked = engine.analyze_offers(&portfolio, &offers).unwrap();

    for (i, op) in ranked.iter().enumerate() {
        println!(
            "{}. {} at {} over {} months (score {}/100, {:?} risk)",
            i + 1,
            op.consolidation_type,
            op.new_rate,
            op.term_months,
            op.pros_and_cons.recommendation_score,
            op.pros_and_cons.risk_assessment
        );
        println!(
            "   Payment {} (now {}), interest saved {}, {} months sooner",
            op.new_monthly_payment,
            op.current_monthly_payment,
            op.total_interest_savings,
            op.time_savings_months
        );
        for a in &op.pros_and_cons.advantages {
            println!("   + {}", a);
        }
        for d in &op.pros_and_cons.disadvantages {
            println!("   - {}", d);
        }
        println!();
    }

    println!("━━━ Worth a call to the creditor ━━━\n");
    for op in engine.find_negotiation_opportunities(&portfolio).unwrap() {
        println!(
            "{}: {} could save {} ({}% chance)",
            op.debt_name, op.negotiation_type, op.potential_savings, op.success_probability
        );
    }
    println!();

    let loan = amortized_payment(usd("9400"), Rate::annual(dec!(11.99)).unwrap(), 36).unwrap();
    println!("Closed-form payment on 9400 at 11.99% over 36 months: {}", loan);
}
