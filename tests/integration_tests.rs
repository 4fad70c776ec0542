use chrono::NaiveDate;
use payoff_engine::core::currency::Currency;
use payoff_engine::core::debt::{DebtAccount, DebtId, DebtPortfolio, DebtType};
use payoff_engine::core::money::{Money, MoneyError};
use payoff_engine::core::rate::Rate;
use payoff_engine::optimization::comparison::ScoringPolicy;
use payoff_engine::optimization::consolidation::{ConsolidationOffer, ConsolidationType};
use payoff_engine::optimization::payoff::{OptimizationResult, PayoffEngine};
use payoff_engine::optimization::strategy::{prioritize, DebtStrategy};
use payoff_engine::simulation::amortization::{PlanError, SimulationConfig};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn usd(s: &str) -> Money {
    Money::parse(s, Currency::USD).unwrap()
}

fn debt(id: &str, debt_type: DebtType, balance: &str, apr: Decimal, min: &str) -> DebtAccount {
    DebtAccount::new(
        DebtId::new(id),
        id,
        debt_type,
        usd(balance),
        Rate::annual(apr).unwrap(),
        usd(min),
    )
    .unwrap()
}

fn engine() -> PayoffEngine {
    PayoffEngine::new(SimulationConfig::starting(
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
    ))
}

/// A typical household: two cards, a store card, a car loan, student debt.
fn household() -> DebtPortfolio {
    DebtPortfolio::new(vec![
        debt("visa", DebtType::CreditCard, "6200", dec!(24.99), "186"),
        debt("store", DebtType::CreditCard, "480", dec!(26.99), "25"),
        debt("mc", DebtType::CreditCard, "2300", dec!(19.49), "69"),
        debt("car", DebtType::AutoLoan, "11400", dec!(6.9), "310"),
        debt("school", DebtType::StudentLoan, "18750", dec!(4.5), "195"),
    ])
    .unwrap()
}

/// Full pipeline: JSON → portfolio → strategies → comparison → allocation.
#[test]
fn full_pipeline_household_scenario() {
    let json = r#"[
        {"id":"visa","name":"Visa","debt_type":"credit_card",
         "balance":{"amount":"6200","currency":"USD"},
         "interest_rate":{"percentage":"24.99","period":"ANNUAL"},
         "minimum_payment":{"amount":"186","currency":"USD"},
         "credit_limit":{"amount":"8000","currency":"USD"}},
        {"id":"car","name":"Car","debt_type":"auto_loan",
         "balance":{"amount":"11400","currency":"USD"},
         "interest_rate":{"percentage":"6.9","period":"ANNUAL"},
         "minimum_payment":{"amount":"310","currency":"USD"}}
    ]"#;
    let accounts: Vec<DebtAccount> = serde_json::from_str(json).unwrap();
    let portfolio = DebtPortfolio::try_from(accounts).unwrap();
    assert_eq!(portfolio.total_balance().unwrap(), usd("17600"));
    assert_eq!(portfolio.total_minimum_payment().unwrap(), usd("496"));

    let e = engine();
    let extra = usd("250");
    let avalanche = e.optimize(&portfolio, &DebtStrategy::Avalanche, extra).unwrap();
    let snowball = e.optimize(&portfolio, &DebtStrategy::Snowball, extra).unwrap();

    assert_eq!(avalanche.priority_order[0], DebtId::new("visa"));
    assert_eq!(snowball.priority_order[0], DebtId::new("visa"));
    assert_eq!(avalanche.total_monthly_payment, usd("746"));
    assert_eq!(
        avalanche.total_paid,
        usd("17600").add(&avalanche.total_interest_paid).unwrap()
    );
    assert!(avalanche.interest_savings_vs_minimum.unwrap().is_positive());
    assert!(avalanche.final_payoff_date > NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());

    let comparison = e
        .compare_strategies(&portfolio, extra, &ScoringPolicy::default())
        .unwrap();
    assert_eq!(comparison.avalanche, avalanche);
    assert_eq!(comparison.recommended_strategy, DebtStrategy::Avalanche);

    let allocation = e
        .optimize_payment_allocation(&portfolio, &DebtStrategy::Avalanche, extra)
        .unwrap();
    assert_eq!(allocation.allocations[0].extra_payment, usd("250"));
    assert_eq!(
        allocation.expected_impact.interest_savings,
        avalanche.interest_savings_vs_minimum
    );
}

#[test]
fn avalanche_pays_b_only_after_a() {
    let portfolio = DebtPortfolio::new(vec![
        debt("A", DebtType::CreditCard, "1000", dec!(20), "30"),
        debt("B", DebtType::CreditCard, "500", dec!(10), "20"),
    ])
    .unwrap();
    let result = engine()
        .optimize(&portfolio, &DebtStrategy::Avalanche, usd("100"))
        .unwrap();
    assert_eq!(result.priority_order, vec![DebtId::new("A"), DebtId::new("B")]);
    let a = result.plan_for(&DebtId::new("A")).unwrap();
    let b = result.plan_for(&DebtId::new("B")).unwrap();
    assert!(b.months_to_payoff > a.months_to_payoff);

    // While A is open, B never receives more than its minimum.
    for item in &b.schedule {
        if item.payment_number < a.months_to_payoff {
            assert_eq!(item.payment, usd("20"));
        }
    }

    let snowball = prioritize(&portfolio, &DebtStrategy::Snowball).unwrap();
    assert_eq!(snowball[0].id(), &DebtId::new("B"));
}

#[test]
fn avalanche_never_costs_more_than_snowball() {
    let e = engine();
    let p = household();
    for extra in ["0", "100", "400", "1200"] {
        let a = e.optimize(&p, &DebtStrategy::Avalanche, usd(extra)).unwrap();
        let s = e.optimize(&p, &DebtStrategy::Snowball, usd(extra)).unwrap();
        assert!(a.total_interest_paid <= s.total_interest_paid, "extra {}", extra);
    }
}

#[test]
fn more_extra_never_takes_longer() {
    let e = engine();
    let p = household();
    let mut last: Option<OptimizationResult> = None;
    for extra in ["0", "50", "200", "800"] {
        let r = e.optimize(&p, &DebtStrategy::Avalanche, usd(extra)).unwrap();
        if let Some(prev) = &last {
            assert!(r.total_time_to_payoff_months <= prev.total_time_to_payoff_months);
            assert!(r.total_interest_paid <= prev.total_interest_paid);
        }
        last = Some(r);
    }
}

#[test]
fn non_convergent_portfolio_times_out() {
    let portfolio = DebtPortfolio::new(vec![debt(
        "payday",
        DebtType::PersonalLoan,
        "5000",
        dec!(36),
        "100",
    )])
    .unwrap();
    let err = engine()
        .optimize(&portfolio, &DebtStrategy::MinimumOnly, usd("0"))
        .unwrap_err();
    assert!(matches!(err, PlanError::PayoffTimeoutExceeded { .. }));

    // Not enough extra: the requested strategy itself never finishes.
    let err = engine()
        .optimize(&portfolio, &DebtStrategy::Avalanche, usd("40"))
        .unwrap_err();
    assert!(matches!(err, PlanError::PayoffTimeoutExceeded { .. }));
}

#[test]
fn extra_payment_plan_works_when_minimums_never_finish() {
    let portfolio = DebtPortfolio::new(vec![debt(
        "payday",
        DebtType::PersonalLoan,
        "5000",
        dec!(36),
        "100",
    )])
    .unwrap();
    let e = engine();
    let extra = usd("300");

    let result = e.optimize(&portfolio, &DebtStrategy::Avalanche, extra).unwrap();
    assert_eq!(result.total_time_to_payoff_months, 16);
    assert_eq!(result.interest_savings_vs_minimum, None);
    assert_eq!(result.time_savings_vs_minimum_months, None);

    let allocation = e
        .optimize_payment_allocation(&portfolio, &DebtStrategy::Avalanche, extra)
        .unwrap();
    assert_eq!(allocation.expected_impact.months_to_debt_free, 16);
    assert_eq!(allocation.expected_impact.interest_savings, None);

    let comparison = e
        .compare_strategies(&portfolio, extra, &ScoringPolicy::default())
        .unwrap();
    assert!(comparison.minimum_only.is_none());
    assert_eq!(comparison.avalanche, result);
}

#[test]
fn custom_order_must_name_every_debt_once() {
    let p = household();
    let bad = DebtStrategy::Custom(vec![DebtId::new("visa"), DebtId::new("car")]);
    let err = engine().optimize(&p, &bad, usd("100")).unwrap_err();
    assert!(matches!(err, PlanError::InvalidPriorityOrder { .. }));

    let good: DebtStrategy = "custom:car,school,visa,mc,store".parse().unwrap();
    let result = engine().optimize(&p, &good, usd("100")).unwrap();
    assert_eq!(result.priority_order[0], DebtId::new("car"));
}

#[test]
fn comparison_is_bit_identical_across_runs() {
    let e = engine();
    let policy = ScoringPolicy::default();
    let first = e.compare_strategies(&household(), usd("300"), &policy).unwrap();
    let second = e.compare_strategies(&household(), usd("300"), &policy).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn consolidation_against_current_trajectory() {
    let e = engine();
    let offer = ConsolidationOffer::new(
        ConsolidationType::BalanceTransfer,
        Rate::annual(dec!(3.99)).unwrap(),
        24,
    )
    .with_origination_fee(dec!(3))
    .with_requirements(["Credit score 700+"]);
    let op = e.analyze_consolidation(&household(), &offer).unwrap();

    // Only the three cards move: 6200 + 480 + 2300 plus a 3% fee.
    assert_eq!(op.consolidated_balance, usd("9249.4"));
    assert_eq!(op.origination_fee, usd("269.4"));
    assert_eq!(op.current_monthly_payment, usd("280"));
    assert!(op.total_interest_savings.is_positive());
    assert_eq!(op.eligibility_requirements, vec!["Credit score 700+".to_string()]);
}

#[test]
fn money_contract() {
    let sum = Money::parse("0.1", Currency::USD)
        .unwrap()
        .add(&Money::parse("0.2", Currency::USD).unwrap())
        .unwrap();
    assert!(sum.equals(&Money::parse("0.3", Currency::USD).unwrap()));

    assert!(Money::parse("999999999999999.9999", Currency::USD).is_ok());
    assert!(matches!(
        Money::parse("9999999999999999.9999", Currency::USD),
        Err(MoneyError::InvalidAmount { .. })
    ));

    let eur = Money::parse("10.00", Currency::EUR).unwrap();
    assert!(matches!(
        usd("10.00").add(&eur),
        Err(MoneyError::CurrencyMismatch { .. })
    ));

    let json = serde_json::to_string(&usd("1234.56")).unwrap();
    assert_eq!(json, r#"{"amount":"1234.5600","currency":"USD"}"#);
}

#[test]
fn results_serialize_with_fixed_scale_amounts() {
    let result = engine()
        .optimize(&household(), &DebtStrategy::Snowball, usd("150"))
        .unwrap();
    let json = serde_json::to_value(&result).unwrap();
    let amount = json["total_interest_paid"]["amount"].as_str().unwrap();
    let (_, fraction) = amount.split_once('.').unwrap();
    assert_eq!(fraction.len(), 4);
    assert!(!amount.contains('e') && !amount.contains('E'));

    let back: OptimizationResult = serde_json::from_value(json).unwrap();
    assert_eq!(back, result);
}
