use criterion::{black_box, criterion_group, criterion_main, Criterion};
use payoff_engine::core::currency::Currency;
use payoff_engine::core::debt::DebtPortfolio;
use payoff_engine::core::money::Money;
use payoff_engine::optimization::comparison::ScoringPolicy;
use payoff_engine::optimization::payoff::PayoffEngine;
use payoff_engine::optimization::strategy::DebtStrategy;
use payoff_engine::simulation::portfolio_gen::{generate_portfolio_with_rng, PortfolioConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn portfolio(debt_count: usize) -> DebtPortfolio {
    let config = PortfolioConfig {
        debt_count,
        ..Default::default()
    };
    generate_portfolio_with_rng(&config, &mut StdRng::seed_from_u64(2024)).unwrap()
}

fn extra() -> Money {
    Money::from_integer(250, Currency::USD).unwrap()
}

fn bench_avalanche_5_debts(c: &mut Criterion) {
    let p = portfolio(5);
    let engine = PayoffEngine::default();

    c.bench_function("avalanche_5_debts", |b| {
        b.iter(|| engine.optimize(black_box(&p), &DebtStrategy::Avalanche, extra()))
    });
}

fn bench_avalanche_50_debts(c: &mut Criterion) {
    let p = portfolio(50);
    let engine = PayoffEngine::default();

    c.bench_function("avalanche_50_debts", |b| {
        b.iter(|| engine.optimize(black_box(&p), &DebtStrategy::Avalanche, extra()))
    });
}

fn bench_compare_20_debts(c: &mut Criterion) {
    let p = portfolio(20);
    let engine = PayoffEngine::default();
    let policy = ScoringPolicy::default();

    c.bench_function("compare_20_debts", |b| {
        b.iter(|| engine.compare_strategies(black_box(&p), extra(), &policy))
    });
}

criterion_group!(
    benches,
    bench_avalanche_5_debts,
    bench_avalanche_50_debts,
    bench_compare_20_debts
);
criterion_main!(benches);
