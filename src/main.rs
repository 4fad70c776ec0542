//! payoff-engine CLI
//!
//! Run debt payoff optimization from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Avalanche with 200 extra per month
//! payoff-engine optimize --input debts.json --extra 200
//!
//! # Compare avalanche, snowball and minimum-only, as JSON
//! payoff-engine compare --input debts.json --extra 200 --format json
//!
//! # Evaluate a 36-month personal loan at 9.99%
//! payoff-engine consolidate --input debts.json --rate 9.99 --term 36
//!
//! # Which creditors are worth calling
//! payoff-engine negotiate --input debts.json
//!
//! # Generate a random portfolio for testing
//! payoff-engine generate --debts 6 --seed 42
//! ```

use chrono::NaiveDate;
use log::info;
use payoff_engine::core::currency::Currency;
use payoff_engine::core::debt::{DebtAccount, DebtId, DebtPortfolio, DebtType};
use payoff_engine::core::money::Money;
use payoff_engine::core::rate::{Period, Rate};
use payoff_engine::optimization::comparison::ScoringPolicy;
use payoff_engine::optimization::consolidation::{ConsolidationOffer, ConsolidationType};
use payoff_engine::optimization::payoff::PayoffEngine;
use payoff_engine::optimization::strategy::DebtStrategy;
use payoff_engine::simulation::amortization::SimulationConfig;
use payoff_engine::simulation::portfolio_gen::{
    generate_portfolio_with_rng, generate_random_portfolio, PortfolioConfig,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::fs;
use std::process;

fn print_usage() {
    eprintln!(
        r#"payoff-engine: exact-decimal debt payoff optimization

USAGE:
    payoff-engine <COMMAND> [OPTIONS]

COMMANDS:
    optimize      Run one payoff strategy
    compare       Compare avalanche, snowball and minimum-only
    allocate      Show how this month's payment is split across debts
    consolidate   Evaluate a consolidation loan
    negotiate     List debts worth negotiating with the creditor
    generate      Generate a random debt portfolio (for testing)
    help          Show this message

OPTIONS (optimize, compare, allocate, consolidate, negotiate):
    --input <FILE>        Path to JSON debts file
    --start <YYYY-MM-DD>  Simulation start date (default: 1970-01-01)
    --max-months <N>      Simulation ceiling (default: 600)
    --format <FORMAT>     Output format: text (default) or json

OPTIONS (optimize, compare, allocate):
    --extra <AMOUNT>      Extra monthly payment on top of minimums (default: 0)

OPTIONS (optimize, allocate):
    --strategy <S>        avalanche (default), snowball, minimum, custom:ID,ID,...

OPTIONS (compare):
    --policy <FILE>       JSON scoring policy overriding the defaults

OPTIONS (consolidate):
    --rate <PCT>          Annual rate of the new loan
    --term <MONTHS>       Term of the new loan
    --fee <PCT>           Origination fee as a percentage (default: 0)
    --type <TYPE>         personal_loan (default), balance_transfer, home_equity_loan,
                          debt_management_plan, refinancing_program

OPTIONS (generate):
    --debts <N>           Number of debts (default: 5)
    --currency <CODE>     Currency code (default: USD)
    --seed <N>            Seed for a repeatable portfolio
    --output <FILE>       Write to file instead of stdout

EXAMPLES:
    payoff-engine optimize --input debts.json --strategy snowball --extra 150
    payoff-engine compare --input debts.json --extra 300 --policy policy.json
    payoff-engine allocate --input debts.json --strategy custom:car,card --extra 100
    payoff-engine consolidate --input debts.json --rate 11.5 --term 48 --fee 3
    payoff-engine negotiate --input debts.json --format json
    payoff-engine generate --debts 8 --currency EUR --output debts.json"#
    );
}

/// JSON schema for one input debt. Amounts and rates are decimal strings.
#[derive(Serialize, Deserialize)]
struct DebtInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    name: String,
    #[serde(rename = "type", default = "default_debt_type")]
    debt_type: DebtType,
    balance: String,
    apr: String,
    minimum_payment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    credit_limit: Option<String>,
}

fn default_debt_type() -> DebtType {
    DebtType::Other
}

#[derive(Serialize, Deserialize)]
struct DebtsFile {
    #[serde(default = "default_currency")]
    currency: Currency,
    debts: Vec<DebtInput>,
}

fn default_currency() -> Currency {
    Currency::USD
}

fn fail(message: impl Display) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => fail(format!("serializing output: {}", e)),
    }
}

fn parse_money(literal: &str, currency: Currency, field: &str) -> Money {
    Money::parse(literal, currency)
        .unwrap_or_else(|e| fail(format!("invalid {} '{}': {}", field, literal, e)))
}

fn load_portfolio(path: &str) -> DebtPortfolio {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|e| fail(format!("reading file '{}': {}", path, e)));

    let file: DebtsFile = serde_json::from_str(&content).unwrap_or_else(|e| {
        eprintln!("Error parsing JSON: {}", e);
        eprintln!("Expected format:");
        eprintln!(
            r#"{{
  "currency": "USD",
  "debts": [
    {{ "id": "card", "name": "Visa", "type": "credit_card", "balance": "4200.00",
      "apr": "22.99", "minimum_payment": "120.00", "credit_limit": "6000.00" }}
  ]
}}"#
        );
        process::exit(1);
    });

    let currency = file.currency;
    let mut debts = Vec::with_capacity(file.debts.len());
    for input in file.debts {
        let id = input.id.map(DebtId::new).unwrap_or_else(DebtId::generate);
        let rate = Rate::parse(&input.apr, Period::Annual)
            .unwrap_or_else(|e| fail(format!("debt '{}': {}", id, e)));
        let mut debt = DebtAccount::new(
            id.clone(),
            input.name,
            input.debt_type,
            parse_money(&input.balance, currency, "balance"),
            rate,
            parse_money(&input.minimum_payment, currency, "minimum_payment"),
        )
        .unwrap_or_else(|e| fail(e));
        if let Some(limit) = input.credit_limit {
            debt = debt
                .with_credit_limit(parse_money(&limit, currency, "credit_limit"))
                .unwrap_or_else(|e| fail(e));
        }
        debts.push(debt);
    }

    DebtPortfolio::new(debts).unwrap_or_else(|e| fail(e))
}

/// Flags shared by every command that runs the engine.
struct Options {
    input: Option<String>,
    extra: Option<String>,
    strategy: DebtStrategy,
    config: SimulationConfig,
    json: bool,
    policy: Option<String>,
    rate: Option<String>,
    term: Option<u32>,
    fee: Option<Decimal>,
    consolidation_type: ConsolidationType,
}

fn value(args: &[String], i: usize, flag: &str, what: &str) -> Result<String, String> {
    args.get(i)
        .cloned()
        .ok_or_else(|| format!("{} requires {}", flag, what))
}

/// Origination fee percentage: a plain non-negative decimal, `%` optional.
fn parse_fee(raw: &str) -> Result<Decimal, String> {
    let trimmed = raw.trim().trim_end_matches('%').trim();
    let fee = Decimal::from_str_exact(trimmed)
        .map_err(|_| format!("--fee: '{}' is not a percentage", raw))?;
    if fee < Decimal::ZERO {
        return Err(format!("--fee must not be negative, got {}", raw));
    }
    Ok(fee)
}

fn parse_options(args: &[String], allowed: &[&str]) -> Result<Options, String> {
    let mut opts = Options {
        input: None,
        extra: None,
        strategy: DebtStrategy::Avalanche,
        config: SimulationConfig::default(),
        json: false,
        policy: None,
        rate: None,
        term: None,
        fee: None,
        consolidation_type: ConsolidationType::PersonalLoan,
    };
    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        if !allowed.contains(&flag) {
            return Err(format!("unknown option: {}", flag));
        }
        i += 1;
        match flag {
            "--input" => opts.input = Some(value(args, i, flag, "a file path")?),
            "--extra" => opts.extra = Some(value(args, i, flag, "an amount")?),
            "--strategy" => {
                opts.strategy = value(args, i, flag, "a strategy")?
                    .parse()
                    .map_err(|e| format!("{}", e))?;
            }
            "--start" => {
                let raw = value(args, i, flag, "a date")?;
                opts.config.start_date = NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                    .map_err(|e| format!("invalid date '{}': {}", raw, e))?;
            }
            "--max-months" => {
                opts.config.max_months = value(args, i, flag, "a number")?
                    .parse()
                    .map_err(|_| "--max-months requires a number".to_string())?;
            }
            "--format" => {
                opts.json = match value(args, i, flag, "'text' or 'json'")?.as_str() {
                    "json" => true,
                    "text" => false,
                    other => return Err(format!("unknown format '{}'", other)),
                };
            }
            "--policy" => opts.policy = Some(value(args, i, flag, "a file path")?),
            "--rate" => opts.rate = Some(value(args, i, flag, "a percentage")?),
            "--term" => {
                opts.term = Some(
                    value(args, i, flag, "a number of months")?
                        .parse()
                        .map_err(|_| "--term requires a number of months".to_string())?,
                );
            }
            "--fee" => opts.fee = Some(parse_fee(&value(args, i, flag, "a percentage")?)?),
            "--type" => {
                opts.consolidation_type = value(args, i, flag, "a consolidation type")?.parse()?;
            }
            _ => return Err(format!("unknown option: {}", flag)),
        }
        i += 1;
    }
    Ok(opts)
}

/// Flags every command that reads a debts file accepts.
const INPUT_FLAGS: [&str; 4] = ["--input", "--start", "--max-months", "--format"];

fn flags_with(extra: &[&'static str]) -> Vec<&'static str> {
    INPUT_FLAGS.iter().chain(extra.iter()).copied().collect()
}

fn options_for(args: &[String], extra: &[&'static str]) -> Options {
    parse_options(args, &flags_with(extra)).unwrap_or_else(|e| fail(e))
}

fn portfolio_from(opts: &Options) -> DebtPortfolio {
    let path = opts
        .input
        .as_deref()
        .unwrap_or_else(|| fail("--input <FILE> is required"));
    let portfolio = load_portfolio(path);
    info!(
        "{} debts, total balance {}",
        portfolio.len(),
        portfolio
            .total_balance()
            .map(|m| m.to_string())
            .unwrap_or_default()
    );
    portfolio
}

/// Load the portfolio and parse `--extra` in its currency.
fn portfolio_and_extra(opts: &Options) -> (DebtPortfolio, Money) {
    let portfolio = portfolio_from(opts);
    let extra = match &opts.extra {
        Some(raw) => parse_money(raw, portfolio.currency(), "extra payment"),
        None => Money::zero(portfolio.currency()),
    };
    (portfolio, extra)
}

fn cmd_optimize(args: &[String]) {
    let opts = options_for(args, &["--extra", "--strategy"]);
    let (portfolio, extra) = portfolio_and_extra(&opts);
    let engine = PayoffEngine::new(opts.config);
    let result = engine
        .optimize(&portfolio, &opts.strategy, extra)
        .unwrap_or_else(|e| fail(e));

    if opts.json {
        print_json(&result);
    } else {
        println!("{}", result);
    }
}

fn cmd_compare(args: &[String]) {
    let opts = options_for(args, &["--extra", "--policy"]);
    let (portfolio, extra) = portfolio_and_extra(&opts);
    let policy = match &opts.policy {
        Some(path) => {
            let content = fs::read_to_string(path)
                .unwrap_or_else(|e| fail(format!("reading policy '{}': {}", path, e)));
            serde_json::from_str::<ScoringPolicy>(&content)
                .unwrap_or_else(|e| fail(format!("parsing policy '{}': {}", path, e)))
        }
        None => ScoringPolicy::default(),
    };

    let engine = PayoffEngine::new(opts.config);
    let comparison = engine
        .compare_strategies(&portfolio, extra, &policy)
        .unwrap_or_else(|e| fail(e));

    if opts.json {
        print_json(&comparison);
        return;
    }

    println!("{}", comparison.avalanche);
    println!("{}", comparison.snowball);
    match &comparison.minimum_only {
        Some(result) => println!("{}", result),
        None => println!("=== Minimum Payments Only ===\nNever pays off within the simulation ceiling\n"),
    }
    for (label, milestones) in [
        ("Snowball", &comparison.snowball_milestones),
        ("Avalanche", &comparison.avalanche_milestones),
    ] {
        println!("{} milestones:", label);
        for m in milestones {
            println!(
                "  month {:>3}  {:<24} motivation {}/10",
                m.payoff_month, m.debt_name, m.motivation_boost
            );
        }
    }
    let f = &comparison.psychological_factors;
    println!("=== Recommendation: {} ===", comparison.recommended_strategy);
    println!("{}", comparison.recommendation_reason);
    println!(
        "Quick wins (first {} months): snowball {}, avalanche {}",
        policy.quick_win_window_months, f.quick_wins_snowball, f.quick_wins_avalanche
    );
    println!(
        "Motivation: snowball {}/10, avalanche {}/10",
        f.motivation_score_snowball, f.motivation_score_avalanche
    );
    println!(
        "Quick-win importance {}, mathematical optimality {}",
        f.quick_wins_importance, f.mathematical_optimality
    );
    println!(
        "Estimated success probability: {}%",
        f.estimated_success_probability
    );
}

fn cmd_allocate(args: &[String]) {
    let opts = options_for(args, &["--extra", "--strategy"]);
    let (portfolio, extra) = portfolio_and_extra(&opts);
    let engine = PayoffEngine::new(opts.config);
    let allocation = engine
        .optimize_payment_allocation(&portfolio, &opts.strategy, extra)
        .unwrap_or_else(|e| fail(e));

    if opts.json {
        print_json(&allocation);
    } else {
        print!("{}", allocation);
    }
}

fn cmd_consolidate(args: &[String]) {
    let opts = options_for(args, &["--rate", "--term", "--fee", "--type"]);
    let portfolio = portfolio_from(&opts);

    let raw_rate = opts
        .rate
        .as_deref()
        .unwrap_or_else(|| fail("--rate <PCT> is required"));
    let rate = Rate::parse(raw_rate, Period::Annual).unwrap_or_else(|e| fail(e));
    let term = opts
        .term
        .unwrap_or_else(|| fail("--term <MONTHS> is required"));
    let fee = opts.fee.unwrap_or(Decimal::ZERO);

    let offer = ConsolidationOffer::new(opts.consolidation_type, rate, term).with_origination_fee(fee);
    let engine = PayoffEngine::new(opts.config);
    let op = engine
        .analyze_consolidation(&portfolio, &offer)
        .unwrap_or_else(|e| fail(e));

    if opts.json {
        print_json(&op);
        return;
    }

    println!("=== {} at {} over {} months ===", op.consolidation_type, op.new_rate, op.term_months);
    println!("Consolidated Balance:  {}", op.consolidated_balance);
    println!("Origination Fee:       {}", op.origination_fee);
    println!(
        "Monthly Payment:       {} (currently {})",
        op.new_monthly_payment, op.current_monthly_payment
    );
    println!(
        "Total Interest:        {} (currently {})",
        op.new_total_interest, op.current_total_interest
    );
    println!("Interest Savings:      {}", op.total_interest_savings);
    println!(
        "Time Savings:          {} months (currently {} months)",
        op.time_savings_months, op.current_months_to_payoff
    );
    println!(
        "Risk: {:?}  Score: {}/100",
        op.pros_and_cons.risk_assessment, op.pros_and_cons.recommendation_score
    );
    for a in &op.pros_and_cons.advantages {
        println!("  + {}", a);
    }
    for d in &op.pros_and_cons.disadvantages {
        println!("  - {}", d);
    }
}

fn cmd_negotiate(args: &[String]) {
    let opts = options_for(args, &[]);
    let portfolio = portfolio_from(&opts);
    let engine = PayoffEngine::new(opts.config);
    let opportunities = engine
        .find_negotiation_opportunities(&portfolio)
        .unwrap_or_else(|e| fail(e));

    if opts.json {
        print_json(&opportunities);
        return;
    }

    if opportunities.is_empty() {
        println!("No debts qualify for negotiation.");
        return;
    }
    for op in &opportunities {
        println!("=== {}: {} ===", op.debt_name, op.negotiation_type);
        println!("Balance:             {}", op.current_balance);
        println!(
            "Potential Savings:   {} ({}% chance of success)",
            op.potential_savings, op.success_probability
        );
        println!("Approach:            {}", op.negotiation_strategy);
        for point in &op.talking_points {
            println!("  > {}", point);
        }
        for step in &op.required_preparation {
            println!("  * {}", step);
        }
        println!();
    }
}

fn cmd_generate(args: &[String]) {
    let mut config = PortfolioConfig::default();
    let mut seed: Option<u64> = None;
    let mut output_path: Option<String> = None;
    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        i += 1;
        match flag {
            "--debts" => {
                config.debt_count = value(args, i, flag, "a number")
                    .unwrap_or_else(|e| fail(e))
                    .parse()
                    .unwrap_or_else(|_| fail("--debts requires a number"));
            }
            "--currency" => {
                config.currency = value(args, i, flag, "a currency code")
                    .unwrap_or_else(|e| fail(e))
                    .parse()
                    .unwrap_or_else(|e| fail(e));
            }
            "--seed" => {
                seed = Some(
                    value(args, i, flag, "a number")
                        .unwrap_or_else(|e| fail(e))
                        .parse()
                        .unwrap_or_else(|_| fail("--seed requires a number")),
                );
            }
            "--output" => {
                output_path = Some(value(args, i, flag, "a file path").unwrap_or_else(|e| fail(e)))
            }
            _ => fail(format!("unknown option: {}", flag)),
        }
        i += 1;
    }

    let portfolio = match seed {
        Some(seed) => generate_portfolio_with_rng(&config, &mut StdRng::seed_from_u64(seed)),
        None => generate_random_portfolio(&config),
    }
    .unwrap_or_else(|e| fail(e));

    let output = DebtsFile {
        currency: portfolio.currency(),
        debts: portfolio
            .debts()
            .iter()
            .map(|d| DebtInput {
                id: Some(d.id().to_string()),
                name: d.name().to_string(),
                debt_type: d.debt_type(),
                balance: d.balance().to_fixed_string(),
                apr: d.interest_rate().annual_percentage().to_string(),
                minimum_payment: d.minimum_payment().to_fixed_string(),
                credit_limit: d.credit_limit().map(|m| m.to_fixed_string()),
            })
            .collect(),
    };

    let json = serde_json::to_string_pretty(&output)
        .unwrap_or_else(|e| fail(format!("serializing output: {}", e)));

    if let Some(path) = output_path {
        fs::write(&path, &json)
            .unwrap_or_else(|e| fail(format!("writing to '{}': {}", path, e)));
        eprintln!("Generated {} debts → {}", portfolio.len(), path);
    } else {
        println!("{}", json);
    }
}

fn main() {
    env_logger::init();
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    match command {
        "optimize" => cmd_optimize(rest),
        "compare" => cmd_compare(rest),
        "allocate" => cmd_allocate(rest),
        "consolidate" => cmd_consolidate(rest),
        "negotiate" => cmd_negotiate(rest),
        "generate" => cmd_generate(rest),
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(1);
        }
    }
}
