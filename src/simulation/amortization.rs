//! Month-by-month amortization of a prioritised set of debts.
//!
//! This is the single primitive every strategy, comparison and allocation
//! runs on. Each simulated month:
//!
//! 1. every open debt accrues `balance * monthly_rate`, rounded to 4 digits;
//! 2. every open debt receives its minimum payment (capped at its balance);
//! 3. in [`PaymentMode::Rolling`], whatever is left of the monthly capacity
//!    goes to the highest-priority open debt, spilling into the next one
//!    when that debt reaches zero.
//!
//! Capacity is fixed at `sum(minimums) + extra`, so the minimum of a debt
//! that reaches zero is redistributed to the remaining debts from the same
//! month onward.

use crate::core::debt::{DebtAccount, DebtError, DebtId};
use crate::core::money::{Money, MoneyError};
use chrono::{Months, NaiveDate};
use log::{debug, trace};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Hard ceiling on simulated months (50 years).
pub const DEFAULT_MAX_MONTHS: u32 = 600;

/// Errors arising from payoff planning.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("invalid priority order: {reason}")]
    InvalidPriorityOrder { reason: String },
    #[error("debts not paid off within {months} months: payments do not outpace accruing interest")]
    PayoffTimeoutExceeded { months: u32 },
    #[error("extra payment must not be negative, got {0}")]
    NegativeExtraPayment(Money),
    #[error("loan term must be between 1 and 1200 months")]
    InvalidTerm,
    #[error(transparent)]
    Debt(#[from] DebtError),
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Simulation parameters.
///
/// The start date is always explicit input so identical inputs produce
/// identical schedules. `Default` starts at the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub start_date: NaiveDate,
    pub max_months: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            start_date: NaiveDate::default(),
            max_months: DEFAULT_MAX_MONTHS,
        }
    }
}

impl SimulationConfig {
    pub fn starting(start_date: NaiveDate) -> Self {
        Self {
            start_date,
            ..Default::default()
        }
    }

    pub fn with_max_months(mut self, max_months: u32) -> Self {
        self.max_months = max_months;
        self
    }

    /// Calendar date `months` after the start date.
    pub fn date_after(&self, months: u32) -> NaiveDate {
        self.start_date
            .checked_add_months(Months::new(months))
            .unwrap_or(NaiveDate::MAX)
    }
}

/// How leftover capacity is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMode {
    /// Extra payment and freed minimums roll onto the next priority debt.
    Rolling,
    /// Each debt only ever receives its own minimum; nothing rolls over.
    MinimumOnly,
}

/// One month of one debt's schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentScheduleItem {
    pub payment_number: u32,
    pub payment_date: NaiveDate,
    pub payment: Money,
    pub interest: Money,
    /// `payment - interest`; negative when the payment did not cover interest.
    pub principal: Money,
    pub remaining_balance: Money,
}

/// Aggregate cash flow of one simulated month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthTotal {
    pub month: u32,
    pub payment: Money,
    pub interest: Money,
    pub remaining_balance: Money,
}

/// Simulated trajectory of a single debt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtProgress {
    pub debt_id: DebtId,
    pub debt_name: String,
    pub starting_balance: Money,
    /// Payment applied in the first month.
    pub monthly_payment: Money,
    pub total_paid: Money,
    pub total_interest: Money,
    pub months_to_payoff: u32,
    pub payoff_date: NaiveDate,
    pub schedule: Vec<PaymentScheduleItem>,
}

/// Full result of a simulation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Simulation {
    pub mode: PaymentMode,
    pub monthly_capacity: Money,
    pub months: u32,
    pub total_paid: Money,
    pub total_interest: Money,
    /// Per-debt progress, in the priority order supplied.
    pub progress: Vec<DebtProgress>,
    /// Debt ids in the order their balances reached zero.
    pub payoff_order: Vec<DebtId>,
    pub monthly_totals: Vec<MonthTotal>,
}

impl Simulation {
    pub fn progress_for(&self, id: &DebtId) -> Option<&DebtProgress> {
        self.progress.iter().find(|p| &p.debt_id == id)
    }

    /// Number of debts cleared within the first `months` months.
    pub fn debts_cleared_within(&self, months: u32) -> usize {
        self.progress
            .iter()
            .filter(|p| p.months_to_payoff <= months)
            .count()
    }
}

struct Track<'a> {
    debt: &'a DebtAccount,
    monthly_fraction: Decimal,
    balance: Money,
    paid: Money,
    interest: Money,
    payoff_month: Option<u32>,
    schedule: Vec<PaymentScheduleItem>,
}

impl Track<'_> {
    fn is_open(&self) -> bool {
        self.payoff_month.is_none()
    }
}

/// Amortize `ordered` (highest priority first) with `extra` on top of the
/// summed minimum payments.
///
/// Fails with [`PlanError::PayoffTimeoutExceeded`] when balances are not all
/// zero after `config.max_months` months, or when balances grow past the
/// representable Money range before then.
pub fn simulate(
    ordered: &[&DebtAccount],
    extra: Money,
    mode: PaymentMode,
    config: &SimulationConfig,
) -> Result<Simulation, PlanError> {
    let currency = extra.currency();
    if extra.is_negative() {
        return Err(PlanError::NegativeExtraPayment(extra));
    }

    let mut tracks = Vec::with_capacity(ordered.len());
    let mut minimums = Money::zero(currency);
    for debt in ordered {
        minimums = minimums.add(&debt.minimum_payment())?;
        tracks.push(Track {
            debt,
            monthly_fraction: debt.interest_rate().monthly_fraction(),
            balance: debt.balance(),
            paid: Money::zero(currency),
            interest: Money::zero(currency),
            payoff_month: if debt.balance().is_zero() { Some(0) } else { None },
            schedule: Vec::new(),
        });
    }
    let capacity = match mode {
        PaymentMode::Rolling => minimums.add(&extra)?,
        PaymentMode::MinimumOnly => minimums,
    };

    debug!(
        "simulating {} debts, mode {:?}, capacity {}",
        tracks.len(),
        mode,
        capacity
    );

    let mut payoff_order: Vec<DebtId> = tracks
        .iter()
        .filter(|t| !t.is_open())
        .map(|t| t.debt.id().clone())
        .collect();
    let mut monthly_totals = Vec::new();
    let mut month = 0u32;

    while tracks.iter().any(Track::is_open) {
        month += 1;
        if month > config.max_months {
            return Err(PlanError::PayoffTimeoutExceeded {
                months: config.max_months,
            });
        }
        let date = config.date_after(month);

        // Accrue. Running past the Money bounds only happens when interest
        // outgrows payments, which is the same non-convergent case.
        let mut accrued = vec![Money::zero(currency); tracks.len()];
        for (i, t) in tracks.iter_mut().enumerate() {
            if !t.is_open() {
                continue;
            }
            let interest = t
                .balance
                .multiply(t.monthly_fraction)
                .and_then(|interest| t.balance.add(&interest).map(|b| (interest, b)));
            let (interest, grown) = match interest {
                Ok(pair) => pair,
                Err(MoneyError::InvalidAmount { .. }) => {
                    return Err(PlanError::PayoffTimeoutExceeded { months: month });
                }
                Err(e) => return Err(e.into()),
            };
            t.balance = grown;
            t.interest = t.interest.add(&interest)?;
            accrued[i] = interest;
        }

        // Minimums first.
        let mut payments = vec![Money::zero(currency); tracks.len()];
        let mut pool = capacity;
        for (i, t) in tracks.iter().enumerate() {
            if !t.is_open() {
                continue;
            }
            let due = t.debt.minimum_payment().min_of(&t.balance)?;
            payments[i] = due;
            pool = pool.subtract(&due)?;
        }

        // Leftover capacity cascades down the priority order.
        if mode == PaymentMode::Rolling {
            for (i, t) in tracks.iter().enumerate() {
                if !pool.is_positive() {
                    break;
                }
                if !t.is_open() {
                    continue;
                }
                let outstanding = t.balance.subtract(&payments[i])?;
                let take = pool.min_of(&outstanding)?;
                if take.is_positive() {
                    payments[i] = payments[i].add(&take)?;
                    pool = pool.subtract(&take)?;
                }
            }
        }

        let mut month_paid = Money::zero(currency);
        let mut month_interest = Money::zero(currency);
        let mut month_remaining = Money::zero(currency);
        for (i, t) in tracks.iter_mut().enumerate() {
            if !t.is_open() {
                continue;
            }
            let payment = payments[i];
            t.balance = t.balance.subtract(&payment)?;
            t.paid = t.paid.add(&payment)?;
            t.schedule.push(PaymentScheduleItem {
                payment_number: month,
                payment_date: date,
                payment,
                interest: accrued[i],
                principal: payment.subtract(&accrued[i])?,
                remaining_balance: t.balance,
            });
            month_paid = month_paid.add(&payment)?;
            month_interest = month_interest.add(&accrued[i])?;
            month_remaining = month_remaining.add(&t.balance)?;
            if t.balance.is_zero() {
                t.payoff_month = Some(month);
                payoff_order.push(t.debt.id().clone());
                trace!("month {}: '{}' paid off", month, t.debt.id());
            }
        }
        monthly_totals.push(MonthTotal {
            month,
            payment: month_paid,
            interest: month_interest,
            remaining_balance: month_remaining,
        });
    }

    let mut total_paid = Money::zero(currency);
    let mut total_interest = Money::zero(currency);
    let mut progress = Vec::with_capacity(tracks.len());
    for t in tracks {
        total_paid = total_paid.add(&t.paid)?;
        total_interest = total_interest.add(&t.interest)?;
        let months_to_payoff = t.payoff_month.unwrap_or(month);
        progress.push(DebtProgress {
            debt_id: t.debt.id().clone(),
            debt_name: t.debt.name().to_string(),
            starting_balance: t.debt.balance(),
            monthly_payment: t
                .schedule
                .first()
                .map(|item| item.payment)
                .unwrap_or_else(|| Money::zero(currency)),
            total_paid: t.paid,
            total_interest: t.interest,
            months_to_payoff,
            payoff_date: config.date_after(months_to_payoff),
            schedule: t.schedule,
        });
    }

    debug!(
        "simulation finished after {} months, total interest {}",
        month, total_interest
    );

    Ok(Simulation {
        mode,
        monthly_capacity: capacity,
        months: month,
        total_paid,
        total_interest,
        progress,
        payoff_order,
        monthly_totals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::currency::Currency;
    use crate::core::debt::DebtType;
    use crate::core::rate::Rate;
    use rust_decimal_macros::dec;

    fn usd(s: &str) -> Money {
        Money::parse(s, Currency::USD).unwrap()
    }

    fn debt(id: &str, balance: &str, apr: Decimal, min: &str) -> DebtAccount {
        DebtAccount::new(
            DebtId::new(id),
            id,
            DebtType::CreditCard,
            usd(balance),
            Rate::annual(apr).unwrap(),
            usd(min),
        )
        .unwrap()
    }

    fn config() -> SimulationConfig {
        SimulationConfig::starting(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap())
    }

    #[test]
    fn test_zero_interest_single_debt() {
        let d = debt("a", "300", Decimal::ZERO, "100");
        let sim = simulate(&[&d], usd("0"), PaymentMode::Rolling, &config()).unwrap();
        assert_eq!(sim.months, 3);
        assert_eq!(sim.total_interest, usd("0"));
        assert_eq!(sim.total_paid, usd("300"));
        let p = &sim.progress[0];
        assert_eq!(p.months_to_payoff, 3);
        assert_eq!(p.payoff_date, NaiveDate::from_ymd_opt(2025, 4, 15).unwrap());
        assert_eq!(p.schedule.len(), 3);
    }

    #[test]
    fn test_interest_accrues_before_payment() {
        // 12% APR -> 1% per month: 1000 -> 1010 -> pay 1010 in full.
        let d = debt("a", "1000", dec!(12), "2000");
        let sim = simulate(&[&d], usd("0"), PaymentMode::Rolling, &config()).unwrap();
        assert_eq!(sim.months, 1);
        assert_eq!(sim.total_interest, usd("10"));
        assert_eq!(sim.progress[0].schedule[0].payment, usd("1010"));
        assert_eq!(sim.progress[0].schedule[0].principal, usd("1000"));
    }

    #[test]
    fn test_extra_goes_to_first_priority() {
        let a = debt("a", "1000", Decimal::ZERO, "50");
        let b = debt("b", "1000", Decimal::ZERO, "50");
        let sim = simulate(&[&a, &b], usd("100"), PaymentMode::Rolling, &config()).unwrap();
        assert_eq!(sim.progress[0].monthly_payment, usd("150"));
        assert_eq!(sim.progress[1].monthly_payment, usd("50"));
        assert_eq!(sim.payoff_order, vec![DebtId::new("a"), DebtId::new("b")]);
    }

    #[test]
    fn test_freed_minimum_rolls_over() {
        // a: 100 at 50/month clears in month 2. From month 3 on, b gets 100.
        let a = debt("a", "100", Decimal::ZERO, "50");
        let b = debt("b", "1000", Decimal::ZERO, "50");
        let sim = simulate(&[&a, &b], usd("0"), PaymentMode::Rolling, &config()).unwrap();
        let b_sched = &sim.progress_for(&DebtId::new("b")).unwrap().schedule;
        assert_eq!(b_sched[1].payment, usd("50"));
        assert_eq!(b_sched[2].payment, usd("100"));
        // 1000 = 2*50 + 9*100
        assert_eq!(sim.months, 11);
    }

    #[test]
    fn test_overpayment_spills_in_same_month() {
        let a = debt("a", "30", Decimal::ZERO, "10");
        let b = debt("b", "500", Decimal::ZERO, "10");
        let sim = simulate(&[&a, &b], usd("100"), PaymentMode::Rolling, &config()).unwrap();
        // capacity 120: a takes 30, b takes 90 in month 1.
        let b_first = &sim.progress[1].schedule[0];
        assert_eq!(sim.progress[0].months_to_payoff, 1);
        assert_eq!(b_first.payment, usd("90"));
        assert_eq!(sim.monthly_totals[0].payment, usd("120"));
    }

    #[test]
    fn test_minimum_only_does_not_roll() {
        let a = debt("a", "100", Decimal::ZERO, "50");
        let b = debt("b", "1000", Decimal::ZERO, "50");
        let sim = simulate(&[&a, &b], usd("0"), PaymentMode::MinimumOnly, &config()).unwrap();
        assert_eq!(sim.months, 20);
        assert!(sim.progress[1].schedule.iter().all(|s| s.payment == usd("50")));
    }

    #[test]
    fn test_minimum_below_interest_times_out() {
        let d = debt("a", "10000", dec!(24), "100");
        let err = simulate(&[&d], usd("0"), PaymentMode::Rolling, &config()).unwrap_err();
        assert!(matches!(err, PlanError::PayoffTimeoutExceeded { .. }));
    }

    #[test]
    fn test_zero_capacity_times_out() {
        let d = debt("a", "10", Decimal::ZERO, "0");
        let cfg = config().with_max_months(12);
        let err = simulate(&[&d], usd("0"), PaymentMode::Rolling, &cfg).unwrap_err();
        assert_eq!(err, PlanError::PayoffTimeoutExceeded { months: 12 });
    }

    #[test]
    fn test_already_paid_debt() {
        let a = debt("a", "0", dec!(10), "25");
        let b = debt("b", "100", Decimal::ZERO, "25");
        let sim = simulate(&[&a, &b], usd("0"), PaymentMode::Rolling, &config()).unwrap();
        assert_eq!(sim.progress[0].months_to_payoff, 0);
        assert!(sim.progress[0].schedule.is_empty());
        // b receives both minimums from month 1.
        assert_eq!(sim.progress[1].schedule[0].payment, usd("50"));
        assert_eq!(sim.payoff_order[0], DebtId::new("a"));
    }

    #[test]
    fn test_negative_extra_rejected() {
        let d = debt("a", "100", Decimal::ZERO, "10");
        let err = simulate(&[&d], usd("-1"), PaymentMode::Rolling, &config()).unwrap_err();
        assert!(matches!(err, PlanError::NegativeExtraPayment(_)));
    }

    #[test]
    fn test_extra_in_other_currency_rejected() {
        let d = debt("a", "100", Decimal::ZERO, "10");
        let eur = Money::parse("5", Currency::EUR).unwrap();
        let err = simulate(&[&d], eur, PaymentMode::Rolling, &config()).unwrap_err();
        assert!(matches!(
            err,
            PlanError::Money(MoneyError::CurrencyMismatch { .. })
        ));
    }

    #[test]
    fn test_month_totals_never_exceed_capacity() {
        let a = debt("a", "1500", dec!(19.99), "45");
        let b = debt("b", "800", dec!(7.5), "30");
        let c = debt("c", "4200", dec!(24.99), "120");
        let sim = simulate(&[&c, &a, &b], usd("250"), PaymentMode::Rolling, &config()).unwrap();
        for total in &sim.monthly_totals {
            assert!(total.payment <= sim.monthly_capacity);
        }
        let last = sim.monthly_totals.last().unwrap();
        assert!(last.remaining_balance.is_zero());
    }
}
