//! Creditor negotiation suggestions: which debts are worth a phone call,
//! what to ask for and what it could save.
//!
//! Read-only over the portfolio. Nothing here changes a plan; the savings
//! are estimates from fixed per-type rules.

use crate::core::debt::{DebtAccount, DebtId, DebtPortfolio, DebtType};
use crate::core::money::{Money, MoneyError};
use crate::optimization::payoff::PayoffEngine;
use log::debug;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Credit card balance above which a rate reduction is worth asking for.
const RATE_REDUCTION_CARD_BALANCE: Decimal = dec!(5000);

/// What to ask the creditor for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegotiationType {
    InterestRateReduction,
    BalanceSettlement,
    PaymentPlanModification,
    HardshipProgram,
    DebtForgiveness,
}

impl NegotiationType {
    /// The approach to take with the creditor.
    pub fn approach(&self) -> &'static str {
        match self {
            NegotiationType::InterestRateReduction => {
                "Ask for a lower rate, citing your payment history and current market rates"
            }
            NegotiationType::BalanceSettlement => {
                "Offer a lump sum for less than the full balance, typically 40-60% of it"
            }
            NegotiationType::PaymentPlanModification => {
                "Ask for a modified plan with a longer term or a lower monthly payment"
            }
            NegotiationType::HardshipProgram => {
                "Apply to the creditor's hardship program with documented financial difficulty"
            }
            NegotiationType::DebtForgiveness => {
                "Ask for partial forgiveness on the grounds of exceptional circumstances"
            }
        }
    }

    fn talking_points(&self) -> Vec<String> {
        let mut points = vec![
            "I want to resolve this debt and keep the account in good standing".to_string(),
            "I have been making consistent payments".to_string(),
        ];
        match self {
            NegotiationType::InterestRateReduction => {
                points.push("Competitors are offering me lower rates".to_string());
                points.push("A lower rate lets me pay the balance off faster".to_string());
            }
            NegotiationType::BalanceSettlement => {
                points.push("I can pay a reduced amount as a lump sum now".to_string());
                points.push("The settlement closes the account in full".to_string());
            }
            _ => {}
        }
        points
    }

    fn preparation(&self) -> Vec<String> {
        let mut steps = vec![
            "Gather statements and your payment history".to_string(),
            "Look up current market rates for similar products".to_string(),
            "Write down a short summary of your financial situation".to_string(),
        ];
        match self {
            NegotiationType::BalanceSettlement => {
                steps.push("Have the settlement funds available".to_string());
                steps.push("Get the agreement in writing before paying".to_string());
            }
            NegotiationType::HardshipProgram => {
                steps.push("Document the loss of income or unexpected expenses".to_string());
                steps.push("Fill in the hardship application completely".to_string());
            }
            _ => {}
        }
        steps
    }
}

impl fmt::Display for NegotiationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NegotiationType::InterestRateReduction => "Interest Rate Reduction",
            NegotiationType::BalanceSettlement => "Balance Settlement",
            NegotiationType::PaymentPlanModification => "Payment Plan Modification",
            NegotiationType::HardshipProgram => "Hardship Program",
            NegotiationType::DebtForgiveness => "Debt Forgiveness",
        };
        write!(f, "{}", label)
    }
}

/// A negotiation worth attempting on one debt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegotiationOpportunity {
    pub debt_id: DebtId,
    pub debt_name: String,
    pub current_balance: Money,
    pub negotiation_type: NegotiationType,
    /// Estimated reduction in what is owed.
    pub potential_savings: Money,
    /// Percentage, 0 to 100.
    pub success_probability: Decimal,
    pub negotiation_strategy: String,
    pub talking_points: Vec<String>,
    pub required_preparation: Vec<String>,
}

impl NegotiationOpportunity {
    /// `potential_savings` weighted by the chance of success.
    pub fn expected_savings(&self) -> Result<Money, MoneyError> {
        self.potential_savings
            .multiply(self.success_probability / dec!(100))
    }
}

/// Negotiation type, savings percentage and success percentage for a debt.
fn terms_for(debt: &DebtAccount) -> (NegotiationType, Decimal, Decimal) {
    match debt.debt_type() {
        DebtType::CreditCard if debt.balance().amount() > RATE_REDUCTION_CARD_BALANCE => {
            (NegotiationType::InterestRateReduction, dec!(20), dec!(70))
        }
        DebtType::CreditCard => (NegotiationType::PaymentPlanModification, dec!(10), dec!(60)),
        DebtType::MedicalDebt => (NegotiationType::BalanceSettlement, dec!(40), dec!(80)),
        DebtType::PersonalLoan => (NegotiationType::InterestRateReduction, dec!(15), dec!(50)),
        _ => (NegotiationType::PaymentPlanModification, dec!(5), dec!(30)),
    }
}

fn opportunity_for(debt: &DebtAccount) -> Result<NegotiationOpportunity, MoneyError> {
    let (negotiation_type, savings_pct, success_pct) = terms_for(debt);
    Ok(NegotiationOpportunity {
        debt_id: debt.id().clone(),
        debt_name: debt.name().to_string(),
        current_balance: debt.balance(),
        negotiation_type,
        potential_savings: debt.balance().multiply(savings_pct / dec!(100))?,
        success_probability: success_pct,
        negotiation_strategy: negotiation_type.approach().to_string(),
        talking_points: negotiation_type.talking_points(),
        required_preparation: negotiation_type.preparation(),
    })
}

impl PayoffEngine {
    /// Negotiation opportunities for every debt that qualifies, largest
    /// potential savings first.
    ///
    /// Ties are broken by debt id so the order is stable.
    ///
    /// # Examples
    ///
    /// ```
    /// use payoff_engine::prelude::*;
    /// use rust_decimal_macros::dec;
    ///
    /// let usd = |s: &str| Money::parse(s, Currency::USD).unwrap();
    /// let portfolio = DebtPortfolio::new(vec![
    ///     DebtAccount::new(DebtId::new("er"), "ER visit", DebtType::MedicalDebt,
    ///         usd("2000"), Rate::zero(), usd("50")).unwrap(),
    ///     DebtAccount::new(DebtId::new("car"), "Car", DebtType::AutoLoan,
    ///         usd("9000"), Rate::annual(dec!(6.5)).unwrap(), usd("250")).unwrap(),
    /// ]).unwrap();
    ///
    /// let found = PayoffEngine::default().find_negotiation_opportunities(&portfolio).unwrap();
    /// assert_eq!(found.len(), 1);
    /// assert_eq!(found[0].negotiation_type, NegotiationType::BalanceSettlement);
    /// assert_eq!(found[0].potential_savings, usd("800"));
    /// ```
    pub fn find_negotiation_opportunities(
        &self,
        portfolio: &DebtPortfolio,
    ) -> Result<Vec<NegotiationOpportunity>, MoneyError> {
        let mut found = portfolio
            .debts()
            .iter()
            .filter(|d| d.qualifies_for_negotiation())
            .map(opportunity_for)
            .collect::<Result<Vec<_>, _>>()?;
        found.sort_by(|a, b| {
            b.potential_savings
                .amount()
                .cmp(&a.potential_savings.amount())
                .then_with(|| a.debt_id.cmp(&b.debt_id))
        });
        debug!(
            "{} of {} debts qualify for negotiation",
            found.len(),
            portfolio.len()
        );
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::currency::Currency;
    use crate::core::rate::Rate;

    fn usd(s: &str) -> Money {
        Money::parse(s, Currency::USD).unwrap()
    }

    fn debt(id: &str, debt_type: DebtType, balance: &str) -> DebtAccount {
        DebtAccount::new(
            DebtId::new(id),
            id,
            debt_type,
            usd(balance),
            Rate::annual(dec!(18)).unwrap(),
            usd("50"),
        )
        .unwrap()
    }

    fn mixed() -> DebtPortfolio {
        DebtPortfolio::new(vec![
            debt("big_card", DebtType::CreditCard, "8000"),
            debt("mid_card", DebtType::CreditCard, "2500"),
            debt("tiny_card", DebtType::CreditCard, "600"),
            debt("hospital", DebtType::MedicalDebt, "3000"),
            debt("loan", DebtType::PersonalLoan, "7000"),
            debt("small_loan", DebtType::PersonalLoan, "4000"),
            debt("car", DebtType::AutoLoan, "15000"),
        ])
        .unwrap()
    }

    #[test]
    fn test_only_qualifying_debts_are_listed() {
        let found = PayoffEngine::default()
            .find_negotiation_opportunities(&mixed())
            .unwrap();
        let ids: Vec<&str> = found.iter().map(|o| o.debt_id.as_str()).collect();
        assert!(!ids.contains(&"tiny_card"));
        assert!(!ids.contains(&"small_loan"));
        assert!(!ids.contains(&"car"));
        assert_eq!(found.len(), 4);
    }

    #[test]
    fn test_terms_by_debt_type() {
        let found = PayoffEngine::default()
            .find_negotiation_opportunities(&mixed())
            .unwrap();
        let by_id = |id: &str| found.iter().find(|o| o.debt_id.as_str() == id).unwrap();

        let big = by_id("big_card");
        assert_eq!(big.negotiation_type, NegotiationType::InterestRateReduction);
        assert_eq!(big.potential_savings, usd("1600"));
        assert_eq!(big.success_probability, dec!(70));

        let mid = by_id("mid_card");
        assert_eq!(mid.negotiation_type, NegotiationType::PaymentPlanModification);
        assert_eq!(mid.potential_savings, usd("250"));

        let hospital = by_id("hospital");
        assert_eq!(hospital.negotiation_type, NegotiationType::BalanceSettlement);
        assert_eq!(hospital.potential_savings, usd("1200"));
        assert_eq!(hospital.expected_savings().unwrap(), usd("960"));
        assert!(hospital
            .required_preparation
            .iter()
            .any(|s| s.contains("in writing")));

        let loan = by_id("loan");
        assert_eq!(loan.negotiation_type, NegotiationType::InterestRateReduction);
        assert_eq!(loan.potential_savings, usd("1050"));
        assert_eq!(loan.success_probability, dec!(50));
    }

    #[test]
    fn test_sorted_by_potential_savings() {
        let found = PayoffEngine::default()
            .find_negotiation_opportunities(&mixed())
            .unwrap();
        let ids: Vec<&str> = found.iter().map(|o| o.debt_id.as_str()).collect();
        assert_eq!(ids, vec!["big_card", "hospital", "loan", "mid_card"]);
    }

    #[test]
    fn test_nothing_to_negotiate() {
        let p = DebtPortfolio::new(vec![debt("car", DebtType::AutoLoan, "15000")]).unwrap();
        assert!(PayoffEngine::default()
            .find_negotiation_opportunities(&p)
            .unwrap()
            .is_empty());
    }
}
