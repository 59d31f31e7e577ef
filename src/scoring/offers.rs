//! Tier thresholds, loan ceilings and offer catalogue.
//!
//! Thresholds and amounts are configuration. The decision function is fixed:
//! the highest tier whose `min_score` the score reaches.

use serde::{Deserialize, Serialize};

use crate::scoring::types::{Tier, MAX_SCORE, MIN_SCORE};

/// Largest loan amount accepted on a scoring request.
pub const MAX_LOAN_AMOUNT: f64 = 10_000.0;

/// Accepted loan durations in months.
pub const LOAN_DURATION_MONTHS: std::ops::RangeInclusive<u32> = 1..=60;

/// A concrete loan product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanOffer {
    pub amount: f64,
    /// Monthly interest rate as a fraction (0.02 = 2%/month).
    pub monthly_rate: f64,
    pub duration_months: u32,
    pub description: String,
}

/// Configuration for one tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierRule {
    pub tier: Tier,
    /// Inclusive lower bound on the scaled score.
    pub min_score: u16,
    /// Largest loan a borrower in this tier may request.
    pub max_loan: f64,
    pub monthly_rate: f64,
    #[serde(default)]
    pub offers: Vec<LoanOffer>,
}

/// Ordered tier rules, highest threshold first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<TierRule>", into = "Vec<TierRule>")]
pub struct TierPolicy(Vec<TierRule>);

impl From<Vec<TierRule>> for TierPolicy {
    fn from(rules: Vec<TierRule>) -> Self {
        Self::new(rules)
    }
}

impl From<TierPolicy> for Vec<TierRule> {
    fn from(policy: TierPolicy) -> Self {
        policy.0
    }
}

impl Default for TierPolicy {
    fn default() -> Self {
        Self(vec![
            TierRule {
                tier: Tier::High,
                min_score: 700,
                max_loan: 1000.0,
                monthly_rate: 0.02,
                offers: vec![
                    offer(1000.0, 0.02, 12, "Premium loan with the lowest rate"),
                    offer(500.0, 0.02, 6, "Short-term loan at the premium rate"),
                ],
            },
            TierRule {
                tier: Tier::Medium,
                min_score: 500,
                max_loan: 500.0,
                monthly_rate: 0.04,
                offers: vec![
                    offer(500.0, 0.04, 12, "Standard loan"),
                    offer(200.0, 0.04, 6, "Short-term standard loan"),
                ],
            },
            TierRule {
                tier: Tier::Entry,
                min_score: MIN_SCORE,
                max_loan: 200.0,
                monthly_rate: 0.06,
                offers: vec![
                    offer(200.0, 0.06, 6, "Starter loan to build history"),
                    offer(100.0, 0.06, 3, "Microcredit"),
                ],
            },
        ])
    }
}

fn offer(amount: f64, monthly_rate: f64, duration_months: u32, description: &str) -> LoanOffer {
    LoanOffer {
        amount,
        monthly_rate,
        duration_months,
        description: description.to_string(),
    }
}

impl TierPolicy {
    /// Build a policy, sorting rules by descending threshold.
    pub fn new(mut rules: Vec<TierRule>) -> Self {
        rules.sort_by(|a, b| b.min_score.cmp(&a.min_score));
        Self(rules)
    }

    pub fn rules(&self) -> &[TierRule] {
        &self.0
    }

    /// Tier for a scaled score. Total: scores below every threshold fall
    /// into the lowest configured tier.
    pub fn tier(&self, scaled_score: u16) -> Tier {
        self.rule(scaled_score).map(|r| r.tier).unwrap_or(Tier::Entry)
    }

    fn rule(&self, scaled_score: u16) -> Option<&TierRule> {
        self.0
            .iter()
            .find(|r| scaled_score >= r.min_score)
            .or_else(|| self.0.last())
    }

    pub fn rule_for(&self, tier: Tier) -> Option<&TierRule> {
        self.0.iter().find(|r| r.tier == tier)
    }

    /// Offers available at a scaled score.
    pub fn offers_for(&self, scaled_score: u16) -> Vec<LoanOffer> {
        self.rule(scaled_score)
            .map(|r| r.offers.clone())
            .unwrap_or_default()
    }

    /// Check a loan request against the tier ceiling.
    pub fn decide_loan(&self, tier: Tier, request: &LoanRequest) -> LoanDecision {
        let (ceiling, monthly_rate) = self
            .rule_for(tier)
            .map(|r| (r.max_loan, r.monthly_rate))
            .unwrap_or((0.0, 0.0));
        let approved = request.amount <= ceiling;

        LoanDecision {
            approved,
            tier,
            requested_amount: request.amount,
            max_amount: ceiling,
            monthly_rate,
            duration_months: request.duration_months,
            reason: (!approved).then(|| {
                format!(
                    "Requested amount {:.2} exceeds the {} tier ceiling of {:.2}",
                    request.amount,
                    tier.as_str(),
                    ceiling
                )
            }),
        }
    }

    /// Semantic checks run at configuration load.
    pub fn validate(&self) -> Result<(), String> {
        let lowest = self.0.last().ok_or("at least one tier is required")?;
        if lowest.min_score != MIN_SCORE {
            return Err(format!(
                "lowest tier must start at {}, got {}",
                MIN_SCORE, lowest.min_score
            ));
        }
        for pair in self.0.windows(2) {
            if pair[0].min_score <= pair[1].min_score {
                return Err(format!(
                    "tier thresholds must be distinct, {} repeats",
                    pair[1].min_score
                ));
            }
        }
        for (i, rule) in self.0.iter().enumerate() {
            if self.0[..i].iter().any(|r| r.tier == rule.tier) {
                return Err(format!("tier '{}' is configured twice", rule.tier.as_str()));
            }
        }
        // Higher thresholds must carry higher tiers.
        for pair in self.0.windows(2) {
            if pair[0].tier < pair[1].tier {
                return Err(format!(
                    "tier '{}' at {} sits above tier '{}' at {}",
                    pair[1].tier.as_str(),
                    pair[1].min_score,
                    pair[0].tier.as_str(),
                    pair[0].min_score
                ));
            }
        }
        for rule in &self.0 {
            if rule.min_score > MAX_SCORE {
                return Err(format!(
                    "tier '{}' threshold {} exceeds {}",
                    rule.tier.as_str(),
                    rule.min_score,
                    MAX_SCORE
                ));
            }
            if !rule.max_loan.is_finite() || rule.max_loan < 0.0 {
                return Err(format!("tier '{}' has an invalid ceiling", rule.tier.as_str()));
            }
        }
        Ok(())
    }
}

/// Loan terms requested alongside a scoring call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoanRequest {
    pub amount: f64,
    pub duration_months: u32,
}

impl LoanRequest {
    /// Amount in (0, 10000], duration 1 to 60 months.
    pub fn validate(&self) -> Result<(), String> {
        if !self.amount.is_finite() || self.amount <= 0.0 || self.amount > MAX_LOAN_AMOUNT {
            return Err(format!(
                "amount must be positive and at most {}",
                MAX_LOAN_AMOUNT
            ));
        }
        if !LOAN_DURATION_MONTHS.contains(&self.duration_months) {
            return Err("duration_months must be between 1 and 60".to_string());
        }
        Ok(())
    }
}

/// Outcome of checking a loan request against the borrower's tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanDecision {
    pub approved: bool,
    pub tier: Tier,
    pub requested_amount: f64,
    pub max_amount: f64,
    pub monthly_rate: f64,
    pub duration_months: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
