use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::warn;

use super::cagr_rules::{cagr_fee, FeeMetrics};
use super::multiplier::multiplier_fees;
use crate::engagement::{ClientProfile, ServiceKey, YearlyHistory};
use crate::types::{saturating_sum, with_metadata, ComputationOutput, Money};

pub const FALLBACK_EXPLANATION: &str =
    "Insufficient historical data for CAGR-based calculation. Using traditional method.";

/// Which engine (or person) produced the current proposal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeMethod {
    #[default]
    NotCalculated,
    CagrRules,
    Multiplier,
    Manual,
}

/// The recommended fee set shown on the summary step and persisted with
/// the rest of the application state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProposedFee {
    pub fees: BTreeMap<ServiceKey, Money>,
    pub total: Money,
    pub explanation: String,
    pub metrics: FeeMetrics,
    pub method: FeeMethod,
}

impl ProposedFee {
    pub fn fee(&self, service: ServiceKey) -> Option<Money> {
        self.fees.get(&service).copied()
    }

    /// Replace one service fee by hand. Negative amounts are stored as zero.
    pub fn override_fee(&mut self, service: ServiceKey, amount: Money) {
        self.fees.insert(service, amount.max(Decimal::ZERO));
        self.recompute_total();
        self.method = FeeMethod::Manual;
    }

    pub fn recompute_total(&mut self) {
        self.total = saturating_sum(self.fees.values().copied());
    }

    pub fn is_calculated(&self) -> bool {
        self.method != FeeMethod::NotCalculated
    }
}

/// Input shared by the recommendation and comparison entry points.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecommendationInput {
    pub history: YearlyHistory,
    #[serde(default)]
    pub profile: ClientProfile,
}

/// CAGR rules first; the multiplier schedule when the CAGR engine has no
/// prior statutory fee to anchor on.
pub fn recommend_fee(history: &YearlyHistory, profile: &ClientProfile) -> ProposedFee {
    let inflation_rate = profile.inflation_rate();
    let cagr = cagr_fee(history, inflation_rate);

    if cagr.is_sufficient() {
        return ProposedFee {
            fees: cagr.fees,
            total: cagr.total,
            explanation: cagr.explanation,
            metrics: cagr
                .metrics
                .unwrap_or_else(|| FeeMetrics::measure(history, inflation_rate)),
            method: FeeMethod::CagrRules,
        };
    }

    warn!(
        reason = %cagr.explanation,
        "CAGR-based calculation unavailable, falling back to multiplier schedule"
    );
    let legacy = multiplier_fees(history, profile);
    ProposedFee {
        fees: legacy.fees,
        total: legacy.total,
        explanation: FALLBACK_EXPLANATION.to_string(),
        metrics: FeeMetrics::measure(history, inflation_rate),
        method: FeeMethod::Multiplier,
    }
}

pub fn calculate_recommendation(input: &RecommendationInput) -> ComputationOutput<ProposedFee> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let proposal = recommend_fee(&input.history, &input.profile);
    if proposal.method == FeeMethod::Multiplier {
        warnings.push(FALLBACK_EXPLANATION.to_string());
    }

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Recommended audit fee (CAGR rules with multiplier fallback)",
        input,
        warnings,
        elapsed,
        proposal,
    )
}

/// Totals from both engines side by side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeComparison {
    pub multiplier_total: Money,
    /// None when the CAGR engine had insufficient data
    pub cagr_total: Option<Money>,
    pub recommended_total: Money,
    pub recommended_method: FeeMethod,
    pub multiplier_fees: BTreeMap<ServiceKey, Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cagr_fees: Option<BTreeMap<ServiceKey, Money>>,
}

pub fn compare_methods(history: &YearlyHistory, profile: &ClientProfile) -> FeeComparison {
    let legacy = multiplier_fees(history, profile);
    let cagr = cagr_fee(history, profile.inflation_rate());

    let (cagr_total, cagr_fees) = if cagr.is_sufficient() {
        (Some(cagr.total), Some(cagr.fees))
    } else {
        (None, None)
    };
    let (recommended_total, recommended_method) = match cagr_total {
        Some(total) => (total, FeeMethod::CagrRules),
        None => (legacy.total, FeeMethod::Multiplier),
    };

    FeeComparison {
        multiplier_total: legacy.total,
        cagr_total,
        recommended_total,
        recommended_method,
        multiplier_fees: legacy.fees,
        cagr_fees,
    }
}

pub fn calculate_comparison(input: &RecommendationInput) -> ComputationOutput<FeeComparison> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let comparison = compare_methods(&input.history, &input.profile);
    if comparison.cagr_total.is_none() {
        warnings.push("CAGR method unavailable; recommendation uses the multiplier schedule".into());
    }

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Comparison of multiplier schedule and CAGR rule engine",
        input,
        warnings,
        elapsed,
        comparison,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engagement::{ServiceLine, YearRecord};
    use rust_decimal_macros::dec;

    fn billed_year(label: &str, statutory: Money, tax: Money) -> YearRecord {
        let mut y = YearRecord::new(label);
        y.financial_data.total_revenue = Some(dec!(500));
        y.services.statutory_audit = ServiceLine::billed(statutory);
        y.services.tax_audit = ServiceLine::billed(tax);
        y
    }

    #[test]
    fn test_recommend_uses_cagr_rules_when_anchored() {
        let h = YearlyHistory::new(vec![billed_year("2023-24", dec!(100000), dec!(40000))]);
        let p = ProposedFee::default();
        assert!(!p.is_calculated());

        let proposal = recommend_fee(&h, &ClientProfile::default());
        assert_eq!(proposal.method, FeeMethod::CagrRules);
        // no growth history: standard 15%
        assert_eq!(proposal.fee(ServiceKey::StatutoryAudit), Some(dec!(115000)));
        assert_eq!(proposal.fee(ServiceKey::TaxAudit), Some(dec!(46000)));
        assert_eq!(proposal.total, dec!(161000));
    }

    #[test]
    fn test_recommend_falls_back_to_multiplier() {
        let mut y = YearRecord::new("2023-24");
        y.financial_data.total_revenue = Some(dec!(50));
        let h = YearlyHistory::new(vec![y]);

        let proposal = recommend_fee(&h, &ClientProfile::default());
        assert_eq!(proposal.method, FeeMethod::Multiplier);
        assert_eq!(proposal.explanation, FALLBACK_EXPLANATION);
        assert_eq!(proposal.fees.len(), 7);
        assert_eq!(proposal.fee(ServiceKey::StatutoryAudit), Some(dec!(160000)));
    }

    #[test]
    fn test_inflation_from_profile_applies() {
        let h = YearlyHistory::new(vec![billed_year("2023-24", dec!(100000), dec!(40000))]);
        let mut profile = ClientProfile::default();
        profile.set_inflation_rate_pct(Some(dec!(20)));

        let proposal = recommend_fee(&h, &profile);
        assert_eq!(proposal.fee(ServiceKey::StatutoryAudit), Some(dec!(120000)));
        assert_eq!(proposal.metrics.inflation_rate, dec!(0.20));
        assert!(proposal.explanation.contains("Inflation"));
    }

    #[test]
    fn test_override_recomputes_total() {
        let h = YearlyHistory::new(vec![billed_year("2023-24", dec!(100000), dec!(40000))]);
        let mut proposal = recommend_fee(&h, &ClientProfile::default());

        proposal.override_fee(ServiceKey::TaxAudit, dec!(50000));
        assert_eq!(proposal.total, dec!(165000));
        assert_eq!(proposal.method, FeeMethod::Manual);

        proposal.override_fee(ServiceKey::IncomeTaxReturnFiling, dec!(-10));
        assert_eq!(proposal.fee(ServiceKey::IncomeTaxReturnFiling), Some(Decimal::ZERO));
        assert_eq!(proposal.total, dec!(165000));
    }

    #[test]
    fn test_proposed_fee_wire_shape() {
        let mut p = ProposedFee::default();
        p.override_fee(ServiceKey::StatutoryAudit, dec!(1000));
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["fees"]["statutoryAudit"], "1000");
        assert_eq!(json["method"], "manual");
        assert!(json["metrics"].get("revenueCagr").is_some());

        let back: ProposedFee = serde_json::from_value(json).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn test_compare_methods() {
        let h = YearlyHistory::new(vec![billed_year("2023-24", dec!(100000), dec!(40000))]);
        let cmp = compare_methods(&h, &ClientProfile::default());
        assert_eq!(cmp.cagr_total, Some(dec!(161000)));
        assert_eq!(cmp.recommended_total, dec!(161000));
        assert_eq!(cmp.recommended_method, FeeMethod::CagrRules);
        assert!(cmp.multiplier_total > Decimal::ZERO);

        let cmp = compare_methods(&YearlyHistory::default(), &ClientProfile::default());
        assert!(cmp.cagr_total.is_none());
        assert_eq!(cmp.recommended_total, cmp.multiplier_total);
        assert_eq!(cmp.recommended_method, FeeMethod::Multiplier);
    }
}
