use audit_fee_core::engagement::{ClientProfile, ClientType, ServiceKey, YearlyHistory};
use audit_fee_core::fees::cagr_rules::{self, CagrFeeInput, GrowthRule};
use audit_fee_core::fees::multiplier::{self, FeeBasis, MultiplierFeeInput};
use audit_fee_core::fees::proposal::{self, FeeMethod, RecommendationInput};
use audit_fee_core::growth;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Three years as a wizard front end would send them: numbers as strings,
/// blanks as "", newest year first.
const THREE_YEARS: &str = r#"[
  {
    "yearLabel": "2023-24",
    "financialData": {
      "revenueFromOperations": "1200", "totalRevenue": "1200", "surplusDeficit": "172.8",
      "totalAssets": "2400", "employeeBenefitExpense": "", "borrowings": "300"
    },
    "services": {
      "statutoryAudit": { "selected": true, "fee": "105000" },
      "taxAudit": { "selected": true, "fee": "42000" },
      "gstAnnualReturnFiling": { "selected": false, "fee": "" }
    }
  },
  {
    "yearLabel": "2021-22",
    "financialData": { "totalRevenue": 1000, "surplusDeficit": 100 },
    "services": { "statutoryAudit": { "selected": true, "fee": 100000 } }
  },
  {
    "yearLabel": "2022-23",
    "financialData": { "totalRevenue": "1100", "surplusDeficit": "130" },
    "services": { "statutoryAudit": { "selected": true, "fee": "102500" } }
  }
]"#;

fn history() -> YearlyHistory {
    serde_json::from_str(THREE_YEARS).unwrap()
}

// ===========================================================================
// Growth measurements
// ===========================================================================

#[test]
fn test_growth_measures_follow_year_labels() {
    let h = history();
    // 1000 -> 1200 over two years, about 9.54%
    let revenue = growth::revenue_cagr(&h);
    assert!(revenue > dec!(0.095) && revenue < dec!(0.096), "{revenue}");
    // 100 -> 172.8 over two years, about 31.45%
    let profit = growth::profit_cagr(&h);
    assert!(profit > dec!(0.314) && profit < dec!(0.315), "{profit}");
    // 100000 -> 105000 over two years, about 2.47%
    let fee_growth = growth::historical_fee_cagr(&h);
    assert!(fee_growth > dec!(0.024) && fee_growth < dec!(0.025), "{fee_growth}");
}

// ===========================================================================
// CAGR rule engine
// ===========================================================================

#[test]
fn test_cagr_engine_profit_aligned() {
    let out = cagr_rules::calculate_cagr_fee(&CagrFeeInput {
        history: history(),
        inflation_rate: dec!(0.05),
    });
    let r = &out.result;
    // revenue growth is below 10%, profit outpaces fees
    assert_eq!(r.rule, Some(GrowthRule::ProfitAligned));
    assert!(!r.inflation_floor_applied);
    assert_eq!(r.anchor_year.as_deref(), Some("2023-24"));

    let growth_rate = r.growth_rate.unwrap();
    let expected = (dec!(105000) * (Decimal::ONE + growth_rate))
        .round_dp_with_strategy(0, rust_decimal::RoundingStrategy::MidpointAwayFromZero);
    assert_eq!(r.proposed_fee, expected);

    // tax audit keeps its 40% share of the statutory fee
    let tax = r.fees[&ServiceKey::TaxAudit];
    assert!((tax - r.proposed_fee * dec!(0.4)).abs() <= Decimal::ONE);
    assert_eq!(r.total, r.proposed_fee + tax);
    assert!(out.warnings.is_empty(), "{:?}", out.warnings);
}

#[test]
fn test_cagr_engine_inflation_floor() {
    let out = cagr_rules::calculate_cagr_fee(&CagrFeeInput {
        history: history(),
        inflation_rate: dec!(0.40),
    });
    assert!(out.result.inflation_floor_applied);
    assert_eq!(out.result.growth_rate, Some(dec!(0.40)));
    assert_eq!(out.result.proposed_fee, dec!(147000));
    assert!(out.result.explanation.contains("40.00%"));
}

#[test]
fn test_cagr_engine_insufficient_history() {
    let out = cagr_rules::calculate_cagr_fee(&CagrFeeInput::default());
    assert_eq!(out.result.proposed_fee, Decimal::ZERO);
    assert_eq!(out.result.explanation, cagr_rules::EMPTY_HISTORY_EXPLANATION);
    assert_eq!(out.warnings, vec![cagr_rules::EMPTY_HISTORY_EXPLANATION.to_string()]);
}

// ===========================================================================
// Multiplier engine
// ===========================================================================

#[test]
fn test_multiplier_engine_mixes_bases() {
    let profile = ClientProfile {
        client_type: ClientType::Listed,
        has_complex_group_structure: true,
        ..Default::default()
    };
    let out = multiplier::calculate_multiplier_fees(&MultiplierFeeInput {
        history: history(),
        profile,
    });
    let r = &out.result;
    assert_eq!(r.complexity_multiplier, dec!(1.05));
    assert!(r.growth_factor > dec!(1.095) && r.growth_factor < dec!(1.096));

    let statutory = r.lines.iter().find(|l| l.service == ServiceKey::StatutoryAudit).unwrap();
    assert_eq!(statutory.basis, FeeBasis::Historical);
    assert_eq!(statutory.historical_average, dec!(102500));

    let ifc = r.lines.iter().find(|l| l.service == ServiceKey::IfcTesting).unwrap();
    assert_eq!(ifc.basis, FeeBasis::BaseSchedule);
    // 100000 x 1.5 (very large) x 1.5 (listed) x 1.05 x 1.15
    assert_eq!(ifc.fee, dec!(271688));

    assert_eq!(r.total, r.fees.values().copied().sum::<Decimal>());
}

// ===========================================================================
// Recommendation
// ===========================================================================

#[test]
fn test_recommendation_prefers_cagr_and_falls_back() {
    let out = proposal::calculate_recommendation(&RecommendationInput {
        history: history(),
        profile: ClientProfile::default(),
    });
    assert_eq!(out.result.method, FeeMethod::CagrRules);
    assert!(out.warnings.is_empty());

    let mut no_fees = history();
    for i in 0..no_fees.len() {
        no_fees.year_mut(i).unwrap().services.statutory_audit.selected = false;
    }
    let out = proposal::calculate_recommendation(&RecommendationInput {
        history: no_fees,
        profile: ClientProfile::default(),
    });
    assert_eq!(out.result.method, FeeMethod::Multiplier);
    assert_eq!(out.result.explanation, proposal::FALLBACK_EXPLANATION);
    assert_eq!(out.result.fees.len(), 7);
}

#[test]
fn test_comparison_reports_both_totals() {
    let out = proposal::calculate_comparison(&RecommendationInput {
        history: history(),
        profile: ClientProfile::new(ClientType::Public),
    });
    let c = &out.result;
    assert_eq!(c.recommended_method, FeeMethod::CagrRules);
    assert_eq!(Some(c.recommended_total), c.cagr_total);
    assert_eq!(c.multiplier_fees.len(), 7);
}
