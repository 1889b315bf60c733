use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, warn};

use crate::amounts;
use crate::engagement::{FinancialField, ServiceKey, YearRecord, YearlyHistory};
use crate::growth;
use crate::types::{
    pct_display, round_currency, saturating_sum, with_metadata, ComputationOutput, Money, Rate,
};

/// Revenue and profit growth above this rate count as strong growth.
pub const STRONG_GROWTH_THRESHOLD: Rate = dec!(0.10);
/// Minimum increase when the client grows strongly but fees have lagged.
pub const STRONG_GROWTH_MINIMUM_INCREASE: Rate = dec!(0.10);
/// Fallback increase when no other rule applies.
pub const STANDARD_INCREASE: Rate = dec!(0.15);

pub const EMPTY_HISTORY_EXPLANATION: &str = "Insufficient data to calculate fee.";
pub const NO_PRIOR_FEE_EXPLANATION: &str = "No previous audit fee data available.";
pub const FEE_OUT_OF_RANGE_EXPLANATION: &str =
    "Projected audit fee is too large to calculate; check the fee history.";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Input for the CAGR rule engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CagrFeeInput {
    pub history: YearlyHistory,
    /// Inflation as a decimal (0.06 = 6%); zero disables the floor
    #[serde(default, with = "amounts::lenient")]
    pub inflation_rate: Rate,
}

/// Growth measurements behind a recommendation, all as decimals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FeeMetrics {
    pub revenue_cagr: Rate,
    pub profit_cagr: Rate,
    pub historical_fee_growth: Rate,
    pub inflation_rate: Rate,
}

impl FeeMetrics {
    pub fn measure(history: &YearlyHistory, inflation_rate: Rate) -> Self {
        Self {
            revenue_cagr: growth::revenue_cagr(history),
            profit_cagr: growth::profit_cagr(history),
            historical_fee_growth: growth::historical_fee_cagr(history),
            inflation_rate,
        }
    }
}

/// Which row of the decision table produced the growth rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthRule {
    /// Revenue and profit both above 10%, fee growth below 10%: 10% increase
    StrongGrowthMinimum,
    /// Revenue and profit both above 10%, fee growth already at or above 10%
    StrongGrowthContinue,
    /// Profit growth outpaces historical fee growth
    ProfitAligned,
    /// None of the above: standard 15% increase
    StandardIncrease,
}

/// Result of running the decision table plus the inflation floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthDecision {
    pub growth_rate: Rate,
    pub rule: GrowthRule,
    pub inflation_floor_applied: bool,
    pub explanation: String,
}

/// Output of the CAGR rule engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CagrFeeOutput {
    /// Recommended statutory audit fee, whole currency units; 0 when data is insufficient
    pub proposed_fee: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub growth_rate: Option<Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<GrowthRule>,
    pub inflation_floor_applied: bool,
    pub explanation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<FeeMetrics>,
    /// Statutory audit plus every service derived from the anchor year's proportions
    pub fees: BTreeMap<ServiceKey, Money>,
    pub total: Money,
    /// Year label whose statutory fee anchored the recommendation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor_year: Option<String>,
}

impl CagrFeeOutput {
    fn insufficient(explanation: &str) -> Self {
        Self {
            proposed_fee: Decimal::ZERO,
            growth_rate: None,
            rule: None,
            inflation_floor_applied: false,
            explanation: explanation.to_string(),
            metrics: None,
            fees: BTreeMap::new(),
            total: Decimal::ZERO,
            anchor_year: None,
        }
    }

    pub fn is_sufficient(&self) -> bool {
        self.proposed_fee > Decimal::ZERO
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Recommend next year's statutory audit fee from growth history.
///
/// Anchors on the most recent year with a selected, positive statutory fee,
/// grows it by the rate chosen in [`decide_growth_rate`], and scales every
/// other service billed in that year by its share of the statutory fee.
pub fn cagr_fee(history: &YearlyHistory, inflation_rate: Rate) -> CagrFeeOutput {
    if history.is_empty() {
        return CagrFeeOutput::insufficient(EMPTY_HISTORY_EXPLANATION);
    }

    let metrics = FeeMetrics::measure(history, inflation_rate);

    let Some(anchor) = history.latest_with_statutory_fee() else {
        return CagrFeeOutput::insufficient(NO_PRIOR_FEE_EXPLANATION);
    };
    let Some(latest_fee) = anchor.statutory_fee() else {
        return CagrFeeOutput::insufficient(NO_PRIOR_FEE_EXPLANATION);
    };

    let decision = decide_growth_rate(&metrics);
    debug!(
        rule = ?decision.rule,
        growth_rate = %decision.growth_rate,
        inflation_floor = decision.inflation_floor_applied,
        anchor_year = %anchor.year_label,
        "CAGR rule selected"
    );

    let Some(proposed_fee) = Decimal::ONE
        .checked_add(decision.growth_rate)
        .and_then(|factor| latest_fee.checked_mul(factor))
        .map(round_currency)
    else {
        warn!(
            latest_fee = %latest_fee,
            growth_rate = %decision.growth_rate,
            "projected fee overflows"
        );
        return CagrFeeOutput::insufficient(FEE_OUT_OF_RANGE_EXPLANATION);
    };
    let fees = derive_service_fees(anchor, latest_fee, proposed_fee);
    let total = saturating_sum(fees.values().copied());

    CagrFeeOutput {
        proposed_fee,
        growth_rate: Some(decision.growth_rate),
        rule: Some(decision.rule),
        inflation_floor_applied: decision.inflation_floor_applied,
        explanation: decision.explanation,
        metrics: Some(metrics),
        fees,
        total,
        anchor_year: Some(anchor.year_label.clone()),
    }
}

/// Decision table, first match wins, followed by the inflation floor.
pub fn decide_growth_rate(metrics: &FeeMetrics) -> GrowthDecision {
    let revenue = pct_display(metrics.revenue_cagr);
    let profit = pct_display(metrics.profit_cagr);
    let fee_growth = pct_display(metrics.historical_fee_growth);

    let strong_growth = metrics.revenue_cagr > STRONG_GROWTH_THRESHOLD
        && metrics.profit_cagr > STRONG_GROWTH_THRESHOLD;

    let (mut growth_rate, rule, mut explanation) = if strong_growth {
        if metrics.historical_fee_growth < STRONG_GROWTH_MINIMUM_INCREASE {
            (
                STRONG_GROWTH_MINIMUM_INCREASE,
                GrowthRule::StrongGrowthMinimum,
                format!(
                    "Both revenue growth ({revenue}%) and profit growth ({profit}%) exceed 10%, \
                     but historical fee growth ({fee_growth}%) is below 10%. \
                     Recommending a 10% increase."
                ),
            )
        } else {
            (
                metrics.historical_fee_growth,
                GrowthRule::StrongGrowthContinue,
                format!(
                    "Both revenue growth ({revenue}%) and profit growth ({profit}%) exceed 10%, \
                     and historical fee growth ({fee_growth}%) already keeps pace. \
                     Recommending the same growth rate."
                ),
            )
        }
    } else if metrics.profit_cagr > metrics.historical_fee_growth {
        (
            metrics.profit_cagr,
            GrowthRule::ProfitAligned,
            format!(
                "Profit growth ({profit}%) exceeds historical fee growth ({fee_growth}%). \
                 Recommending an increase aligned with profit growth."
            ),
        )
    } else {
        (
            STANDARD_INCREASE,
            GrowthRule::StandardIncrease,
            format!(
                "Revenue growth ({revenue}%) and profit growth ({profit}%) do not both exceed 10%, \
                 and profit growth does not exceed historical fee growth ({fee_growth}%). \
                 Recommending a standard 15% increase."
            ),
        )
    };

    let mut inflation_floor_applied = false;
    if metrics.inflation_rate > Decimal::ZERO && growth_rate < metrics.inflation_rate {
        growth_rate = metrics.inflation_rate;
        inflation_floor_applied = true;
        explanation.push_str(&format!(
            " Inflation ({}%) is higher, so recommending at least an inflation-based increase.",
            pct_display(metrics.inflation_rate)
        ));
    }

    GrowthDecision {
        growth_rate,
        rule,
        inflation_floor_applied,
        explanation,
    }
}

/// Statutory fee plus each other service billed in the anchor year, scaled
/// by its proportion of that year's statutory fee.
fn derive_service_fees(
    anchor: &YearRecord,
    latest_fee: Money,
    proposed_fee: Money,
) -> BTreeMap<ServiceKey, Money> {
    let mut fees = BTreeMap::new();
    fees.insert(ServiceKey::StatutoryAudit, proposed_fee);

    for (key, line) in anchor.services.iter() {
        if key == ServiceKey::StatutoryAudit {
            continue;
        }
        if let Some(fee) = line.positive_fee() {
            let scaled = fee
                .checked_div(latest_fee)
                .map_or(Decimal::MAX, |proportion| proposed_fee.saturating_mul(proportion));
            fees.insert(key, round_currency(scaled));
        }
    }
    fees
}

/// CAGR rule engine wrapped in the standard output envelope.
pub fn calculate_cagr_fee(input: &CagrFeeInput) -> ComputationOutput<CagrFeeOutput> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let history = &input.history;
    if !history.is_empty() {
        if growth::usable_points(history, FinancialField::TotalRevenue) < 2 {
            warnings.push(
                "Fewer than two years of positive total revenue; revenue CAGR treated as 0%"
                    .into(),
            );
        }
        if growth::usable_points(history, FinancialField::SurplusDeficit) < 2 {
            warnings.push(
                "Fewer than two years of positive surplus; profit CAGR treated as 0%".into(),
            );
        }
        let fee_years = history
            .years()
            .iter()
            .filter(|y| y.statutory_fee().is_some())
            .count();
        if fee_years < 2 {
            warnings.push(
                "Fewer than two years of statutory audit fees; historical fee growth treated as 0%"
                    .into(),
            );
        }
    }
    if input.inflation_rate > Decimal::ONE {
        warnings.push(format!(
            "Inflation rate {} exceeds 100%; expected a decimal such as 0.06 for 6%",
            input.inflation_rate
        ));
    }

    let output = cagr_fee(history, input.inflation_rate);
    if !output.is_sufficient() {
        warnings.push(output.explanation.clone());
    }

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "CAGR rule engine (revenue, profit and fee growth decision table)",
        input,
        warnings,
        elapsed,
        output,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
