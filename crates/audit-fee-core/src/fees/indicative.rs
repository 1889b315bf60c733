use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::time::Instant;

use super::multiplier::client_type_multiplier;
use crate::engagement::{ClientType, FinancialField, YearlyHistory};
use crate::types::{
    round_currency, saturating_sum, with_metadata, ComputationOutput, Factor, Money,
};

/// Complexity multiplier ceiling.
pub const MAX_COMPLEXITY: Factor = dec!(2.0);

// ---------------------------------------------------------------------------
// Services and complexity factors
// ---------------------------------------------------------------------------

/// Add-on services priced as a share of revenue.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicativeService {
    TaxAudit,
    GstAudit,
    InternalFinancialControls,
    ConsolidatedFinancialStatements,
    TransferPricingCertification,
    Other(String),
}

impl IndicativeService {
    pub fn label(&self) -> &str {
        match self {
            IndicativeService::TaxAudit => "Tax Audit",
            IndicativeService::GstAudit => "GST Audit",
            IndicativeService::InternalFinancialControls => "Internal Financial Controls",
            IndicativeService::ConsolidatedFinancialStatements => {
                "Consolidated Financial Statements"
            }
            IndicativeService::TransferPricingCertification => "Transfer Pricing Certification",
            IndicativeService::Other(name) => name,
        }
    }

    /// Fee for this service on a revenue figure in lakhs.
    pub fn fee(&self, revenue: Money, client_type: ClientType) -> Money {
        match self {
            IndicativeService::TaxAudit => {
                let mut fee = revenue * dec!(0.001);
                if matches!(client_type, ClientType::Listed | ClientType::Public) {
                    fee += revenue * dec!(0.0005);
                }
                fee
            }
            IndicativeService::GstAudit => revenue * dec!(0.0015),
            IndicativeService::InternalFinancialControls => {
                if client_type == ClientType::Listed {
                    revenue * dec!(0.002)
                } else {
                    revenue * dec!(0.001)
                }
            }
            IndicativeService::ConsolidatedFinancialStatements => {
                // 1.5 x the 0.05% rate
                revenue * dec!(0.00075)
            }
            IndicativeService::TransferPricingCertification => revenue * dec!(0.001),
            IndicativeService::Other(_) => revenue * dec!(0.0005),
        }
    }
}

impl From<&str> for IndicativeService {
    fn from(label: &str) -> Self {
        match label.trim() {
            "Tax Audit" => IndicativeService::TaxAudit,
            "GST Audit" => IndicativeService::GstAudit,
            "Internal Financial Controls" => IndicativeService::InternalFinancialControls,
            "Consolidated Financial Statements" => {
                IndicativeService::ConsolidatedFinancialStatements
            }
            "Transfer Pricing Certification" => IndicativeService::TransferPricingCertification,
            other => IndicativeService::Other(other.to_string()),
        }
    }
}

/// Engagement characteristics that make the audit harder.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ComplexityFactor {
    MultipleLocations,
    ComplexRevenueRecognition,
    SignificantJudgments,
    FirstTimeAudit,
    MultipleBusinessSegments,
    ForeignCurrencyTransactions,
    RelatedPartyTransactions,
    Other(String),
}

impl ComplexityFactor {
    pub fn label(&self) -> &str {
        match self {
            ComplexityFactor::MultipleLocations => "Multiple Locations",
            ComplexityFactor::ComplexRevenueRecognition => "Complex Revenue Recognition",
            ComplexityFactor::SignificantJudgments => "Significant Judgments Required",
            ComplexityFactor::FirstTimeAudit => "First-Time Audit",
            ComplexityFactor::MultipleBusinessSegments => "Multiple Business Segments",
            ComplexityFactor::ForeignCurrencyTransactions => "Foreign Currency Transactions",
            ComplexityFactor::RelatedPartyTransactions => "Related Party Transactions",
            ComplexityFactor::Other(name) => name,
        }
    }

    pub fn loading(&self) -> Factor {
        match self {
            ComplexityFactor::MultipleLocations => dec!(0.15),
            ComplexityFactor::ComplexRevenueRecognition => dec!(0.10),
            ComplexityFactor::SignificantJudgments => dec!(0.12),
            ComplexityFactor::FirstTimeAudit => dec!(0.20),
            ComplexityFactor::MultipleBusinessSegments => dec!(0.15),
            ComplexityFactor::ForeignCurrencyTransactions => dec!(0.08),
            ComplexityFactor::RelatedPartyTransactions => dec!(0.07),
            ComplexityFactor::Other(_) => dec!(0.05),
        }
    }
}

impl From<&str> for ComplexityFactor {
    fn from(label: &str) -> Self {
        match label.trim() {
            "Multiple Locations" => ComplexityFactor::MultipleLocations,
            "Complex Revenue Recognition" => ComplexityFactor::ComplexRevenueRecognition,
            "Significant Judgments Required" | "Significant Judgments" => {
                ComplexityFactor::SignificantJudgments
            }
            "First-Time Audit" | "First Time Audit" => ComplexityFactor::FirstTimeAudit,
            "Multiple Business Segments" => ComplexityFactor::MultipleBusinessSegments,
            "Foreign Currency Transactions" => ComplexityFactor::ForeignCurrencyTransactions,
            "Related Party Transactions" => ComplexityFactor::RelatedPartyTransactions,
            other => ComplexityFactor::Other(other.to_string()),
        }
    }
}

macro_rules! label_serde {
    ($ty:ty) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
                s.serialize_str(self.label())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(d)?;
                Ok(<$ty>::from(raw.as_str()))
            }
        }
    };
}

label_serde!(IndicativeService);
label_serde!(ComplexityFactor);

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Input for the indicative calculator. Financial figures are in lakhs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicativeFeeInput {
    pub history: YearlyHistory,
    pub services: Vec<IndicativeService>,
    pub complexity_factors: Vec<ComplexityFactor>,
    pub client_type: ClientType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicativeFeeOutput {
    pub base_fee: Money,
    pub assets_fee: Money,
    pub borrowings_fee: Money,
    pub service_fees: Money,
    pub client_type_multiplier: Factor,
    pub complexity_multiplier: Factor,
    /// Whole lakhs
    pub total: Money,
}

impl IndicativeFeeOutput {
    fn zero() -> Self {
        Self {
            base_fee: Decimal::ZERO,
            assets_fee: Decimal::ZERO,
            borrowings_fee: Decimal::ZERO,
            service_fees: Decimal::ZERO,
            client_type_multiplier: Decimal::ONE,
            complexity_multiplier: Decimal::ONE,
            total: Decimal::ZERO,
        }
    }
}

/// Progressive revenue slab fee.
pub fn revenue_slab_fee(revenue: Money) -> Money {
    if revenue <= dec!(500) {
        revenue * dec!(0.005)
    } else if revenue <= dec!(2000) {
        dec!(2.5) + (revenue - dec!(500)) * dec!(0.0035)
    } else if revenue <= dec!(10000) {
        dec!(7.75) + (revenue - dec!(2000)) * dec!(0.002)
    } else {
        dec!(23.75) + (revenue - dec!(10000)) * dec!(0.0015)
    }
}

/// 1.0 plus each factor's loading, capped at 2.0.
pub fn indicative_complexity(factors: &[ComplexityFactor]) -> Factor {
    let raw = factors
        .iter()
        .fold(Decimal::ONE, |acc, f| acc + f.loading());
    raw.min(MAX_COMPLEXITY)
}

pub fn indicative_fee(input: &IndicativeFeeInput) -> IndicativeFeeOutput {
    let Some(latest) = input.history.latest() else {
        return IndicativeFeeOutput::zero();
    };
    let data = &latest.financial_data;
    let revenue = data.value_or_zero(FinancialField::TotalRevenue);
    let assets = data.value_or_zero(FinancialField::TotalAssets);
    let borrowings = data.value_or_zero(FinancialField::Borrowings);

    let base_fee = revenue_slab_fee(revenue);
    let assets_fee = assets * dec!(0.0005);
    let borrowings_fee = borrowings * dec!(0.001);
    let service_fees = saturating_sum(
        input
            .services
            .iter()
            .map(|s| s.fee(revenue, input.client_type)),
    );

    let client_multiplier = client_type_multiplier(input.client_type);
    let complexity = indicative_complexity(&input.complexity_factors);

    let total = round_currency(
        saturating_sum([base_fee, assets_fee, borrowings_fee, service_fees])
            .saturating_mul(client_multiplier)
            .saturating_mul(complexity),
    );

    IndicativeFeeOutput {
        base_fee,
        assets_fee,
        borrowings_fee,
        service_fees,
        client_type_multiplier: client_multiplier,
        complexity_multiplier: complexity,
        total,
    }
}

pub fn calculate_indicative_fee(input: &IndicativeFeeInput) -> ComputationOutput<IndicativeFeeOutput> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.history.is_empty() {
        warnings.push("No year records supplied; indicative fee is 0".into());
    }
    let raw_complexity = input
        .complexity_factors
        .iter()
        .fold(Decimal::ONE, |acc, f| acc + f.loading());
    if raw_complexity > MAX_COMPLEXITY {
        warnings.push(format!(
            "Complexity multiplier {raw_complexity} capped at {MAX_COMPLEXITY}"
        ));
    }
    for s in &input.services {
        if let IndicativeService::Other(name) = s {
            warnings.push(format!("Unrecognised service '{name}' priced at 0.05% of revenue"));
        }
    }

    let output = indicative_fee(input);

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Indicative fee in lakhs (progressive revenue slabs, asset and borrowing loadings)",
        input,
        warnings,
        elapsed,
        output,
    )
}
