use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

use crate::engagement::{ClientProfile, ClientType, FinancialField, ServiceKey, YearlyHistory};
use crate::growth;
use crate::types::{
    round_currency, saturating_sum, with_metadata, ComputationOutput, Factor, Money,
};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const COMPLEX_GROUP_LOADING: Factor = dec!(0.05);
const INTERNATIONAL_LOADING: Factor = dec!(0.05);
const REGULATORY_LOADING: Factor = dec!(0.03);
const PER_BRANCH_LOADING: Factor = dec!(0.01);
const BRANCH_LOADING_CAP: Factor = dec!(0.10);

/// Growth assumed when fewer than two years of positive revenue exist.
pub const DEFAULT_ANNUAL_GROWTH: Factor = dec!(0.05);
/// Upper clamp on revenue CAGR before it becomes a growth factor.
pub const MAX_ANNUAL_GROWTH: Factor = dec!(0.15);

/// Base schedule fee for a service before any multiplier.
pub fn base_fee(service: ServiceKey) -> Money {
    match service {
        ServiceKey::StatutoryAudit => dec!(200000),
        ServiceKey::IfcTesting => dec!(100000),
        ServiceKey::TaxAudit => dec!(75000),
        ServiceKey::TransferPricingCertification => dec!(60000),
        ServiceKey::TransferPricingDocumentation => dec!(150000),
        ServiceKey::IncomeTaxReturnFiling => dec!(25000),
        ServiceKey::GstAnnualReturnFiling => dec!(40000),
    }
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Revenue size band of the latest year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevenueBracket {
    /// Below 100
    Small,
    /// 100 to below 500
    Medium,
    /// 500 to below 1000
    Large,
    /// 1000 and above
    VeryLarge,
}

impl RevenueBracket {
    pub fn for_revenue(revenue: Money) -> Self {
        if revenue < dec!(100) {
            RevenueBracket::Small
        } else if revenue < dec!(500) {
            RevenueBracket::Medium
        } else if revenue < dec!(1000) {
            RevenueBracket::Large
        } else {
            RevenueBracket::VeryLarge
        }
    }

    pub fn multiplier(&self) -> Factor {
        match self {
            RevenueBracket::Small => dec!(0.8),
            RevenueBracket::Medium => dec!(1.0),
            RevenueBracket::Large => dec!(1.3),
            RevenueBracket::VeryLarge => dec!(1.5),
        }
    }
}

/// How a service fee was priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeBasis {
    /// Grown from the historical average of billed fees
    Historical,
    /// Priced from the base schedule
    BaseSchedule,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceFeeLine {
    pub service: ServiceKey,
    pub basis: FeeBasis,
    pub historical_average: Money,
    pub service_factor: Factor,
    pub fee: Money,
}

/// Input for the multiplier engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MultiplierFeeInput {
    pub history: YearlyHistory,
    #[serde(default)]
    pub profile: ClientProfile,
}

/// Output of the multiplier engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiplierFeeOutput {
    pub fees: BTreeMap<ServiceKey, Money>,
    pub total: Money,
    pub lines: Vec<ServiceFeeLine>,
    pub revenue_bracket: RevenueBracket,
    pub revenue_multiplier: Factor,
    pub client_type_multiplier: Factor,
    pub complexity_multiplier: Factor,
    pub growth_factor: Factor,
}

// ---------------------------------------------------------------------------
// Factors
// ---------------------------------------------------------------------------

pub fn client_type_multiplier(client_type: ClientType) -> Factor {
    match client_type {
        ClientType::Listed => dec!(1.5),
        ClientType::Public => dec!(1.3),
        ClientType::Private => dec!(1.0),
        ClientType::Smc => dec!(0.8),
        ClientType::Llp => dec!(0.9),
        ClientType::Section8 => dec!(0.7),
    }
}

/// 1.0 plus additive loadings for each complexity answer. Branches add 1%
/// each, capped at 10%, and only count when multiple branches are reported.
pub fn complexity_multiplier(profile: &ClientProfile) -> Factor {
    let mut multiplier = Decimal::ONE;
    if profile.has_complex_group_structure {
        multiplier += COMPLEX_GROUP_LOADING;
    }
    if profile.has_international_transactions {
        multiplier += INTERNATIONAL_LOADING;
    }
    if profile.has_regulatory_changes {
        multiplier += REGULATORY_LOADING;
    }
    let branches = profile.effective_branches();
    if branches > 0 {
        multiplier += (PER_BRANCH_LOADING * Decimal::from(branches)).min(BRANCH_LOADING_CAP);
    }
    multiplier
}

/// 1 + revenue CAGR clamped to [0, 15%]; 1.05 with fewer than two usable years.
pub fn growth_factor(history: &YearlyHistory) -> Factor {
    if growth::usable_points(history, FinancialField::TotalRevenue) < 2 {
        return Decimal::ONE + DEFAULT_ANNUAL_GROWTH;
    }
    let raw = growth::metric_cagr(history, FinancialField::TotalRevenue);
    Decimal::ONE + raw.max(Decimal::ZERO).min(MAX_ANNUAL_GROWTH)
}

/// Per-service adjustment for client attributes that bear on that service.
pub fn service_specific_factor(service: ServiceKey, profile: &ClientProfile) -> Factor {
    let ct = profile.client_type;
    let listed_or_public = matches!(ct, ClientType::Listed | ClientType::Public);
    let mut factor = Decimal::ONE;

    match service {
        ServiceKey::TransferPricingCertification | ServiceKey::TransferPricingDocumentation => {
            if profile.has_international_transactions {
                factor += dec!(0.10);
            }
            if listed_or_public {
                factor += dec!(0.05);
            }
        }
        ServiceKey::StatutoryAudit => {
            if profile.has_complex_group_structure {
                factor += dec!(0.07);
            }
            if ct == ClientType::Listed {
                factor += dec!(0.10);
            }
        }
        ServiceKey::IfcTesting => {
            if profile.has_multiple_branches {
                let branches = Decimal::from(profile.number_of_branches);
                factor += (branches * dec!(0.02)).min(dec!(0.15));
            }
            match ct {
                ClientType::Listed => factor += dec!(0.15),
                ClientType::Public => factor += dec!(0.10),
                ClientType::Smc | ClientType::Section8 => factor -= dec!(0.10),
                _ => {}
            }
        }
        ServiceKey::TaxAudit => {
            if listed_or_public {
                factor += dec!(0.05);
            }
            if ct == ClientType::Section8 {
                factor -= dec!(0.10);
            }
        }
        ServiceKey::IncomeTaxReturnFiling | ServiceKey::GstAnnualReturnFiling => {}
    }
    factor
}

/// Mean of the selected, positive fees billed for a service; zero if none.
pub fn historical_average_fee(history: &YearlyHistory, service: ServiceKey) -> Money {
    let fees: Vec<Money> = history
        .years()
        .iter()
        .filter_map(|y| y.services.get(service).positive_fee())
        .collect();
    if fees.is_empty() {
        return Decimal::ZERO;
    }
    let count = Decimal::from(fees.len() as u64);
    match fees.iter().try_fold(Decimal::ZERO, |acc, fee| acc.checked_add(*fee)) {
        Some(sum) => sum / count,
        // sum exceeds the decimal range: average the shares instead
        None => saturating_sum(fees.iter().map(|fee| *fee / count)),
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Price every service from history where it exists, otherwise from the
/// base schedule scaled by revenue size and client type.
pub fn multiplier_fees(history: &YearlyHistory, profile: &ClientProfile) -> MultiplierFeeOutput {
    let latest_revenue = history
        .latest()
        .map(|y| y.financial_data.value_or_zero(FinancialField::TotalRevenue))
        .unwrap_or(Decimal::ZERO);

    let revenue_bracket = RevenueBracket::for_revenue(latest_revenue);
    let revenue_multiplier = revenue_bracket.multiplier();
    let client_multiplier = client_type_multiplier(profile.client_type);
    let complexity = complexity_multiplier(profile);
    let growth = growth_factor(history);

    let mut fees = BTreeMap::new();
    let mut lines = Vec::with_capacity(ServiceKey::ALL.len());

    for service in ServiceKey::ALL {
        let historical_average = historical_average_fee(history, service);
        let service_factor = service_specific_factor(service, profile);

        let (basis, fee) = if historical_average > Decimal::ZERO {
            (
                FeeBasis::Historical,
                round_currency(
                    historical_average
                        .saturating_mul(growth)
                        .saturating_mul(complexity)
                        .saturating_mul(service_factor),
                ),
            )
        } else {
            (
                FeeBasis::BaseSchedule,
                round_currency(
                    base_fee(service)
                        * revenue_multiplier
                        * client_multiplier
                        * complexity
                        * service_factor,
                ),
            )
        };

        fees.insert(service, fee);
        lines.push(ServiceFeeLine {
            service,
            basis,
            historical_average,
            service_factor,
            fee,
        });
    }

    let total = saturating_sum(fees.values().copied());

    MultiplierFeeOutput {
        fees,
        total,
        lines,
        revenue_bracket,
        revenue_multiplier,
        client_type_multiplier: client_multiplier,
        complexity_multiplier: complexity,
        growth_factor: growth,
    }
}

/// Multiplier engine wrapped in the standard output envelope.
pub fn calculate_multiplier_fees(
    input: &MultiplierFeeInput,
) -> ComputationOutput<MultiplierFeeOutput> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.history.is_empty() {
        warnings.push("No year records supplied; latest revenue treated as 0".into());
    } else if growth::usable_points(&input.history, FinancialField::TotalRevenue) < 2 {
        warnings.push(
            "Fewer than two years of positive total revenue; default 5% growth factor applied"
                .into(),
        );
    }

    let output = multiplier_fees(&input.history, &input.profile);
    if output.lines.iter().all(|l| l.basis == FeeBasis::BaseSchedule) {
        warnings.push("No historical fees recorded; every service priced from the base schedule".into());
    }

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Multiplier schedule (historical average or base fee x revenue, client, complexity and service factors)",
        input,
        warnings,
        elapsed,
        output,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
