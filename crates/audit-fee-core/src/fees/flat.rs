use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use crate::error::AuditFeeError;
use crate::types::{round_currency, saturating_sum, with_metadata, ComputationOutput, Money, Rate};

/// Fee schedule profile for the standalone calculator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlatProfile {
    #[default]
    Mri,
    Interchange,
}

impl FromStr for FlatProfile {
    type Err = AuditFeeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mri" => Ok(FlatProfile::Mri),
            "interchange" => Ok(FlatProfile::Interchange),
            _ => Err(AuditFeeError::InvalidInput {
                field: "profile".into(),
                reason: format!("unknown flat fee profile '{s}' (expected mri or interchange)"),
            }),
        }
    }
}

impl fmt::Display for FlatProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlatProfile::Mri => f.write_str("MRI"),
            FlatProfile::Interchange => f.write_str("iNTERCHANGE"),
        }
    }
}

impl<'de> Deserialize<'de> for FlatProfile {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// `base + revenue * percent_of_revenue`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeeComponent {
    pub base: Money,
    pub percent_of_revenue: Rate,
}

impl FeeComponent {
    const fn new(base: Money, percent_of_revenue: Rate) -> Self {
        Self {
            base,
            percent_of_revenue,
        }
    }

    pub fn amount(&self, revenue: Money) -> Money {
        round_currency(
            self.base
                .saturating_add(revenue.saturating_mul(self.percent_of_revenue)),
        )
    }
}

/// Per-service components for one profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FlatSchedule {
    pub statutory_audit: FeeComponent,
    pub ifc: FeeComponent,
    pub tax_audit: FeeComponent,
    pub gst: FeeComponent,
    pub transfer_pricing_audit: FeeComponent,
    pub transfer_pricing_documentation: FeeComponent,
    pub income_tax_return: Money,
}

impl FlatProfile {
    pub fn schedule(&self) -> FlatSchedule {
        match self {
            FlatProfile::Mri => FlatSchedule {
                statutory_audit: FeeComponent::new(dec!(500000), dec!(0.0001)),
                ifc: FeeComponent::new(dec!(200000), Decimal::ZERO),
                tax_audit: FeeComponent::new(dec!(110000), dec!(0.00005)),
                gst: FeeComponent::new(dec!(60000), dec!(0.00001)),
                transfer_pricing_audit: FeeComponent::new(dec!(40000), Decimal::ZERO),
                transfer_pricing_documentation: FeeComponent::new(dec!(185000), Decimal::ZERO),
                income_tax_return: dec!(25000),
            },
            FlatProfile::Interchange => FlatSchedule {
                statutory_audit: FeeComponent::new(dec!(75000), dec!(0.0001)),
                ifc: FeeComponent::new(Decimal::ZERO, Decimal::ZERO),
                tax_audit: FeeComponent::new(dec!(75000), dec!(0.00003)),
                gst: FeeComponent::new(Decimal::ZERO, dec!(0.00001)),
                transfer_pricing_audit: FeeComponent::new(Decimal::ZERO, Decimal::ZERO),
                transfer_pricing_documentation: FeeComponent::new(Decimal::ZERO, Decimal::ZERO),
                income_tax_return: Decimal::ZERO,
            },
        }
    }
}

/// Input for the flat calculator. Revenue is in millions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FlatFeeInput {
    pub profile: FlatProfile,
    #[serde(with = "crate::amounts::lenient")]
    pub revenue_millions: Money,
    pub requires_ifc: bool,
    pub gst_registered: bool,
    pub foreign_transactions: bool,
    pub requires_tp_doc: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatFeeOutput {
    pub profile: FlatProfile,
    pub revenue: Money,
    pub statutory_audit: Money,
    pub ifc: Money,
    pub tax_audit: Money,
    pub gst: Money,
    pub transfer_pricing_audit: Money,
    pub transfer_pricing_documentation: Money,
    pub income_tax_return: Money,
    pub other_services: Money,
    pub total: Money,
}

/// Schedule-based fees, independent of any history.
pub fn flat_fees(input: &FlatFeeInput) -> FlatFeeOutput {
    let revenue = input
        .revenue_millions
        .max(Decimal::ZERO)
        .saturating_mul(dec!(1000000));
    let s = input.profile.schedule();

    let gated = |on: bool, c: &FeeComponent| {
        if on {
            c.amount(revenue)
        } else {
            Decimal::ZERO
        }
    };

    let statutory_audit = s.statutory_audit.amount(revenue);
    let ifc = gated(input.requires_ifc, &s.ifc);
    let tax_audit = s.tax_audit.amount(revenue);
    let gst = gated(input.gst_registered, &s.gst);
    let transfer_pricing_audit = gated(input.foreign_transactions, &s.transfer_pricing_audit);
    let transfer_pricing_documentation =
        gated(input.requires_tp_doc, &s.transfer_pricing_documentation);
    let income_tax_return = s.income_tax_return;
    let other_services = Decimal::ZERO;

    let total = saturating_sum([
        statutory_audit,
        ifc,
        tax_audit,
        gst,
        transfer_pricing_audit,
        transfer_pricing_documentation,
        income_tax_return,
        other_services,
    ]);

    FlatFeeOutput {
        profile: input.profile,
        revenue,
        statutory_audit,
        ifc,
        tax_audit,
        gst,
        transfer_pricing_audit,
        transfer_pricing_documentation,
        income_tax_return,
        other_services,
        total,
    }
}

pub fn calculate_flat_fees(input: &FlatFeeInput) -> ComputationOutput<FlatFeeOutput> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    if input.revenue_millions < Decimal::ZERO {
        warnings.push("Negative revenue treated as 0".into());
    }

    let output = flat_fees(input);

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        &format!("Flat fee schedule ({})", input.profile),
        input,
        warnings,
        elapsed,
        output,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_profile_parsing_is_case_insensitive() {
        assert_eq!("MRI".parse::<FlatProfile>().unwrap(), FlatProfile::Mri);
        assert_eq!("iNTERCHANGE".parse::<FlatProfile>().unwrap(), FlatProfile::Interchange);
        assert_eq!("interchange".parse::<FlatProfile>().unwrap(), FlatProfile::Interchange);
        assert!("acme".parse::<FlatProfile>().is_err());
    }

    #[test]
    fn test_mri_flags_off_only_mandatory_services() {
        let out = flat_fees(&FlatFeeInput {
            profile: FlatProfile::Mri,
            revenue_millions: dec!(100),
            ..Default::default()
        });
        // revenue 100,000,000
        assert_eq!(out.statutory_audit, dec!(510000));
        assert_eq!(out.tax_audit, dec!(115000));
        assert_eq!(out.income_tax_return, dec!(25000));
        assert_eq!(out.ifc, Decimal::ZERO);
        assert_eq!(out.gst, Decimal::ZERO);
        assert_eq!(out.transfer_pricing_audit, Decimal::ZERO);
        assert_eq!(out.transfer_pricing_documentation, Decimal::ZERO);
        assert_eq!(out.total, dec!(650000));
    }

    #[test]
    fn test_mri_all_flags_on() {
        let out = flat_fees(&FlatFeeInput {
            profile: FlatProfile::Mri,
            revenue_millions: dec!(100),
            requires_ifc: true,
            gst_registered: true,
            foreign_transactions: true,
            requires_tp_doc: true,
        });
        assert_eq!(out.ifc, dec!(200000));
        assert_eq!(out.gst, dec!(61000));
        assert_eq!(out.transfer_pricing_audit, dec!(40000));
        assert_eq!(out.transfer_pricing_documentation, dec!(185000));
        assert_eq!(out.total, dec!(1136000));
    }

    #[test]
    fn test_interchange_schedule() {
        let out = flat_fees(&FlatFeeInput {
            profile: FlatProfile::Interchange,
            revenue_millions: dec!(50),
            gst_registered: true,
            requires_ifc: true,
            ..Default::default()
        });
        assert_eq!(out.statutory_audit, dec!(80000));
        assert_eq!(out.tax_audit, dec!(76500));
        assert_eq!(out.gst, dec!(500));
        assert_eq!(out.ifc, Decimal::ZERO);
        assert_eq!(out.income_tax_return, Decimal::ZERO);
        assert_eq!(out.total, dec!(157000));
    }

    #[test]
    fn test_input_from_json() {
        let input: FlatFeeInput = serde_json::from_str(
            r#"{"profile": "Interchange", "revenue_millions": 12.5, "gst_registered": true}"#,
        )
        .unwrap();
        assert_eq!(input.profile, FlatProfile::Interchange);
        assert_eq!(input.revenue_millions, dec!(12.5));
        assert!(input.gst_registered);
        assert!(!input.requires_ifc);
    }

    #[test]
    fn test_enormous_revenue_saturates() {
        let out = flat_fees(&FlatFeeInput {
            revenue_millions: Decimal::MAX,
            ..Default::default()
        });
        assert_eq!(out.revenue, Decimal::MAX);
        assert!(out.total > out.statutory_audit);
    }
}
