use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::amounts::{self, amount_or_zero};
use crate::error::AuditFeeError;
use crate::types::Money;
use crate::AuditFeeResult;

/// Number of year records a fresh engagement starts with.
pub const DEFAULT_YEAR_COUNT: usize = 4;

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// The fixed set of engagement services a fee can be quoted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ServiceKey {
    StatutoryAudit,
    IfcTesting,
    TaxAudit,
    TransferPricingCertification,
    TransferPricingDocumentation,
    IncomeTaxReturnFiling,
    GstAnnualReturnFiling,
}

impl ServiceKey {
    pub const ALL: [ServiceKey; 7] = [
        ServiceKey::StatutoryAudit,
        ServiceKey::IfcTesting,
        ServiceKey::TaxAudit,
        ServiceKey::TransferPricingCertification,
        ServiceKey::TransferPricingDocumentation,
        ServiceKey::IncomeTaxReturnFiling,
        ServiceKey::GstAnnualReturnFiling,
    ];

    /// Wire key, as used in persisted state.
    pub fn key(&self) -> &'static str {
        match self {
            ServiceKey::StatutoryAudit => "statutoryAudit",
            ServiceKey::IfcTesting => "ifcTesting",
            ServiceKey::TaxAudit => "taxAudit",
            ServiceKey::TransferPricingCertification => "transferPricingCertification",
            ServiceKey::TransferPricingDocumentation => "transferPricingDocumentation",
            ServiceKey::IncomeTaxReturnFiling => "incomeTaxReturnFiling",
            ServiceKey::GstAnnualReturnFiling => "gstAnnualReturnFiling",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ServiceKey::StatutoryAudit => "Statutory Audit",
            ServiceKey::IfcTesting => "IFC Testing",
            ServiceKey::TaxAudit => "Tax Audit",
            ServiceKey::TransferPricingCertification => "Transfer Pricing Certification",
            ServiceKey::TransferPricingDocumentation => "Transfer Pricing Documentation",
            ServiceKey::IncomeTaxReturnFiling => "Income Tax Return Filing",
            ServiceKey::GstAnnualReturnFiling => "GST Annual Return Filing",
        }
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ServiceKey {
    type Err = AuditFeeError;

    /// Accepts `statutoryAudit`, `statutory-audit` and `statutory_audit`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = squash(s);
        ServiceKey::ALL
            .into_iter()
            .find(|k| squash(k.key()) == wanted)
            .ok_or_else(|| AuditFeeError::InvalidInput {
                field: "service".into(),
                reason: format!("unknown service '{s}'"),
            })
    }
}

/// The financial statement lines captured per year (amounts in lakhs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FinancialField {
    RevenueFromOperations,
    TotalRevenue,
    SurplusDeficit,
    TotalAssets,
    EmployeeBenefitExpense,
    Borrowings,
}

impl FinancialField {
    pub const ALL: [FinancialField; 6] = [
        FinancialField::RevenueFromOperations,
        FinancialField::TotalRevenue,
        FinancialField::SurplusDeficit,
        FinancialField::TotalAssets,
        FinancialField::EmployeeBenefitExpense,
        FinancialField::Borrowings,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            FinancialField::RevenueFromOperations => "revenueFromOperations",
            FinancialField::TotalRevenue => "totalRevenue",
            FinancialField::SurplusDeficit => "surplusDeficit",
            FinancialField::TotalAssets => "totalAssets",
            FinancialField::EmployeeBenefitExpense => "employeeBenefitExpense",
            FinancialField::Borrowings => "borrowings",
        }
    }
}

impl fmt::Display for FinancialField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for FinancialField {
    type Err = AuditFeeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = squash(s);
        FinancialField::ALL
            .into_iter()
            .find(|k| squash(k.key()) == wanted)
            .ok_or_else(|| AuditFeeError::InvalidInput {
                field: "financial_field".into(),
                reason: format!("unknown financial field '{s}'"),
            })
    }
}

fn squash(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One year's financial statement figures. Blank form fields are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FinancialData {
    #[serde(with = "amounts::lenient_opt")]
    pub revenue_from_operations: Option<Money>,
    #[serde(with = "amounts::lenient_opt")]
    pub total_revenue: Option<Money>,
    #[serde(with = "amounts::lenient_opt")]
    pub surplus_deficit: Option<Money>,
    #[serde(with = "amounts::lenient_opt")]
    pub total_assets: Option<Money>,
    #[serde(with = "amounts::lenient_opt")]
    pub employee_benefit_expense: Option<Money>,
    #[serde(with = "amounts::lenient_opt")]
    pub borrowings: Option<Money>,
}

impl FinancialData {
    pub fn get(&self, field: FinancialField) -> Option<Money> {
        match field {
            FinancialField::RevenueFromOperations => self.revenue_from_operations,
            FinancialField::TotalRevenue => self.total_revenue,
            FinancialField::SurplusDeficit => self.surplus_deficit,
            FinancialField::TotalAssets => self.total_assets,
            FinancialField::EmployeeBenefitExpense => self.employee_benefit_expense,
            FinancialField::Borrowings => self.borrowings,
        }
    }

    pub fn set(&mut self, field: FinancialField, value: Option<Money>) {
        let slot = match field {
            FinancialField::RevenueFromOperations => &mut self.revenue_from_operations,
            FinancialField::TotalRevenue => &mut self.total_revenue,
            FinancialField::SurplusDeficit => &mut self.surplus_deficit,
            FinancialField::TotalAssets => &mut self.total_assets,
            FinancialField::EmployeeBenefitExpense => &mut self.employee_benefit_expense,
            FinancialField::Borrowings => &mut self.borrowings,
        };
        *slot = value;
    }

    /// Field value with blanks read as zero.
    pub fn value_or_zero(&self, field: FinancialField) -> Money {
        amount_or_zero(self.get(field))
    }
}

/// Whether a service was engaged in a year, and what was billed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceLine {
    pub selected: bool,
    #[serde(with = "amounts::lenient_opt")]
    pub fee: Option<Money>,
}

impl ServiceLine {
    pub fn billed(fee: Money) -> Self {
        Self {
            selected: true,
            fee: Some(fee),
        }
    }

    /// The fee, only when the service was selected and billed above zero.
    pub fn positive_fee(&self) -> Option<Money> {
        match self.fee {
            Some(fee) if self.selected && fee > Decimal::ZERO => Some(fee),
            _ => None,
        }
    }
}

/// Service lines for one year, one per [`ServiceKey`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Services {
    pub statutory_audit: ServiceLine,
    pub ifc_testing: ServiceLine,
    pub tax_audit: ServiceLine,
    pub transfer_pricing_certification: ServiceLine,
    pub transfer_pricing_documentation: ServiceLine,
    pub income_tax_return_filing: ServiceLine,
    pub gst_annual_return_filing: ServiceLine,
}

impl Services {
    pub fn get(&self, key: ServiceKey) -> &ServiceLine {
        match key {
            ServiceKey::StatutoryAudit => &self.statutory_audit,
            ServiceKey::IfcTesting => &self.ifc_testing,
            ServiceKey::TaxAudit => &self.tax_audit,
            ServiceKey::TransferPricingCertification => &self.transfer_pricing_certification,
            ServiceKey::TransferPricingDocumentation => &self.transfer_pricing_documentation,
            ServiceKey::IncomeTaxReturnFiling => &self.income_tax_return_filing,
            ServiceKey::GstAnnualReturnFiling => &self.gst_annual_return_filing,
        }
    }

    pub fn get_mut(&mut self, key: ServiceKey) -> &mut ServiceLine {
        match key {
            ServiceKey::StatutoryAudit => &mut self.statutory_audit,
            ServiceKey::IfcTesting => &mut self.ifc_testing,
            ServiceKey::TaxAudit => &mut self.tax_audit,
            ServiceKey::TransferPricingCertification => &mut self.transfer_pricing_certification,
            ServiceKey::TransferPricingDocumentation => &mut self.transfer_pricing_documentation,
            ServiceKey::IncomeTaxReturnFiling => &mut self.income_tax_return_filing,
            ServiceKey::GstAnnualReturnFiling => &mut self.gst_annual_return_filing,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ServiceKey, &ServiceLine)> + '_ {
        ServiceKey::ALL.into_iter().map(move |k| (k, self.get(k)))
    }

    pub fn any_selected(&self) -> bool {
        self.iter().any(|(_, line)| line.selected)
    }
}

/// One financial year of data as entered in the wizard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearRecord {
    pub year_label: String,
    #[serde(default)]
    pub financial_data: FinancialData,
    #[serde(default)]
    pub services: Services,
}

impl YearRecord {
    pub fn new(year_label: impl Into<String>) -> Self {
        Self {
            year_label: year_label.into(),
            ..Default::default()
        }
    }

    /// Selected, positive statutory audit fee for this year.
    pub fn statutory_fee(&self) -> Option<Money> {
        self.services.statutory_audit.positive_fee()
    }
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// Year records in the order the user entered them.
///
/// The fee engines never depend on that order: they read through
/// [`YearlyHistory::chronological`], which sorts by year label ascending
/// (oldest first). Labels must therefore share a comparable form such as
/// `"2022-23"` / `"2023-24"` or `"Year 1"` .. `"Year 9"`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct YearlyHistory {
    years: Vec<YearRecord>,
}

impl YearlyHistory {
    pub fn new(years: Vec<YearRecord>) -> Self {
        Self { years }
    }

    /// `count` empty records labelled "Year 1" .. "Year {count}".
    pub fn blank(count: usize) -> Self {
        Self {
            years: (1..=count).map(|i| YearRecord::new(format!("Year {i}"))).collect(),
        }
    }

    pub fn years(&self) -> &[YearRecord] {
        &self.years
    }

    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    pub fn push(&mut self, record: YearRecord) {
        self.years.push(record);
    }

    pub fn get(&self, index: usize) -> Option<&YearRecord> {
        self.years.get(index)
    }

    /// Mutable access by entry position; out-of-range indices are an input error.
    pub fn year_mut(&mut self, index: usize) -> AuditFeeResult<&mut YearRecord> {
        let len = self.years.len();
        self.years
            .get_mut(index)
            .ok_or_else(|| AuditFeeError::InvalidInput {
                field: "year_index".into(),
                reason: format!("index {index} out of range for {len} year(s)"),
            })
    }

    /// Records sorted oldest to newest by year label.
    pub fn chronological(&self) -> Vec<&YearRecord> {
        let mut sorted: Vec<&YearRecord> = self.years.iter().collect();
        sorted.sort_by(|a, b| a.year_label.cmp(&b.year_label));
        sorted
    }

    /// Newest record by year label.
    pub fn latest(&self) -> Option<&YearRecord> {
        self.years.iter().max_by(|a, b| a.year_label.cmp(&b.year_label))
    }

    /// Newest record carrying a selected, positive statutory audit fee.
    pub fn latest_with_statutory_fee(&self) -> Option<&YearRecord> {
        self.chronological()
            .into_iter()
            .rev()
            .find(|y| y.statutory_fee().is_some())
    }
}

impl From<Vec<YearRecord>> for YearlyHistory {
    fn from(years: Vec<YearRecord>) -> Self {
        Self::new(years)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn year(label: &str, revenue: Option<Money>, statutory: Option<Money>) -> YearRecord {
        let mut y = YearRecord::new(label);
        y.financial_data.total_revenue = revenue;
        if let Some(fee) = statutory {
            y.services.statutory_audit = ServiceLine::billed(fee);
        }
        y
    }

    #[test]
    fn test_service_key_parsing_variants() {
        assert_eq!(
            "statutoryAudit".parse::<ServiceKey>().unwrap(),
            ServiceKey::StatutoryAudit
        );
        assert_eq!(
            "gst-annual-return-filing".parse::<ServiceKey>().unwrap(),
            ServiceKey::GstAnnualReturnFiling
        );
        assert_eq!(
            "IFC_TESTING".parse::<ServiceKey>().unwrap(),
            ServiceKey::IfcTesting
        );
        assert!("bookkeeping".parse::<ServiceKey>().is_err());
    }

    #[test]
    fn test_service_key_wire_name_matches_key() {
        for key in ServiceKey::ALL {
            let json = serde_json::to_value(key).unwrap();
            assert_eq!(json, key.key());
        }
    }

    #[test]
    fn test_positive_fee_requires_selection() {
        let unselected = ServiceLine {
            selected: false,
            fee: Some(dec!(5000)),
        };
        assert_eq!(unselected.positive_fee(), None);
        assert_eq!(ServiceLine::billed(dec!(0)).positive_fee(), None);
        assert_eq!(
            ServiceLine::billed(dec!(5000)).positive_fee(),
            Some(dec!(5000))
        );
    }

    #[test]
    fn test_blank_history_labels() {
        let h = YearlyHistory::blank(DEFAULT_YEAR_COUNT);
        let labels: Vec<&str> = h.years().iter().map(|y| y.year_label.as_str()).collect();
        assert_eq!(labels, vec!["Year 1", "Year 2", "Year 3", "Year 4"]);
    }

    #[test]
    fn test_chronological_ignores_entry_order() {
        let h = YearlyHistory::new(vec![
            year("2023-24", Some(dec!(300)), None),
            year("2021-22", Some(dec!(100)), None),
            year("2022-23", Some(dec!(200)), None),
        ]);
        let labels: Vec<&str> = h
            .chronological()
            .iter()
            .map(|y| y.year_label.as_str())
            .collect();
        assert_eq!(labels, vec!["2021-22", "2022-23", "2023-24"]);
        assert_eq!(h.latest().unwrap().year_label, "2023-24");
        // entry order untouched
        assert_eq!(h.years()[0].year_label, "2023-24");
    }

    #[test]
    fn test_latest_with_statutory_fee_skips_unbilled_years() {
        let h = YearlyHistory::new(vec![
            year("2023-24", None, None),
            year("2021-22", None, Some(dec!(90000))),
            year("2022-23", None, Some(dec!(100000))),
        ]);
        let anchor = h.latest_with_statutory_fee().unwrap();
        assert_eq!(anchor.year_label, "2022-23");
        assert_eq!(anchor.statutory_fee(), Some(dec!(100000)));
    }

    #[test]
    fn test_year_mut_out_of_range() {
        let mut h = YearlyHistory::blank(2);
        assert!(h.year_mut(1).is_ok());
        match h.year_mut(5).unwrap_err() {
            AuditFeeError::InvalidInput { field, .. } => assert_eq!(field, "year_index"),
            e => panic!("Expected InvalidInput, got {e:?}"),
        }
    }

    #[test]
    fn test_wizard_blob_shape_deserializes() {
        let json = r#"[
            {
                "yearLabel": "Year 1",
                "financialData": {
                    "revenueFromOperations": "900",
                    "totalRevenue": 1000,
                    "surplusDeficit": "",
                    "totalAssets": "",
                    "employeeBenefitExpense": "",
                    "borrowings": "150"
                },
                "services": {
                    "statutoryAudit": { "selected": true, "fee": "200000" },
                    "taxAudit": { "selected": false, "fee": "" }
                }
            }
        ]"#;
        let h: YearlyHistory = serde_json::from_str(json).unwrap();
        let y = &h.years()[0];
        assert_eq!(y.financial_data.total_revenue, Some(dec!(1000)));
        assert_eq!(y.financial_data.surplus_deficit, None);
        assert_eq!(y.financial_data.value_or_zero(FinancialField::Borrowings), dec!(150));
        assert_eq!(y.statutory_fee(), Some(dec!(200000)));
        assert!(!y.services.ifc_testing.selected);
    }

    #[test]
    fn test_financial_field_set_get() {
        let mut data = FinancialData::default();
        data.set(FinancialField::EmployeeBenefitExpense, Some(dec!(42)));
        assert_eq!(data.get(FinancialField::EmployeeBenefitExpense), Some(dec!(42)));
        assert_eq!(
            "surplus-deficit".parse::<FinancialField>().unwrap(),
            FinancialField::SurplusDeficit
        );
    }
}
