use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use tracing::warn;

use crate::amounts;
use crate::engagement::{
    ClientProfile, ClientType, FinancialField, ServiceKey, YearlyHistory, DEFAULT_YEAR_COUNT,
};
use crate::fees::proposal::{recommend_fee, ProposedFee};
use crate::types::{Money, Rate};
use crate::AuditFeeResult;

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WizardStep {
    #[default]
    ClientInfo = 1,
    FinancialData = 2,
    Services = 3,
    QualitativeFactors = 4,
    Summary = 5,
}

impl WizardStep {
    pub const ALL: [WizardStep; 5] = [
        WizardStep::ClientInfo,
        WizardStep::FinancialData,
        WizardStep::Services,
        WizardStep::QualitativeFactors,
        WizardStep::Summary,
    ];

    pub fn number(&self) -> u8 {
        *self as u8
    }

    /// Out-of-range numbers clamp to the first or last step.
    pub fn from_number(n: i64) -> Self {
        match n {
            i64::MIN..=1 => WizardStep::ClientInfo,
            2 => WizardStep::FinancialData,
            3 => WizardStep::Services,
            4 => WizardStep::QualitativeFactors,
            _ => WizardStep::Summary,
        }
    }

    pub fn next(&self) -> Self {
        WizardStep::from_number(i64::from(self.number()) + 1)
    }

    pub fn previous(&self) -> Self {
        WizardStep::from_number(i64::from(self.number()) - 1)
    }

    pub fn title(&self) -> &'static str {
        match self {
            WizardStep::ClientInfo => "Client Information",
            WizardStep::FinancialData => "Financial Data",
            WizardStep::Services => "Services",
            WizardStep::QualitativeFactors => "Additional Questions",
            WizardStep::Summary => "Summary",
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Step {} of 5: {}", self.number(), self.title())
    }
}

impl Serialize for WizardStep {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u8(self.number())
    }
}

impl<'de> Deserialize<'de> for WizardStep {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let n = amounts::lenient_count::deserialize(d)?;
        Ok(WizardStep::from_number(i64::from(n)))
    }
}

// ---------------------------------------------------------------------------
// Client and personnel details
// ---------------------------------------------------------------------------

/// Client identification captured on the first step. Financial figures are
/// in lakhs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientInfo {
    pub client_name: String,
    #[serde(with = "amounts::lenient_id")]
    pub client_id: Option<u32>,
    #[serde(rename = "CIN")]
    pub cin: String,
    #[serde(rename = "PAN")]
    pub pan: String,
    #[serde(with = "amounts::lenient_opt")]
    pub paid_up_capital: Option<Money>,
    #[serde(with = "amounts::lenient_opt")]
    pub latest_turnover: Option<Money>,
    #[serde(with = "amounts::lenient_opt")]
    pub borrowings: Option<Money>,
    #[serde(with = "amounts::lenient_opt")]
    pub net_profit: Option<Money>,
    pub sector: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PersonnelAssignment {
    #[serde(with = "amounts::lenient_id")]
    pub engagement_partner_id: Option<u32>,
    #[serde(with = "amounts::lenient_id")]
    pub audit_manager_id: Option<u32>,
    #[serde(with = "amounts::lenient_id")]
    pub concurring_partner_id: Option<u32>,
}

/// Qualitative answers plus client and personnel details, stored together
/// under one key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdditionalData {
    #[serde(flatten)]
    pub profile: ClientProfile,
    pub client_info: ClientInfo,
    pub personnel_info: PersonnelAssignment,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Everything the wizard edits. Owned by the caller; every mutation is a
/// method so the caller can save after each one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredState", into = "StoredState")]
pub struct AppState {
    pub current_step: WizardStep,
    pub history: YearlyHistory,
    pub profile: ClientProfile,
    pub client_info: ClientInfo,
    pub personnel: PersonnelAssignment,
    pub proposed_fee: ProposedFee,
}

/// Wire layout of the persisted blob.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct StoredState {
    yearly_data: YearlyHistory,
    additional_data: AdditionalData,
    proposed_fee: ProposedFee,
    current_step: WizardStep,
}

impl From<StoredState> for AppState {
    fn from(s: StoredState) -> Self {
        let mut state = AppState {
            current_step: s.current_step,
            history: s.yearly_data,
            profile: s.additional_data.profile,
            client_info: s.additional_data.client_info,
            personnel: s.additional_data.personnel_info,
            proposed_fee: s.proposed_fee,
        };
        state.normalize();
        state
    }
}

impl From<AppState> for StoredState {
    fn from(s: AppState) -> Self {
        StoredState {
            yearly_data: s.history,
            additional_data: AdditionalData {
                profile: s.profile,
                client_info: s.client_info,
                personnel_info: s.personnel,
            },
            proposed_fee: s.proposed_fee,
            current_step: s.current_step,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            current_step: WizardStep::ClientInfo,
            history: YearlyHistory::blank(DEFAULT_YEAR_COUNT),
            profile: ClientProfile::default(),
            client_info: ClientInfo::default(),
            personnel: PersonnelAssignment::default(),
            proposed_fee: ProposedFee::default(),
        }
    }
}

impl AppState {
    /// Qualitative answers, client and personnel details as one value.
    pub fn additional_data(&self) -> AdditionalData {
        AdditionalData {
            profile: self.profile.clone(),
            client_info: self.client_info.clone(),
            personnel_info: self.personnel.clone(),
        }
    }

    /// Repair state restored from storage: an empty history gets the
    /// default blank years back.
    pub fn normalize(&mut self) {
        if self.history.is_empty() {
            warn!("restored state has no year records, restoring default years");
            self.history = YearlyHistory::blank(DEFAULT_YEAR_COUNT);
        }
    }

    // -- financial data and services --------------------------------------

    pub fn set_year_label(&mut self, index: usize, label: &str) -> AuditFeeResult<()> {
        self.history.year_mut(index)?.year_label = label.to_string();
        Ok(())
    }

    pub fn set_financial_value(
        &mut self,
        index: usize,
        field: FinancialField,
        value: Option<Money>,
    ) -> AuditFeeResult<()> {
        self.history.year_mut(index)?.financial_data.set(field, value);
        Ok(())
    }

    pub fn set_service_selected(
        &mut self,
        index: usize,
        service: ServiceKey,
        selected: bool,
    ) -> AuditFeeResult<()> {
        self.history.year_mut(index)?.services.get_mut(service).selected = selected;
        Ok(())
    }

    pub fn set_service_fee(
        &mut self,
        index: usize,
        service: ServiceKey,
        fee: Option<Money>,
    ) -> AuditFeeResult<()> {
        self.history.year_mut(index)?.services.get_mut(service).fee = fee;
        Ok(())
    }

    // -- profile ------------------------------------------------------------

    /// Lenient: unknown types become private with a warning.
    pub fn set_client_type(&mut self, raw: &str) {
        self.profile.client_type = ClientType::coerce(raw);
    }

    /// Percentages outside 0..=100 are ignored; returns whether it was applied.
    pub fn set_inflation_rate_pct(&mut self, pct: Option<Rate>) -> bool {
        self.profile.set_inflation_rate_pct(pct)
    }

    pub fn set_client_info(&mut self, info: ClientInfo) {
        self.client_info = info;
    }

    /// Prefill client details and client type from the directory.
    #[cfg(feature = "directory")]
    pub fn select_directory_client(&mut self, id: u32) -> AuditFeeResult<()> {
        let record = crate::directory::client_by_id(id).ok_or_else(|| {
            crate::error::AuditFeeError::InvalidInput {
                field: "client_id".into(),
                reason: format!("no client with id {id} in the directory"),
            }
        })?;
        self.client_info = record.to_client_info();
        self.profile.client_type = record.client_type();
        Ok(())
    }

    pub fn set_personnel(&mut self, personnel: PersonnelAssignment) {
        self.personnel = personnel;
    }

    // -- navigation ---------------------------------------------------------

    pub fn go_next(&mut self) -> WizardStep {
        self.current_step = self.current_step.next();
        self.current_step
    }

    pub fn go_back(&mut self) -> WizardStep {
        self.current_step = self.current_step.previous();
        self.current_step
    }

    pub fn reset(&mut self) {
        *self = AppState::default();
    }

    /// Whether the data a step collects is complete enough to move on.
    pub fn validate_step(&self, step: WizardStep) -> bool {
        match step {
            WizardStep::ClientInfo => {
                !self.client_info.client_name.trim().is_empty()
                    && self.personnel.engagement_partner_id.is_some()
            }
            WizardStep::FinancialData => self.history.years().iter().any(|y| {
                let d = &y.financial_data;
                d.value_or_zero(FinancialField::RevenueFromOperations) > Decimal::ZERO
                    && d.value_or_zero(FinancialField::SurplusDeficit) > Decimal::ZERO
            }),
            WizardStep::Services => self.history.years().iter().any(|y| y.services.any_selected()),
            WizardStep::QualitativeFactors | WizardStep::Summary => true,
        }
    }

    // -- fees ---------------------------------------------------------------

    /// Replace the proposal wholesale with a fresh recommendation.
    pub fn calculate_proposed_fee(&mut self) -> &ProposedFee {
        self.proposed_fee = recommend_fee(&self.history, &self.profile);
        &self.proposed_fee
    }

    pub fn override_proposed_fee(&mut self, service: ServiceKey, amount: Money) {
        self.proposed_fee.override_fee(service, amount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fees::proposal::FeeMethod;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_state() {
        let s = AppState::default();
        assert_eq!(s.current_step, WizardStep::ClientInfo);
        assert_eq!(s.history.len(), 4);
        assert_eq!(s.history.get(0).unwrap().year_label, "Year 1");
        assert_eq!(s.profile.client_type, ClientType::Private);
        assert!(!s.proposed_fee.is_calculated());
    }

    #[test]
    fn test_navigation_clamps() {
        let mut s = AppState::default();
        assert_eq!(s.go_back(), WizardStep::ClientInfo);
        for _ in 0..10 {
            s.go_next();
        }
        assert_eq!(s.current_step, WizardStep::Summary);
        assert_eq!(s.go_back(), WizardStep::QualitativeFactors);
    }

    #[test]
    fn test_out_of_range_year_index() {
        let mut s = AppState::default();
        let err = s.set_year_label(9, "2030-31").unwrap_err();
        assert!(err.to_string().contains("year_index"));
        assert!(s
            .set_financial_value(3, FinancialField::Borrowings, Some(dec!(10)))
            .is_ok());
    }

    #[test]
    fn test_validate_steps() {
        let mut s = AppState::default();
        assert!(!s.validate_step(WizardStep::ClientInfo));
        s.client_info.client_name = "Acme Ltd".into();
        assert!(!s.validate_step(WizardStep::ClientInfo));
        s.personnel.engagement_partner_id = Some(101);
        assert!(s.validate_step(WizardStep::ClientInfo));

        assert!(!s.validate_step(WizardStep::FinancialData));
        s.set_financial_value(1, FinancialField::RevenueFromOperations, Some(dec!(500)))
            .unwrap();
        assert!(!s.validate_step(WizardStep::FinancialData));
        s.set_financial_value(1, FinancialField::SurplusDeficit, Some(dec!(40)))
            .unwrap();
        assert!(s.validate_step(WizardStep::FinancialData));

        assert!(!s.validate_step(WizardStep::Services));
        s.set_service_selected(2, ServiceKey::TaxAudit, true).unwrap();
        assert!(s.validate_step(WizardStep::Services));

        assert!(s.validate_step(WizardStep::QualitativeFactors));
        assert!(s.validate_step(WizardStep::Summary));
    }

    #[test]
    fn test_calculate_replaces_proposal() {
        let mut s = AppState::default();
        s.set_year_label(0, "2023-24").unwrap();
        s.set_service_selected(0, ServiceKey::StatutoryAudit, true).unwrap();
        s.set_service_fee(0, ServiceKey::StatutoryAudit, Some(dec!(200000)))
            .unwrap();

        let fee = s.calculate_proposed_fee().clone();
        assert_eq!(fee.method, FeeMethod::CagrRules);
        assert_eq!(fee.total, dec!(230000));

        s.override_proposed_fee(ServiceKey::TaxAudit, dec!(15000));
        assert_eq!(s.proposed_fee.total, dec!(245000));

        s.calculate_proposed_fee();
        assert_eq!(s.proposed_fee.total, dec!(230000));
        assert_eq!(s.proposed_fee.fee(ServiceKey::TaxAudit), None);
    }

    #[test]
    fn test_client_type_and_inflation_setters() {
        let mut s = AppState::default();
        s.set_client_type("list");
        assert_eq!(s.profile.client_type, ClientType::Listed);
        s.set_client_type("mutual");
        assert_eq!(s.profile.client_type, ClientType::Private);

        assert!(s.set_inflation_rate_pct(Some(dec!(6.5))));
        assert!(!s.set_inflation_rate_pct(Some(dec!(-1))));
        assert_eq!(s.profile.inflation_rate(), dec!(0.065));
    }

    #[test]
    fn test_wire_layout_nests_profile_in_additional_data() {
        let mut s = AppState::default();
        s.current_step = WizardStep::Services;
        s.profile.client_type = ClientType::Llp;
        s.client_info.client_name = "Acme".into();
        s.personnel.audit_manager_id = Some(202);

        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["currentStep"], 3);
        assert_eq!(json["additionalData"]["clientType"], "llp");
        assert_eq!(json["additionalData"]["clientInfo"]["clientName"], "Acme");
        assert_eq!(json["additionalData"]["personnelInfo"]["auditManagerId"], 202);
        assert_eq!(json["yearlyData"].as_array().unwrap().len(), 4);

        let back: AppState = serde_json::from_value(json).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn test_restore_repairs_empty_history_and_bad_step() {
        let s: AppState =
            serde_json::from_str(r#"{"yearlyData": [], "currentStep": 42}"#).unwrap();
        assert_eq!(s.history.len(), 4);
        assert_eq!(s.current_step, WizardStep::Summary);
    }

    #[cfg(feature = "directory")]
    #[test]
    fn test_select_directory_client() {
        let mut s = AppState::default();
        s.select_directory_client(3).unwrap();
        assert_eq!(s.client_info.client_name, "Global Finance India Ltd.");
        assert_eq!(s.client_info.client_id, Some(3));
        assert_eq!(s.profile.client_type, ClientType::Listed);
        assert!(s.select_directory_client(42).is_err());
    }
}
