use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::{AdditionalData, AppState, ClientInfo, PersonnelAssignment, WizardStep};
use crate::engagement::{ClientType, YearlyHistory};
use crate::fees::proposal::ProposedFee;
use crate::AuditFeeResult;

/// Snapshot of an engagement for download or hand-off.
///
/// Client, personnel and client type are repeated at the top level next to
/// the full additional data so the file reads well on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    #[serde(default)]
    pub client_info: ClientInfo,
    #[serde(default)]
    pub personnel_info: PersonnelAssignment,
    #[serde(default)]
    pub client_type: ClientType,
    #[serde(default)]
    pub yearly_data: YearlyHistory,
    #[serde(default)]
    pub additional_data: AdditionalData,
    #[serde(default)]
    pub proposed_fee: ProposedFee,
    pub export_date: DateTime<Utc>,
}

impl ExportDocument {
    pub fn from_state(state: &AppState, now: DateTime<Utc>) -> Self {
        Self {
            client_info: state.client_info.clone(),
            personnel_info: state.personnel.clone(),
            client_type: state.profile.client_type,
            yearly_data: state.history.clone(),
            additional_data: state.additional_data(),
            proposed_fee: state.proposed_fee.clone(),
            export_date: now,
        }
    }

    pub fn to_json_pretty(&self) -> AuditFeeResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(raw: &str) -> AuditFeeResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Rebuild wizard state, landing on the summary step. The top-level
    /// client and personnel copies win over those inside `additional_data`.
    pub fn into_state(self) -> AppState {
        let mut profile = self.additional_data.profile;
        profile.client_type = self.client_type;
        let mut state = AppState {
            current_step: WizardStep::Summary,
            history: self.yearly_data,
            profile,
            client_info: self.client_info,
            personnel: self.personnel_info,
            proposed_fee: self.proposed_fee,
        };
        state.normalize();
        state
    }

    /// `audit-fee-data-<client>-<YYYY-MM-DD>.json`, "client" when unnamed.
    /// Path separators and other characters unsafe in a file name become `-`.
    pub fn file_name(&self) -> String {
        let name = self.client_info.client_name.trim();
        let name: String = if name.is_empty() {
            "client".into()
        } else {
            name.chars()
                .map(|c| {
                    if c.is_alphanumeric() || matches!(c, ' ' | '.' | '_' | '&' | '-') {
                        c
                    } else {
                        '-'
                    }
                })
                .collect()
        };
        format!(
            "audit-fee-data-{}-{}.json",
            name,
            self.export_date.format("%Y-%m-%d")
        )
    }
}
