use chrono::Utc;
use clap::{Args, Subcommand};
use rust_decimal::Decimal;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use audit_fee_core::amounts::parse_amount;
use audit_fee_core::engagement::{FinancialField, ServiceKey};
use audit_fee_core::format::format_inr;
use audit_fee_core::wizard::{AppState, ExportDocument, WizardStep};

use crate::config::StorageConfig;
use crate::input;

/// Drive the five-step engagement wizard. State is saved after every change.
#[derive(Args)]
pub struct WizardArgs {
    #[command(subcommand)]
    pub command: WizardCommand,
}

#[derive(Subcommand)]
pub enum WizardCommand {
    /// Show the current step and everything entered so far
    Show,
    /// Move to the next step once the current one is complete
    Next {
        /// Move on even if the current step is incomplete
        #[arg(long)]
        force: bool,
    },
    /// Move to the previous step
    Back,
    /// Discard all entered data and start again
    Reset,
    /// Rename a year column, e.g. "2023-24"
    SetLabel {
        /// Year position (0-based)
        index: usize,
        label: String,
    },
    /// Enter a financial figure for a year (in lakhs); an empty value clears it
    SetFinancial {
        /// Year position (0-based)
        index: usize,
        /// revenueFromOperations, totalRevenue, surplusDeficit, totalAssets,
        /// employeeBenefitExpense or borrowings
        field: FinancialField,
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
    /// Tick a service and/or record its fee for a year
    SetService {
        /// Year position (0-based)
        index: usize,
        /// Service key, e.g. statutoryAudit or tax-audit
        service: ServiceKey,
        /// Whether the service was provided
        #[arg(long)]
        selected: Option<bool>,
        /// Fee charged; an empty value clears it
        #[arg(long, allow_hyphen_values = true)]
        fee: Option<String>,
    },
    /// Client details; --directory-id prefills from the client directory
    SetClient(SetClientArgs),
    /// Assign engagement personnel by directory id
    SetPersonnel {
        #[arg(long)]
        engagement_partner: Option<u32>,
        #[arg(long)]
        audit_manager: Option<u32>,
        #[arg(long)]
        concurring_partner: Option<u32>,
    },
    /// Answer the qualitative questions
    SetProfile(SetProfileArgs),
    /// Replace the proposal with a fresh recommendation
    Calculate,
    /// Manually set the proposed fee for one service
    Override {
        service: ServiceKey,
        /// Amount in rupees; negative amounts are stored as zero
        #[arg(allow_hyphen_values = true)]
        amount: Decimal,
    },
    /// Write the engagement to audit-fee-data-<client>-<date>.json
    Export {
        /// Directory to write into
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Load a previously exported engagement and jump to the summary
    Import {
        /// Path to an exported JSON file
        path: String,
    },
}

#[derive(Args)]
pub struct SetClientArgs {
    /// Prefill from the built-in directory
    #[arg(long)]
    pub directory_id: Option<u32>,
    #[arg(long)]
    pub name: Option<String>,
    /// listed, public, private, smc, llp or section8 (unknown values fall back to private)
    #[arg(long)]
    pub client_type: Option<String>,
    #[arg(long)]
    pub cin: Option<String>,
    #[arg(long)]
    pub pan: Option<String>,
    #[arg(long)]
    pub sector: Option<String>,
    /// Latest turnover in lakhs
    #[arg(long)]
    pub turnover: Option<String>,
}

#[derive(Args)]
pub struct SetProfileArgs {
    #[arg(long)]
    pub complex_group: Option<bool>,
    #[arg(long)]
    pub international: Option<bool>,
    #[arg(long)]
    pub regulatory_changes: Option<bool>,
    #[arg(long)]
    pub multiple_branches: Option<bool>,
    #[arg(long)]
    pub branches: Option<u32>,
    /// Inflation in percent (0-100); an empty value clears it
    #[arg(long)]
    pub inflation_pct: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
}

pub fn run_wizard(
    args: WizardArgs,
    storage: &StorageConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let store = storage.store();
    let mut state = store.load_or_default();

    match args.command {
        WizardCommand::Show => return Ok(summary(&state, None)),
        WizardCommand::Next { force } => {
            let step = state.current_step;
            if !force && !state.validate_step(step) {
                return Err(format!("{step} is incomplete: {}", missing_for(step)).into());
            }
            if state.go_next() == WizardStep::Summary && step == WizardStep::QualitativeFactors {
                state.calculate_proposed_fee();
            }
        }
        WizardCommand::Back => {
            state.go_back();
        }
        WizardCommand::Reset => {
            state.reset();
            let cleared = store.clear();
            return Ok(summary(&state, Some(cleared)));
        }
        WizardCommand::SetLabel { index, label } => state.set_year_label(index, &label)?,
        WizardCommand::SetFinancial {
            index,
            field,
            value,
        } => state.set_financial_value(index, field, parse_amount(&value))?,
        WizardCommand::SetService {
            index,
            service,
            selected,
            fee,
        } => {
            if let Some(selected) = selected {
                state.set_service_selected(index, service, selected)?;
            }
            if let Some(ref fee) = fee {
                state.set_service_fee(index, service, parse_amount(fee))?;
            }
        }
        WizardCommand::SetClient(client) => apply_client(&mut state, client)?,
        WizardCommand::SetPersonnel {
            engagement_partner,
            audit_manager,
            concurring_partner,
        } => {
            let mut personnel = state.personnel.clone();
            if engagement_partner.is_some() {
                personnel.engagement_partner_id = engagement_partner;
            }
            if audit_manager.is_some() {
                personnel.audit_manager_id = audit_manager;
            }
            if concurring_partner.is_some() {
                personnel.concurring_partner_id = concurring_partner;
            }
            state.set_personnel(personnel);
        }
        WizardCommand::SetProfile(profile) => apply_profile(&mut state, profile)?,
        WizardCommand::Calculate => {
            state.calculate_proposed_fee();
        }
        WizardCommand::Override { service, amount } => {
            state.override_proposed_fee(service, amount);
        }
        WizardCommand::Export { out_dir } => return export(&state, &out_dir),
        WizardCommand::Import { path } => {
            let resolved = input::file::resolve_path(&path)?;
            let raw = input::file::read_text(&resolved)?;
            state = ExportDocument::from_json(&raw)?.into_state();
            info!(path = %resolved.display(), "engagement imported");
        }
    }

    let saved = store.save(&state);
    Ok(summary(&state, Some(saved)))
}

fn apply_client(
    state: &mut AppState,
    args: SetClientArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(id) = args.directory_id {
        state.select_directory_client(id)?;
    }
    let mut info = state.client_info.clone();
    if let Some(name) = args.name {
        info.client_name = name;
    }
    if let Some(cin) = args.cin {
        info.cin = cin;
    }
    if let Some(pan) = args.pan {
        info.pan = pan;
    }
    if let Some(sector) = args.sector {
        info.sector = sector;
    }
    if let Some(ref turnover) = args.turnover {
        info.latest_turnover = parse_amount(turnover);
    }
    state.set_client_info(info);
    if let Some(ref raw) = args.client_type {
        state.set_client_type(raw);
    }
    Ok(())
}

fn apply_profile(
    state: &mut AppState,
    args: SetProfileArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(ref raw) = args.inflation_pct {
        let pct = parse_amount(raw);
        if !state.set_inflation_rate_pct(pct) {
            return Err(format!("inflation must be between 0 and 100 percent, got '{raw}'").into());
        }
    }
    let profile = &mut state.profile;
    if let Some(v) = args.complex_group {
        profile.has_complex_group_structure = v;
    }
    if let Some(v) = args.international {
        profile.has_international_transactions = v;
    }
    if let Some(v) = args.regulatory_changes {
        profile.has_regulatory_changes = v;
    }
    if let Some(v) = args.multiple_branches {
        profile.has_multiple_branches = v;
    }
    if let Some(n) = args.branches {
        profile.number_of_branches = n;
    }
    if let Some(notes) = args.notes {
        profile.additional_notes = notes;
    }
    Ok(())
}

fn export(state: &AppState, out_dir: &Path) -> Result<Value, Box<dyn std::error::Error>> {
    let doc = ExportDocument::from_state(state, Utc::now());
    fs::create_dir_all(out_dir)
        .map_err(|e| format!("Failed to create '{}': {}", out_dir.display(), e))?;
    let path = out_dir.join(doc.file_name());
    fs::write(&path, doc.to_json_pretty()?)
        .map_err(|e| format!("Failed to write '{}': {}", path.display(), e))?;
    info!(path = %path.display(), "engagement exported");
    Ok(json!({
        "path": path.display().to_string(),
        "client_name": doc.client_info.client_name,
        "export_date": doc.export_date,
        "total": doc.proposed_fee.total,
    }))
}

fn missing_for(step: WizardStep) -> &'static str {
    match step {
        WizardStep::ClientInfo => "enter a client name and an engagement partner",
        WizardStep::FinancialData => {
            "enter revenue from operations and surplus/deficit for at least one year"
        }
        WizardStep::Services => "select at least one service",
        WizardStep::QualitativeFactors | WizardStep::Summary => "nothing required",
    }
}

/// Step header, completion flags and the proposal in rupees, followed by
/// the raw state.
fn summary(state: &AppState, saved: Option<bool>) -> Value {
    let step = state.current_step;
    let mut out = Map::new();
    out.insert("step".into(), json!(step.to_string()));
    out.insert("step_number".into(), json!(step.number()));
    out.insert("step_complete".into(), json!(state.validate_step(step)));
    if let Some(saved) = saved {
        out.insert("saved".into(), json!(saved));
    }
    out.insert("client_name".into(), json!(state.client_info.client_name));
    out.insert("client_type".into(), json!(state.profile.client_type.display_name()));

    if state.proposed_fee.is_calculated() {
        let fee = &state.proposed_fee;
        let lines: Map<String, Value> = fee
            .fees
            .iter()
            .map(|(service, amount)| (service.label().to_string(), json!(format_inr(*amount, true))))
            .collect();
        out.insert("proposed_total".into(), json!(format_inr(fee.total, true)));
        out.insert("proposed_fees".into(), Value::Object(lines));
        out.insert("method".into(), json!(fee.method));
        out.insert("explanation".into(), json!(fee.explanation));
    }
    out.insert(
        "state".into(),
        serde_json::to_value(state).unwrap_or(Value::Null),
    );
    Value::Object(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(tag: &str) -> StorageConfig {
        StorageConfig {
            state_dir: std::env::temp_dir()
                .join(format!("afe-cli-wizard-{tag}-{}", std::process::id())),
            state_key: "wizard".into(),
        }
    }

    fn run(storage: &StorageConfig, command: WizardCommand) -> Value {
        run_wizard(WizardArgs { command }, storage).unwrap()
    }

    #[test]
    fn test_next_refuses_incomplete_step_unless_forced() {
        let storage = storage("next");
        let err = run_wizard(
            WizardArgs {
                command: WizardCommand::Next { force: false },
            },
            &storage,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Step 1 of 5"));

        let out = run(&storage, WizardCommand::Next { force: true });
        assert_eq!(out["step_number"], 2);
        assert_eq!(out["saved"], true);
        let _ = fs::remove_dir_all(&storage.state_dir);
    }

    #[test]
    fn test_edits_survive_between_invocations() {
        let storage = storage("persist");
        run(
            &storage,
            WizardCommand::SetFinancial {
                index: 3,
                field: FinancialField::RevenueFromOperations,
                value: "1250".into(),
            },
        );
        run(
            &storage,
            WizardCommand::SetService {
                index: 3,
                service: ServiceKey::StatutoryAudit,
                selected: Some(true),
                fee: Some("150000".into()),
            },
        );
        let out = run(&storage, WizardCommand::Show);
        let years = &out["state"]["yearlyData"];
        assert_eq!(years[3]["financialData"]["revenueFromOperations"], "1250");
        assert_eq!(years[3]["services"]["statutoryAudit"]["selected"], true);
        assert!(out.get("saved").is_none());

        let out = run(&storage, WizardCommand::Reset);
        assert_eq!(out["step_number"], 1);
        assert!(!storage.store().has_saved());
        let _ = fs::remove_dir_all(&storage.state_dir);
    }

    #[test]
    fn test_out_of_range_year_is_an_error() {
        let storage = storage("range");
        let result = run_wizard(
            WizardArgs {
                command: WizardCommand::SetLabel {
                    index: 9,
                    label: "2030-31".into(),
                },
            },
            &storage,
        );
        assert!(result.is_err());
        let _ = fs::remove_dir_all(&storage.state_dir);
    }

    #[test]
    fn test_calculate_then_override_shows_rupees() {
        let storage = storage("override");
        run(
            &storage,
            WizardCommand::SetService {
                index: 0,
                service: ServiceKey::StatutoryAudit,
                selected: Some(true),
                fee: Some("100000".into()),
            },
        );
        run(&storage, WizardCommand::Calculate);
        let out = run(
            &storage,
            WizardCommand::Override {
                service: ServiceKey::TaxAudit,
                amount: Decimal::new(50000, 0),
            },
        );
        assert_eq!(out["method"], "manual");
        assert_eq!(out["proposed_fees"]["Tax Audit"], "₹50,000.00");
        let _ = fs::remove_dir_all(&storage.state_dir);
    }

    #[test]
    fn test_rejected_inflation_leaves_state_untouched() {
        let storage = storage("inflation");
        let result = run_wizard(
            WizardArgs {
                command: WizardCommand::SetProfile(SetProfileArgs {
                    complex_group: Some(true),
                    international: None,
                    regulatory_changes: None,
                    multiple_branches: None,
                    branches: None,
                    inflation_pct: Some("250".into()),
                    notes: None,
                }),
            },
            &storage,
        );
        assert!(result.is_err());
        assert!(!storage.store().has_saved());
        let _ = fs::remove_dir_all(&storage.state_dir);
    }

    #[test]
    fn test_export_then_import_lands_on_summary() {
        let storage = storage("export");
        run(
            &storage,
            WizardCommand::SetClient(SetClientArgs {
                directory_id: Some(2),
                name: None,
                client_type: None,
                cin: None,
                pan: None,
                sector: None,
                turnover: None,
            }),
        );
        let out_dir = storage.state_dir.join("exports");
        let exported = run(
            &storage,
            WizardCommand::Export {
                out_dir: out_dir.clone(),
            },
        );
        assert_eq!(exported["client_name"], "XYZ Technology Solutions Pvt. Ltd.");
        let path = exported["path"].as_str().unwrap().to_string();

        run(&storage, WizardCommand::Reset);
        let out = run(&storage, WizardCommand::Import { path });
        assert_eq!(out["step_number"], 5);
        assert_eq!(out["client_name"], "XYZ Technology Solutions Pvt. Ltd.");
        assert_eq!(out["client_type"], "Private Company");
        let _ = fs::remove_dir_all(&storage.state_dir);
    }

    #[test]
    fn test_export_keeps_slashed_client_name_inside_out_dir() {
        let storage = storage("export-slash");
        run(
            &storage,
            WizardCommand::SetClient(SetClientArgs {
                directory_id: None,
                name: Some("M/s Sharma & Co".into()),
                client_type: None,
                cin: None,
                pan: None,
                sector: None,
                turnover: None,
            }),
        );
        let out_dir = storage.state_dir.join("exports");
        let exported = run(
            &storage,
            WizardCommand::Export {
                out_dir: out_dir.clone(),
            },
        );
        let path = PathBuf::from(exported["path"].as_str().unwrap());
        assert_eq!(path.parent(), Some(out_dir.as_path()));
        assert!(path.is_file());
        let name = path.file_name().unwrap().to_str().unwrap().to_string();
        assert!(name.starts_with("audit-fee-data-M-s Sharma & Co-"), "got {name}");
        let _ = fs::remove_dir_all(&storage.state_dir);
    }
}
