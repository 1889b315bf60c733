use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;

use audit_fee_core::directory;
use audit_fee_core::engagement::ServiceKey;
use audit_fee_core::fees::{cagr_rules, flat, indicative, multiplier, proposal};
use audit_fee_core::format;
use audit_fee_core::growth;
use audit_fee_core::wizard::{AppState, ExportDocument, WizardStep};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse_state(state_json: &str) -> NapiResult<AppState> {
    serde_json::from_str(state_json).map_err(to_napi_error)
}

fn parse_decimal(raw: &str, field: &str) -> NapiResult<Decimal> {
    raw.trim()
        .parse::<Decimal>()
        .map_err(|e| to_napi_error(format!("{field}: {e}")))
}

// ---------------------------------------------------------------------------
// Fee engines
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_cagr_fee(input_json: String) -> NapiResult<String> {
    let input: cagr_rules::CagrFeeInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = cagr_rules::calculate_cagr_fee(&input);
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn calculate_multiplier_fees(input_json: String) -> NapiResult<String> {
    let input: multiplier::MultiplierFeeInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = multiplier::calculate_multiplier_fees(&input);
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn recommend_fee(input_json: String) -> NapiResult<String> {
    let input: proposal::RecommendationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = proposal::calculate_recommendation(&input);
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn compare_fee_methods(input_json: String) -> NapiResult<String> {
    let input: proposal::RecommendationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = proposal::calculate_comparison(&input);
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn calculate_flat_fees(input_json: String) -> NapiResult<String> {
    let input: flat::FlatFeeInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = flat::calculate_flat_fees(&input);
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn calculate_indicative_fee(input_json: String) -> NapiResult<String> {
    let input: indicative::IndicativeFeeInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = indicative::calculate_indicative_fee(&input);
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct CagrInput {
    initial: Decimal,
    #[serde(rename = "final")]
    final_value: Decimal,
    years: u32,
}

/// `{"initial": .., "final": .., "years": n}` -> the rate as a decimal string.
#[napi]
pub fn calculate_cagr(input_json: String) -> NapiResult<String> {
    let input: CagrInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    Ok(growth::cagr(input.initial, input.final_value, input.years).to_string())
}

// ---------------------------------------------------------------------------
// Wizard
//
// The host owns the state; each call takes it as JSON (the persisted blob
// layout) and returns the updated blob.
// ---------------------------------------------------------------------------

#[napi]
pub fn validate_wizard_step(state_json: String, step: u32) -> NapiResult<bool> {
    let state = parse_state(&state_json)?;
    Ok(state.validate_step(WizardStep::from_number(i64::from(step))))
}

#[napi]
pub fn calculate_proposed_fee(state_json: String) -> NapiResult<String> {
    let mut state = parse_state(&state_json)?;
    state.calculate_proposed_fee();
    serde_json::to_string(&state).map_err(to_napi_error)
}

#[napi]
pub fn override_proposed_fee(state_json: String, service: String, amount: String) -> NapiResult<String> {
    let mut state = parse_state(&state_json)?;
    let service: ServiceKey = service.parse().map_err(to_napi_error)?;
    state.override_proposed_fee(service, parse_decimal(&amount, "amount")?);
    serde_json::to_string(&state).map_err(to_napi_error)
}

#[napi]
pub fn export_engagement(state_json: String) -> NapiResult<String> {
    let state = parse_state(&state_json)?;
    let doc = ExportDocument::from_state(&state, chrono::Utc::now());
    doc.to_json_pretty().map_err(to_napi_error)
}

#[napi]
pub fn export_file_name(export_json: String) -> NapiResult<String> {
    let doc = ExportDocument::from_json(&export_json).map_err(to_napi_error)?;
    Ok(doc.file_name())
}

#[napi]
pub fn import_engagement(export_json: String) -> NapiResult<String> {
    let doc = ExportDocument::from_json(&export_json).map_err(to_napi_error)?;
    serde_json::to_string(&doc.into_state()).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Directory
// ---------------------------------------------------------------------------

#[napi]
pub fn search_clients(query: String) -> NapiResult<String> {
    serde_json::to_string(&directory::search_clients(&query)).map_err(to_napi_error)
}

#[napi]
pub fn get_client(id: u32) -> NapiResult<Option<String>> {
    directory::client_by_id(id)
        .map(|c| serde_json::to_string(c).map_err(to_napi_error))
        .transpose()
}

/// All personnel, or those with the given role ("partner" / "manager").
#[napi]
pub fn list_personnel(role: Option<String>) -> NapiResult<String> {
    let people = match role {
        Some(ref r) => directory::personnel_by_role(r),
        None => directory::personnel().iter().collect(),
    };
    serde_json::to_string(&people).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

#[napi]
pub fn format_inr(amount: String, with_symbol: bool) -> NapiResult<String> {
    Ok(format::format_inr(parse_decimal(&amount, "amount")?, with_symbol))
}

#[napi]
pub fn convert_unit(value: String, from: String, to: String) -> NapiResult<String> {
    let from: format::Unit = from.parse().map_err(to_napi_error)?;
    let to: format::Unit = to.parse().map_err(to_napi_error)?;
    Ok(format::convert_unit(parse_decimal(&value, "value")?, from, to).to_string())
}
