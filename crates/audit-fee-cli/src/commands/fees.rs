use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use audit_fee_core::engagement::{ClientProfile, ClientType, YearlyHistory};
use audit_fee_core::fees::cagr_rules::{self, CagrFeeInput};
use audit_fee_core::fees::multiplier::{self, MultiplierFeeInput};
use audit_fee_core::fees::proposal::{self, RecommendationInput};
use audit_fee_core::wizard::AppState;

use crate::config::StorageConfig;
use crate::input;

/// Where an engine reads its engagement from
#[derive(Args)]
pub struct EngagementArgs {
    /// Path to a JSON or YAML input file (overrides the saved wizard state)
    #[arg(long)]
    pub input: Option<String>,

    /// Use the history and profile saved by the wizard
    #[arg(long)]
    pub from_state: bool,

    /// Override the client type (listed, public, private, smc, llp, section8)
    #[arg(long)]
    pub client_type: Option<String>,
}

/// Arguments for the CAGR rule engine
#[derive(Args)]
pub struct CagrFeeArgs {
    #[command(flatten)]
    pub engagement: EngagementArgs,

    /// Inflation in percent (6 = 6%); overrides the input's rate
    #[arg(long)]
    pub inflation_pct: Option<Decimal>,
}

pub fn run_cagr_fee(
    args: CagrFeeArgs,
    storage: &StorageConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut cagr_input: CagrFeeInput = if let Some(ref path) = args.engagement.input {
        input::file::read_input(path)?
    } else if args.engagement.from_state {
        let state = saved_state(storage)?;
        CagrFeeInput {
            inflation_rate: state.profile.inflation_rate(),
            history: state.history,
        }
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file>, stdin or --from-state required for cagr-fee".into());
    };

    if let Some(pct) = args.inflation_pct {
        let mut profile = ClientProfile::default();
        if !profile.set_inflation_rate_pct(Some(pct)) {
            return Err(format!("--inflation-pct must be between 0 and 100, got {pct}").into());
        }
        cagr_input.inflation_rate = profile.inflation_rate();
    }

    let result = cagr_rules::calculate_cagr_fee(&cagr_input);
    Ok(serde_json::to_value(result)?)
}

/// Arguments for the multiplier schedule engine
#[derive(Args)]
pub struct MultiplierFeeArgs {
    #[command(flatten)]
    pub engagement: EngagementArgs,
}

pub fn run_multiplier_fee(
    args: MultiplierFeeArgs,
    storage: &StorageConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let (history, profile) = load_engagement(&args.engagement, storage, "multiplier-fee")?;
    let result = multiplier::calculate_multiplier_fees(&MultiplierFeeInput { history, profile });
    Ok(serde_json::to_value(result)?)
}

/// Arguments for the recommended fee
#[derive(Args)]
pub struct RecommendArgs {
    #[command(flatten)]
    pub engagement: EngagementArgs,
}

pub fn run_recommend(
    args: RecommendArgs,
    storage: &StorageConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let (history, profile) = load_engagement(&args.engagement, storage, "recommend")?;
    let result = proposal::calculate_recommendation(&RecommendationInput { history, profile });
    Ok(serde_json::to_value(result)?)
}

/// Arguments for the side-by-side comparison
#[derive(Args)]
pub struct CompareArgs {
    #[command(flatten)]
    pub engagement: EngagementArgs,
}

pub fn run_compare(
    args: CompareArgs,
    storage: &StorageConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let (history, profile) = load_engagement(&args.engagement, storage, "compare")?;
    let result = proposal::calculate_comparison(&RecommendationInput { history, profile });
    Ok(serde_json::to_value(result)?)
}

fn load_engagement(
    args: &EngagementArgs,
    storage: &StorageConfig,
    command: &str,
) -> Result<(YearlyHistory, ClientProfile), Box<dyn std::error::Error>> {
    let (history, mut profile) = if let Some(ref path) = args.input {
        let data: RecommendationInput = input::file::read_input(path)?;
        (data.history, data.profile)
    } else if args.from_state {
        let state = saved_state(storage)?;
        (state.history, state.profile)
    } else if let Some(data) = input::stdin::read_stdin()? {
        let data: RecommendationInput = serde_json::from_value(data)?;
        (data.history, data.profile)
    } else {
        return Err(format!("--input <file>, stdin or --from-state required for {command}").into());
    };

    if let Some(ref raw) = args.client_type {
        profile.client_type = raw.parse::<ClientType>()?;
    }
    Ok((history, profile))
}

pub(crate) fn saved_state(storage: &StorageConfig) -> Result<AppState, Box<dyn std::error::Error>> {
    let store = storage.store();
    store
        .load()
        .ok_or_else(|| format!("no saved wizard state at {}", store.path().display()).into())
}
