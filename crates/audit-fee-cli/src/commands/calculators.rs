use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use audit_fee_core::engagement::{ClientType, FinancialField, YearRecord, YearlyHistory};
use audit_fee_core::fees::flat::{self, FlatFeeInput, FlatProfile};
use audit_fee_core::fees::indicative::{self, ComplexityFactor, IndicativeFeeInput, IndicativeService};

use crate::input;

/// Arguments for the flat schedule calculator
#[derive(Args)]
pub struct FlatFeeArgs {
    /// Path to a JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Fee schedule (mri or interchange)
    #[arg(long, default_value = "mri")]
    pub profile: FlatProfile,

    /// Annual revenue in millions
    #[arg(long, allow_hyphen_values = true)]
    pub revenue_millions: Option<Decimal>,

    /// Internal financial controls reporting required
    #[arg(long)]
    pub ifc: bool,

    /// Registered for GST
    #[arg(long)]
    pub gst: bool,

    /// Has foreign or related-party cross-border transactions
    #[arg(long)]
    pub foreign: bool,

    /// Transfer pricing documentation required (only with --foreign)
    #[arg(long)]
    pub tp_doc: bool,
}

pub fn run_flat_fee(args: FlatFeeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let flat_input: FlatFeeInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(revenue) = args.revenue_millions {
        FlatFeeInput {
            profile: args.profile,
            revenue_millions: revenue,
            requires_ifc: args.ifc,
            gst_registered: args.gst,
            foreign_transactions: args.foreign,
            requires_tp_doc: args.tp_doc,
        }
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--revenue-millions is required (or provide --input)".into());
    };

    let result = flat::calculate_flat_fees(&flat_input);
    Ok(serde_json::to_value(result)?)
}

/// Arguments for the indicative slab calculator
#[derive(Args)]
pub struct IndicativeFeeArgs {
    /// Path to a JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Total revenue in lakhs
    #[arg(long)]
    pub revenue: Option<Decimal>,

    /// Total assets in lakhs
    #[arg(long)]
    pub total_assets: Option<Decimal>,

    /// Borrowings in lakhs
    #[arg(long)]
    pub borrowings: Option<Decimal>,

    /// Client type (listed, public, private, smc, llp, section8)
    #[arg(long, default_value = "private")]
    pub client_type: ClientType,

    /// Additional services, by label (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub services: Vec<String>,

    /// Complexity factors, by label (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub complexity: Vec<String>,
}

pub fn run_indicative_fee(args: IndicativeFeeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let indicative_input: IndicativeFeeInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(revenue) = args.revenue {
        let mut year = YearRecord::new("current");
        let data = &mut year.financial_data;
        data.set(FinancialField::TotalRevenue, Some(revenue));
        data.set(FinancialField::TotalAssets, args.total_assets);
        data.set(FinancialField::Borrowings, args.borrowings);
        IndicativeFeeInput {
            history: YearlyHistory::new(vec![year]),
            services: args
                .services
                .iter()
                .map(|s| IndicativeService::from(s.trim()))
                .collect(),
            complexity_factors: args
                .complexity
                .iter()
                .map(|s| ComplexityFactor::from(s.trim()))
                .collect(),
            client_type: args.client_type,
        }
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--revenue is required (or provide --input)".into());
    };

    let result = indicative::calculate_indicative_fee(&indicative_input);
    Ok(serde_json::to_value(result)?)
}
