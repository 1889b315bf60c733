use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use audit_fee_core::format::{convert_unit, format_indian_number, format_inr, percentage_change, Unit};
use audit_fee_core::growth;
use audit_fee_core::pct_display;

/// Arguments for a plain compound annual growth rate
#[derive(Args)]
pub struct CagrArgs {
    /// Value at the start of the period
    #[arg(long, allow_hyphen_values = true)]
    pub initial: Decimal,

    /// Value at the end of the period
    #[arg(long = "final", allow_hyphen_values = true)]
    pub final_value: Decimal,

    /// Number of years between the two values
    #[arg(long)]
    pub years: u32,
}

pub fn run_cagr(args: CagrArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let rate = growth::cagr(args.initial, args.final_value, args.years);
    Ok(json!({
        "initial": args.initial,
        "final": args.final_value,
        "years": args.years,
        "cagr": rate,
        "cagr_pct": pct_display(rate),
        "change": percentage_change(args.initial, args.final_value, 2),
    }))
}

/// Arguments for lakh/million conversion
#[derive(Args)]
pub struct ConvertArgs {
    /// Amount to convert
    #[arg(long, allow_hyphen_values = true)]
    pub value: Decimal,

    /// Unit of the amount (lakhs or millions)
    #[arg(long)]
    pub from: Unit,

    /// Target unit (lakhs or millions)
    #[arg(long)]
    pub to: Unit,
}

pub fn run_convert(args: ConvertArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let converted = convert_unit(args.value, args.from, args.to);
    Ok(json!({
        "value": args.value,
        "from": args.from,
        "to": args.to,
        "converted": converted,
        "formatted": format!("{} {}", format_indian_number(converted), args.to),
    }))
}

/// Arguments for rupee formatting
#[derive(Args)]
pub struct InrArgs {
    /// Amount in rupees
    #[arg(long, allow_hyphen_values = true)]
    pub amount: Decimal,

    /// Leave out the rupee symbol
    #[arg(long)]
    pub no_symbol: bool,
}

pub fn run_inr(args: InrArgs) -> Result<Value, Box<dyn std::error::Error>> {
    Ok(json!({
        "amount": args.amount,
        "formatted": format_inr(args.amount, !args.no_symbol),
    }))
}
