pub mod cagr_rules;
pub mod multiplier;
pub mod proposal;

#[cfg(feature = "flat")]
pub mod flat;

#[cfg(feature = "indicative")]
pub mod indicative;

pub use cagr_rules::{calculate_cagr_fee, cagr_fee, CagrFeeInput, CagrFeeOutput, FeeMetrics, GrowthRule};
pub use multiplier::{calculate_multiplier_fees, multiplier_fees, MultiplierFeeInput, MultiplierFeeOutput};
pub use proposal::{compare_methods, recommend_fee, FeeComparison, FeeMethod, ProposedFee};
