use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;

use crate::engagement::{FinancialField, YearRecord, YearlyHistory};
use crate::types::{Money, Rate};

/// Compound annual growth rate: `(final / initial)^(1 / years) - 1`.
///
/// Returns zero when `initial <= 0` or `years == 0`. A negative ending value
/// has no real root and also yields zero; a zero ending value yields -100%.
pub fn cagr(initial: Money, final_value: Money, years: u32) -> Rate {
    if initial <= Decimal::ZERO || years == 0 {
        return Decimal::ZERO;
    }

    let ratio = match final_value.checked_div(initial) {
        Some(r) => r,
        None => return Decimal::ZERO,
    };
    if ratio == Decimal::ONE {
        return Decimal::ZERO;
    }
    if ratio.is_zero() {
        return -Decimal::ONE;
    }
    if ratio < Decimal::ZERO {
        return Decimal::ZERO;
    }
    if years == 1 {
        return ratio - Decimal::ONE;
    }

    let exponent = Decimal::ONE / Decimal::from(years);
    match ratio.checked_powd(exponent) {
        Some(root) => root - Decimal::ONE,
        None => Decimal::ZERO,
    }
}

/// Present, strictly positive values of `field`, in the order given.
pub fn extract_series(records: &[&YearRecord], field: FinancialField) -> Vec<Money> {
    records
        .iter()
        .filter_map(|y| y.financial_data.get(field))
        .filter(|v| *v > Decimal::ZERO)
        .collect()
}

/// CAGR of a financial field from the oldest to the latest usable year.
///
/// Years are taken in chronological order; the elapsed period is the number
/// of usable points minus one. Fewer than two usable points gives zero.
pub fn metric_cagr(history: &YearlyHistory, field: FinancialField) -> Rate {
    let series = extract_series(&history.chronological(), field);
    series_cagr(&series)
}

/// Growth of the selected, positive statutory audit fee across the history.
pub fn historical_fee_cagr(history: &YearlyHistory) -> Rate {
    let fees: Vec<Money> = history
        .chronological()
        .into_iter()
        .filter_map(YearRecord::statutory_fee)
        .collect();
    series_cagr(&fees)
}

pub fn revenue_cagr(history: &YearlyHistory) -> Rate {
    metric_cagr(history, FinancialField::TotalRevenue)
}

pub fn profit_cagr(history: &YearlyHistory) -> Rate {
    metric_cagr(history, FinancialField::SurplusDeficit)
}

/// Number of usable (present and positive) points for a field.
pub fn usable_points(history: &YearlyHistory, field: FinancialField) -> usize {
    extract_series(&history.chronological(), field).len()
}

fn series_cagr(series: &[Money]) -> Rate {
    match (series.first(), series.last()) {
        (Some(first), Some(last)) if series.len() >= 2 => {
            cagr(*first, *last, (series.len() - 1) as u32)
        }
        _ => Decimal::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engagement::ServiceLine;
    use rust_decimal_macros::dec;

    fn year(label: &str, revenue: &str, profit: &str, statutory: Option<Money>) -> YearRecord {
        let mut y = YearRecord::new(label);
        y.financial_data.total_revenue = crate::amounts::parse_amount(revenue);
        y.financial_data.surplus_deficit = crate::amounts::parse_amount(profit);
        if let Some(fee) = statutory {
            y.services.statutory_audit = ServiceLine::billed(fee);
        }
        y
    }

    #[test]
    fn test_cagr_no_growth_is_zero() {
        assert_eq!(cagr(dec!(100), dec!(100), 3), Decimal::ZERO);
        assert_eq!(cagr(dec!(2500.50), dec!(2500.50), 1), Decimal::ZERO);
    }

    #[test]
    fn test_cagr_ten_percent_over_two_years() {
        let r = cagr(dec!(100), dec!(121), 2);
        assert!((r - dec!(0.10)).abs() < dec!(0.000001), "got {r}");
    }

    #[test]
    fn test_cagr_three_years() {
        // 1000 -> 1331 over 3 years = 10%
        let r = cagr(dec!(1000), dec!(1331), 3);
        assert!((r - dec!(0.10)).abs() < dec!(0.000001), "got {r}");
    }

    #[test]
    fn test_cagr_single_year_is_exact() {
        assert_eq!(cagr(dec!(200), dec!(230), 1), dec!(0.15));
    }

    #[test]
    fn test_cagr_degenerate_inputs() {
        assert_eq!(cagr(Decimal::ZERO, dec!(100), 2), Decimal::ZERO);
        assert_eq!(cagr(dec!(-5), dec!(100), 2), Decimal::ZERO);
        assert_eq!(cagr(dec!(100), dec!(150), 0), Decimal::ZERO);
        assert_eq!(cagr(dec!(100), dec!(-50), 2), Decimal::ZERO);
        assert_eq!(cagr(dec!(100), Decimal::ZERO, 2), dec!(-1));
    }

    #[test]
    fn test_cagr_decline() {
        let r = cagr(dec!(121), dec!(100), 2);
        assert!((r - dec!(-0.0909091)).abs() < dec!(0.00001), "got {r}");
    }

    #[test]
    fn test_extract_series_filters_blank_and_non_positive() {
        let a = year("Y1", "100", "", None);
        let b = year("Y2", "", "5", None);
        let c = year("Y3", "-40", "5", None);
        let d = year("Y4", "250", "5", None);
        let series = extract_series(&[&a, &b, &c, &d], FinancialField::TotalRevenue);
        assert_eq!(series, vec![dec!(100), dec!(250)]);
    }

    #[test]
    fn test_metric_cagr_needs_two_points() {
        let h = YearlyHistory::new(vec![
            year("2022-23", "100", "", None),
            year("2023-24", "", "", None),
        ]);
        assert_eq!(metric_cagr(&h, FinancialField::TotalRevenue), Decimal::ZERO);
        assert_eq!(metric_cagr(&h, FinancialField::SurplusDeficit), Decimal::ZERO);
    }

    #[test]
    fn test_metric_cagr_uses_label_order_not_entry_order() {
        // entered newest first
        let h = YearlyHistory::new(vec![
            year("2023-24", "121", "", None),
            year("2022-23", "110", "", None),
            year("2021-22", "100", "", None),
        ]);
        let r = revenue_cagr(&h);
        assert!(r > Decimal::ZERO, "growth direction inverted: {r}");
        assert!((r - dec!(0.10)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_historical_fee_cagr() {
        let h = YearlyHistory::new(vec![
            year("2022-23", "", "", Some(dec!(110000))),
            year("2021-22", "", "", Some(dec!(100000))),
            year("2023-24", "", "", Some(dec!(121000))),
        ]);
        let r = historical_fee_cagr(&h);
        assert!((r - dec!(0.10)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_historical_fee_cagr_insufficient() {
        let h = YearlyHistory::new(vec![
            year("2022-23", "100", "10", Some(dec!(110000))),
            year("2023-24", "200", "20", None),
        ]);
        assert_eq!(historical_fee_cagr(&h), Decimal::ZERO);
        assert_eq!(historical_fee_cagr(&YearlyHistory::default()), Decimal::ZERO);
    }
}
