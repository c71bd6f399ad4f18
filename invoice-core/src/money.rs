use rust_decimal::{Decimal, RoundingStrategy};

/// Two decimal places, midpoint away from zero, no grouping:
/// `37` → `"37.00"`, `5.555` → `"5.56"`.
pub fn format_amount(value: Decimal) -> String {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded.to_string()
}

/// Rate as a whole or fractional percentage: `0.15` → `"15%"`,
/// `0.075` → `"7.5%"`.
pub fn format_percent(rate: Decimal) -> String {
    format!("{}%", (rate * Decimal::ONE_HUNDRED).normalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn amounts_have_two_places() {
        assert_eq!(format_amount(dec!(37)), "37.00");
        assert_eq!(format_amount(dec!(5.55)), "5.55");
        assert_eq!(format_amount(dec!(5.555)), "5.56");
        assert_eq!(format_amount(dec!(1234567.5)), "1234567.50");
        assert_eq!(format_amount(Decimal::ZERO), "0.00");
    }

    #[test]
    fn percentages() {
        assert_eq!(format_percent(dec!(0.15)), "15%");
        assert_eq!(format_percent(dec!(0.075)), "7.5%");
    }
}
