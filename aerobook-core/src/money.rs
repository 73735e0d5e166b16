use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::EngineError;

/// Convert a major-unit amount into the provider's minor units
/// (rupees to paise). The amount must land on a whole minor unit.
pub fn to_minor_units(amount: Decimal) -> Result<i64, EngineError> {
    let minor = amount * Decimal::ONE_HUNDRED;
    if !minor.fract().is_zero() {
        return Err(EngineError::Validation(format!(
            "amount {} is not representable in minor units",
            amount
        )));
    }
    minor.trunc().to_i64().ok_or_else(|| {
        EngineError::Validation(format!("amount {} overflows minor units", amount))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_whole_amounts_convert() {
        assert_eq!(to_minor_units(dec!(1000.00)).unwrap(), 100_000);
        assert_eq!(to_minor_units(dec!(100.50)).unwrap(), 10_050);
        assert_eq!(to_minor_units(dec!(0.01)).unwrap(), 1);
        assert_eq!(to_minor_units(Decimal::ZERO).unwrap(), 0);
    }

    #[test]
    fn test_sub_minor_precision_is_rejected() {
        let err = to_minor_units(dec!(10.555)).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }
}
