//! Standalone calculators built from the same debt sizing and DSCR rating
//! as the acquisition model.

pub mod business_loan;
pub mod commercial_property;
pub mod cre_loan_sizer;
pub mod dscr;

use rust_decimal::Decimal;

/// Clamp a negative magnitude to zero, noting the adjustment.
pub(crate) fn non_negative(value: Decimal, field: &str, warnings: &mut Vec<String>) -> Decimal {
    if value < Decimal::ZERO {
        warnings.push(format!("{field} was negative ({value}); clamped to 0"));
        Decimal::ZERO
    } else {
        value
    }
}

/// Clamp a fraction into `[0, 1]`, noting the adjustment.
pub(crate) fn fraction(value: Decimal, field: &str, warnings: &mut Vec<String>) -> Decimal {
    if value < Decimal::ZERO || value > Decimal::ONE {
        let clamped = value.clamp(Decimal::ZERO, Decimal::ONE);
        warnings.push(format!("{field} {value} outside [0, 1]; clamped to {clamped}"));
        clamped
    } else {
        value
    }
}

/// Floor a growth rate at -100%, noting the adjustment.
pub(crate) fn growth_rate(value: Decimal, field: &str, warnings: &mut Vec<String>) -> Decimal {
    if value < Decimal::NEGATIVE_ONE {
        warnings.push(format!("{field} {value} below -100%; clamped to -1"));
        Decimal::NEGATIVE_ONE
    } else {
        value
    }
}
