//! Income tax, solidarity surcharge and church tax.
//!
//! This module implements the progressive tariff of §32a EStG as a four-zone
//! piecewise formula over yearly taxable income (zvE), the mitigated
//! solidarity surcharge (SolZG) and the state-dependent church tax.
//!
//! ## Zones
//!
//! | Zone | Range | Formula |
//! |------|-------|---------|
//! | 0 | `y ≤ basic allowance` | 0 |
//! | 1 | up to `zone1.to` | `(c0·z + c1)·z`, `z = (y − basic)/10000` |
//! | 2 | up to `zone2.to` | `(c0·z + c1)·z + offset`, `z = (y − zone1.to)/10000` |
//! | 3 | up to `zone3.to` | `0.42·y − k3` |
//! | 4 | above | `0.45·y − k4` |
//!
//! Upper bounds are inclusive: a value exactly on a boundary is taxed with the
//! lower zone's formula.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{IncomeTaxRates, RateTable, SolidarityRates};
use crate::error::{EngineError, EngineResult};
use crate::models::{TaxBreakdown, TaxClass};

const ZONE_DIVISOR: Decimal = Decimal::from_parts(10000, 0, 0, false, 0);

/// The tariff zone a taxable income falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxZone {
    /// At or below the basic allowance.
    BasicAllowance,
    /// First progression zone.
    Progression1,
    /// Second progression zone.
    Progression2,
    /// 42 % proportional zone.
    Proportional,
    /// 45 % top rate.
    TopRate,
}

/// Inputs to the tax calculation for one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxInput {
    /// Yearly taxable income (zvE).
    pub taxable_income: Decimal,
    /// Wage tax class.
    pub tax_class: TaxClass,
    /// Child allowances.
    pub child_allowances: Decimal,
    /// Whether church tax is due.
    pub church_tax: bool,
    /// Federal state code for the church tax rate.
    pub state: String,
}

/// The result of a yearly tax calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeTaxResult {
    /// Yearly taxes.
    pub breakdown: TaxBreakdown,
    /// Zone of the income the tariff was applied to.
    pub zone: TaxZone,
    /// Income tax after child allowances, the base for surcharges.
    pub surcharge_base: Decimal,
}

/// Returns the tariff zone for a taxable income.
pub fn tax_zone(taxable_income: Decimal, rates: &IncomeTaxRates) -> TaxZone {
    if taxable_income <= rates.basic_allowance {
        TaxZone::BasicAllowance
    } else if taxable_income <= rates.zone1.to {
        TaxZone::Progression1
    } else if taxable_income <= rates.zone2.to {
        TaxZone::Progression2
    } else if rates.zone3.to.is_none_or(|to| taxable_income <= to) {
        TaxZone::Proportional
    } else {
        TaxZone::TopRate
    }
}

/// Applies the §32a tariff to a yearly taxable income.
///
/// The result is unrounded and never negative.
///
/// # Examples
///
/// ```
/// use lohnwerk::calculation::progressive_income_tax;
/// use lohnwerk::config::RateRegistry;
/// use rust_decimal::Decimal;
///
/// let registry = RateRegistry::builtin().unwrap();
/// let rates = &registry.get(2025).unwrap().income_tax;
///
/// assert_eq!(progressive_income_tax(Decimal::from(12096), rates), Decimal::ZERO);
/// assert_eq!(progressive_income_tax(Decimal::from(100000), rates), Decimal::new(3108808, 2));
/// ```
pub fn progressive_income_tax(taxable_income: Decimal, rates: &IncomeTaxRates) -> Decimal {
    let y = taxable_income;
    let tax = match tax_zone(y, rates) {
        TaxZone::BasicAllowance => Decimal::ZERO,
        TaxZone::Progression1 => {
            let z = (y - rates.basic_allowance) / ZONE_DIVISOR;
            (rates.zone1.coeff0 * z + rates.zone1.coeff1) * z + rates.zone1.offset
        }
        TaxZone::Progression2 => {
            let z = (y - rates.zone1.to) / ZONE_DIVISOR;
            (rates.zone2.coeff0 * z + rates.zone2.coeff1) * z + rates.zone2.offset
        }
        TaxZone::Proportional => rates.zone3.rate * y - rates.zone3.constant,
        TaxZone::TopRate => rates.zone4.rate * y - rates.zone4.constant,
    };
    tax.max(Decimal::ZERO)
}

/// Applies the tariff according to the tax class.
///
/// - I, IV: basic tariff
/// - II: single-parent relief deducted first
/// - III: splitting, `2 × tariff(y / 2)`
/// - V, VI: the basic allowance is used by the other job, approximated as
///   `tariff(y + basic allowance)`
pub fn income_tax_for_class(
    taxable_income: Decimal,
    tax_class: TaxClass,
    rates: &IncomeTaxRates,
) -> Decimal {
    match tax_class {
        TaxClass::I | TaxClass::IV => progressive_income_tax(taxable_income, rates),
        TaxClass::II => progressive_income_tax(
            (taxable_income - rates.single_parent_relief).max(Decimal::ZERO),
            rates,
        ),
        TaxClass::III => {
            progressive_income_tax(taxable_income / Decimal::TWO, rates) * Decimal::TWO
        }
        TaxClass::V | TaxClass::VI => {
            progressive_income_tax(taxable_income + rates.basic_allowance, rates)
        }
    }
}

/// Computes the solidarity surcharge on an income tax amount.
///
/// Zero up to the allowance; inside the mitigation band the surcharge is
/// limited to `mitigation_rate × (tax − allowance)`; above the band the full
/// rate applies.
pub fn solidarity_surcharge(
    income_tax: Decimal,
    tax_class: TaxClass,
    rates: &SolidarityRates,
) -> Decimal {
    let allowance = match tax_class {
        TaxClass::III => rates.allowance * Decimal::TWO,
        _ => rates.allowance,
    };
    if income_tax <= allowance {
        return Decimal::ZERO;
    }
    let full = income_tax * rates.rate;
    let mitigated = (income_tax - allowance) * rates.mitigation_rate;
    full.min(mitigated)
}

/// Calculates yearly income tax, solidarity surcharge and church tax.
///
/// Child allowances do not change the income tax itself; they reduce the
/// income the surcharges are computed on.
///
/// # Errors
///
/// Returns `InvalidIncome` when the taxable income is negative.
pub fn calculate_income_tax(input: &TaxInput, table: &RateTable) -> EngineResult<IncomeTaxResult> {
    if input.taxable_income < Decimal::ZERO {
        return Err(EngineError::InvalidIncome {
            value: input.taxable_income,
        });
    }

    let rates = &table.income_tax;
    let income_tax = income_tax_for_class(input.taxable_income, input.tax_class, rates);

    let child_allowances = input.child_allowances.max(Decimal::ZERO);
    let surcharge_income =
        (input.taxable_income - child_allowances * rates.child_allowance).max(Decimal::ZERO);
    let surcharge_base = income_tax_for_class(surcharge_income, input.tax_class, rates);

    let solidarity_tax = solidarity_surcharge(surcharge_base, input.tax_class, &table.solidarity);
    let church_tax = if input.church_tax {
        surcharge_base * table.church_tax.rate_for(&input.state)
    } else {
        Decimal::ZERO
    };

    let zone = tax_zone(input.taxable_income, rates);
    debug!(
        taxable_income = %input.taxable_income,
        ?zone,
        income_tax = %income_tax,
        solidarity_tax = %solidarity_tax,
        church_tax = %church_tax,
        "Calculated yearly taxes"
    );

    Ok(IncomeTaxResult {
        breakdown: TaxBreakdown::new(income_tax, solidarity_tax, church_tax),
        zone,
        surcharge_base,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RateRegistry;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn table_2025() -> RateTable {
        RateRegistry::builtin().unwrap().get(2025).unwrap().clone()
    }

    fn input(taxable_income: &str) -> TaxInput {
        TaxInput {
            taxable_income: dec(taxable_income),
            tax_class: TaxClass::I,
            child_allowances: Decimal::ZERO,
            church_tax: false,
            state: "NW".to_string(),
        }
    }

    fn zone1_formula(y: Decimal, rates: &IncomeTaxRates) -> Decimal {
        let z = (y - rates.basic_allowance) / ZONE_DIVISOR;
        (rates.zone1.coeff0 * z + rates.zone1.coeff1) * z
    }

    fn zone2_formula(y: Decimal, rates: &IncomeTaxRates) -> Decimal {
        let z = (y - rates.zone1.to) / ZONE_DIVISOR;
        (rates.zone2.coeff0 * z + rates.zone2.coeff1) * z + rates.zone2.offset
    }

    #[test]
    fn test_income_at_basic_allowance_is_tax_free() {
        let table = table_2025();
        let rates = &table.income_tax;
        assert_eq!(progressive_income_tax(dec("0"), rates), Decimal::ZERO);
        assert_eq!(progressive_income_tax(dec("12096"), rates), Decimal::ZERO);
        assert_eq!(tax_zone(dec("12096"), rates), TaxZone::BasicAllowance);
    }

    #[test]
    fn test_first_euro_above_basic_allowance() {
        let table = table_2025();
        assert_eq!(
            progressive_income_tax(dec("12097"), &table.income_tax),
            dec("0.1400093230")
        );
    }

    #[test]
    fn test_zone2_value() {
        let table = table_2025();
        assert_eq!(
            progressive_income_tax(dec("32229"), &table.income_tax),
            dec("4945.5148060544")
        );
        assert_eq!(
            progressive_income_tax(dec("50000"), &table.income_tax),
            dec("10691.3531510336")
        );
    }

    #[test]
    fn test_proportional_and_top_zones() {
        let table = table_2025();
        let rates = &table.income_tax;
        assert_eq!(tax_zone(dec("100000"), rates), TaxZone::Proportional);
        assert_eq!(progressive_income_tax(dec("100000"), rates), dec("31088.08"));
        assert_eq!(tax_zone(dec("300000"), rates), TaxZone::TopRate);
        assert_eq!(progressive_income_tax(dec("300000"), rates), dec("115753.33"));
    }

    #[test]
    fn test_boundary_uses_lower_zone() {
        let table = table_2025();
        let rates = &table.income_tax;
        assert_eq!(tax_zone(dec("17443"), rates), TaxZone::Progression1);
        assert_eq!(tax_zone(dec("17444"), rates), TaxZone::Progression2);
        assert_eq!(tax_zone(dec("68480"), rates), TaxZone::Progression2);
        assert_eq!(tax_zone(dec("277825"), rates), TaxZone::Proportional);
        assert_eq!(tax_zone(dec("277826"), rates), TaxZone::TopRate);
    }

    #[test]
    fn test_zone_boundaries_are_continuous() {
        let table = table_2025();
        let rates = &table.income_tax;
        let cent = dec("0.01");

        // Zone 0 / zone 1
        let b0 = rates.basic_allowance;
        assert!(zone1_formula(b0, rates).abs() <= cent);

        // Zone 1 / zone 2
        let b1 = rates.zone1.to;
        assert!((zone1_formula(b1, rates) - zone2_formula(b1, rates)).abs() <= cent);

        // Zone 3 / zone 4
        let b3 = rates.zone3.to.unwrap();
        let left = rates.zone3.rate * b3 - rates.zone3.constant;
        let right = rates.zone4.rate * b3 - rates.zone4.constant;
        assert!((left - right).abs() <= cent);
    }

    #[test]
    fn test_zone2_to_zone3_step_below_statutory_rounding() {
        // The published 2025 coefficients leave a 9 cent step at this boundary.
        let table = table_2025();
        let rates = &table.income_tax;
        let b2 = rates.zone2.to;
        let left = zone2_formula(b2, rates);
        let right = rates.zone3.rate * b2 - rates.zone3.constant;
        assert!((left - right).abs() < dec("0.10"));
    }

    #[test]
    fn test_negative_income_fails() {
        let table = table_2025();
        match calculate_income_tax(&input("-1"), &table) {
            Err(EngineError::InvalidIncome { value }) => assert_eq!(value, dec("-1")),
            other => panic!("Expected InvalidIncome, got {:?}", other),
        }
    }

    #[test]
    fn test_no_solidarity_below_allowance() {
        let table = table_2025();
        let result = calculate_income_tax(&input("50000"), &table).unwrap();
        assert_eq!(result.breakdown.solidarity_tax, Decimal::ZERO);
        assert_eq!(result.breakdown.total, dec("10691.3531510336"));
    }

    #[test]
    fn test_solidarity_in_mitigation_band() {
        let table = table_2025();
        let result = calculate_income_tax(&input("100000"), &table).unwrap();
        // min(5.5% × 31088.08, 11.9% × (31088.08 − 19950))
        assert_eq!(result.breakdown.solidarity_tax, dec("1325.43152"));
    }

    #[test]
    fn test_solidarity_full_rate_above_band() {
        let table = table_2025();
        let result = calculate_income_tax(&input("300000"), &table).unwrap();
        assert_eq!(result.breakdown.solidarity_tax, dec("6366.43315"));
    }

    #[test]
    fn test_church_tax_by_state() {
        let table = table_2025();
        let mut tax_input = input("50000");
        tax_input.church_tax = true;
        tax_input.state = "BY".to_string();
        let bavaria = calculate_income_tax(&tax_input, &table).unwrap();
        assert_eq!(bavaria.breakdown.church_tax, dec("855.308252082688"));

        tax_input.state = "??".to_string();
        let unknown = calculate_income_tax(&tax_input, &table).unwrap();
        assert_eq!(
            unknown.breakdown.church_tax,
            dec("10691.3531510336") * dec("0.09")
        );
    }

    #[test]
    fn test_child_allowances_reduce_surcharge_base_only() {
        let table = table_2025();
        let mut tax_input = input("50000");
        tax_input.child_allowances = dec("1");
        tax_input.church_tax = true;
        let result = calculate_income_tax(&tax_input, &table).unwrap();

        assert_eq!(result.breakdown.income_tax, dec("10691.3531510336"));
        assert_eq!(result.surcharge_base, dec("7448.8578268736"));
        assert_eq!(
            result.breakdown.church_tax,
            dec("7448.8578268736") * dec("0.09")
        );
    }

    #[test]
    fn test_tax_classes() {
        let table = table_2025();
        let rates = &table.income_tax;
        assert_eq!(
            income_tax_for_class(dec("60000"), TaxClass::III, rates),
            dec("8607.1315180672")
        );
        assert_eq!(
            income_tax_for_class(dec("30000"), TaxClass::II, rates),
            dec("3125.5202451776")
        );
        assert_eq!(
            income_tax_for_class(dec("30000"), TaxClass::V, rates),
            dec("7998.0197504576")
        );
        assert_eq!(
            income_tax_for_class(dec("30000"), TaxClass::IV, rates),
            income_tax_for_class(dec("30000"), TaxClass::I, rates)
        );
    }

    #[test]
    fn test_class_iii_doubles_solidarity_allowance() {
        let table = table_2025();
        assert_eq!(
            solidarity_surcharge(dec("30000"), TaxClass::III, &table.solidarity),
            Decimal::ZERO
        );
        assert!(solidarity_surcharge(dec("30000"), TaxClass::I, &table.solidarity) > Decimal::ZERO);
    }
}
