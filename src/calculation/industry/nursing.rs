//! Nursing and care (Pflege).
//!
//! Night, Sunday and holiday premiums are tax-free up to the §3b EStG
//! ceilings, computed on a base wage capped at the statutory hourly limit.
//! Whatever the contract pays beyond that is taxable. On-call pay is taxable.
//!
//! When shifts are supplied without explicit night hours, the night share is
//! estimated from the shift start time.

use rust_decimal::Decimal;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    AdvisoryWarning, IndustryBreakdown, IndustryPayrollInput, IndustryPayrollResult,
    IndustryType, NursingBreakdown, NursingConfig, NursingInput, ShiftRecord, WarningSeverity,
};

use super::{IndustryContext, IndustrySurchargeModule, ensure_non_negative, mismatched_input};

/// Share of a night-starting shift counted as night work.
pub const NIGHT_SHARE_OF_SHIFT: Decimal = Decimal::from_parts(30, 0, 0, false, 2);

fn starts_at_night(start_hour: u32) -> bool {
    start_hour >= 22 || start_hour < 6
}

/// Estimates night hours from shift start times.
///
/// A shift starting between 22:00 and 05:59 contributes 30 % of its duration.
///
/// # Errors
///
/// Returns `InvalidInput` for a start hour above 23 or a negative duration.
pub fn estimated_night_hours(shifts: &[ShiftRecord]) -> EngineResult<Decimal> {
    let mut total = Decimal::ZERO;
    for shift in shifts {
        if shift.start_hour > 23 {
            return Err(EngineError::invalid_input(
                "shifts.start_hour",
                format!("must be between 0 and 23 (got {})", shift.start_hour),
            ));
        }
        ensure_non_negative(&[("shifts.duration_hours", shift.duration_hours)])?;
        if starts_at_night(shift.start_hour) {
            total += shift.duration_hours * NIGHT_SHARE_OF_SHIFT;
        }
    }
    Ok(total)
}

/// A premium split into its tax-free and taxable parts.
struct PremiumSplit {
    premium: Decimal,
    tax_free: Decimal,
}

impl PremiumSplit {
    fn taxable(&self) -> Decimal {
        self.premium - self.tax_free
    }
}

fn split_premium(
    hours: Decimal,
    hourly: Decimal,
    capped_hourly: Decimal,
    contract_rate: Decimal,
    ceiling: Decimal,
) -> PremiumSplit {
    let premium = hours * hourly * contract_rate;
    let tax_free = (hours * capped_hourly * contract_rate.min(ceiling)).min(premium);
    PremiumSplit { premium, tax_free }
}

/// Surcharge module for nursing employees.
#[derive(Debug, Clone, Copy)]
pub struct NursingModule<'a> {
    config: &'a NursingConfig,
}

impl<'a> NursingModule<'a> {
    /// Wraps an employee's nursing configuration.
    pub fn new(config: &'a NursingConfig) -> Self {
        Self { config }
    }

    fn compute(
        &self,
        input: &NursingInput,
        ctx: &IndustryContext<'_>,
    ) -> EngineResult<IndustryPayrollResult> {
        ensure_non_negative(&[
            ("on_call_hours", input.on_call_hours),
            ("night_hours", input.night_hours),
            ("sunday_hours", input.sunday_hours),
            ("holiday_hours", input.holiday_hours),
        ])?;

        let rates = &ctx.rates.industry.nursing;
        let hourly = self.config.hourly_wage.unwrap_or(ctx.hourly_rate);
        let capped_hourly = hourly.min(rates.tax_free_base_wage_cap);
        let mut warnings = Vec::new();

        let estimated = estimated_night_hours(&input.shifts)?;
        if estimated > Decimal::ZERO {
            warnings.push(AdvisoryWarning::new(
                "NIGHT_HOURS_ESTIMATED",
                format!(
                    "{} night hours estimated from shift start times",
                    estimated
                ),
                WarningSeverity::Low,
            ));
        }
        if hourly > rates.tax_free_base_wage_cap {
            warnings.push(AdvisoryWarning::new(
                "BASE_WAGE_ABOVE_TAX_FREE_CAP",
                format!(
                    "Hourly wage {} exceeds the tax-free base of {}; the excess premium is taxable",
                    hourly, rates.tax_free_base_wage_cap
                ),
                WarningSeverity::Low,
            ));
        }

        let night = split_premium(
            input.night_hours + estimated,
            hourly,
            capped_hourly,
            self.config.night_premium_rate,
            rates.tax_free_night_rate,
        );
        let sunday = split_premium(
            input.sunday_hours,
            hourly,
            capped_hourly,
            self.config.sunday_premium_rate,
            rates.tax_free_sunday_rate,
        );
        let holiday = split_premium(
            input.holiday_hours,
            hourly,
            capped_hourly,
            self.config.holiday_premium_rate,
            rates.tax_free_holiday_rate,
        );

        let tax_free_premiums = night.tax_free + sunday.tax_free + holiday.tax_free;
        let taxable_premiums = night.taxable() + sunday.taxable() + holiday.taxable();
        if taxable_premiums > Decimal::ZERO {
            warnings.push(AdvisoryWarning::new(
                "PREMIUM_ABOVE_TAX_FREE_CEILING",
                format!("{} of premiums exceed the tax-free ceilings", taxable_premiums),
                WarningSeverity::Low,
            ));
        }

        let on_call_pay = input.on_call_hours * hourly * self.config.on_call_factor;

        Ok(IndustryPayrollResult::new(
            IndustryType::Nursing,
            taxable_premiums + on_call_pay,
            tax_free_premiums,
            Decimal::ZERO,
            warnings,
            IndustryBreakdown::Nursing(NursingBreakdown {
                on_call_pay,
                night_premium: night.premium,
                sunday_premium: sunday.premium,
                holiday_premium: holiday.premium,
                tax_free_premiums,
                taxable_premiums,
                estimated_night_hours: estimated,
            }),
        ))
    }
}

impl IndustrySurchargeModule for NursingModule<'_> {
    fn calculate(
        &self,
        input: &IndustryPayrollInput,
        ctx: &IndustryContext<'_>,
    ) -> EngineResult<IndustryPayrollResult> {
        match input {
            IndustryPayrollInput::Nursing(nursing) => self.compute(nursing, ctx),
            IndustryPayrollInput::Standard => self.compute(&NursingInput::default(), ctx),
            other => Err(mismatched_input("nursing", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RateRegistry;
    use crate::models::PayrollPeriod;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn run(config: &NursingConfig, input: NursingInput) -> EngineResult<IndustryPayrollResult> {
        let registry = RateRegistry::builtin().unwrap();
        let ctx = IndustryContext {
            period: PayrollPeriod::new(2025, 12).unwrap(),
            hourly_rate: dec("22.00"),
            base_gross: dec("3810.40"),
            rates: registry.get(2025).unwrap(),
        };
        NursingModule::new(config).calculate(&IndustryPayrollInput::Nursing(input), &ctx)
    }

    fn breakdown(result: &IndustryPayrollResult) -> &NursingBreakdown {
        match &result.breakdown {
            IndustryBreakdown::Nursing(b) => b,
            other => panic!("Expected nursing breakdown, got {:?}", other),
        }
    }

    #[test]
    fn test_premiums_within_ceilings_are_tax_free() {
        let input = NursingInput {
            night_hours: dec("20"),
            sunday_hours: dec("10"),
            ..NursingInput::default()
        };
        let result = run(&NursingConfig::default(), input).unwrap();
        // 20 × 22 × 0.20 + 10 × 22 × 0.25
        assert_eq!(result.tax_free_additions, dec("143.00"));
        assert_eq!(result.taxable_additions, Decimal::ZERO);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_holiday_premium_above_ceiling_is_split() {
        let input = NursingInput {
            holiday_hours: dec("8"),
            ..NursingInput::default()
        };
        let result = run(&NursingConfig::default(), input).unwrap();
        let b = breakdown(&result);
        // 8 × 22 × 1.35 = 237.60, of which 8 × 22 × 1.25 = 220.00 is tax-free
        assert_eq!(b.holiday_premium, dec("237.60"));
        assert_eq!(result.tax_free_additions, dec("220.00"));
        assert_eq!(result.taxable_additions, dec("17.60"));
        assert_eq!(result.warnings[0].code, "PREMIUM_ABOVE_TAX_FREE_CEILING");
    }

    #[test]
    fn test_on_call_pay_is_taxable() {
        let input = NursingInput {
            on_call_hours: dec("10"),
            ..NursingInput::default()
        };
        let result = run(&NursingConfig::default(), input).unwrap();
        assert_eq!(breakdown(&result).on_call_pay, dec("110.00"));
        assert_eq!(result.taxable_additions, dec("110.00"));
        assert_eq!(result.tax_free_additions, Decimal::ZERO);
    }

    #[test]
    fn test_tax_free_base_capped_at_fifty() {
        let config = NursingConfig {
            hourly_wage: Some(dec("60.00")),
            ..NursingConfig::default()
        };
        let input = NursingInput {
            night_hours: dec("10"),
            ..NursingInput::default()
        };
        let result = run(&config, input).unwrap();
        // 10 × 60 × 0.20 = 120.00 paid, 10 × 50 × 0.20 = 100.00 tax-free
        assert_eq!(result.tax_free_additions, dec("100.00"));
        assert_eq!(result.taxable_additions, dec("20.00"));
        assert!(
            result
                .warnings
                .iter()
                .any(|w| w.code == "BASE_WAGE_ABOVE_TAX_FREE_CAP")
        );
    }

    #[test]
    fn test_night_hours_estimated_from_shifts() {
        let shifts = vec![
            ShiftRecord {
                start_hour: 22,
                duration_hours: dec("8"),
            },
            ShiftRecord {
                start_hour: 5,
                duration_hours: dec("10"),
            },
            ShiftRecord {
                start_hour: 6,
                duration_hours: dec("8"),
            },
            ShiftRecord {
                start_hour: 14,
                duration_hours: dec("8"),
            },
        ];
        assert_eq!(estimated_night_hours(&shifts).unwrap(), dec("5.40"));

        let input = NursingInput {
            shifts,
            ..NursingInput::default()
        };
        let result = run(&NursingConfig::default(), input).unwrap();
        assert_eq!(breakdown(&result).estimated_night_hours, dec("5.40"));
        // 5.4 × 22 × 0.20
        assert_eq!(result.tax_free_additions, dec("23.760"));
        assert_eq!(result.warnings[0].code, "NIGHT_HOURS_ESTIMATED");
    }

    #[test]
    fn test_invalid_shift_start_rejected() {
        let shifts = vec![ShiftRecord {
            start_hour: 24,
            duration_hours: dec("8"),
        }];
        assert!(matches!(
            estimated_night_hours(&shifts),
            Err(EngineError::InvalidInput { .. })
        ));
    }
}
