//! Construction industry (Baugewerbe).
//!
//! Winter allowance is paid per winter hour during December through March
//! and is tax-free. Dirty-work allowance and the night, Sunday and holiday
//! premiums are taxable. The employer owes the SOKA-BAU levy on the base
//! gross paid for the period plus the taxable additions.

use rust_decimal::Decimal;

use crate::error::EngineResult;
use crate::models::{
    AdvisoryWarning, ConstructionBreakdown, ConstructionConfig, ConstructionInput,
    IndustryBreakdown, IndustryPayrollInput, IndustryPayrollResult, IndustryType,
    WarningSeverity,
};

use super::{IndustryContext, IndustrySurchargeModule, ensure_non_negative, mismatched_input};

/// Returns true for the months in which winter allowance is paid.
pub fn is_winter_month(month: u32) -> bool {
    matches!(month, 12 | 1 | 2 | 3)
}

/// Surcharge module for construction employees.
#[derive(Debug, Clone, Copy)]
pub struct ConstructionModule<'a> {
    config: &'a ConstructionConfig,
}

impl<'a> ConstructionModule<'a> {
    /// Wraps an employee's construction configuration.
    pub fn new(config: &'a ConstructionConfig) -> Self {
        Self { config }
    }

    fn compute(
        &self,
        input: &ConstructionInput,
        ctx: &IndustryContext<'_>,
    ) -> EngineResult<IndustryPayrollResult> {
        ensure_non_negative(&[
            ("winter_hours", input.winter_hours),
            ("dirty_work_hours", input.dirty_work_hours),
            ("night_hours", input.night_hours),
            ("sunday_hours", input.sunday_hours),
            ("holiday_hours", input.holiday_hours),
        ])?;

        let rates = &ctx.rates.industry.construction;
        let hourly = self.config.hourly_wage.unwrap_or(ctx.hourly_rate);
        let mut warnings = Vec::new();

        let winter_period = is_winter_month(ctx.period.month);
        let winter_allowance = if winter_period {
            input.winter_hours * rates.winter_allowance_per_hour
        } else {
            if input.winter_hours > Decimal::ZERO {
                warnings.push(AdvisoryWarning::new(
                    "WINTER_HOURS_OUTSIDE_WINTER",
                    format!(
                        "{} winter hours reported for {} are outside December-March and were not paid",
                        input.winter_hours, ctx.period
                    ),
                    WarningSeverity::Medium,
                ));
            }
            Decimal::ZERO
        };

        let dirty_work_allowance = if self.config.dirty_work_eligible {
            input.dirty_work_hours * rates.dirty_work_allowance_per_hour
        } else {
            if input.dirty_work_hours > Decimal::ZERO {
                warnings.push(AdvisoryWarning::new(
                    "DIRTY_WORK_NOT_ELIGIBLE",
                    "Dirty-work hours reported for an employee without dirty-work entitlement",
                    WarningSeverity::Low,
                ));
            }
            Decimal::ZERO
        };

        let night_premium = input.night_hours * hourly * rates.night_premium_rate;
        let sunday_premium = input.sunday_hours * hourly * rates.sunday_premium_rate;
        let holiday_premium = input.holiday_hours * hourly * rates.holiday_premium_rate;

        let taxable = dirty_work_allowance + night_premium + sunday_premium + holiday_premium;
        let soka_bau_levy = (ctx.base_gross + taxable) * rates.soka_bau_rate;

        Ok(IndustryPayrollResult::new(
            IndustryType::Construction,
            taxable,
            winter_allowance,
            soka_bau_levy,
            warnings,
            IndustryBreakdown::Construction(ConstructionBreakdown {
                winter_period,
                winter_allowance,
                dirty_work_allowance,
                night_premium,
                sunday_premium,
                holiday_premium,
                soka_bau_levy,
            }),
        ))
    }
}

impl IndustrySurchargeModule for ConstructionModule<'_> {
    fn calculate(
        &self,
        input: &IndustryPayrollInput,
        ctx: &IndustryContext<'_>,
    ) -> EngineResult<IndustryPayrollResult> {
        match input {
            IndustryPayrollInput::Construction(construction) => self.compute(construction, ctx),
            IndustryPayrollInput::Standard => self.compute(&ConstructionInput::default(), ctx),
            other => Err(mismatched_input("construction", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RateRegistry;
    use crate::error::EngineError;
    use crate::models::PayrollPeriod;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn full_input() -> IndustryPayrollInput {
        IndustryPayrollInput::Construction(ConstructionInput {
            winter_hours: dec("40"),
            dirty_work_hours: dec("10"),
            night_hours: dec("8"),
            sunday_hours: dec("4"),
            holiday_hours: dec("8"),
        })
    }

    fn run(
        config: &ConstructionConfig,
        input: &IndustryPayrollInput,
        month: u32,
    ) -> EngineResult<IndustryPayrollResult> {
        let registry = RateRegistry::builtin().unwrap();
        let ctx = IndustryContext {
            period: PayrollPeriod::new(2025, month).unwrap(),
            hourly_rate: dec("20.00"),
            base_gross: dec("3464.00"),
            rates: registry.get(2025).unwrap(),
        };
        ConstructionModule::new(config).calculate(input, &ctx)
    }

    #[test]
    fn test_winter_window() {
        for month in [12, 1, 2, 3] {
            assert!(is_winter_month(month), "month {}", month);
        }
        for month in 4..=11 {
            assert!(!is_winter_month(month), "month {}", month);
        }
    }

    #[test]
    fn test_january_full_input() {
        let config = ConstructionConfig {
            hourly_wage: None,
            dirty_work_eligible: true,
        };
        let result = run(&config, &full_input(), 1).unwrap();

        // 40h × 1.00 tax-free winter allowance
        assert_eq!(result.tax_free_additions, dec("40.00"));
        // 15.00 dirty + 32.00 night + 60.00 Sunday + 320.00 holiday
        assert_eq!(result.taxable_additions, dec("427.00"));
        assert_eq!(result.additional_gross, dec("467.00"));
        // 15.4 % of (3464 + 427)
        assert_eq!(result.employer_additional_costs, dec("599.214"));
        assert!(result.warnings.is_empty());

        match result.breakdown {
            IndustryBreakdown::Construction(b) => {
                assert!(b.winter_period);
                assert_eq!(b.night_premium, dec("32.00"));
                assert_eq!(b.sunday_premium, dec("60.00"));
                assert_eq!(b.holiday_premium, dec("320.00"));
            }
            other => panic!("Expected construction breakdown, got {:?}", other),
        }
    }

    #[test]
    fn test_no_winter_allowance_in_summer() {
        let config = ConstructionConfig {
            hourly_wage: None,
            dirty_work_eligible: true,
        };
        let result = run(&config, &full_input(), 7).unwrap();
        assert_eq!(result.tax_free_additions, Decimal::ZERO);
        assert_eq!(result.taxable_additions, dec("427.00"));
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].code, "WINTER_HOURS_OUTSIDE_WINTER");
    }

    #[test]
    fn test_dirty_work_requires_eligibility() {
        let result = run(&ConstructionConfig::default(), &full_input(), 2).unwrap();
        assert_eq!(result.taxable_additions, dec("412.00"));
        assert!(
            result
                .warnings
                .iter()
                .any(|w| w.code == "DIRTY_WORK_NOT_ELIGIBLE")
        );
    }

    #[test]
    fn test_configured_hourly_wage_overrides_context() {
        let config = ConstructionConfig {
            hourly_wage: Some(dec("25.00")),
            dirty_work_eligible: false,
        };
        let input = IndustryPayrollInput::Construction(ConstructionInput {
            night_hours: dec("10"),
            ..ConstructionInput::default()
        });
        let result = run(&config, &input, 5).unwrap();
        // 10 × 25 × 0.20
        assert_eq!(result.taxable_additions, dec("50.00"));
    }

    #[test]
    fn test_soka_bau_levy_without_input() {
        let result = run(
            &ConstructionConfig::default(),
            &IndustryPayrollInput::Standard,
            6,
        )
        .unwrap();
        assert_eq!(result.additional_gross, Decimal::ZERO);
        assert_eq!(result.employer_additional_costs, dec("533.456"));
    }

    #[test]
    fn test_negative_hours_rejected() {
        let input = IndustryPayrollInput::Construction(ConstructionInput {
            sunday_hours: dec("-1"),
            ..ConstructionInput::default()
        });
        match run(&ConstructionConfig::default(), &input, 1) {
            Err(EngineError::InvalidInput { field, .. }) => assert_eq!(field, "sunday_hours"),
            other => panic!("Expected InvalidInput, got {:?}", other),
        }
    }
}
