//! Gastronomy industry (Gastgewerbe).
//!
//! Meals provided by the employer are a taxable benefit-in-kind valued at the
//! official per-meal rates. Tips paid out by the employer are taxable; tips
//! paid directly by guests are tax-free without a cap (§3 Nr. 51 EStG).

use rust_decimal::Decimal;

use crate::error::EngineResult;
use crate::models::{
    AdvisoryWarning, GastronomyBreakdown, GastronomyConfig, GastronomyInput, IndustryBreakdown,
    IndustryPayrollInput, IndustryPayrollResult, IndustryType, WarningSeverity,
};

use super::{IndustryContext, IndustrySurchargeModule, ensure_non_negative, mismatched_input};

/// Surcharge module for gastronomy employees.
#[derive(Debug, Clone, Copy)]
pub struct GastronomyModule<'a> {
    config: &'a GastronomyConfig,
}

impl<'a> GastronomyModule<'a> {
    /// Wraps an employee's gastronomy configuration.
    pub fn new(config: &'a GastronomyConfig) -> Self {
        Self { config }
    }

    fn compute(
        &self,
        input: &GastronomyInput,
        ctx: &IndustryContext<'_>,
    ) -> EngineResult<IndustryPayrollResult> {
        ensure_non_negative(&[
            ("employer_paid_tips", input.employer_paid_tips),
            ("monthly_tips", input.monthly_tips),
        ])?;

        let rates = &ctx.rates.industry.gastronomy;
        let mut warnings = Vec::new();

        let meal_count = input.breakfasts + input.lunches + input.dinners;
        if meal_count > 0 && !self.config.meals_provided {
            warnings.push(AdvisoryWarning::new(
                "MEALS_NOT_PROVIDED",
                format!(
                    "{} meals reported although the employee is configured without meals",
                    meal_count
                ),
                WarningSeverity::Medium,
            ));
        }

        if input.working_days > 0 {
            for (meal, count) in [
                ("breakfasts", input.breakfasts),
                ("lunches", input.lunches),
                ("dinners", input.dinners),
            ] {
                if count > input.working_days {
                    warnings.push(AdvisoryWarning::new(
                        "MEAL_COUNT_EXCEEDS_WORKING_DAYS",
                        format!(
                            "{} {} reported for {} working days",
                            count, meal, input.working_days
                        ),
                        WarningSeverity::Medium,
                    ));
                }
            }
        }

        let meal_benefit = Decimal::from(input.breakfasts) * rates.breakfast_value
            + Decimal::from(input.lunches) * rates.lunch_value
            + Decimal::from(input.dinners) * rates.dinner_value;

        let taxable = meal_benefit + input.employer_paid_tips;

        Ok(IndustryPayrollResult::new(
            IndustryType::Gastronomy,
            taxable,
            input.monthly_tips,
            Decimal::ZERO,
            warnings,
            IndustryBreakdown::Gastronomy(GastronomyBreakdown {
                meal_benefit,
                employer_paid_tips: input.employer_paid_tips,
                guest_tips: input.monthly_tips,
            }),
        ))
    }
}

impl IndustrySurchargeModule for GastronomyModule<'_> {
    fn calculate(
        &self,
        input: &IndustryPayrollInput,
        ctx: &IndustryContext<'_>,
    ) -> EngineResult<IndustryPayrollResult> {
        match input {
            IndustryPayrollInput::Gastronomy(gastronomy) => self.compute(gastronomy, ctx),
            IndustryPayrollInput::Standard => self.compute(&GastronomyInput::default(), ctx),
            other => Err(mismatched_input("gastronomy", other)),
        }
    }
}
