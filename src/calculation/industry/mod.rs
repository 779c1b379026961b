//! Industry surcharge modules.
//!
//! Each regulated industry computes its own taxable and tax-free additions
//! from the period's industry input. Modules are selected by the employee's
//! industry tag through [`IndustryModule`]; the standard industry
//! short-circuits to an all-zero result.
//!
//! Advisory warnings are collected in the result and never abort the
//! calculation. Negative input quantities do.

mod construction;
mod gastronomy;
mod nursing;

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::config::RateTable;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AdvisoryWarning, Employee, IndustryConfig, IndustryPayrollInput, IndustryPayrollResult,
    PayrollPeriod, WarningSeverity, WorkingTimeData,
};

pub use construction::{ConstructionModule, is_winter_month};
pub use gastronomy::GastronomyModule;
pub use nursing::{NIGHT_SHARE_OF_SHIFT, NursingModule, estimated_night_hours};

/// Employee- and period-level values every module needs.
#[derive(Debug, Clone, Copy)]
pub struct IndustryContext<'a> {
    /// The payroll period.
    pub period: PayrollPeriod,
    /// The employee's hourly rate.
    pub hourly_rate: Decimal,
    /// Base gross actually paid for the period.
    pub base_gross: Decimal,
    /// Rate table for the period's year.
    pub rates: &'a RateTable,
}

impl<'a> IndustryContext<'a> {
    /// Builds the context for an employee.
    pub fn for_employee(
        employee: &Employee,
        period: PayrollPeriod,
        working_time: &WorkingTimeData,
        rates: &'a RateTable,
    ) -> Self {
        Self {
            period,
            hourly_rate: employee.hourly_rate(),
            base_gross: employee.base_gross(working_time),
            rates,
        }
    }
}

/// An industry-specific surcharge calculation.
pub trait IndustrySurchargeModule {
    /// Computes the industry additions for one period.
    fn calculate(
        &self,
        input: &IndustryPayrollInput,
        ctx: &IndustryContext<'_>,
    ) -> EngineResult<IndustryPayrollResult>;
}

/// The standard industry: no additions.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardModule;

impl IndustrySurchargeModule for StandardModule {
    fn calculate(
        &self,
        input: &IndustryPayrollInput,
        _ctx: &IndustryContext<'_>,
    ) -> EngineResult<IndustryPayrollResult> {
        let mut result = IndustryPayrollResult::standard();
        if !matches!(input, IndustryPayrollInput::Standard) {
            result.warnings.push(AdvisoryWarning::new(
                "INDUSTRY_INPUT_IGNORED",
                format!(
                    "{} input supplied for a standard-industry employee was ignored",
                    input.industry_type()
                ),
                WarningSeverity::Low,
            ));
        }
        Ok(result)
    }
}

/// Tagged dispatch over the four industry modules.
#[derive(Debug, Clone, Copy)]
pub enum IndustryModule<'a> {
    /// Standard industry.
    Standard(StandardModule),
    /// Construction.
    Construction(ConstructionModule<'a>),
    /// Gastronomy.
    Gastronomy(GastronomyModule<'a>),
    /// Nursing.
    Nursing(NursingModule<'a>),
}

impl<'a> IndustryModule<'a> {
    /// Selects the module for an employee's industry configuration.
    pub fn for_config(config: &'a IndustryConfig) -> Self {
        match config {
            IndustryConfig::Standard => Self::Standard(StandardModule),
            IndustryConfig::Construction(c) => Self::Construction(ConstructionModule::new(c)),
            IndustryConfig::Gastronomy(c) => Self::Gastronomy(GastronomyModule::new(c)),
            IndustryConfig::Nursing(c) => Self::Nursing(NursingModule::new(c)),
        }
    }
}

impl IndustrySurchargeModule for IndustryModule<'_> {
    fn calculate(
        &self,
        input: &IndustryPayrollInput,
        ctx: &IndustryContext<'_>,
    ) -> EngineResult<IndustryPayrollResult> {
        match self {
            Self::Standard(m) => m.calculate(input, ctx),
            Self::Construction(m) => m.calculate(input, ctx),
            Self::Gastronomy(m) => m.calculate(input, ctx),
            Self::Nursing(m) => m.calculate(input, ctx),
        }
    }
}

/// Runs the industry module selected by the employee's industry.
///
/// A standard input for a non-standard employee is treated as an empty input
/// of the employee's industry.
///
/// # Errors
///
/// - `UnsupportedConfiguration` if the input belongs to a different
///   non-standard industry than the employee
/// - `InvalidInput` for negative quantities
pub fn calculate_industry_surcharges(
    employee: &Employee,
    input: &IndustryPayrollInput,
    period: PayrollPeriod,
    working_time: &WorkingTimeData,
    rates: &RateTable,
) -> EngineResult<IndustryPayrollResult> {
    let ctx = IndustryContext::for_employee(employee, period, working_time, rates);
    let result = IndustryModule::for_config(&employee.industry).calculate(input, &ctx)?;

    for warning in &result.warnings {
        warn!(
            employee_id = %employee.id,
            period = %period,
            code = %warning.code,
            message = %warning.message,
            "Industry advisory warning"
        );
    }
    debug!(
        employee_id = %employee.id,
        industry = %result.industry,
        taxable = %result.taxable_additions,
        tax_free = %result.tax_free_additions,
        employer_costs = %result.employer_additional_costs,
        "Calculated industry surcharges"
    );
    Ok(result)
}

pub(crate) fn mismatched_input(expected: &str, input: &IndustryPayrollInput) -> EngineError {
    EngineError::UnsupportedConfiguration {
        message: format!(
            "{} input supplied for a {} employee",
            input.industry_type(),
            expected
        ),
    }
}

pub(crate) fn ensure_non_negative(fields: &[(&str, Decimal)]) -> EngineResult<()> {
    for (field, value) in fields {
        if *value < Decimal::ZERO {
            return Err(EngineError::invalid_input(
                *field,
                format!("must not be negative (got {})", value),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RateRegistry;
    use crate::models::{
        ConstructionConfig, ConstructionInput, EmploymentType, GastronomyInput, IndustryType,
        TaxClass,
    };
    use chrono::NaiveDate;

    fn employee(industry: IndustryConfig) -> Employee {
        Employee {
            id: "emp_001".to_string(),
            name: String::new(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 15).unwrap(),
            state: "NW".to_string(),
            church_tax: false,
            tax_class: TaxClass::I,
            child_allowances: Decimal::ZERO,
            weekly_hours: Decimal::from(40),
            monthly_salary: Decimal::from(3464),
            hourly_wage: None,
            employment_type: EmploymentType::Fulltime,
            industry,
        }
    }

    #[test]
    fn test_standard_short_circuits_to_zero() {
        let registry = RateRegistry::builtin().unwrap();
        let result = calculate_industry_surcharges(
            &employee(IndustryConfig::Standard),
            &IndustryPayrollInput::Standard,
            PayrollPeriod::new(2025, 1).unwrap(),
            &WorkingTimeData::default(),
            registry.get(2025).unwrap(),
        )
        .unwrap();
        assert_eq!(result, IndustryPayrollResult::standard());
    }

    #[test]
    fn test_standard_ignores_foreign_input_with_warning() {
        let registry = RateRegistry::builtin().unwrap();
        let result = calculate_industry_surcharges(
            &employee(IndustryConfig::Standard),
            &IndustryPayrollInput::Construction(ConstructionInput::default()),
            PayrollPeriod::new(2025, 1).unwrap(),
            &WorkingTimeData::default(),
            registry.get(2025).unwrap(),
        )
        .unwrap();
        assert_eq!(result.additional_gross, Decimal::ZERO);
        assert_eq!(result.warnings[0].code, "INDUSTRY_INPUT_IGNORED");
    }

    #[test]
    fn test_mismatched_input_is_rejected() {
        let registry = RateRegistry::builtin().unwrap();
        let result = calculate_industry_surcharges(
            &employee(IndustryConfig::Construction(ConstructionConfig::default())),
            &IndustryPayrollInput::Gastronomy(GastronomyInput::default()),
            PayrollPeriod::new(2025, 1).unwrap(),
            &WorkingTimeData::default(),
            registry.get(2025).unwrap(),
        );
        assert!(matches!(
            result,
            Err(EngineError::UnsupportedConfiguration { .. })
        ));
    }

    #[test]
    fn test_standard_input_for_industry_employee_is_empty_input() {
        let registry = RateRegistry::builtin().unwrap();
        let result = calculate_industry_surcharges(
            &employee(IndustryConfig::Construction(ConstructionConfig::default())),
            &IndustryPayrollInput::Standard,
            PayrollPeriod::new(2025, 6).unwrap(),
            &WorkingTimeData::default(),
            registry.get(2025).unwrap(),
        )
        .unwrap();
        assert_eq!(result.industry, IndustryType::Construction);
        assert_eq!(result.taxable_additions, Decimal::ZERO);
        // SOKA-BAU is due regardless of the input
        assert!(result.employer_additional_costs > Decimal::ZERO);
    }

    #[test]
    fn test_context_for_hourly_paid_employee() {
        let registry = RateRegistry::builtin().unwrap();
        let mut hourly = employee(IndustryConfig::Standard);
        hourly.hourly_wage = Some(Decimal::from(15));
        hourly.weekly_hours = Decimal::from(20);
        let working_time = WorkingTimeData {
            regular_hours: Decimal::from(80),
            overtime_hours: Decimal::from(6),
            ..WorkingTimeData::default()
        };
        let ctx = IndustryContext::for_employee(
            &hourly,
            PayrollPeriod::new(2025, 1).unwrap(),
            &working_time,
            registry.get(2025).unwrap(),
        );
        assert_eq!(ctx.hourly_rate, Decimal::from(15));
        // 15 × 86 recorded hours
        assert_eq!(ctx.base_gross, Decimal::from(1290));
    }

    #[test]
    fn test_soka_bau_levy_follows_prorated_base_gross() {
        let registry = RateRegistry::builtin().unwrap();
        let rates = registry.get(2025).unwrap();
        let builder = employee(IndustryConfig::Construction(ConstructionConfig::default()));
        let period = PayrollPeriod::new(2025, 6).unwrap();
        let half_month = WorkingTimeData {
            actual_working_days: Decimal::from(10),
            expected_working_days: Decimal::from(20),
            ..WorkingTimeData::default()
        };

        let full = calculate_industry_surcharges(
            &builder,
            &IndustryPayrollInput::Standard,
            period,
            &WorkingTimeData::default(),
            rates,
        )
        .unwrap();
        let half = calculate_industry_surcharges(
            &builder,
            &IndustryPayrollInput::Standard,
            period,
            &half_month,
            rates,
        )
        .unwrap();

        assert_eq!(
            full.employer_additional_costs,
            Decimal::from(3464) * rates.industry.construction.soka_bau_rate
        );
        assert_eq!(
            half.employer_additional_costs * Decimal::from(2),
            full.employer_additional_costs
        );
    }
}
