//! Gross-to-net orchestration.
//!
//! Runs one employee through a payroll period in a fixed order:
//!
//! 1. Base gross from the contract and worked time, plus explicit additions
//! 2. Industry additions (taxable into the gross, tax-free carried separately)
//! 3. Social insurance on the monthly taxable gross
//! 4. Yearly taxable income and taxes, de-annualized to the month
//! 5. Net salary
//! 6. Period deductions
//! 7. Rounding of the final net, once, to cents
//!
//! Every step is recorded in the entry's audit trace. Intermediate figures
//! stay unrounded.

use std::time::Instant;

use chrono::{NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{RateRegistry, RateTable};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    Additions, AdvisoryWarning, AuditStep, AuditTrace, ContributionRegime, Deductions, Employee,
    EmployerCosts, IndustryPayrollInput, IndustryPayrollResult, IndustryType, PayrollEntry,
    PayrollPeriod, SalaryCalculation, SocialSecurityContributions, TaxBreakdown, WarningSeverity,
    WorkingTimeData,
};

use super::industry::calculate_industry_surcharges;
use super::income_tax::{TaxInput, calculate_income_tax};
use super::social_insurance::{SocialInsuranceInput, calculate_social_insurance};

const MONTHS_PER_YEAR: Decimal = Decimal::from_parts(12, 0, 0, false, 0);

/// Everything needed to run payroll for one employee and period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollInput {
    /// The employee.
    pub employee: Employee,
    /// The payroll period.
    pub period: PayrollPeriod,
    /// Worked time.
    #[serde(default)]
    pub working_time: WorkingTimeData,
    /// Explicit additions.
    #[serde(default)]
    pub additions: Additions,
    /// Deductions.
    #[serde(default)]
    pub deductions: Deductions,
    /// Industry input for the employee's industry module.
    #[serde(default)]
    pub industry_input: IndustryPayrollInput,
}

/// Monthly amounts entering the tax and social insurance calculation.
#[derive(Debug, Clone, Copy)]
pub struct SalaryInput<'a> {
    /// The employee.
    pub employee: &'a Employee,
    /// Age at the end of the period.
    pub age: u32,
    /// Monthly taxable gross.
    pub taxable_gross: Decimal,
    /// Monthly tax-free additions.
    pub tax_free_additions: Decimal,
    /// Employer-only industry costs.
    pub industry_employer_costs: Decimal,
}

/// Returns the last calendar day of a period.
pub fn period_end(period: PayrollPeriod) -> EngineResult<NaiveDate> {
    let next = period.next();
    NaiveDate::from_ymd_opt(next.year, next.month, 1)
        .and_then(|first| first.pred_opt())
        .ok_or_else(|| {
            EngineError::invalid_input("period", format!("{} is not a valid calendar month", period))
        })
}

/// Annual employee pension, health and care contributions, deducted from the
/// taxable income as Vorsorgepauschale.
pub fn vorsorgepauschale(social_security: &SocialSecurityContributions) -> Decimal {
    (social_security.pension.employee
        + social_security.health.employee
        + social_security.care.employee)
        * MONTHS_PER_YEAR
}

/// Yearly taxable income (zvE) for a monthly taxable gross.
///
/// `12 × gross − employee lump sum − special expenses lump sum −
/// Vorsorgepauschale`, never negative.
pub fn annual_taxable_income(
    taxable_gross: Decimal,
    social_security: &SocialSecurityContributions,
    table: &RateTable,
) -> Decimal {
    let rates = &table.income_tax;
    (taxable_gross * MONTHS_PER_YEAR
        - rates.employee_lump_sum
        - rates.special_expenses_lump_sum
        - vorsorgepauschale(social_security))
    .max(Decimal::ZERO)
}

/// Computes social insurance, taxes, net and employer costs for a monthly
/// taxable gross.
///
/// Minijobs pay no employee tax; the employer owes the flat payroll tax on
/// the gross instead.
///
/// # Errors
///
/// - `InvalidSalary` if the gross or the tax-free additions are negative
/// - `InvalidIncome` if the derived taxable income is negative
pub fn calculate_salary(input: &SalaryInput<'_>, table: &RateTable) -> EngineResult<SalaryCalculation> {
    if input.tax_free_additions < Decimal::ZERO {
        return Err(EngineError::InvalidSalary {
            value: input.tax_free_additions,
        });
    }

    let employee = input.employee;
    let social_security = calculate_social_insurance(
        &SocialInsuranceInput {
            gross_monthly: input.taxable_gross,
            age: input.age,
            childless: employee.is_childless(),
            region: employee.region(),
            employment_type: employee.employment_type,
        },
        table,
    )?;

    let (taxable_income, annual_taxes) = if social_security.regime == ContributionRegime::Minijob {
        let flat = input.taxable_gross * MONTHS_PER_YEAR * table.low_income.minijob_flat_tax_rate;
        (Decimal::ZERO, TaxBreakdown::employer_flat(flat))
    } else {
        let taxable_income = annual_taxable_income(input.taxable_gross, &social_security, table);
        let result = calculate_income_tax(
            &TaxInput {
                taxable_income,
                tax_class: employee.tax_class,
                child_allowances: employee.child_allowances,
                church_tax: employee.church_tax,
                state: employee.state.clone(),
            },
            table,
        )?;
        (taxable_income, result.breakdown)
    };
    let taxes = annual_taxes.divided_by(MONTHS_PER_YEAR);

    let net_salary = input.taxable_gross - social_security.totals.employee - taxes.total
        + input.tax_free_additions;

    let employer_costs = EmployerCosts::new(
        input.taxable_gross,
        input.tax_free_additions,
        social_security.totals.employer,
        taxes.employer_flat_tax,
        input.industry_employer_costs,
    );

    Ok(SalaryCalculation {
        gross_salary: input.taxable_gross,
        tax_free_additions: input.tax_free_additions,
        total_gross: input.taxable_gross + input.tax_free_additions,
        net_salary,
        social_security,
        taxes,
        annual_taxes,
        taxable_income,
        employer_costs,
    })
}

/// Runs payroll for one employee and period.
///
/// Looks up the rate table for the period's year and runs the employee's
/// industry module before the gross-to-net calculation.
///
/// # Errors
///
/// - `UnsupportedTaxYear` if no rate table exists for the period's year
/// - `InvalidInput` for negative amounts or inconsistent working time
/// - `UnsupportedConfiguration` for an industry input that does not match
///   the employee's industry
///
/// # Examples
///
/// ```
/// use lohnwerk::calculation::{PayrollInput, compute};
/// use lohnwerk::config::RateRegistry;
/// use rust_decimal::Decimal;
///
/// let registry = RateRegistry::builtin().unwrap();
/// let input: PayrollInput = serde_json::from_str(r#"{
///     "employee": {
///         "id": "emp_001", "name": "Max Mustermann", "date_of_birth": "1994-05-10",
///         "state": "NW", "tax_class": 1, "weekly_hours": "40",
///         "monthly_salary": "3500", "employment_type": "fulltime"
///     },
///     "period": {"year": 2025, "month": 1}
/// }"#).unwrap();
///
/// let entry = compute(&input, &registry).unwrap();
/// assert_eq!(entry.final_net_salary, Decimal::new(233362, 2));
/// ```
pub fn compute(input: &PayrollInput, registry: &RateRegistry) -> EngineResult<PayrollEntry> {
    input.period.validate()?;
    let table = registry.get(input.period.year)?;

    let no_industry = input.employee.industry.industry_type() == IndustryType::Standard
        && input.industry_input == IndustryPayrollInput::Standard;
    let industry = if no_industry {
        None
    } else {
        Some(calculate_industry_surcharges(
            &input.employee,
            &input.industry_input,
            input.period,
            &input.working_time,
            table,
        )?)
    };

    compute_entry(
        &input.employee,
        input.period,
        &input.working_time,
        &input.additions,
        &input.deductions,
        industry,
        table,
    )
}

/// Runs payroll for several employees independently.
///
/// One failing input does not affect the others.
pub fn compute_batch(
    inputs: &[PayrollInput],
    registry: &RateRegistry,
) -> Vec<EngineResult<PayrollEntry>> {
    let results: Vec<_> = inputs.iter().map(|input| compute(input, registry)).collect();
    let failed = results.iter().filter(|r| r.is_err()).count();
    info!(
        entries = inputs.len(),
        failed,
        "Completed payroll batch"
    );
    results
}

struct TraceBuilder {
    steps: Vec<AuditStep>,
}

impl TraceBuilder {
    fn new() -> Self {
        Self { steps: Vec::new() }
    }

    fn push(
        &mut self,
        rule_id: &str,
        rule_name: &str,
        legal_ref: &str,
        input: serde_json::Value,
        output: serde_json::Value,
        reasoning: String,
    ) {
        self.steps.push(AuditStep {
            step_number: self.steps.len() as u32 + 1,
            rule_id: rule_id.to_string(),
            rule_name: rule_name.to_string(),
            legal_ref: legal_ref.to_string(),
            input,
            output,
            reasoning,
        });
    }
}

fn validate_employee(employee: &Employee) -> EngineResult<()> {
    if employee.monthly_salary < Decimal::ZERO {
        return Err(EngineError::InvalidSalary {
            value: employee.monthly_salary,
        });
    }
    if let Some(wage) = employee.hourly_wage {
        if wage < Decimal::ZERO {
            return Err(EngineError::invalid_input(
                "hourly_wage",
                format!("must not be negative (got {})", wage),
            ));
        }
    }
    if employee.weekly_hours < Decimal::ZERO {
        return Err(EngineError::invalid_input(
            "weekly_hours",
            format!("must not be negative (got {})", employee.weekly_hours),
        ));
    }
    if employee.child_allowances < Decimal::ZERO {
        return Err(EngineError::invalid_input(
            "child_allowances",
            format!("must not be negative (got {})", employee.child_allowances),
        ));
    }
    Ok(())
}

fn validate_amounts(additions: &Additions, deductions: &Deductions) -> EngineResult<()> {
    let fields = [
        ("additions.bonuses", additions.bonuses),
        ("additions.overtime_premiums", additions.overtime_premiums),
        ("additions.one_time_payments", additions.one_time_payments),
        ("additions.other", additions.other),
        ("deductions.unpaid_leave", deductions.unpaid_leave),
        ("deductions.advances", deductions.advances),
        ("deductions.other", deductions.other),
    ];
    for (field, value) in fields {
        if value < Decimal::ZERO {
            return Err(EngineError::invalid_input(
                field,
                format!("must not be negative (got {})", value),
            ));
        }
    }
    Ok(())
}

/// Runs the gross-to-net calculation with an already computed industry
/// result.
///
/// # Errors
///
/// Fails fast on invalid input; see [`compute`].
pub fn compute_entry(
    employee: &Employee,
    period: PayrollPeriod,
    working_time: &WorkingTimeData,
    additions: &Additions,
    deductions: &Deductions,
    industry: Option<IndustryPayrollResult>,
    table: &RateTable,
) -> EngineResult<PayrollEntry> {
    let start_time = Instant::now();

    period.validate()?;
    if period.year != table.year {
        return Err(EngineError::UnsupportedTaxYear { year: period.year });
    }
    validate_employee(employee)?;
    working_time.validate()?;
    validate_amounts(additions, deductions)?;

    let age = employee.age_on(period_end(period)?);
    let mut trace = TraceBuilder::new();

    // 1. Base gross
    let base_gross = employee.base_gross(working_time);
    let additions_total = additions.total();
    trace.push(
        "base_gross",
        "Base Gross Salary",
        "§611a BGB",
        serde_json::json!({
            "monthly_salary": employee.monthly_salary.to_string(),
            "hourly_wage": employee.hourly_wage.map(|w| w.to_string()),
            "paid_ratio": working_time.paid_ratio().to_string(),
            "hours": working_time.total_hours().to_string(),
            "additions": additions_total.to_string()
        }),
        serde_json::json!({
            "base_gross": base_gross.to_string(),
            "gross_with_additions": (base_gross + additions_total).to_string()
        }),
        match employee.hourly_wage {
            Some(wage) => format!(
                "{}h × {} EUR hourly wage, plus {} EUR additions",
                working_time.total_hours(),
                wage,
                additions_total
            ),
            None => format!(
                "Monthly salary {} EUR × paid ratio {}, plus {} EUR additions",
                employee.monthly_salary,
                working_time.paid_ratio().round_dp(4),
                additions_total
            ),
        },
    );

    // 2. Industry additions
    let mut warnings: Vec<AdvisoryWarning> = industry
        .as_ref()
        .map(|result| result.warnings.clone())
        .unwrap_or_default();
    let industry = industry.filter(|result| result.industry != IndustryType::Standard);
    let (industry_taxable, tax_free_additions, industry_employer_costs) = match &industry {
        Some(result) => (
            result.taxable_additions,
            result.tax_free_additions,
            result.employer_additional_costs,
        ),
        None => (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO),
    };
    let taxable_gross = base_gross + additions_total + industry_taxable;
    if let Some(result) = &industry {
        trace.push(
            "industry_additions",
            "Industry Additions",
            "§3b EStG, §3 Nr. 51 EStG",
            serde_json::json!({
                "industry": result.industry.to_string()
            }),
            serde_json::json!({
                "taxable_additions": result.taxable_additions.to_string(),
                "tax_free_additions": result.tax_free_additions.to_string(),
                "employer_additional_costs": result.employer_additional_costs.to_string()
            }),
            format!(
                "{} industry: {} EUR taxable, {} EUR tax-free",
                result.industry, result.taxable_additions, result.tax_free_additions
            ),
        );
    }

    // 3.-5. Social insurance, taxes and net
    let salary = calculate_salary(
        &SalaryInput {
            employee,
            age,
            taxable_gross,
            tax_free_additions,
            industry_employer_costs,
        },
        table,
    )?;

    let ss = &salary.social_security;
    trace.push(
        "social_insurance",
        "Social Insurance Contributions",
        match ss.regime {
            ContributionRegime::Minijob => "§8 SGB IV",
            ContributionRegime::Midijob => "§20 Abs. 2a SGB IV",
            ContributionRegime::Regular => "§20 SGB IV",
        },
        serde_json::json!({
            "gross": taxable_gross.to_string(),
            "age": age,
            "childless": employee.is_childless(),
            "employment_type": employee.employment_type.to_string()
        }),
        serde_json::json!({
            "regime": ss.regime,
            "employee": ss.totals.employee.to_string(),
            "employer": ss.totals.employer.to_string()
        }),
        format!(
            "{:?} regime: employee {} EUR, employer {} EUR",
            ss.regime, ss.totals.employee, ss.totals.employer
        ),
    );

    if ss.regime == ContributionRegime::Minijob {
        trace.push(
            "minijob_flat_tax",
            "Minijob Flat Tax",
            "§40a Abs. 2 EStG",
            serde_json::json!({
                "gross": taxable_gross.to_string(),
                "rate": table.low_income.minijob_flat_tax_rate.to_string()
            }),
            serde_json::json!({
                "employer_flat_tax": salary.taxes.employer_flat_tax.to_string()
            }),
            "Employer pays the flat payroll tax; no employee income tax".to_string(),
        );
    } else {
        trace.push(
            "taxable_income",
            "Taxable Income",
            "§9a EStG, §10c EStG, §39b EStG",
            serde_json::json!({
                "annual_gross": (taxable_gross * MONTHS_PER_YEAR).to_string(),
                "employee_lump_sum": table.income_tax.employee_lump_sum.to_string(),
                "special_expenses_lump_sum": table.income_tax.special_expenses_lump_sum.to_string(),
                "vorsorgepauschale": vorsorgepauschale(ss).to_string()
            }),
            serde_json::json!({
                "taxable_income": salary.taxable_income.to_string()
            }),
            format!("Yearly taxable income {} EUR", salary.taxable_income),
        );
        trace.push(
            "income_tax",
            "Income Tax, Solidarity Surcharge and Church Tax",
            "§32a EStG, §4 SolZG",
            serde_json::json!({
                "taxable_income": salary.taxable_income.to_string(),
                "tax_class": employee.tax_class,
                "child_allowances": employee.child_allowances.to_string(),
                "church_tax": employee.church_tax
            }),
            serde_json::json!({
                "annual_total": salary.annual_taxes.total.to_string(),
                "monthly_income_tax": salary.taxes.income_tax.to_string(),
                "monthly_solidarity_tax": salary.taxes.solidarity_tax.to_string(),
                "monthly_church_tax": salary.taxes.church_tax.to_string()
            }),
            format!(
                "Yearly taxes {} EUR, {} EUR per month",
                salary.annual_taxes.total,
                salary.taxes.total.round_dp(2)
            ),
        );
    }

    trace.push(
        "net_salary",
        "Net Salary",
        "§38 EStG",
        serde_json::json!({
            "gross": taxable_gross.to_string(),
            "social_security_employee": ss.totals.employee.to_string(),
            "taxes": salary.taxes.total.to_string(),
            "tax_free_additions": tax_free_additions.to_string()
        }),
        serde_json::json!({
            "net_salary": salary.net_salary.to_string()
        }),
        "Gross minus employee contributions and taxes, plus tax-free additions".to_string(),
    );

    // 6.-7. Deductions, benefits in kind and rounding
    let deductions_total = deductions.total();
    // Meals were taxed as gross but are not paid out in cash
    let benefits_in_kind = industry
        .as_ref()
        .map(IndustryPayrollResult::benefits_in_kind)
        .unwrap_or_default();
    let final_net_salary = (salary.net_salary - deductions_total - benefits_in_kind)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    trace.push(
        "final_net",
        "Deductions and Rounding",
        "§362 BGB, §8 Abs. 2 EStG",
        serde_json::json!({
            "net_salary": salary.net_salary.to_string(),
            "deductions": deductions_total.to_string(),
            "benefits_in_kind": benefits_in_kind.to_string()
        }),
        serde_json::json!({
            "final_net_salary": final_net_salary.to_string()
        }),
        format!(
            "Net minus {} EUR deductions and {} EUR benefits in kind, rounded to cents",
            deductions_total, benefits_in_kind
        ),
    );

    if final_net_salary < Decimal::ZERO {
        warn!(
            employee_id = %employee.id,
            period = %period,
            final_net = %final_net_salary,
            "Deductions exceed net salary"
        );
        warnings.push(AdvisoryWarning::new(
            "NEGATIVE_NET_SALARY",
            format!("Deductions exceed the net salary; final net is {}", final_net_salary),
            WarningSeverity::High,
        ));
    }

    let duration_us = start_time.elapsed().as_micros() as u64;
    debug!(
        employee_id = %employee.id,
        steps = trace.steps.len(),
        "Recorded audit trace"
    );
    info!(
        employee_id = %employee.id,
        period = %period,
        gross = %taxable_gross,
        final_net = %final_net_salary,
        duration_us,
        "Payroll calculated"
    );

    Ok(PayrollEntry {
        id: Uuid::new_v4(),
        employee_id: employee.id.clone(),
        period,
        working_time: working_time.clone(),
        salary,
        additions: additions.clone(),
        deductions: deductions.clone(),
        industry,
        final_net_salary,
        audit_trace: AuditTrace {
            steps: trace.steps,
            warnings,
            duration_us,
        },
        created_at: Utc::now(),
    })
}
