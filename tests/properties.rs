//! Property tests for the payroll engine.
//!
//! These run the library directly (no HTTP) over generated salaries,
//! employee attributes and periods.

use chrono::{NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use lohnwerk::analytics::{AnomalyDetectionConfig, calculate_health_score, detect_anomalies};
use lohnwerk::calculation::{
    PayrollInput, SocialInsuranceInput, calculate_social_insurance, compute,
    progressive_income_tax,
};
use lohnwerk::config::RateRegistry;
use lohnwerk::models::{
    Additions, AnomalySeverity, AnomalyStatus, AnomalyType, ConstructionConfig,
    ConstructionInput, ContributionRegime, Deductions, Employee, EmploymentType,
    HistoricalPayrollData, IndustryConfig, IndustryPayrollInput, PayrollAnomaly, PayrollPeriod,
    Region, TaxClass, WorkingTimeData,
};

// =============================================================================
// Helpers
// =============================================================================

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn registry() -> RateRegistry {
    RateRegistry::builtin().unwrap()
}

fn employee(monthly_salary: Decimal) -> Employee {
    Employee {
        id: "emp_001".to_string(),
        name: "Max Mustermann".to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(1994, 5, 10).unwrap(),
        state: "NW".to_string(),
        church_tax: false,
        tax_class: TaxClass::I,
        child_allowances: Decimal::ZERO,
        weekly_hours: Decimal::from(40),
        monthly_salary,
        hourly_wage: None,
        employment_type: EmploymentType::Fulltime,
        industry: IndustryConfig::Standard,
    }
}

fn payroll(employee: Employee, month: u32) -> PayrollInput {
    PayrollInput {
        employee,
        period: PayrollPeriod::new(2025, month).unwrap(),
        working_time: WorkingTimeData::default(),
        additions: Additions::default(),
        deductions: Deductions::default(),
        industry_input: IndustryPayrollInput::Standard,
    }
}

fn steady_history(gross: Decimal) -> Vec<HistoricalPayrollData> {
    (1..=3)
        .map(|month| HistoricalPayrollData {
            employee_id: "emp_001".to_string(),
            period: PayrollPeriod::new(2025, month).unwrap(),
            gross_salary: gross,
            net_salary: gross * dec("0.66"),
            overtime_hours: Decimal::ZERO,
            bonuses: Decimal::ZERO,
            deductions: Decimal::ZERO,
            income_tax: Decimal::ZERO,
            employee_social_security: Decimal::ZERO,
        })
        .collect()
}

fn euros(max_cents: i64) -> impl Strategy<Value = Decimal> {
    (0..=max_cents).prop_map(|cents| Decimal::new(cents, 2))
}

fn tax_class() -> impl Strategy<Value = TaxClass> {
    prop_oneof![
        Just(TaxClass::I),
        Just(TaxClass::II),
        Just(TaxClass::III),
        Just(TaxClass::IV),
        Just(TaxClass::V),
        Just(TaxClass::VI),
    ]
}

fn state() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("NW"), Just("BY"), Just("BW"), Just("SN"), Just("BE")]
}

fn severity() -> impl Strategy<Value = AnomalySeverity> {
    prop_oneof![
        Just(AnomalySeverity::Low),
        Just(AnomalySeverity::Medium),
        Just(AnomalySeverity::High),
        Just(AnomalySeverity::Critical),
    ]
}

fn status() -> impl Strategy<Value = AnomalyStatus> {
    prop_oneof![
        Just(AnomalyStatus::Detected),
        Just(AnomalyStatus::Resolved),
        Just(AnomalyStatus::Dismissed),
    ]
}

// =============================================================================
// Deterministic checks
// =============================================================================

#[test]
fn test_golden_case() {
    let entry = compute(&payroll(employee(dec("3500")), 1), &registry()).unwrap();
    assert!((entry.final_net_salary - dec("2333.62")).abs() <= dec("0.05"));
}

#[test]
fn test_tariff_zone_boundaries() {
    let registry = registry();
    let rates = &registry.get(2025).unwrap().income_tax;
    let cent = dec("0.01");

    for boundary in [rates.basic_allowance, rates.zone1.to] {
        let step = progressive_income_tax(boundary + cent, rates)
            - progressive_income_tax(boundary, rates);
        assert!(step.abs() <= cent, "step of {} at {}", step, boundary);
    }
    let top = rates.zone3.to.unwrap();
    let step = progressive_income_tax(top + cent, rates) - progressive_income_tax(top, rates);
    assert!(step.abs() <= cent, "step of {} at {}", step, top);

    // The 2025 coefficients leave a small step between zone 2 and 3
    let step = progressive_income_tax(rates.zone2.to + cent, rates)
        - progressive_income_tax(rates.zone2.to, rates);
    assert!(step.abs() < dec("0.10"), "step of {} at {}", step, rates.zone2.to);
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn prop_social_insurance_splits_sum_to_totals(
        gross in euros(8_050_000),
        age in 18u32..67,
        childless in any::<bool>(),
        east in any::<bool>(),
        parttime in any::<bool>(),
    ) {
        let registry = registry();
        let input = SocialInsuranceInput {
            gross_monthly: gross,
            age,
            childless,
            region: if east { Region::East } else { Region::West },
            employment_type: if parttime { EmploymentType::Parttime } else { EmploymentType::Fulltime },
        };
        let result = calculate_social_insurance(&input, registry.get(2025).unwrap()).unwrap();

        for split in [result.pension, result.unemployment, result.health, result.care] {
            prop_assert_eq!(split.employee + split.employer, split.total);
            prop_assert!(split.employee >= Decimal::ZERO);
        }
        prop_assert_eq!(
            result.totals.employee,
            result.pension.employee + result.unemployment.employee
                + result.health.employee + result.care.employee
        );
        prop_assert_eq!(
            result.totals.total,
            result.pension.total + result.unemployment.total
                + result.health.total + result.care.total
        );
    }

    #[test]
    fn prop_income_tax_is_monotonic(a in 0i64..400_000, b in 0i64..400_000) {
        let registry = registry();
        let rates = &registry.get(2025).unwrap().income_tax;
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(
            progressive_income_tax(Decimal::from(low), rates)
                <= progressive_income_tax(Decimal::from(high), rates)
        );
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_accounting_identity(
        salary in euros(1_500_000),
        bonus in euros(200_000),
        advances in euros(50_000),
        class in tax_class(),
        halves in 0u32..=6,
        church in any::<bool>(),
        state in state(),
    ) {
        let mut emp = employee(salary);
        emp.tax_class = class;
        emp.child_allowances = Decimal::new(i64::from(halves) * 5, 1);
        emp.church_tax = church;
        emp.state = state.to_string();
        let mut input = payroll(emp, 7);
        input.additions.bonuses = bonus;
        input.deductions.advances = advances;

        let entry = compute(&input, &registry()).unwrap();
        let s = &entry.salary;
        let lhs = entry.final_net_salary + s.taxes.total + s.social_security.totals.employee
            - s.tax_free_additions;
        let rhs = s.gross_salary - input.deductions.total();
        prop_assert!((lhs - rhs).abs() <= dec("0.01"), "identity off by {}", lhs - rhs);
    }

    #[test]
    fn prop_minijob_employee_pays_nothing(
        class in tax_class(),
        age in 16u32..70,
        childless in any::<bool>(),
        church in any::<bool>(),
        state in state(),
    ) {
        let mut emp = employee(dec("538"));
        emp.employment_type = EmploymentType::Minijob;
        emp.weekly_hours = dec("10");
        emp.tax_class = class;
        emp.date_of_birth = NaiveDate::from_ymd_opt(2025 - age as i32, 1, 1).unwrap();
        emp.child_allowances = if childless { Decimal::ZERO } else { Decimal::ONE };
        emp.church_tax = church;
        emp.state = state.to_string();

        let entry = compute(&payroll(emp, 5), &registry()).unwrap();
        let ss = &entry.salary.social_security;
        prop_assert_eq!(ss.regime, ContributionRegime::Minijob);
        for split in [ss.pension, ss.unemployment, ss.health, ss.care, ss.totals] {
            prop_assert_eq!(split.employee, Decimal::ZERO);
        }
        prop_assert_eq!(entry.salary.taxes.income_tax, Decimal::ZERO);
        prop_assert_eq!(entry.salary.taxes.solidarity_tax, Decimal::ZERO);
        prop_assert_eq!(entry.salary.taxes.church_tax, Decimal::ZERO);
        prop_assert!(entry.salary.taxes.employer_flat_tax > Decimal::ZERO);
        prop_assert_eq!(entry.final_net_salary, dec("538.00"));
    }

    #[test]
    fn prop_winter_allowance_only_in_winter(month in 1u32..=12, hours in 1u32..200) {
        let mut emp = employee(dec("3464"));
        emp.industry = IndustryConfig::Construction(ConstructionConfig::default());
        let mut input = payroll(emp, month);
        input.industry_input = IndustryPayrollInput::Construction(ConstructionInput {
            winter_hours: Decimal::from(hours),
            ..ConstructionInput::default()
        });

        let entry = compute(&input, &registry()).unwrap();
        if matches!(month, 12 | 1 | 2 | 3) {
            prop_assert_eq!(entry.salary.tax_free_additions, Decimal::from(hours));
        } else {
            prop_assert_eq!(entry.salary.tax_free_additions, Decimal::ZERO);
        }
    }

    #[test]
    fn prop_deviation_threshold_is_exclusive(previous in 1000u32..9000) {
        let registry = registry();
        let config = AnomalyDetectionConfig::default();
        let detected_at = Utc.with_ymd_and_hms(2025, 4, 30, 0, 0, 0).unwrap();
        let previous = Decimal::from(previous);
        let history = steady_history(previous);

        let at_threshold = employee(previous * dec("1.2"));
        let entry = compute(&payroll(at_threshold.clone(), 4), &registry).unwrap();
        let anomalies = detect_anomalies(
            &[at_threshold], &[entry], &history, &[], &registry, &config, detected_at,
        );
        prop_assert!(anomalies.is_empty(), "unexpected: {:?}", anomalies);

        let above = employee(previous * dec("1.2") + dec("0.01"));
        let entry = compute(&payroll(above.clone(), 4), &registry).unwrap();
        let anomalies = detect_anomalies(
            &[above], &[entry], &history, &[], &registry, &config, detected_at,
        );
        prop_assert_eq!(anomalies.len(), 1);
        prop_assert_eq!(anomalies[0].anomaly_type, AnomalyType::SalarySpike);
    }

    #[test]
    fn prop_rerun_with_open_anomalies_adds_nothing(
        salary in 1500u32..9000,
        previous in 1500u32..9000,
        bonus in 0u32..20_000,
        overtime in 0u32..80,
        month in 2u32..=12,
    ) {
        let registry = registry();
        let config = AnomalyDetectionConfig::default();
        let detected_at = Utc.with_ymd_and_hms(2025, 12, 31, 0, 0, 0).unwrap();
        let emp = employee(Decimal::from(salary));
        let mut input = payroll(emp.clone(), month);
        input.additions.bonuses = Decimal::from(bonus);
        input.working_time.overtime_hours = Decimal::from(overtime);
        let entry = compute(&input, &registry).unwrap();
        let history = steady_history(Decimal::from(previous));
        let employees = [emp];
        let entries = [entry];

        let first = detect_anomalies(
            &employees, &entries, &history, &[], &registry, &config, detected_at,
        );
        let second = detect_anomalies(
            &employees, &entries, &history, &first, &registry, &config, detected_at,
        );
        prop_assert!(second.is_empty(), "second run raised {:?}", second);
    }
}

proptest! {
    #[test]
    fn prop_health_score_bounded(
        anomalies in prop::collection::vec((severity(), status()), 0..20),
    ) {
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let anomalies: Vec<PayrollAnomaly> = anomalies
            .into_iter()
            .map(|(severity, status)| PayrollAnomaly {
                id: Uuid::new_v4(),
                anomaly_type: AnomalyType::UnusualBonus,
                severity,
                employee_id: "emp_001".to_string(),
                current_value: Decimal::from(8000),
                expected_value: None,
                deviation: None,
                detected_at: at,
                period: PayrollPeriod::new(2025, 5).unwrap(),
                status,
                message: String::new(),
                closed_at: None,
            })
            .collect();

        let score = calculate_health_score(&anomalies);
        prop_assert!(score <= 100);

        let open: Vec<PayrollAnomaly> = anomalies.iter().filter(|a| a.is_open()).cloned().collect();
        prop_assert_eq!(score, calculate_health_score(&open));
        if open.is_empty() {
            prop_assert_eq!(score, 100);
        }
    }
}
