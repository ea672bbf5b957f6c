//! Statutory deduction calculation with per-template error isolation.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::calculation::amount::calculate_statutory_amounts;
use crate::models::{Employee, StatutoryItem};
use crate::registry::TemplateRegistry;

/// The statutory deductions resolved for one employee.
///
/// This calculation never aborts: failures in jurisdiction resolution
/// or in individual templates are reported in `errors` while the
/// remaining templates still contribute.
#[derive(Debug, Clone, Default)]
pub struct StatutoryDeductionResult {
    /// Successfully computed statutory items.
    pub items: Vec<StatutoryItem>,
    /// Sum of employee-side amounts.
    pub employee_total: Decimal,
    /// Sum of employer-side amounts.
    pub employer_total: Decimal,
    /// Templates or resolution steps that failed, each named.
    pub errors: Vec<String>,
    /// Conditions resolved to 0 instead of failing.
    pub warnings: Vec<String>,
}

impl StatutoryDeductionResult {
    fn resolution_failure(message: String) -> Self {
        tracing::warn!(%message, "statutory resolution failed");
        Self {
            errors: vec![message],
            ..Self::default()
        }
    }
}

/// Computes all mandatory statutory deductions for an employee.
///
/// Resolution walks employee to company to country to the jurisdiction
/// effective on `as_of`. A break anywhere in that chain yields zero
/// deductions with a descriptive error rather than a hard failure, so
/// a misconfigured jurisdiction never blocks an entire payroll run.
pub fn calculate_statutory_deductions(
    employee: &Employee,
    gross_salary: Decimal,
    as_of: NaiveDate,
    registry: &TemplateRegistry,
) -> StatutoryDeductionResult {
    let Some(company) = registry.company(&employee.company_code) else {
        return StatutoryDeductionResult::resolution_failure(format!(
            "company '{}' not found; statutory deductions skipped",
            employee.company_code
        ));
    };

    let Some(jurisdiction) = registry.jurisdiction_for_country(&company.country, as_of) else {
        return StatutoryDeductionResult::resolution_failure(format!(
            "no tax jurisdiction effective for country '{}' on {as_of}; statutory deductions skipped",
            company.country
        ));
    };

    let mut result = StatutoryDeductionResult::default();

    for template in &jurisdiction.deductions {
        if !template.is_effective_on(as_of) {
            continue;
        }

        match calculate_statutory_amounts(&template.code, &template.method, gross_salary) {
            Ok(amounts) => {
                result.employee_total += amounts.employee;
                result.employer_total += amounts.employer;
                result.warnings.extend(amounts.warnings);
                result.items.push(StatutoryItem {
                    code: template.code.clone(),
                    name: template.name.clone(),
                    deduction_type: template.deduction_type,
                    calculation_base: amounts.calculation_base,
                    rate_applied: amounts.rate_applied,
                    employee_amount: amounts.employee,
                    employer_amount: amounts.employer,
                    calculation_details: amounts.details,
                });
            }
            Err(error) => {
                tracing::warn!(
                    template = %template.code,
                    jurisdiction = %jurisdiction.code,
                    %error,
                    "statutory template failed"
                );
                result
                    .errors
                    .push(format!("{} ({}): {error}", template.name, template.code));
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        CalculationMethod, Company, EmploymentType, PayFrequency, ProgressiveBand,
        StatutoryDeductionTemplate, StatutoryDeductionType, TaxJurisdiction,
    };
    use std::str::FromStr;
    use uuid::Uuid;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn employee() -> Employee {
        Employee {
            id: Uuid::new_v4(),
            company_code: "acme_ke".to_string(),
            base_salary: dec("600000"),
            pay_frequency: PayFrequency::Monthly,
            employment_start_date: date("2020-01-01"),
            hire_date: None,
            termination_date: None,
            employment_type: EmploymentType::FullTime,
            department: None,
            position: None,
            manager_id: None,
        }
    }

    fn paye() -> StatutoryDeductionTemplate {
        StatutoryDeductionTemplate {
            code: "paye".to_string(),
            name: "Pay As You Earn".to_string(),
            deduction_type: StatutoryDeductionType::IncomeTax,
            method: CalculationMethod::ProgressiveBracket {
                brackets: vec![
                    ProgressiveBand {
                        min: dec("0"),
                        max: Some(dec("24000")),
                        rate: dec("0.10"),
                    },
                    ProgressiveBand {
                        min: dec("24000"),
                        max: None,
                        rate: dec("0.25"),
                    },
                ],
                rebate: None,
            },
            is_mandatory: true,
            active: true,
            effective_from: date("2024-01-01"),
            effective_to: None,
        }
    }

    fn nssf() -> StatutoryDeductionTemplate {
        StatutoryDeductionTemplate {
            code: "nssf".to_string(),
            name: "Social Security".to_string(),
            deduction_type: StatutoryDeductionType::SocialInsurance,
            method: CalculationMethod::Percentage {
                employee_rate: dec("0.06"),
                employer_rate: dec("0.06"),
                maximum_salary: Some(dec("18000")),
            },
            is_mandatory: true,
            active: true,
            effective_from: date("2024-01-01"),
            effective_to: None,
        }
    }

    fn registry(deductions: Vec<StatutoryDeductionTemplate>) -> TemplateRegistry {
        let registry = TemplateRegistry::new(
            vec![Company {
                code: "acme_ke".to_string(),
                name: "Acme Kenya".to_string(),
                country: "KE".to_string(),
            }],
            Default::default(),
            vec![TaxJurisdiction {
                code: "ke_2024".to_string(),
                name: "Kenya 2024".to_string(),
                country: "KE".to_string(),
                region: None,
                effective_from: date("2024-01-01"),
                effective_to: None,
                deductions,
            }],
        );
        registry.validate().unwrap();
        registry
    }

    #[test]
    fn test_applies_all_effective_templates() {
        let result = calculate_statutory_deductions(
            &employee(),
            dec("50000"),
            date("2025-06-30"),
            &registry(vec![paye(), nssf()]),
        );
        assert_eq!(result.items.len(), 2);
        assert!(result.errors.is_empty());
        // paye: 24000*0.10 + 26000*0.25 = 8900; nssf: 6% of capped 18000 = 1080
        assert_eq!(result.employee_total, dec("9980.00"));
        assert_eq!(result.employer_total, dec("1080.00"));
    }

    #[test]
    fn test_unknown_company_reports_error_with_zero_totals() {
        let mut e = employee();
        e.company_code = "ghost".to_string();
        let result = calculate_statutory_deductions(
            &e,
            dec("50000"),
            date("2025-06-30"),
            &registry(vec![paye()]),
        );
        assert!(result.items.is_empty());
        assert_eq!(result.employee_total, Decimal::ZERO);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("ghost"));
    }

    #[test]
    fn test_missing_jurisdiction_reports_error() {
        // Query a date before the jurisdiction takes effect.
        let result = calculate_statutory_deductions(
            &employee(),
            dec("50000"),
            date("2023-06-30"),
            &registry(vec![paye()]),
        );
        assert!(result.items.is_empty());
        assert!(result.errors[0].contains("KE"));
    }

    #[test]
    fn test_failed_template_does_not_block_siblings() {
        let mut broken = paye();
        broken.method = CalculationMethod::ProgressiveBracket {
            brackets: vec![],
            rebate: None,
        };
        let result = calculate_statutory_deductions(
            &employee(),
            dec("50000"),
            date("2025-06-30"),
            &registry(vec![broken, nssf()]),
        );
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].code, "nssf");
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("Pay As You Earn"));
    }

    #[test]
    fn test_inactive_template_is_skipped_silently() {
        let mut dormant = nssf();
        dormant.active = false;
        let result = calculate_statutory_deductions(
            &employee(),
            dec("50000"),
            date("2025-06-30"),
            &registry(vec![paye(), dormant]),
        );
        assert_eq!(result.items.len(), 1);
        assert!(result.errors.is_empty());
    }
}
