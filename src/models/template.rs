//! Payroll template and item models.
//!
//! This module defines the calculation method tagged union shared by all
//! template kinds, company-defined payroll templates with their eligibility
//! rules, employee-specific payroll items, and jurisdiction statutory
//! deduction templates.
//!
//! Method parameters are carried inside each [`CalculationMethod`] variant
//! rather than in a dynamic rules blob, so a template can only be
//! constructed or deserialized with the parameters its method actually
//! takes. An unrecognized method tag fails deserialization outright, which
//! is the fatal-configuration-error behavior the engine requires.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::EmploymentType;

/// One band of a progressive bracket table.
///
/// Bands partition the reference amount: the slice of the amount falling
/// inside `[min, max)` is taxed at `rate`. `max = None` marks the
/// open-ended top band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressiveBand {
    /// Lower bound of the band (inclusive).
    pub min: Decimal,
    /// Upper bound of the band (exclusive), or `None` for the top band.
    #[serde(default)]
    pub max: Option<Decimal>,
    /// The rate applied to the amount falling inside this band (e.g., 0.25).
    pub rate: Decimal,
}

/// One band of a salary bracket table.
///
/// Unlike progressive bands, exactly one salary band matches the reference
/// amount and its flat `amount` is returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryBand {
    /// Lower bound of the band (inclusive).
    pub min: Decimal,
    /// Upper bound of the band (inclusive), or `None` for the top band.
    #[serde(default)]
    pub max: Option<Decimal>,
    /// The flat amount owed by anyone whose reference amount falls in the band.
    pub amount: Decimal,
}

/// How an amount is computed from its parameters and base.
///
/// The first five variants are company/employee methods; the remaining four
/// are statutory methods used by jurisdiction deduction templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum CalculationMethod {
    /// A literal configured value.
    FixedAmount {
        /// The configured amount.
        amount: Decimal,
    },
    /// A percentage of the period gross base.
    PercentageOfSalary {
        /// The percentage (e.g., 15 for 15%).
        percentage: Decimal,
    },
    /// A percentage of the employee's period base salary.
    ///
    /// Uses base salary, not period gross, even inside deduction
    /// calculations.
    PercentageOfBasic {
        /// The percentage (e.g., 15 for 15%).
        percentage: Decimal,
    },
    /// A restricted formula expression over whitelisted variables.
    Formula {
        /// The expression source, e.g. `"{basic_salary} * 0.1 + 500"`.
        expression: String,
    },
    /// The calculator always returns 0; the real value is supplied directly
    /// by the caller or approver as a literal override.
    Manual,
    /// Progressive tax brackets over the reference amount.
    ProgressiveBracket {
        /// Ordered, non-overlapping bands.
        brackets: Vec<ProgressiveBand>,
        /// Optional rebate subtracted from the bracket sum, floored at 0.
        #[serde(default)]
        rebate: Option<Decimal>,
    },
    /// A flat amount selected by the band containing the reference amount.
    SalaryBracket {
        /// Ordered, non-overlapping bands.
        brackets: Vec<SalaryBand>,
    },
    /// A fixed amount, optionally gated by a minimum-salary threshold.
    FlatAmount {
        /// The configured amount.
        amount: Decimal,
        /// Below this reference amount the deduction does not apply.
        #[serde(default)]
        minimum_salary: Option<Decimal>,
    },
    /// A capped percentage with independent employee and employer rates:
    /// `rate * min(amount, maximum_salary)`.
    Percentage {
        /// The employee-side rate (e.g., 0.01 for 1%).
        employee_rate: Decimal,
        /// The employer-side rate.
        employer_rate: Decimal,
        /// Cap on the reference amount; absent means uncapped.
        #[serde(default)]
        maximum_salary: Option<Decimal>,
    },
}

impl CalculationMethod {
    /// Validates the method parameters.
    ///
    /// Rejects negative amounts, percentages, and rates, and bracket tables
    /// that are unordered, overlapping, inverted, or that place an
    /// open-ended band anywhere but last. `code` names the owning template
    /// in the error.
    pub fn validate(&self, code: &str) -> EngineResult<()> {
        let invalid = |message: String| EngineError::InvalidTemplate {
            code: code.to_string(),
            message,
        };

        match self {
            CalculationMethod::FixedAmount { amount } => {
                if amount.is_sign_negative() {
                    return Err(invalid(format!("fixed amount {amount} is negative")));
                }
            }
            CalculationMethod::PercentageOfSalary { percentage }
            | CalculationMethod::PercentageOfBasic { percentage } => {
                if percentage.is_sign_negative() {
                    return Err(invalid(format!("percentage {percentage} is negative")));
                }
            }
            CalculationMethod::Formula { expression } => {
                if expression.trim().is_empty() {
                    return Err(invalid("formula expression is empty".to_string()));
                }
            }
            CalculationMethod::Manual => {}
            CalculationMethod::ProgressiveBracket { brackets, rebate } => {
                validate_bands(
                    brackets.iter().map(|b| (b.min, b.max)),
                    brackets.len(),
                    &invalid,
                )?;
                for band in brackets {
                    if band.rate.is_sign_negative() {
                        return Err(invalid(format!("band rate {} is negative", band.rate)));
                    }
                }
                if let Some(rebate) = rebate {
                    if rebate.is_sign_negative() {
                        return Err(invalid(format!("rebate {rebate} is negative")));
                    }
                }
            }
            CalculationMethod::SalaryBracket { brackets } => {
                validate_bands(
                    brackets.iter().map(|b| (b.min, b.max)),
                    brackets.len(),
                    &invalid,
                )?;
                for band in brackets {
                    if band.amount.is_sign_negative() {
                        return Err(invalid(format!("band amount {} is negative", band.amount)));
                    }
                }
            }
            CalculationMethod::FlatAmount { amount, .. } => {
                if amount.is_sign_negative() {
                    return Err(invalid(format!("flat amount {amount} is negative")));
                }
            }
            CalculationMethod::Percentage {
                employee_rate,
                employer_rate,
                ..
            } => {
                if employee_rate.is_sign_negative() || employer_rate.is_sign_negative() {
                    return Err(invalid("percentage rate is negative".to_string()));
                }
            }
        }
        Ok(())
    }
}

fn validate_bands(
    bands: impl Iterator<Item = (Decimal, Option<Decimal>)>,
    len: usize,
    invalid: &impl Fn(String) -> EngineError,
) -> EngineResult<()> {
    if len == 0 {
        return Err(invalid("bracket table is empty".to_string()));
    }
    let mut previous_max: Option<Decimal> = None;
    for (index, (min, max)) in bands.enumerate() {
        if let Some(max) = max {
            if max < min {
                return Err(invalid(format!("band {index} has max {max} below min {min}")));
            }
        } else if index != len - 1 {
            return Err(invalid(format!(
                "band {index} is open-ended but not the last band"
            )));
        }
        if let Some(previous) = previous_max {
            if min < previous {
                return Err(invalid(format!("brackets overlap at {min}")));
            }
        }
        previous_max = max;
    }
    Ok(())
}

/// What a company payroll template contributes to the payslip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    /// Earnings on top of base salary (bonuses, commissions).
    Earning,
    /// Allowances (housing, transport).
    Allowance,
    /// Benefits in kind.
    Benefit,
    /// Employee-side deductions (loan repayments, welfare).
    Deduction,
    /// Employer-side costs that never reduce the employee's net.
    EmployerContribution,
}

/// Structured eligibility predicate attached to a company template.
///
/// An absent dimension is unrestricted; every configured dimension must
/// hold for the template to apply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EligibilityRules {
    /// Departments the template is restricted to.
    #[serde(default)]
    pub departments: Option<Vec<String>>,
    /// Positions the template is restricted to.
    #[serde(default)]
    pub positions: Option<Vec<String>>,
    /// Employment types the template is restricted to.
    #[serde(default)]
    pub employment_types: Option<Vec<EmploymentType>>,
    /// Minimum annual base salary (inclusive).
    #[serde(default)]
    pub min_salary: Option<Decimal>,
    /// Maximum annual base salary (inclusive).
    #[serde(default)]
    pub max_salary: Option<Decimal>,
}

/// A company-defined payroll item template.
///
/// Referenced, never mutated, during calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyPayrollTemplate {
    /// Unique code within the company (e.g., "housing_allowance").
    pub code: String,
    /// Human-readable name.
    pub name: String,
    /// What the template contributes to the payslip.
    pub kind: TemplateKind,
    /// How the amount is computed.
    #[serde(flatten)]
    pub method: CalculationMethod,
    /// Whether the resulting amount is taxable.
    #[serde(default)]
    pub is_taxable: bool,
    /// Whether the resulting amount is pensionable.
    #[serde(default)]
    pub is_pensionable: bool,
    /// Who the template applies to.
    #[serde(default)]
    pub eligibility: EligibilityRules,
    /// Inactive templates never apply.
    pub active: bool,
    /// Whether resulting items require approval before payment.
    #[serde(default)]
    pub requires_approval: bool,
    /// First day the template is effective, if bounded.
    #[serde(default)]
    pub effective_from: Option<NaiveDate>,
    /// Last day the template is effective, if bounded.
    #[serde(default)]
    pub effective_to: Option<NaiveDate>,
}

/// Where an employee payroll item originates.
///
/// The three origins are mutually exclusive by construction: an item either
/// overrides a company template, overrides a statutory template, or is a
/// manual ad hoc entry referencing neither.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ItemSource {
    /// Overrides the company template with the given code.
    CompanyTemplate {
        /// The referenced company template code.
        template_code: String,
    },
    /// Overrides the statutory template with the given code.
    Statutory {
        /// The referenced statutory template code.
        template_code: String,
    },
    /// An ad hoc manual item referencing no template.
    Manual,
}

/// Lifecycle status of an employee payroll item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Created but awaiting approval; never calculated.
    PendingApproval,
    /// Approved and applied to every matching period.
    Active,
    /// Temporarily excluded from calculation.
    Suspended,
    /// Permanently excluded from calculation.
    Cancelled,
}

/// An employee-specific payroll item: an override of a template or an
/// ad hoc entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeePayrollItem {
    /// Unique identifier.
    pub id: Uuid,
    /// The employee the item belongs to.
    pub employee_id: Uuid,
    /// Where the item originates.
    #[serde(flatten)]
    pub source: ItemSource,
    /// Item code shown on the payslip.
    pub code: String,
    /// Human-readable name.
    pub name: String,
    /// What the item contributes to the payslip.
    pub kind: TemplateKind,
    /// How the amount is computed.
    #[serde(flatten)]
    pub method: CalculationMethod,
    /// The literal supplied by the caller/approver for `Manual` items.
    #[serde(default)]
    pub override_amount: Option<Decimal>,
    /// First day the item is effective.
    pub effective_from: NaiveDate,
    /// Last day the item is effective, if bounded.
    #[serde(default)]
    pub effective_to: Option<NaiveDate>,
    /// Recurring items apply every period inside their effective window;
    /// one-time items apply only in the period containing `effective_from`.
    pub is_recurring: bool,
    /// Lifecycle status.
    pub status: ItemStatus,
}

impl EmployeePayrollItem {
    /// Returns true if the item should be calculated for the given period.
    ///
    /// Requires status `Active`, an effective window overlapping the period
    /// and, for one-time items, `effective_from` inside the period.
    pub fn applies_to_period(&self, period_start: NaiveDate, period_end: NaiveDate) -> bool {
        if self.status != ItemStatus::Active {
            return false;
        }
        if !self.is_recurring {
            return self.effective_from >= period_start && self.effective_from <= period_end;
        }
        let starts_in_time = self.effective_from <= period_end;
        let still_effective = self.effective_to.map(|to| to >= period_start).unwrap_or(true);
        starts_in_time && still_effective
    }
}

/// The kind of statutory deduction a jurisdiction mandates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatutoryDeductionType {
    /// Pay-as-you-earn income tax.
    IncomeTax,
    /// Social insurance / social security.
    SocialInsurance,
    /// National or public health insurance.
    HealthInsurance,
    /// Industrial training or skills development levy.
    SkillsLevy,
    /// Unemployment insurance fund.
    UnemploymentInsurance,
    /// Mandatory pension contribution.
    Pension,
}

/// A jurisdiction-mandated deduction template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatutoryDeductionTemplate {
    /// Unique code within the jurisdiction (e.g., "paye", "nssf").
    pub code: String,
    /// Human-readable name.
    pub name: String,
    /// What kind of statutory deduction this is.
    pub deduction_type: StatutoryDeductionType,
    /// How the amounts are computed.
    #[serde(flatten)]
    pub method: CalculationMethod,
    /// Non-mandatory templates are skipped by the statutory calculator.
    pub is_mandatory: bool,
    /// Inactive templates never apply.
    pub active: bool,
    /// First day the template is effective.
    pub effective_from: NaiveDate,
    /// Last day the template is effective, if bounded.
    #[serde(default)]
    pub effective_to: Option<NaiveDate>,
}

impl StatutoryDeductionTemplate {
    /// Returns true if the template is active, mandatory, and effective on
    /// the given date.
    pub fn is_effective_on(&self, date: NaiveDate) -> bool {
        self.active
            && self.is_mandatory
            && date >= self.effective_from
            && self.effective_to.map(|to| date <= to).unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn paye_brackets() -> Vec<ProgressiveBand> {
        vec![
            ProgressiveBand {
                min: dec("0"),
                max: Some(dec("24000")),
                rate: dec("0.10"),
            },
            ProgressiveBand {
                min: dec("24000"),
                max: Some(dec("32333")),
                rate: dec("0.25"),
            },
            ProgressiveBand {
                min: dec("32333"),
                max: None,
                rate: dec("0.30"),
            },
        ]
    }

    #[test]
    fn test_deserialize_fixed_amount_method() {
        let json = r#"{"method": "fixed_amount", "amount": "5000"}"#;
        let method: CalculationMethod = serde_json::from_str(json).unwrap();
        assert_eq!(
            method,
            CalculationMethod::FixedAmount {
                amount: dec("5000")
            }
        );
    }

    #[test]
    fn test_deserialize_progressive_bracket_method() {
        let json = r#"{
            "method": "progressive_bracket",
            "brackets": [
                {"min": "0", "max": "24000", "rate": "0.10"},
                {"min": "24000", "rate": "0.25"}
            ],
            "rebate": "2400"
        }"#;
        let method: CalculationMethod = serde_json::from_str(json).unwrap();
        match method {
            CalculationMethod::ProgressiveBracket { brackets, rebate } => {
                assert_eq!(brackets.len(), 2);
                assert_eq!(brackets[1].max, None);
                assert_eq!(rebate, Some(dec("2400")));
            }
            other => panic!("Expected ProgressiveBracket, got {:?}", other),
        }
    }

    #[test]
    fn test_unrecognized_method_fails_deserialization() {
        let json = r#"{"method": "exec_arbitrary", "amount": "5000"}"#;
        let result: Result<CalculationMethod, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_accepts_well_formed_brackets() {
        let method = CalculationMethod::ProgressiveBracket {
            brackets: paye_brackets(),
            rebate: Some(dec("2400")),
        };
        assert!(method.validate("paye").is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_bracket_table() {
        let method = CalculationMethod::ProgressiveBracket {
            brackets: vec![],
            rebate: None,
        };
        let error = method.validate("paye").unwrap_err();
        assert!(error.to_string().contains("empty"));
    }

    #[test]
    fn test_validate_rejects_overlapping_brackets() {
        let method = CalculationMethod::ProgressiveBracket {
            brackets: vec![
                ProgressiveBand {
                    min: dec("0"),
                    max: Some(dec("24000")),
                    rate: dec("0.10"),
                },
                ProgressiveBand {
                    min: dec("20000"),
                    max: None,
                    rate: dec("0.25"),
                },
            ],
            rebate: None,
        };
        let error = method.validate("paye").unwrap_err();
        assert!(error.to_string().contains("overlap"));
    }

    #[test]
    fn test_validate_rejects_open_band_not_last() {
        let method = CalculationMethod::SalaryBracket {
            brackets: vec![
                SalaryBand {
                    min: dec("0"),
                    max: None,
                    amount: dec("150"),
                },
                SalaryBand {
                    min: dec("6000"),
                    max: Some(dec("8000")),
                    amount: dec("300"),
                },
            ],
        };
        let error = method.validate("nhif").unwrap_err();
        assert!(error.to_string().contains("open-ended"));
    }

    #[test]
    fn test_validate_rejects_inverted_band() {
        let method = CalculationMethod::SalaryBracket {
            brackets: vec![SalaryBand {
                min: dec("8000"),
                max: Some(dec("6000")),
                amount: dec("300"),
            }],
        };
        assert!(method.validate("nhif").is_err());
    }

    #[test]
    fn test_validate_rejects_negative_fixed_amount() {
        let method = CalculationMethod::FixedAmount {
            amount: dec("-10"),
        };
        assert!(method.validate("bonus").is_err());
    }

    #[test]
    fn test_validate_rejects_negative_rate() {
        let method = CalculationMethod::Percentage {
            employee_rate: dec("-0.01"),
            employer_rate: dec("0.01"),
            maximum_salary: None,
        };
        assert!(method.validate("uif").is_err());
    }

    #[test]
    fn test_validate_rejects_empty_formula() {
        let method = CalculationMethod::Formula {
            expression: "   ".to_string(),
        };
        assert!(method.validate("custom").is_err());
    }

    #[test]
    fn test_item_source_mutual_exclusivity_in_serde() {
        let json = r#"{"source": "company_template", "template_code": "housing"}"#;
        let source: ItemSource = serde_json::from_str(json).unwrap();
        assert_eq!(
            source,
            ItemSource::CompanyTemplate {
                template_code: "housing".to_string()
            }
        );

        let json = r#"{"source": "manual"}"#;
        let source: ItemSource = serde_json::from_str(json).unwrap();
        assert_eq!(source, ItemSource::Manual);
    }

    fn create_test_item(status: ItemStatus, recurring: bool) -> EmployeePayrollItem {
        EmployeePayrollItem {
            id: Uuid::new_v4(),
            employee_id: Uuid::new_v4(),
            source: ItemSource::Manual,
            code: "spot_bonus".to_string(),
            name: "Spot Bonus".to_string(),
            kind: TemplateKind::Earning,
            method: CalculationMethod::Manual,
            override_amount: Some(dec("1000")),
            effective_from: NaiveDate::from_ymd_opt(2026, 4, 10).unwrap(),
            effective_to: None,
            is_recurring: recurring,
            status,
        }
    }

    fn april() -> (NaiveDate, NaiveDate) {
        (
            NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 4, 30).unwrap(),
        )
    }

    #[test]
    fn test_active_one_time_item_applies_in_its_period() {
        let (start, end) = april();
        let item = create_test_item(ItemStatus::Active, false);
        assert!(item.applies_to_period(start, end));
    }

    #[test]
    fn test_one_time_item_does_not_apply_in_later_period() {
        let item = create_test_item(ItemStatus::Active, false);
        let start = NaiveDate::from_ymd_opt(2026, 5, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 5, 31).unwrap();
        assert!(!item.applies_to_period(start, end));
    }

    #[test]
    fn test_recurring_item_applies_in_later_period() {
        let item = create_test_item(ItemStatus::Active, true);
        let start = NaiveDate::from_ymd_opt(2026, 7, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 7, 31).unwrap();
        assert!(item.applies_to_period(start, end));
    }

    #[test]
    fn test_recurring_item_stops_after_effective_to() {
        let mut item = create_test_item(ItemStatus::Active, true);
        item.effective_to = Some(NaiveDate::from_ymd_opt(2026, 6, 30).unwrap());
        let start = NaiveDate::from_ymd_opt(2026, 7, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 7, 31).unwrap();
        assert!(!item.applies_to_period(start, end));
    }

    #[test]
    fn test_non_active_statuses_never_apply() {
        let (start, end) = april();
        for status in [
            ItemStatus::PendingApproval,
            ItemStatus::Suspended,
            ItemStatus::Cancelled,
        ] {
            let item = create_test_item(status, true);
            assert!(!item.applies_to_period(start, end), "{status:?} applied");
        }
    }

    #[test]
    fn test_statutory_template_effectiveness() {
        let template = StatutoryDeductionTemplate {
            code: "paye".to_string(),
            name: "PAYE".to_string(),
            deduction_type: StatutoryDeductionType::IncomeTax,
            method: CalculationMethod::ProgressiveBracket {
                brackets: paye_brackets(),
                rebate: None,
            },
            is_mandatory: true,
            active: true,
            effective_from: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            effective_to: Some(NaiveDate::from_ymd_opt(2026, 12, 31).unwrap()),
        };

        assert!(template.is_effective_on(NaiveDate::from_ymd_opt(2026, 4, 30).unwrap()));
        assert!(!template.is_effective_on(NaiveDate::from_ymd_opt(2025, 12, 31).unwrap()));
        assert!(!template.is_effective_on(NaiveDate::from_ymd_opt(2027, 1, 1).unwrap()));

        let mut inactive = template.clone();
        inactive.active = false;
        assert!(!inactive.is_effective_on(NaiveDate::from_ymd_opt(2026, 4, 30).unwrap()));

        let mut optional = template;
        optional.is_mandatory = false;
        assert!(!optional.is_effective_on(NaiveDate::from_ymd_opt(2026, 4, 30).unwrap()));
    }

    #[test]
    fn test_company_template_yaml_round_trip() {
        let yaml = r#"
code: housing_allowance
name: Housing Allowance
kind: allowance
method: percentage_of_basic
percentage: "15"
is_taxable: true
active: true
eligibility:
  employment_types: [full_time]
  min_salary: "100000"
"#;
        let template: CompanyPayrollTemplate = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(template.code, "housing_allowance");
        assert_eq!(template.kind, TemplateKind::Allowance);
        assert_eq!(
            template.method,
            CalculationMethod::PercentageOfBasic {
                percentage: dec("15")
            }
        );
        assert_eq!(
            template.eligibility.employment_types,
            Some(vec![EmploymentType::FullTime])
        );
        assert_eq!(template.eligibility.min_salary, Some(dec("100000")));
        assert!(template.eligibility.departments.is_none());
    }
}
