//! Calculation result models.
//!
//! This module contains the [`PayrollCalculation`] type and its associated
//! structures capturing all outputs of a payroll calculation: per-item
//! lines grouped by origin, statutory deductions, totals, and warnings,
//! plus the batch result and summary types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::models::{PayPeriod, StatutoryDeductionType};

/// One computed company or employee payroll line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputedItem {
    /// Item code (template or item code).
    pub code: String,
    /// Human-readable name.
    pub name: String,
    /// The amount the calculation was based on.
    pub calculation_base: Decimal,
    /// The rate applied, when the method is rate-based.
    pub rate_applied: Option<Decimal>,
    /// The computed amount, rounded to 2 decimal places.
    pub amount: Decimal,
    /// True if the amount is taxable.
    pub is_taxable: bool,
    /// Audit trail describing how the amount was derived.
    pub calculation_details: Value,
}

/// One computed statutory deduction line.
///
/// Statutory lines carry independent employee and employer amounts; for
/// bracket and flat methods the employer amount is zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatutoryItem {
    /// The statutory template code (e.g., "paye").
    pub code: String,
    /// Human-readable name.
    pub name: String,
    /// What kind of statutory deduction this is.
    pub deduction_type: StatutoryDeductionType,
    /// The amount the calculation was based on.
    pub calculation_base: Decimal,
    /// The employee-side rate, when rate-based.
    pub rate_applied: Option<Decimal>,
    /// The amount withheld from the employee.
    pub employee_amount: Decimal,
    /// The amount owed by the employer.
    pub employer_amount: Decimal,
    /// Audit trail describing how the amounts were derived.
    pub calculation_details: Value,
}

/// Items of one kind split by origin: company template vs employee item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemGroup {
    /// Lines from company payroll templates.
    pub company: Vec<ComputedItem>,
    /// Lines from employee-specific payroll items.
    pub employee: Vec<ComputedItem>,
}

impl ItemGroup {
    /// Sum of all amounts in the group.
    pub fn total(&self) -> Decimal {
        self.company
            .iter()
            .chain(self.employee.iter())
            .map(|item| item.amount)
            .sum()
    }
}

/// All deduction lines split by origin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeductionGroups {
    /// Lines from company deduction templates.
    pub company: Vec<ComputedItem>,
    /// Lines from employee-specific deduction items.
    pub employee: Vec<ComputedItem>,
    /// Jurisdiction-mandated deductions.
    pub statutory: Vec<StatutoryItem>,
}

impl DeductionGroups {
    /// Sum of all employee-side deduction amounts.
    pub fn employee_total(&self) -> Decimal {
        let company: Decimal = self.company.iter().map(|item| item.amount).sum();
        let employee: Decimal = self.employee.iter().map(|item| item.amount).sum();
        let statutory: Decimal = self.statutory.iter().map(|item| item.employee_amount).sum();
        company + employee + statutory
    }

    /// Sum of the statutory employer-side amounts.
    pub fn statutory_employer_total(&self) -> Decimal {
        self.statutory.iter().map(|item| item.employer_amount).sum()
    }
}

/// A warning generated during calculation.
///
/// Warnings record conditions resolved without aborting the calculation,
/// such as a rejected formula token or a missing jurisdiction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationWarning {
    /// A code identifying the type of warning.
    pub code: String,
    /// A human-readable description.
    pub message: String,
}

/// The complete result of one employee's payroll calculation.
///
/// Identical inputs always produce an identical result apart from
/// `calculation_id` and `timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollCalculation {
    /// Unique identifier for this calculation run.
    pub calculation_id: Uuid,
    /// When the calculation was performed.
    pub timestamp: DateTime<Utc>,
    /// The version of the engine that performed the calculation.
    pub engine_version: String,
    /// The employee the calculation is for.
    pub employee_id: Uuid,
    /// The employing company.
    pub company_code: String,
    /// The pay period covered.
    pub period: PayPeriod,
    /// Per-period base salary after proration.
    pub base_salary: Decimal,
    /// Earning lines (company and employee, merged).
    pub earnings: Vec<ComputedItem>,
    /// Allowance lines split by origin.
    pub allowances: ItemGroup,
    /// Benefit lines.
    pub benefits: Vec<ComputedItem>,
    /// Deduction lines split by origin.
    pub deductions: DeductionGroups,
    /// Employer-contribution lines from company templates.
    pub employer_contributions: Vec<ComputedItem>,
    /// Base salary plus earnings and allowances, before deductions.
    pub gross_salary: Decimal,
    /// All employee-side deductions.
    pub total_deductions: Decimal,
    /// Statutory employer amounts plus company employer-cost lines.
    pub total_employer_contributions: Decimal,
    /// Gross salary minus total deductions.
    pub net_salary: Decimal,
    /// Conditions resolved without aborting the calculation.
    pub warnings: Vec<CalculationWarning>,
}

/// A per-employee failure captured during a batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchError {
    /// The employee whose calculation failed.
    pub employee_id: Uuid,
    /// Why it failed.
    pub message: String,
}

/// Aggregated totals of a batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Number of employees submitted.
    pub total_employees: usize,
    /// Number of successful calculations.
    pub successful: usize,
    /// Number of failed calculations.
    pub failed: usize,
    /// Sum of gross salaries across successful calculations.
    pub total_gross: Decimal,
    /// Sum of employee-side deductions across successful calculations.
    pub total_deductions: Decimal,
    /// Sum of net salaries across successful calculations.
    pub total_net: Decimal,
}

/// The result of a batch payroll run.
///
/// A per-employee failure never aborts the batch; it is captured in
/// `errors` while all other results are preserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchPayrollResult {
    /// Aggregated totals.
    pub summary: BatchSummary,
    /// Successful calculations, in submission order.
    pub calculations: Vec<PayrollCalculation>,
    /// Per-employee failures, in submission order.
    pub errors: Vec<BatchError>,
}
