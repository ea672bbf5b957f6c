//! Payroll aggregate and its line items.
//!
//! A [`Payroll`] is the durable record of one employee's pay for one
//! period. It carries the computed totals, one [`PayrollItem`] per computed
//! line, and a status that moves strictly draft → approved → processed.
//! Corrections require a new payroll; items are never mutated.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// The lifecycle status of a payroll record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayrollStatus {
    /// Initial state after creation.
    Draft,
    /// Reviewed and approved; awaiting processing.
    Approved,
    /// Paid out. Terminal; no backward transitions.
    Processed,
}

/// The category of a computed payroll line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayrollItemCategory {
    /// Earnings on top of base salary.
    Income,
    /// Allowances.
    Allowance,
    /// Benefits.
    Benefit,
    /// Employee-side deductions.
    Deduction,
    /// Employer-side contributions.
    EmployerContribution,
    /// Statutory income tax lines.
    Tax,
}

/// One computed line of a payroll record.
///
/// Created only by the calculation orchestrator; never edited afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollItem {
    /// Item code (template code or statutory code).
    pub code: String,
    /// Human-readable name.
    pub name: String,
    /// What the line contributes to the payslip.
    pub category: PayrollItemCategory,
    /// The amount the calculation was based on.
    pub calculation_base: Decimal,
    /// The rate applied, when the method is rate-based.
    pub rate_applied: Option<Decimal>,
    /// The employee-side amount.
    pub employee_amount: Decimal,
    /// The employer-side amount.
    pub employer_amount: Decimal,
    /// True for jurisdiction-mandated lines.
    pub is_statutory: bool,
    /// True if the amount is taxable.
    pub is_taxable: bool,
    /// Audit trail describing how the amount was derived.
    pub calculation_details: Value,
}

/// The payroll aggregate: one employee × one pay period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payroll {
    /// Unique identifier.
    pub id: Uuid,
    /// The employee the payroll belongs to.
    pub employee_id: Uuid,
    /// The employing company.
    pub company_code: String,
    /// First day of the pay period (inclusive).
    pub period_start: NaiveDate,
    /// Last day of the pay period (inclusive).
    pub period_end: NaiveDate,
    /// The per-period base salary after proration.
    pub base_salary: Decimal,
    /// Base salary plus earnings and allowances, before deductions.
    pub gross_salary: Decimal,
    /// Sum of all employee-side deductions.
    pub total_deductions: Decimal,
    /// Gross salary minus total deductions.
    pub net_salary: Decimal,
    /// Current lifecycle status.
    pub status: PayrollStatus,
    /// Who approved the payroll, once approved.
    pub approved_by: Option<Uuid>,
    /// When the payroll was approved.
    pub approved_at: Option<DateTime<Utc>>,
    /// When the payroll was processed.
    pub processed_at: Option<DateTime<Utc>>,
    /// One line per computed item.
    pub items: Vec<PayrollItem>,
}

impl Payroll {
    /// Approves a draft payroll, recording the approver and timestamp.
    ///
    /// Returns `false` and leaves the record untouched when the payroll is
    /// not in `Draft` — a wrong-state transition is never an error.
    pub fn approve(&mut self, approver_id: Uuid, now: DateTime<Utc>) -> bool {
        if self.status != PayrollStatus::Draft {
            return false;
        }
        self.status = PayrollStatus::Approved;
        self.approved_by = Some(approver_id);
        self.approved_at = Some(now);
        true
    }

    /// Processes an approved payroll, recording the timestamp.
    ///
    /// Returns `false` and leaves the record untouched when the payroll is
    /// not in `Approved`. `Processed` is terminal.
    pub fn process(&mut self, now: DateTime<Utc>) -> bool {
        if self.status != PayrollStatus::Approved {
            return false;
        }
        self.status = PayrollStatus::Processed;
        self.processed_at = Some(now);
        true
    }
}
