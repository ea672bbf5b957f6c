//! The calculation pipeline: amounts, eligibility, proration, statutory
//! deductions and the gross-to-net orchestrator.

pub mod amount;
pub mod base_salary;
pub mod eligibility;
pub mod formula;
pub mod orchestrator;
pub mod proration;
pub mod statutory;

pub use amount::{AmountContext, AmountResult, StatutoryAmounts, calculate_amount, calculate_statutory_amounts};
pub use base_salary::{BaseSalaryResult, calculate_base_salary};
pub use eligibility::is_applicable;
pub use formula::{ALLOWED_VARIABLES, CompiledFormula, FormulaError};
pub use orchestrator::{calculate_batch_payroll, calculate_employee_payroll};
pub use proration::{ProratedAmount, prorate};
pub use statutory::{StatutoryDeductionResult, calculate_statutory_deductions};

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a monetary amount to 2 decimal places, half away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
