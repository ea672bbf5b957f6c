//! Calendar-day proration for partial pay periods.

use rust_decimal::Decimal;

use crate::calculation::round_money;
use crate::models::{Employee, PayPeriod};

/// A possibly prorated amount with the figures behind it.
#[derive(Debug, Clone, PartialEq)]
pub struct ProratedAmount {
    /// The amount after proration, rounded to 2 decimal places.
    pub amount: Decimal,
    /// Whether proration changed the input.
    pub prorated: bool,
    /// Calendar days the employee was employed within the period.
    pub worked_days: i64,
    /// Total calendar days in the period.
    pub total_days: i64,
}

/// Prorates `amount` by the employee's employed days in the period.
///
/// Proration applies only when the employee starts after the period
/// opens or terminates before it closes; both boundary days count as
/// worked. An employee employed for the whole period passes through
/// unchanged, so full-period amounts never pick up rounding drift.
pub fn prorate(amount: Decimal, employee: &Employee, period: &PayPeriod) -> ProratedAmount {
    let total_days = period.total_days();

    let starts_mid_period = employee.employment_start_date > period.start_date;
    let ends_mid_period = employee
        .termination_date
        .map(|t| t < period.end_date)
        .unwrap_or(false);

    if !starts_mid_period && !ends_mid_period {
        return ProratedAmount {
            amount,
            prorated: false,
            worked_days: total_days,
            total_days,
        };
    }

    let first_day = employee.employment_start_date.max(period.start_date);
    let last_day = employee
        .termination_date
        .map(|t| t.min(period.end_date))
        .unwrap_or(period.end_date);

    let worked_days = ((last_day - first_day).num_days() + 1).max(0);

    let fraction = Decimal::from(worked_days) / Decimal::from(total_days);
    ProratedAmount {
        amount: round_money(amount * fraction),
        prorated: true,
        worked_days,
        total_days,
    }
}
