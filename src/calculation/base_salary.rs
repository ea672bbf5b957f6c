//! Period base salary derivation.

use rust_decimal::Decimal;

use crate::calculation::proration::{ProratedAmount, prorate};
use crate::models::{Employee, PayPeriod};

/// The employee's base pay for one period.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseSalaryResult {
    /// Base salary for the period after proration.
    pub amount: Decimal,
    /// Annual base salary divided by the pay frequency, unprorated.
    pub period_salary: Decimal,
    /// Proration figures behind `amount`.
    pub proration: ProratedAmount,
}

/// Derives the base salary for a pay period.
///
/// The annual salary is divided by the pay frequency's periods per year
/// and then prorated for partial employment within the period.
pub fn calculate_base_salary(employee: &Employee, period: &PayPeriod) -> BaseSalaryResult {
    let period_salary = employee.period_base_salary();
    let proration = prorate(period_salary, employee, period);
    BaseSalaryResult {
        amount: proration.amount,
        period_salary,
        proration,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EmploymentType, PayFrequency};
    use chrono::NaiveDate;
    use std::str::FromStr;
    use uuid::Uuid;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn employee(annual: &str, frequency: PayFrequency, start: &str) -> Employee {
        Employee {
            id: Uuid::new_v4(),
            company_code: "acme_ke".to_string(),
            base_salary: dec(annual),
            pay_frequency: frequency,
            employment_start_date: date(start),
            hire_date: None,
            termination_date: None,
            employment_type: EmploymentType::FullTime,
            department: None,
            position: None,
            manager_id: None,
        }
    }

    #[test]
    fn test_monthly_frequency_divides_by_twelve() {
        let e = employee("600000", PayFrequency::Monthly, "2020-01-01");
        let period = PayPeriod::new(date("2025-06-01"), date("2025-06-30"));
        let result = calculate_base_salary(&e, &period);
        assert_eq!(result.period_salary, dec("50000.00"));
        assert_eq!(result.amount, dec("50000.00"));
        assert!(!result.proration.prorated);
    }

    #[test]
    fn test_weekly_frequency_divides_by_fifty_two() {
        let e = employee("520000", PayFrequency::Weekly, "2020-01-01");
        let period = PayPeriod::new(date("2025-06-02"), date("2025-06-08"));
        let result = calculate_base_salary(&e, &period);
        assert_eq!(result.period_salary, dec("10000.00"));
    }

    #[test]
    fn test_mid_period_hire_is_prorated() {
        let e = employee("600000", PayFrequency::Monthly, "2025-06-16");
        let period = PayPeriod::new(date("2025-06-01"), date("2025-06-30"));
        let result = calculate_base_salary(&e, &period);
        assert_eq!(result.amount, dec("25000.00"));
        assert_eq!(result.proration.worked_days, 15);
    }
}
