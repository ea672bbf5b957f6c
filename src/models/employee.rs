//! Employee model and related types.
//!
//! This module defines the [`Employee`] struct together with the
//! [`EmploymentType`] and [`PayFrequency`] enums, and the iterative
//! reporting-cycle check over manager references.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents the type of employment arrangement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentType {
    /// Full-time employment.
    FullTime,
    /// Part-time employment.
    PartTime,
    /// Fixed-term contract employment.
    Contract,
    /// Casual employment with no guaranteed hours.
    Casual,
}

/// How often an employee is paid.
///
/// The frequency determines how the annual base salary is divided into a
/// per-period base amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayFrequency {
    /// Paid every week (52 periods per year).
    Weekly,
    /// Paid every two weeks (26 periods per year).
    BiWeekly,
    /// Paid every month (12 periods per year).
    Monthly,
    /// Paid every quarter (4 periods per year).
    Quarterly,
    /// Paid once a year.
    Annually,
}

impl PayFrequency {
    /// Returns the number of pay periods per year for this frequency.
    ///
    /// # Examples
    ///
    /// ```
    /// use payroll_engine::models::PayFrequency;
    /// use rust_decimal::Decimal;
    ///
    /// assert_eq!(PayFrequency::Monthly.periods_per_year(), Decimal::from(12));
    /// assert_eq!(PayFrequency::Annually.periods_per_year(), Decimal::ONE);
    /// ```
    pub fn periods_per_year(&self) -> Decimal {
        match self {
            PayFrequency::Weekly => Decimal::from(52),
            PayFrequency::BiWeekly => Decimal::from(26),
            PayFrequency::Monthly => Decimal::from(12),
            PayFrequency::Quarterly => Decimal::from(4),
            PayFrequency::Annually => Decimal::ONE,
        }
    }
}

/// Represents an employee subject to payroll calculation.
///
/// An employee is a read-only input to the engine; calculation never
/// mutates it. The jurisdiction for statutory deductions is resolved
/// through `company_code` and the registered company's country.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    /// Unique identifier for the employee.
    pub id: Uuid,
    /// Code of the employing company.
    pub company_code: String,
    /// Annual base salary.
    pub base_salary: Decimal,
    /// How often the employee is paid.
    pub pay_frequency: PayFrequency,
    /// The date the employee started working.
    pub employment_start_date: NaiveDate,
    /// The date the employee was hired, when distinct from the start date.
    #[serde(default)]
    pub hire_date: Option<NaiveDate>,
    /// The date employment ended, if terminated.
    #[serde(default)]
    pub termination_date: Option<NaiveDate>,
    /// The type of employment arrangement.
    pub employment_type: EmploymentType,
    /// Department code, if assigned.
    #[serde(default)]
    pub department: Option<String>,
    /// Position code, if assigned.
    #[serde(default)]
    pub position: Option<String>,
    /// The employee's direct manager, if any.
    #[serde(default)]
    pub manager_id: Option<Uuid>,
}

impl Employee {
    /// Returns the base salary for a single pay period.
    ///
    /// The annual base salary is divided by the number of pay periods per
    /// year: weekly ÷ 52, bi-weekly ÷ 26, monthly ÷ 12, quarterly ÷ 4,
    /// annually unchanged. The result is rounded to 2 decimal places.
    ///
    /// # Examples
    ///
    /// ```
    /// use payroll_engine::models::{Employee, EmploymentType, PayFrequency};
    /// use chrono::NaiveDate;
    /// use rust_decimal::Decimal;
    /// use uuid::Uuid;
    ///
    /// let employee = Employee {
    ///     id: Uuid::new_v4(),
    ///     company_code: "acme_ke".to_string(),
    ///     base_salary: Decimal::from(300_000),
    ///     pay_frequency: PayFrequency::Monthly,
    ///     employment_start_date: NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(),
    ///     hire_date: None,
    ///     termination_date: None,
    ///     employment_type: EmploymentType::FullTime,
    ///     department: None,
    ///     position: None,
    ///     manager_id: None,
    /// };
    /// assert_eq!(employee.period_base_salary(), Decimal::from(25_000));
    /// ```
    pub fn period_base_salary(&self) -> Decimal {
        (self.base_salary / self.pay_frequency.periods_per_year()).round_dp_with_strategy(
            2,
            rust_decimal::RoundingStrategy::MidpointAwayFromZero,
        )
    }

    /// Returns the number of completed years of service as of the given date.
    ///
    /// Returns 0 if the date precedes the employment start date.
    pub fn years_of_service(&self, as_of: NaiveDate) -> u32 {
        if as_of < self.employment_start_date {
            return 0;
        }
        as_of.years_since(self.employment_start_date).unwrap_or(0)
    }

    /// Returns true if the employee was actively employed on the given date.
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        date >= self.employment_start_date
            && self.termination_date.map(|t| date <= t).unwrap_or(true)
    }
}

/// Maximum manager-chain depth explored by [`has_reporting_cycle`].
///
/// A chain deeper than this is treated as cyclic; real organizations do
/// not nest this far.
pub const MAX_REPORTING_DEPTH: usize = 128;

/// Detects a cycle in the manager-reporting chain starting at `start_id`.
///
/// Walks `manager_id` references by explicit iteration with a visited set
/// and a bounded depth, so a malformed forest can never cause unbounded
/// recursion. A reference to an employee outside `employees` terminates
/// the walk without a cycle.
///
/// # Examples
///
/// ```
/// use payroll_engine::models::has_reporting_cycle;
/// use uuid::Uuid;
///
/// let a = Uuid::new_v4();
/// let b = Uuid::new_v4();
/// // a reports to b, b reports to a
/// assert!(has_reporting_cycle(&[(a, Some(b)), (b, Some(a))], a));
/// // a reports to b, b reports to nobody
/// assert!(!has_reporting_cycle(&[(a, Some(b)), (b, None)], a));
/// ```
pub fn has_reporting_cycle(employees: &[(Uuid, Option<Uuid>)], start_id: Uuid) -> bool {
    let managers: HashMap<Uuid, Option<Uuid>> = employees.iter().copied().collect();
    let mut visited: HashSet<Uuid> = HashSet::new();
    let mut current = start_id;

    for _ in 0..MAX_REPORTING_DEPTH {
        if !visited.insert(current) {
            return true;
        }
        match managers.get(&current) {
            Some(Some(manager)) => current = *manager,
            _ => return false,
        }
    }
    // Depth budget exhausted: treat as cyclic rather than walking forever.
    true
}
