//! Core data models for the payroll calculation engine.
//!
//! This module contains all the domain models used throughout the engine.

mod calculation_result;
mod company;
mod employee;
mod jurisdiction;
mod pay_period;
mod payroll;
mod template;

pub use calculation_result::{
    BatchError, BatchPayrollResult, BatchSummary, CalculationWarning, ComputedItem,
    DeductionGroups, ItemGroup, PayrollCalculation, StatutoryItem,
};
pub use company::Company;
pub use employee::{
    Employee, EmploymentType, MAX_REPORTING_DEPTH, PayFrequency, has_reporting_cycle,
};
pub use jurisdiction::TaxJurisdiction;
pub use pay_period::PayPeriod;
pub use payroll::{Payroll, PayrollItem, PayrollItemCategory, PayrollStatus};
pub use template::{
    CalculationMethod, CompanyPayrollTemplate, EligibilityRules, EmployeePayrollItem, ItemSource,
    ItemStatus, ProgressiveBand, SalaryBand, StatutoryDeductionTemplate, StatutoryDeductionType,
    TemplateKind,
};
