//! Eligibility evaluation for company payroll templates.

use chrono::NaiveDate;

use crate::models::{CompanyPayrollTemplate, Employee};

/// Decides whether a company template applies to an employee on a date.
///
/// Every configured rule dimension must pass; a dimension left
/// unconfigured does not restrict. Inactive templates and templates
/// outside their effective window never apply.
pub fn is_applicable(
    template: &CompanyPayrollTemplate,
    employee: &Employee,
    as_of: NaiveDate,
) -> bool {
    if !template.active {
        return false;
    }
    if let Some(from) = template.effective_from {
        if as_of < from {
            return false;
        }
    }
    if let Some(to) = template.effective_to {
        if as_of > to {
            return false;
        }
    }

    let rules = &template.eligibility;

    if let Some(departments) = &rules.departments {
        match &employee.department {
            Some(department) if departments.contains(department) => {}
            _ => return false,
        }
    }
    if let Some(positions) = &rules.positions {
        match &employee.position {
            Some(position) if positions.contains(position) => {}
            _ => return false,
        }
    }
    if let Some(types) = &rules.employment_types {
        if !types.contains(&employee.employment_type) {
            return false;
        }
    }
    if let Some(min) = rules.min_salary {
        if employee.base_salary < min {
            return false;
        }
    }
    if let Some(max) = rules.max_salary {
        if employee.base_salary > max {
            return false;
        }
    }

    true
}
