//! Gross-to-net orchestration for single employees and batches.

use chrono::Utc;
use rayon::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::ENGINE_VERSION;
use crate::calculation::amount::{AmountContext, AmountResult, calculate_amount};
use crate::calculation::base_salary::calculate_base_salary;
use crate::calculation::eligibility::is_applicable;
use crate::calculation::proration::prorate;
use crate::calculation::round_money;
use crate::calculation::statutory::calculate_statutory_deductions;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    BatchError, BatchPayrollResult, BatchSummary, CalculationMethod, CalculationWarning,
    ComputedItem, DeductionGroups, Employee, EmployeePayrollItem, ItemGroup, ItemSource,
    PayPeriod, PayrollCalculation, TemplateKind,
};
use crate::registry::TemplateRegistry;

/// Calculates a full gross-to-net payroll for one employee.
///
/// Sequencing: base salary is derived from the annual salary and
/// prorated for partial employment; earnings, allowances and benefits
/// are computed against the period salary and prorated the same way;
/// gross salary then feeds the statutory deductions and the remaining
/// deduction and employer-contribution items. Non-fatal conditions
/// (rejected formulas, failed statutory templates, missing
/// jurisdictions) surface as warnings on the result, and a malformed
/// template or item loses its own line only while siblings still
/// compute.
///
/// Fails only when the employee's company is not registered.
pub fn calculate_employee_payroll(
    employee: &Employee,
    items: &[EmployeePayrollItem],
    registry: &TemplateRegistry,
    period: PayPeriod,
) -> EngineResult<PayrollCalculation> {
    if registry.company(&employee.company_code).is_none() {
        return Err(EngineError::CompanyNotFound {
            code: employee.company_code.clone(),
        });
    }

    let base = calculate_base_salary(employee, &period);
    let period_salary = base.period_salary;
    let years_of_service = Decimal::from(employee.years_of_service(period.end_date));

    let applicable_items: Vec<&EmployeePayrollItem> = items
        .iter()
        .filter(|item| item.employee_id == employee.id)
        .filter(|item| item.applies_to_period(period.start_date, period.end_date))
        .collect();

    // An employee item referencing a company template replaces that
    // template's line for this employee.
    let overridden: Vec<&str> = applicable_items
        .iter()
        .filter_map(|item| match &item.source {
            ItemSource::CompanyTemplate { template_code } => Some(template_code.as_str()),
            _ => None,
        })
        .collect();

    let templates: Vec<_> = registry
        .templates_for_company(&employee.company_code)
        .iter()
        .filter(|template| is_applicable(template, employee, period.end_date))
        .filter(|template| !overridden.contains(&template.code.as_str()))
        .collect();

    let mut warnings: Vec<CalculationWarning> = Vec::new();
    let mut earnings = Vec::new();
    let mut allowances = ItemGroup::default();
    let mut benefits = Vec::new();
    let mut deductions = DeductionGroups::default();
    let mut employer_contributions = Vec::new();

    // First pass over the additive kinds, computed against the period
    // salary and prorated alongside it.
    let additive_ctx = AmountContext::new(period_salary, period_salary)
        .with_variable("years_of_service", years_of_service);

    for template in &templates {
        if !matches!(
            template.kind,
            TemplateKind::Earning | TemplateKind::Allowance | TemplateKind::Benefit
        ) {
            continue;
        }
        let result = match calculate_amount(&template.code, &template.method, &additive_ctx) {
            Ok(result) => result,
            Err(error) => {
                skip_line(&mut warnings, &template.code, &error);
                continue;
            }
        };
        collect_warnings(&mut warnings, &template.code, &result);
        let amount = prorate(result.amount, employee, &period).amount;
        let line = computed_item(&template.code, &template.name, template.is_taxable, amount, result);
        match template.kind {
            TemplateKind::Earning => earnings.push(line),
            TemplateKind::Allowance => allowances.company.push(line),
            _ => benefits.push(line),
        }
    }

    for item in &applicable_items {
        if !matches!(
            item.kind,
            TemplateKind::Earning | TemplateKind::Allowance | TemplateKind::Benefit
        ) {
            continue;
        }
        let line = match calculate_item_line(item, employee, registry, &additive_ctx, &period, true, &mut warnings) {
            Ok(line) => line,
            Err(error) => {
                skip_line(&mut warnings, &item.code, &error);
                continue;
            }
        };
        match item.kind {
            TemplateKind::Earning => earnings.push(line),
            TemplateKind::Allowance => allowances.employee.push(line),
            _ => benefits.push(line),
        }
    }

    let earnings_total: Decimal = earnings.iter().map(|item| item.amount).sum();
    let gross_salary = round_money(base.amount + earnings_total + allowances.total());

    deductions.statutory = {
        let statutory = calculate_statutory_deductions(
            employee,
            gross_salary,
            period.end_date,
            registry,
        );
        for message in statutory.errors.iter().chain(statutory.warnings.iter()) {
            warnings.push(CalculationWarning {
                code: "statutory".to_string(),
                message: message.clone(),
            });
        }
        statutory.items
    };

    // Second pass over deductions and employer contributions, computed
    // against the gross and never prorated again.
    let gross_ctx = AmountContext::new(gross_salary, period_salary)
        .with_variable("years_of_service", years_of_service);

    for template in &templates {
        if !matches!(
            template.kind,
            TemplateKind::Deduction | TemplateKind::EmployerContribution
        ) {
            continue;
        }
        let result = match calculate_amount(&template.code, &template.method, &gross_ctx) {
            Ok(result) => result,
            Err(error) => {
                skip_line(&mut warnings, &template.code, &error);
                continue;
            }
        };
        collect_warnings(&mut warnings, &template.code, &result);
        let amount = result.amount;
        let line = computed_item(&template.code, &template.name, template.is_taxable, amount, result);
        match template.kind {
            TemplateKind::Deduction => deductions.company.push(line),
            _ => employer_contributions.push(line),
        }
    }

    for item in &applicable_items {
        if !matches!(
            item.kind,
            TemplateKind::Deduction | TemplateKind::EmployerContribution
        ) {
            continue;
        }
        let line = match calculate_item_line(item, employee, registry, &gross_ctx, &period, false, &mut warnings) {
            Ok(line) => line,
            Err(error) => {
                skip_line(&mut warnings, &item.code, &error);
                continue;
            }
        };
        match item.kind {
            TemplateKind::Deduction => deductions.employee.push(line),
            _ => employer_contributions.push(line),
        }
    }

    let total_deductions = deductions.employee_total();
    let contributions_total: Decimal =
        employer_contributions.iter().map(|item| item.amount).sum();
    let total_employer_contributions =
        contributions_total + deductions.statutory_employer_total();
    let net_salary = round_money(gross_salary - total_deductions);

    tracing::debug!(
        employee = %employee.id,
        %gross_salary,
        %net_salary,
        warnings = warnings.len(),
        "payroll calculated"
    );

    Ok(PayrollCalculation {
        calculation_id: Uuid::new_v4(),
        timestamp: Utc::now(),
        engine_version: ENGINE_VERSION.to_string(),
        employee_id: employee.id,
        company_code: employee.company_code.clone(),
        period,
        base_salary: base.amount,
        earnings,
        allowances,
        benefits,
        deductions,
        employer_contributions,
        gross_salary,
        total_deductions,
        total_employer_contributions,
        net_salary,
        warnings,
    })
}

/// Calculates payroll for a batch of employees in parallel.
///
/// Each employee is isolated: a failure becomes a [`BatchError`] and the
/// rest of the batch completes. The summary aggregates only the
/// successful calculations.
pub fn calculate_batch_payroll(
    employees: &[Employee],
    items: &[EmployeePayrollItem],
    registry: &TemplateRegistry,
    period: PayPeriod,
) -> BatchPayrollResult {
    let total_employees = employees.len();

    let outcomes: Vec<Result<PayrollCalculation, BatchError>> = employees
        .par_iter()
        .map(|employee| {
            calculate_employee_payroll(employee, items, registry, period).map_err(|error| {
                tracing::warn!(employee = %employee.id, %error, "batch employee failed");
                BatchError {
                    employee_id: employee.id,
                    message: error.to_string(),
                }
            })
        })
        .collect();

    let mut calculations = Vec::new();
    let mut errors = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(calculation) => calculations.push(calculation),
            Err(error) => errors.push(error),
        }
    }

    let summary = BatchSummary {
        total_employees,
        successful: calculations.len(),
        failed: errors.len(),
        total_gross: calculations.iter().map(|c| c.gross_salary).sum(),
        total_deductions: calculations.iter().map(|c| c.total_deductions).sum(),
        total_net: calculations.iter().map(|c| c.net_salary).sum(),
    };

    BatchPayrollResult {
        summary,
        calculations,
        errors,
    }
}

fn computed_item(
    code: &str,
    name: &str,
    is_taxable: bool,
    amount: Decimal,
    result: AmountResult,
) -> ComputedItem {
    ComputedItem {
        code: code.to_string(),
        name: name.to_string(),
        calculation_base: result.calculation_base,
        rate_applied: result.rate_applied,
        amount,
        is_taxable,
        calculation_details: result.details,
    }
}

// A malformed template or item is fatal to its own line only.
fn skip_line(warnings: &mut Vec<CalculationWarning>, code: &str, error: &EngineError) {
    tracing::warn!(item = %code, %error, "payroll line skipped");
    warnings.push(CalculationWarning {
        code: code.to_string(),
        message: format!("item skipped: {error}"),
    });
}

fn collect_warnings(warnings: &mut Vec<CalculationWarning>, code: &str, result: &AmountResult) {
    for message in &result.warnings {
        warnings.push(CalculationWarning {
            code: code.to_string(),
            message: message.clone(),
        });
    }
}

fn calculate_item_line(
    item: &EmployeePayrollItem,
    employee: &Employee,
    registry: &TemplateRegistry,
    ctx: &AmountContext,
    period: &PayPeriod,
    prorated: bool,
    warnings: &mut Vec<CalculationWarning>,
) -> EngineResult<ComputedItem> {
    // Manual items pass the approved literal through untouched.
    if matches!(item.method, CalculationMethod::Manual) {
        let amount = round_money(item.override_amount.unwrap_or(Decimal::ZERO));
        if item.override_amount.is_none() {
            warnings.push(CalculationWarning {
                code: item.code.clone(),
                message: format!("{}: manual item has no override amount", item.code),
            });
        }
        return Ok(ComputedItem {
            code: item.code.clone(),
            name: item.name.clone(),
            calculation_base: ctx.base_amount,
            rate_applied: None,
            amount,
            is_taxable: item_is_taxable(item, employee, registry),
            calculation_details: serde_json::json!({
                "method": "manual",
                "override_amount": item.override_amount.map(|a| a.to_string()),
            }),
        });
    }

    let result = calculate_amount(&item.code, &item.method, ctx)?;
    collect_warnings(warnings, &item.code, &result);
    let amount = if prorated {
        prorate(result.amount, employee, period).amount
    } else {
        result.amount
    };
    Ok(computed_item(
        &item.code,
        &item.name,
        item_is_taxable(item, employee, registry),
        amount,
        result,
    ))
}

/// An item overriding a company template inherits its taxability;
/// everything else is treated as taxable.
fn item_is_taxable(
    item: &EmployeePayrollItem,
    employee: &Employee,
    registry: &TemplateRegistry,
) -> bool {
    if let ItemSource::CompanyTemplate { template_code } = &item.source {
        if let Some(template) = registry
            .templates_for_company(&employee.company_code)
            .iter()
            .find(|template| &template.code == template_code)
        {
            return template.is_taxable;
        }
    }
    true
}
