//! Amount calculation for every method a template can carry.
//!
//! [`calculate_amount`] is a pure function from a calculation method and a
//! context to a rounded monetary amount plus an audit detail blob. Formula
//! rejections surface as warnings with an amount of 0; malformed method
//! configuration is a fatal error for the owning item only.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde_json::{Value, json};

use crate::calculation::formula::{CompiledFormula, FormulaError};
use crate::calculation::round_money;
use crate::error::EngineResult;
use crate::models::CalculationMethod;

/// The inputs an amount calculation may draw on.
#[derive(Debug, Clone)]
pub struct AmountContext {
    /// The gross base the item is computed against.
    pub base_amount: Decimal,
    /// The employee's per-period base salary.
    pub basic_salary: Decimal,
    /// Whitelisted variables available to formula expressions.
    pub variables: HashMap<String, Decimal>,
}

impl AmountContext {
    /// Creates a context, seeding the formula variables from the two
    /// monetary inputs.
    pub fn new(base_amount: Decimal, basic_salary: Decimal) -> Self {
        let variables = HashMap::from([
            ("basic_salary".to_string(), basic_salary),
            ("gross_salary".to_string(), base_amount),
        ]);
        Self {
            base_amount,
            basic_salary,
            variables,
        }
    }

    /// Adds a formula variable (e.g., `years_of_service`).
    pub fn with_variable(mut self, name: &str, value: Decimal) -> Self {
        self.variables.insert(name.to_string(), value);
        self
    }
}

/// The result of one amount calculation.
#[derive(Debug, Clone, PartialEq)]
pub struct AmountResult {
    /// The computed amount, rounded to 2 decimal places, never negative.
    pub amount: Decimal,
    /// The amount the calculation was based on.
    pub calculation_base: Decimal,
    /// The rate applied, when the method is rate-based.
    pub rate_applied: Option<Decimal>,
    /// Audit trail describing how the amount was derived.
    pub details: Value,
    /// Conditions resolved to 0 instead of aborting (rejected formulas).
    pub warnings: Vec<String>,
}

impl AmountResult {
    fn new(amount: Decimal, base: Decimal, rate: Option<Decimal>, details: Value) -> Self {
        Self {
            amount: round_money(amount.max(Decimal::ZERO)),
            calculation_base: base,
            rate_applied: rate,
            details,
            warnings: Vec::new(),
        }
    }

    fn with_warning(mut self, warning: String) -> Self {
        self.warnings.push(warning);
        self
    }
}

/// Computes the amount for one template or item.
///
/// `code` names the owning item in errors and warnings. Returns an error
/// only for malformed method configuration; data-shape conditions
/// (rejected formula tokens, division by zero, no matching salary band)
/// resolve to amount 0 with a warning.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::{AmountContext, calculate_amount};
/// use payroll_engine::models::CalculationMethod;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let dec = |s: &str| Decimal::from_str(s).unwrap();
/// let ctx = AmountContext::new(dec("60000"), dec("50000"));
///
/// // percentage_of_basic uses base salary, not period gross.
/// let method = CalculationMethod::PercentageOfBasic { percentage: dec("15") };
/// let result = calculate_amount("housing", &method, &ctx).unwrap();
/// assert_eq!(result.amount, dec("7500.00"));
/// ```
pub fn calculate_amount(
    code: &str,
    method: &CalculationMethod,
    ctx: &AmountContext,
) -> EngineResult<AmountResult> {
    method.validate(code)?;

    let result = match method {
        CalculationMethod::FixedAmount { amount } => AmountResult::new(
            *amount,
            ctx.base_amount,
            None,
            json!({"method": "fixed_amount", "amount": amount.to_string()}),
        ),

        CalculationMethod::PercentageOfSalary { percentage } => {
            let rate = percentage / Decimal::ONE_HUNDRED;
            AmountResult::new(
                ctx.base_amount * rate,
                ctx.base_amount,
                Some(rate),
                json!({
                    "method": "percentage_of_salary",
                    "percentage": percentage.to_string(),
                    "base": ctx.base_amount.to_string(),
                }),
            )
        }

        CalculationMethod::PercentageOfBasic { percentage } => {
            let rate = percentage / Decimal::ONE_HUNDRED;
            AmountResult::new(
                ctx.basic_salary * rate,
                ctx.basic_salary,
                Some(rate),
                json!({
                    "method": "percentage_of_basic",
                    "percentage": percentage.to_string(),
                    "base": ctx.basic_salary.to_string(),
                }),
            )
        }

        CalculationMethod::Formula { expression } => calculate_formula(code, expression, ctx),

        CalculationMethod::Manual => AmountResult::new(
            Decimal::ZERO,
            ctx.base_amount,
            None,
            json!({"method": "manual", "note": "value supplied by caller"}),
        ),

        CalculationMethod::ProgressiveBracket { brackets, rebate } => {
            let mut total = Decimal::ZERO;
            let mut bands = Vec::new();
            for band in brackets {
                let upper = band.max.map(|m| m.min(ctx.base_amount)).unwrap_or(ctx.base_amount);
                if upper > band.min {
                    let in_band = upper - band.min;
                    let contribution = in_band * band.rate;
                    total += contribution;
                    bands.push(json!({
                        "min": band.min.to_string(),
                        "max": band.max.map(|m| m.to_string()),
                        "rate": band.rate.to_string(),
                        "amount_in_band": in_band.to_string(),
                        "contribution": contribution.to_string(),
                    }));
                }
            }
            if let Some(rebate) = rebate {
                total -= *rebate;
            }
            AmountResult::new(
                total,
                ctx.base_amount,
                None,
                json!({
                    "method": "progressive_bracket",
                    "base": ctx.base_amount.to_string(),
                    "bands": bands,
                    "rebate": rebate.map(|r| r.to_string()),
                }),
            )
        }

        CalculationMethod::SalaryBracket { brackets } => {
            let band = brackets.iter().find(|band| {
                ctx.base_amount >= band.min
                    && band.max.map(|m| ctx.base_amount <= m).unwrap_or(true)
            });
            match band {
                Some(band) => AmountResult::new(
                    band.amount,
                    ctx.base_amount,
                    None,
                    json!({
                        "method": "salary_bracket",
                        "base": ctx.base_amount.to_string(),
                        "band_min": band.min.to_string(),
                        "band_max": band.max.map(|m| m.to_string()),
                    }),
                ),
                None => AmountResult::new(
                    Decimal::ZERO,
                    ctx.base_amount,
                    None,
                    json!({"method": "salary_bracket", "matched": false}),
                )
                .with_warning(format!(
                    "{code}: no salary band matches reference amount {}",
                    ctx.base_amount
                )),
            }
        }

        CalculationMethod::FlatAmount {
            amount,
            minimum_salary,
        } => {
            let gated = minimum_salary
                .map(|min| ctx.base_amount < min)
                .unwrap_or(false);
            let value = if gated { Decimal::ZERO } else { *amount };
            AmountResult::new(
                value,
                ctx.base_amount,
                None,
                json!({
                    "method": "flat_amount",
                    "amount": amount.to_string(),
                    "minimum_salary": minimum_salary.map(|m| m.to_string()),
                    "below_minimum": gated,
                }),
            )
        }

        CalculationMethod::Percentage {
            employee_rate,
            maximum_salary,
            ..
        } => {
            let capped = maximum_salary
                .map(|cap| ctx.base_amount.min(cap))
                .unwrap_or(ctx.base_amount);
            AmountResult::new(
                capped * employee_rate,
                capped,
                Some(*employee_rate),
                json!({
                    "method": "percentage",
                    "rate": employee_rate.to_string(),
                    "capped_base": capped.to_string(),
                }),
            )
        }
    };

    Ok(result)
}

/// Computes the employee and employer sides of a statutory template.
///
/// The `Percentage` method applies its two rates independently to the
/// capped reference amount; every other method produces an employee-side
/// amount only.
pub fn calculate_statutory_amounts(
    code: &str,
    method: &CalculationMethod,
    reference: Decimal,
) -> EngineResult<StatutoryAmounts> {
    if let CalculationMethod::Percentage {
        employee_rate,
        employer_rate,
        maximum_salary,
    } = method
    {
        method.validate(code)?;
        let capped = maximum_salary
            .map(|cap| reference.min(cap))
            .unwrap_or(reference);
        return Ok(StatutoryAmounts {
            employee: round_money(capped * employee_rate),
            employer: round_money(capped * employer_rate),
            calculation_base: capped,
            rate_applied: Some(*employee_rate),
            details: json!({
                "method": "percentage",
                "employee_rate": employee_rate.to_string(),
                "employer_rate": employer_rate.to_string(),
                "capped_base": capped.to_string(),
                "capped": maximum_salary.map(|cap| reference > cap).unwrap_or(false),
            }),
            warnings: Vec::new(),
        });
    }

    let ctx = AmountContext::new(reference, reference);
    let result = calculate_amount(code, method, &ctx)?;
    Ok(StatutoryAmounts {
        employee: result.amount,
        employer: Decimal::ZERO,
        calculation_base: result.calculation_base,
        rate_applied: result.rate_applied,
        details: result.details,
        warnings: result.warnings,
    })
}

/// Employee and employer amounts for one statutory template.
#[derive(Debug, Clone, PartialEq)]
pub struct StatutoryAmounts {
    /// The amount withheld from the employee.
    pub employee: Decimal,
    /// The amount owed by the employer.
    pub employer: Decimal,
    /// The (possibly capped) amount the calculation was based on.
    pub calculation_base: Decimal,
    /// The employee-side rate, when rate-based.
    pub rate_applied: Option<Decimal>,
    /// Audit trail describing how the amounts were derived.
    pub details: Value,
    /// Conditions resolved to 0 instead of aborting.
    pub warnings: Vec<String>,
}

fn calculate_formula(code: &str, expression: &str, ctx: &AmountContext) -> AmountResult {
    let rejected = |reason: String| {
        AmountResult::new(
            Decimal::ZERO,
            ctx.base_amount,
            None,
            json!({
                "method": "formula",
                "expression": expression,
                "resolved": "rejected",
            }),
        )
        .with_warning(format!("{code}: formula rejected: {reason}"))
    };

    let formula = match CompiledFormula::compile(expression) {
        Ok(formula) => formula,
        Err(error) => return rejected(error.to_string()),
    };

    match formula.evaluate(&ctx.variables) {
        Ok(value) => {
            let mut result = AmountResult::new(
                value,
                ctx.base_amount,
                None,
                json!({
                    "method": "formula",
                    "expression": expression,
                    "raw_value": value.to_string(),
                }),
            );
            if value.is_sign_negative() {
                result = result
                    .with_warning(format!("{code}: negative formula result clamped to 0"));
            }
            result
        }
        Err(FormulaError::DivisionByZero) => rejected("division by zero".to_string()),
        Err(error) => rejected(error.to_string()),
    }
}
