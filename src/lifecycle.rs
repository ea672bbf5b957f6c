//! Payroll record creation and the draft → approved → processed lifecycle.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    ComputedItem, Payroll, PayrollCalculation, PayrollItem, PayrollItemCategory, PayrollStatus,
    StatutoryDeductionType, StatutoryItem,
};

/// An in-memory store of payroll records keyed by id.
///
/// Record creation is all-or-nothing per batch: either every calculation
/// becomes a draft payroll or none does. One payroll may exist per
/// employee and period; corrections require a new record.
#[derive(Debug, Default)]
pub struct InMemoryPayrollStore {
    payrolls: Mutex<HashMap<Uuid, Payroll>>,
}

impl InMemoryPayrollStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // Every mutation is a single insert or status flip, so the map stays
    // consistent even if a holder panicked; recover the poisoned lock.
    fn locked(&self) -> MutexGuard<'_, HashMap<Uuid, Payroll>> {
        self.payrolls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Persists one draft payroll per calculation.
    ///
    /// Fails without writing anything when any calculation collides with
    /// an existing record, or with another calculation in the same batch,
    /// for the same employee and period.
    pub fn create_payroll_records(
        &self,
        calculations: &[PayrollCalculation],
    ) -> EngineResult<Vec<Payroll>> {
        let records: Vec<Payroll> = calculations.iter().map(build_payroll).collect();

        let mut payrolls = self.locked();

        let mut batch_keys = Vec::with_capacity(records.len());
        for record in &records {
            let key = (record.employee_id, record.period_start, record.period_end);
            let collides = batch_keys.contains(&key)
                || payrolls.values().any(|existing| {
                    existing.employee_id == record.employee_id
                        && existing.period_start == record.period_start
                        && existing.period_end == record.period_end
                });
            if collides {
                return Err(EngineError::CalculationError {
                    message: format!(
                        "payroll already exists for employee {} in period {} to {}",
                        record.employee_id, record.period_start, record.period_end
                    ),
                });
            }
            batch_keys.push(key);
        }

        for record in &records {
            payrolls.insert(record.id, record.clone());
        }
        tracing::info!(count = records.len(), "payroll records created");
        Ok(records)
    }

    /// Returns a snapshot of one payroll record.
    pub fn get_payroll(&self, id: Uuid) -> Option<Payroll> {
        self.locked().get(&id).cloned()
    }

    /// Approves a draft payroll.
    ///
    /// Returns `false` when the record does not exist or is not a draft.
    pub fn approve_payroll(&self, id: Uuid, approver_id: Uuid) -> bool {
        let mut payrolls = self.locked();
        match payrolls.get_mut(&id) {
            Some(payroll) => payroll.approve(approver_id, Utc::now()),
            None => false,
        }
    }

    /// Processes an approved payroll.
    ///
    /// Returns `false` when the record does not exist or is not approved.
    pub fn process_payroll(&self, id: Uuid) -> bool {
        let mut payrolls = self.locked();
        match payrolls.get_mut(&id) {
            Some(payroll) => payroll.process(Utc::now()),
            None => false,
        }
    }

    /// Returns all payrolls for one employee, newest period first.
    pub fn payrolls_for_employee(&self, employee_id: Uuid) -> Vec<Payroll> {
        let payrolls = self.locked();
        let mut records: Vec<Payroll> = payrolls
            .values()
            .filter(|payroll| payroll.employee_id == employee_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.period_start.cmp(&a.period_start));
        records
    }
}

fn build_payroll(calculation: &PayrollCalculation) -> Payroll {
    let mut items = Vec::new();

    let push = |items: &mut Vec<PayrollItem>, line: &ComputedItem, category: PayrollItemCategory| {
        let employer_side = category == PayrollItemCategory::EmployerContribution;
        items.push(PayrollItem {
            code: line.code.clone(),
            name: line.name.clone(),
            category,
            calculation_base: line.calculation_base,
            rate_applied: line.rate_applied,
            employee_amount: if employer_side { Decimal::ZERO } else { line.amount },
            employer_amount: if employer_side { line.amount } else { Decimal::ZERO },
            is_statutory: false,
            is_taxable: line.is_taxable,
            calculation_details: line.calculation_details.clone(),
        });
    };

    for line in &calculation.earnings {
        push(&mut items, line, PayrollItemCategory::Income);
    }
    for line in calculation
        .allowances
        .company
        .iter()
        .chain(calculation.allowances.employee.iter())
    {
        push(&mut items, line, PayrollItemCategory::Allowance);
    }
    for line in &calculation.benefits {
        push(&mut items, line, PayrollItemCategory::Benefit);
    }
    for line in calculation
        .deductions
        .company
        .iter()
        .chain(calculation.deductions.employee.iter())
    {
        push(&mut items, line, PayrollItemCategory::Deduction);
    }
    for line in &calculation.deductions.statutory {
        items.push(statutory_item(line));
    }
    for line in &calculation.employer_contributions {
        push(&mut items, line, PayrollItemCategory::EmployerContribution);
    }

    Payroll {
        id: Uuid::new_v4(),
        employee_id: calculation.employee_id,
        company_code: calculation.company_code.clone(),
        period_start: calculation.period.start_date,
        period_end: calculation.period.end_date,
        base_salary: calculation.base_salary,
        gross_salary: calculation.gross_salary,
        total_deductions: calculation.total_deductions,
        net_salary: calculation.net_salary,
        status: PayrollStatus::Draft,
        approved_by: None,
        approved_at: None,
        processed_at: None,
        items,
    }
}

fn statutory_item(line: &StatutoryItem) -> PayrollItem {
    let category = match line.deduction_type {
        StatutoryDeductionType::IncomeTax => PayrollItemCategory::Tax,
        _ => PayrollItemCategory::Deduction,
    };
    PayrollItem {
        code: line.code.clone(),
        name: line.name.clone(),
        category,
        calculation_base: line.calculation_base,
        rate_applied: line.rate_applied,
        employee_amount: line.employee_amount,
        employer_amount: line.employer_amount,
        is_statutory: true,
        is_taxable: false,
        calculation_details: line.calculation_details.clone(),
    }
}
