//! Benchmarks for single-employee and batch payroll calculation.

use chrono::NaiveDate;
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use payroll_engine::calculation::{calculate_batch_payroll, calculate_employee_payroll};
use payroll_engine::models::{Employee, EmploymentType, PayFrequency, PayPeriod};
use payroll_engine::registry::RegistryLoader;

fn employee(annual: &str) -> Employee {
    Employee {
        id: Uuid::new_v4(),
        company_code: "acme_ke".to_string(),
        base_salary: Decimal::from_str(annual).unwrap(),
        pay_frequency: PayFrequency::Monthly,
        employment_start_date: NaiveDate::from_ymd_opt(2022, 3, 1).unwrap(),
        hire_date: None,
        termination_date: None,
        employment_type: EmploymentType::FullTime,
        department: Some("engineering".to_string()),
        position: Some("developer".to_string()),
        manager_id: None,
    }
}

fn period() -> PayPeriod {
    PayPeriod::new(
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
    )
}

fn bench_single_calculation(c: &mut Criterion) {
    let loader = RegistryLoader::load("./config/demo").unwrap();
    let e = employee("600000");

    c.bench_function("single_employee_payroll", |b| {
        b.iter(|| {
            calculate_employee_payroll(
                black_box(&e),
                black_box(&[]),
                loader.registry(),
                period(),
            )
            .unwrap()
        })
    });
}

fn bench_batch_calculation(c: &mut Criterion) {
    let loader = RegistryLoader::load("./config/demo").unwrap();
    let employees: Vec<Employee> = (0..500)
        .map(|i| employee(&format!("{}", 300_000 + i * 1_000)))
        .collect();

    c.bench_function("batch_payroll_500", |b| {
        b.iter(|| {
            calculate_batch_payroll(
                black_box(&employees),
                black_box(&[]),
                loader.registry(),
                period(),
            )
        })
    });
}

criterion_group!(benches, bench_single_calculation, bench_batch_calculation);
criterion_main!(benches);
