//! Multi-tenant payroll calculation engine.
//!
//! This crate computes, per employee and pay period, gross pay, itemized
//! earnings/allowances/benefits, statutory and company-defined deductions,
//! employer contributions, and net pay, producing an auditable payroll
//! record for a platform spanning multiple employing companies and tax
//! jurisdictions.

#![warn(missing_docs)]

pub mod calculation;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod registry;

/// The engine version recorded on every calculation result.
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
