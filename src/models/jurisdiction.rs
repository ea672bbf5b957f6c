//! Tax jurisdiction model.
//!
//! A jurisdiction is the country- or region-scoped ruleset governing
//! statutory calculations. Each jurisdiction owns the statutory deduction
//! templates mandated while it is effective.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::StatutoryDeductionTemplate;

/// A country/region-scoped statutory ruleset with an effective window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxJurisdiction {
    /// Unique jurisdiction code (e.g., "KE-2026").
    pub code: String,
    /// Human-readable name (e.g., "Kenya 2026 tax year").
    pub name: String,
    /// ISO country code the jurisdiction belongs to.
    pub country: String,
    /// Optional sub-national region the jurisdiction is scoped to.
    #[serde(default)]
    pub region: Option<String>,
    /// First day the jurisdiction is effective.
    pub effective_from: NaiveDate,
    /// Last day the jurisdiction is effective, if bounded.
    #[serde(default)]
    pub effective_to: Option<NaiveDate>,
    /// The statutory deduction templates the jurisdiction mandates.
    pub deductions: Vec<StatutoryDeductionTemplate>,
}

impl TaxJurisdiction {
    /// Returns true if the jurisdiction is effective on the given date.
    pub fn is_effective_on(&self, date: NaiveDate) -> bool {
        date >= self.effective_from && self.effective_to.map(|to| date <= to).unwrap_or(true)
    }
}
