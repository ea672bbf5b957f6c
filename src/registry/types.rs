//! The template registry.
//!
//! This module contains the strongly-typed registry aggregating the
//! companies, company payroll templates, and tax jurisdictions the engine
//! calculates against.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::error::{EngineError, EngineResult};
use crate::models::{Company, CompanyPayrollTemplate, TaxJurisdiction};

/// The complete registry of companies, templates, and jurisdictions.
///
/// Built once (usually by [`super::RegistryLoader`]) and then only read
/// during calculation.
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    /// Companies by code.
    companies: HashMap<String, Company>,
    /// Company payroll templates by company code.
    templates: HashMap<String, Vec<CompanyPayrollTemplate>>,
    /// Jurisdictions, sorted by effective date ascending.
    jurisdictions: Vec<TaxJurisdiction>,
}

impl TemplateRegistry {
    /// Creates a new registry from its component parts.
    ///
    /// Jurisdictions are sorted by effective date so lookups can take the
    /// most recent window matching a date.
    pub fn new(
        companies: Vec<Company>,
        templates: HashMap<String, Vec<CompanyPayrollTemplate>>,
        jurisdictions: Vec<TaxJurisdiction>,
    ) -> Self {
        let mut sorted = jurisdictions;
        sorted.sort_by(|a, b| a.effective_from.cmp(&b.effective_from));
        Self {
            companies: companies
                .into_iter()
                .map(|company| (company.code.clone(), company))
                .collect(),
            templates,
            jurisdictions: sorted,
        }
    }

    /// Looks up a company by code.
    pub fn company(&self, code: &str) -> Option<&Company> {
        self.companies.get(code)
    }

    /// Returns the payroll templates defined by a company.
    pub fn templates_for_company(&self, code: &str) -> &[CompanyPayrollTemplate] {
        self.templates.get(code).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns the jurisdiction effective for a country on a date.
    ///
    /// When several windows match, the one with the latest effective date
    /// wins.
    pub fn jurisdiction_for_country(
        &self,
        country: &str,
        date: NaiveDate,
    ) -> Option<&TaxJurisdiction> {
        self.jurisdictions
            .iter()
            .rfind(|jurisdiction| {
                jurisdiction.country == country && jurisdiction.is_effective_on(date)
            })
    }

    /// Returns all registered jurisdictions.
    pub fn jurisdictions(&self) -> &[TaxJurisdiction] {
        &self.jurisdictions
    }

    /// Validates every template configuration in the registry.
    ///
    /// Checks each calculation method and rejects jurisdictions carrying
    /// more than one active statutory template per code.
    pub fn validate(&self) -> EngineResult<()> {
        for templates in self.templates.values() {
            for template in templates {
                template.method.validate(&template.code)?;
            }
        }
        for jurisdiction in &self.jurisdictions {
            let mut seen: Vec<&str> = Vec::new();
            for deduction in &jurisdiction.deductions {
                deduction.method.validate(&deduction.code)?;
                if deduction.active {
                    if seen.contains(&deduction.code.as_str()) {
                        return Err(EngineError::InvalidTemplate {
                            code: deduction.code.clone(),
                            message: format!(
                                "duplicate active statutory template in jurisdiction '{}'",
                                jurisdiction.code
                            ),
                        });
                    }
                    seen.push(&deduction.code);
                }
            }
        }
        Ok(())
    }
}
