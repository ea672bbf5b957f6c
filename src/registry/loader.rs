//! Registry loading functionality.
//!
//! This module provides the [`RegistryLoader`] type for loading companies,
//! payroll templates, and tax jurisdictions from YAML files.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{EngineError, EngineResult};
use crate::models::{Company, CompanyPayrollTemplate, TaxJurisdiction};

use super::types::TemplateRegistry;

#[derive(Debug, Deserialize)]
struct CompaniesFile {
    companies: Vec<Company>,
}

#[derive(Debug, Deserialize)]
struct TemplatesFile {
    templates: HashMap<String, Vec<CompanyPayrollTemplate>>,
}

#[derive(Debug, Deserialize)]
struct JurisdictionsFile {
    jurisdictions: Vec<TaxJurisdiction>,
}

/// Loads and provides access to the template registry.
///
/// # Directory Structure
///
/// The registry directory should have the following structure:
/// ```text
/// config/demo/
/// ├── companies.yaml      # Employing companies
/// ├── templates.yaml      # Company payroll templates, keyed by company
/// └── jurisdictions.yaml  # Tax jurisdictions and statutory templates
/// ```
///
/// # Example
///
/// ```no_run
/// use payroll_engine::registry::RegistryLoader;
///
/// let loader = RegistryLoader::load("./config/demo").unwrap();
/// let company = loader.registry().company("acme_ke").unwrap();
/// println!("Loaded company: {}", company.name);
/// ```
#[derive(Debug, Clone)]
pub struct RegistryLoader {
    registry: TemplateRegistry,
}

impl RegistryLoader {
    /// Loads a registry from the specified directory.
    ///
    /// Returns an error if any required file is missing, any file contains
    /// invalid YAML, or any template configuration fails validation.
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let companies: CompaniesFile = read_yaml(&path.join("companies.yaml"))?;
        let templates: TemplatesFile = read_yaml(&path.join("templates.yaml"))?;
        let jurisdictions: JurisdictionsFile = read_yaml(&path.join("jurisdictions.yaml"))?;

        let registry = TemplateRegistry::new(
            companies.companies,
            templates.templates,
            jurisdictions.jurisdictions,
        );
        registry.validate()?;

        Ok(Self { registry })
    }

    /// Returns the loaded registry.
    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    /// Consumes the loader and returns the registry.
    pub fn into_registry(self) -> TemplateRegistry {
        self.registry
    }
}

fn read_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
    let display = path.display().to_string();
    let contents = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
        path: display.clone(),
    })?;
    serde_yaml::from_str(&contents).map_err(|e| EngineError::ConfigParseError {
        path: display,
        message: e.to_string(),
    })
}
