//! Registry loading and management.
//!
//! This module provides functionality to load the template registry —
//! companies, company payroll templates, and tax jurisdictions — from YAML
//! files, and to query it during calculation.
//!
//! # Example
//!
//! ```no_run
//! use payroll_engine::registry::RegistryLoader;
//!
//! let loader = RegistryLoader::load("./config/demo").unwrap();
//! println!("Jurisdictions: {}", loader.registry().jurisdictions().len());
//! ```

mod loader;
mod types;

pub use loader::RegistryLoader;
pub use types::TemplateRegistry;
