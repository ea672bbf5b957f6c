//! Error types for the payroll calculation engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur during payroll calculation.

use thiserror::Error;

/// The main error type for the payroll calculation engine.
///
/// All operations in the engine return this error type, making it easy
/// to handle errors consistently throughout the application.
///
/// # Example
///
/// ```
/// use payroll_engine::error::EngineError;
///
/// let error = EngineError::ConfigNotFound {
///     path: "/missing/file.yaml".to_string(),
/// };
/// assert_eq!(error.to_string(), "Configuration file not found: /missing/file.yaml");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// An employee references a company that is not registered.
    #[error("Company not found: {code}")]
    CompanyNotFound {
        /// The company code that was not found.
        code: String,
    },

    /// A payroll template or item carries an invalid configuration.
    ///
    /// Invalid configuration is fatal for the item it belongs to, never
    /// for its siblings.
    #[error("Invalid template '{code}': {message}")]
    InvalidTemplate {
        /// The code of the template or item with the invalid configuration.
        code: String,
        /// A description of what made the configuration invalid.
        message: String,
    },

    /// An employee record was invalid or contained inconsistent data.
    #[error("Invalid employee field '{field}': {message}")]
    InvalidEmployee {
        /// The field that was invalid.
        field: String,
        /// A description of what made the field invalid.
        message: String,
    },

    /// A general calculation error occurred.
    #[error("Calculation error: {message}")]
    CalculationError {
        /// A description of the calculation error.
        message: String,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_not_found_displays_path() {
        let error = EngineError::ConfigNotFound {
            path: "/missing/file.yaml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found: /missing/file.yaml"
        );
    }

    #[test]
    fn test_config_parse_error_displays_path_and_message() {
        let error = EngineError::ConfigParseError {
            path: "/config/bad.yaml".to_string(),
            message: "invalid YAML syntax".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to parse configuration file '/config/bad.yaml': invalid YAML syntax"
        );
    }

    #[test]
    fn test_company_not_found_displays_code() {
        let error = EngineError::CompanyNotFound {
            code: "acme_ke".to_string(),
        };
        assert_eq!(error.to_string(), "Company not found: acme_ke");
    }

    #[test]
    fn test_invalid_template_displays_code_and_message() {
        let error = EngineError::InvalidTemplate {
            code: "paye".to_string(),
            message: "brackets overlap at 24000".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid template 'paye': brackets overlap at 24000"
        );
    }

    #[test]
    fn test_invalid_employee_displays_field_and_message() {
        let error = EngineError::InvalidEmployee {
            field: "termination_date".to_string(),
            message: "before employment start".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid employee field 'termination_date': before employment start"
        );
    }

    #[test]
    fn test_calculation_error_displays_message() {
        let error = EngineError::CalculationError {
            message: "negative gross calculated".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Calculation error: negative gross calculated"
        );
    }

    #[test]
    fn test_errors_implement_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<EngineError>();
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn returns_company_not_found() -> EngineResult<()> {
            Err(EngineError::CompanyNotFound {
                code: "missing".to_string(),
            })
        }

        fn propagates_error() -> EngineResult<()> {
            returns_company_not_found()?;
            Ok(())
        }

        assert!(propagates_error().is_err());
    }
}
