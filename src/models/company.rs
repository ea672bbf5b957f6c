//! Employing company model.
//!
//! Companies are the tenant boundary of the platform: every employee and
//! every company-defined payroll template belongs to exactly one company,
//! and the company's country determines the statutory tax jurisdiction.

use serde::{Deserialize, Serialize};

/// An employing company registered on the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    /// Unique company code (e.g., "acme_ke").
    pub code: String,
    /// The human-readable company name.
    pub name: String,
    /// ISO country code used for jurisdiction resolution (e.g., "KE").
    pub country: String,
}
