// SPDX-License-Identifier: AGPL-3.0-only

//! Typed errors for the comparison pipeline.
//!
//! Replaces `Result<_, String>` in public APIs with a proper enum so callers
//! can pattern-match on failure modes (config, schema, data domain, phase
//! exhaustion) rather than parsing opaque strings.
//!
//! Per-point simulation failures are deliberately NOT represented here:
//! they are recovered locally inside a comparison phase (skipped energy or
//! NaN-sentinel row) and only surface as `PhaseExhaustion` when every point
//! of a phase failed.

use std::fmt;

/// Errors arising from configuration, data loading, or a comparison phase.
#[derive(Debug)]
pub enum ValidationError {
    /// Configuration file missing or malformed.
    Config(String),

    /// Dataset file missing, unreadable, or structurally broken CSV.
    DataLoad(String),

    /// No column matched a required role under any alias, or an explicit
    /// override column is absent. Names every attempted alias.
    SchemaResolution(String),

    /// One or more value-domain violations, collected in a single pass and
    /// reported together.
    DataValidation(Vec<String>),

    /// Every point in a comparison phase failed (names the phase).
    PhaseExhaustion(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "Error loading configuration: {e}"),
            Self::DataLoad(e) => write!(f, "Data loading failed: {e}"),
            Self::SchemaResolution(e) => write!(f, "Schema resolution failed: {e}"),
            Self::DataValidation(errors) => {
                write!(f, "Data validation failed:")?;
                for e in errors {
                    write!(f, "\n  - {e}")?;
                }
                Ok(())
            }
            Self::PhaseExhaustion(phase) => {
                write!(f, "Failed to calculate any results for {phase}")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_config() {
        let err = ValidationError::Config("file not found: config.json".into());
        assert_eq!(
            err.to_string(),
            "Error loading configuration: file not found: config.json"
        );
    }

    #[test]
    fn display_data_validation_lists_every_violation() {
        let err = ValidationError::DataValidation(vec![
            "Column 'Energy_MeV' must be numeric".into(),
            "Column 'dose_rate_Gy_s' contains negative values".into(),
        ]);
        let msg = err.to_string();
        assert!(msg.contains("Energy_MeV"));
        assert!(msg.contains("dose_rate_Gy_s"));
        assert!(msg.contains("\n  - "));
    }

    #[test]
    fn display_phase_exhaustion() {
        let err = ValidationError::PhaseExhaustion("Continuous Beam".into());
        assert_eq!(
            err.to_string(),
            "Failed to calculate any results for Continuous Beam"
        );
    }

    #[test]
    fn error_trait_works() {
        let err = ValidationError::SchemaResolution("no energy column".into());
        let dyn_err: &dyn std::error::Error = &err;
        assert!(dyn_err.to_string().contains("no energy column"));
    }
}
