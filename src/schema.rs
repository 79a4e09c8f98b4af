// SPDX-License-Identifier: AGPL-3.0-only

//! Column alias resolution and value-domain validation.
//!
//! Experimental datasets arrive with inconsistent column names. Each
//! semantic role (energy, recombination factor, dose rate) carries an
//! ordered alias-priority table; resolution picks the first match, and an
//! explicit override always wins over auto-detection. Dose-rate resolution
//! falls back from the air-kerma alias group to the water group.
//!
//! Validation short-circuits only on missing columns or an empty table.
//! Every other violation (NaN cells, non-numeric columns, out-of-domain
//! values) is collected in a single pass so the caller can surface all of
//! them together.

use crate::error::ValidationError;
use crate::table::Table;

/// Energy column aliases, in priority order.
pub const ENERGY_ALIASES: &[&str] = &["Energy_MeV", "energy_MeV", "E_MeV", "energy"];

/// Recombination-factor column aliases, in priority order.
pub const KS_ALIASES: &[&str] = &["k_s", "ks", "recombination_factor", "collection_efficiency"];

/// Dose-rate (air) column aliases, tried before the water group.
pub const DOSE_RATE_AIR_ALIASES: &[&str] =
    &["dose_rate_air_Gy_s", "dose_rate_air", "doserate_air_Gy_s"];

/// Dose-rate (water) column aliases, the fallback group.
pub const DOSE_RATE_WATER_ALIASES: &[&str] =
    &["dose_rate_water_Gy_s", "dose_rate_water", "doserate_water_Gy_s"];

/// Optional explicit column names; `None` means auto-detect via aliases.
#[derive(Debug, Clone, Default)]
pub struct ColumnOverrides {
    /// Explicit energy column name.
    pub energy: Option<String>,
    /// Explicit recombination-factor column name.
    pub ks: Option<String>,
    /// Explicit dose-rate column name.
    pub dose_rate: Option<String>,
}

/// Source column names resolved for the three semantic roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumns {
    /// Source column carrying beam energy (MeV).
    pub energy: String,
    /// Source column carrying the recombination factor.
    pub ks: String,
    /// Source column carrying dose rate (Gy/s).
    pub dose_rate: String,
}

/// First alias present in the table, in priority order.
#[must_use]
pub fn find_column(table: &Table, aliases: &[&str]) -> Option<String> {
    aliases
        .iter()
        .find(|name| table.has_column(name))
        .map(|s| (*s).to_string())
}

fn resolve_role(
    table: &Table,
    role: &str,
    explicit: Option<&String>,
    alias_groups: &[&[&str]],
) -> Result<String, ValidationError> {
    if let Some(name) = explicit {
        if table.has_column(name) {
            return Ok(name.clone());
        }
        return Err(ValidationError::SchemaResolution(format!(
            "explicit {role} column '{name}' not found in dataset"
        )));
    }
    for group in alias_groups {
        if let Some(found) = find_column(table, group) {
            return Ok(found);
        }
    }
    let tried: Vec<&str> = alias_groups.iter().flat_map(|g| g.iter().copied()).collect();
    Err(ValidationError::SchemaResolution(format!(
        "could not find {role} column. Tried: {tried:?}"
    )))
}

/// Resolve the source columns for all three roles.
///
/// # Errors
///
/// Returns [`ValidationError::SchemaResolution`] if an explicit override is
/// absent, or no alias of a role matches (naming all attempted aliases).
pub fn resolve_columns(
    table: &Table,
    overrides: &ColumnOverrides,
) -> Result<ResolvedColumns, ValidationError> {
    let energy = resolve_role(table, "energy", overrides.energy.as_ref(), &[ENERGY_ALIASES])?;
    let ks = resolve_role(table, "k_s", overrides.ks.as_ref(), &[KS_ALIASES])?;
    let dose_rate = resolve_role(
        table,
        "dose rate",
        overrides.dose_rate.as_ref(),
        &[DOSE_RATE_AIR_ALIASES, DOSE_RATE_WATER_ALIASES],
    )?;
    Ok(ResolvedColumns {
        energy,
        ks,
        dose_rate,
    })
}

/// Numeric profile of one column: parse results for every cell.
struct ColumnProfile {
    nan_count: usize,
    non_numeric: bool,
    values: Vec<f64>,
}

fn profile_column(table: &Table, name: &str) -> ColumnProfile {
    let cells = table.column(name).unwrap_or_default();
    let mut nan_count = 0;
    let mut non_numeric = false;
    let mut values = Vec::with_capacity(cells.len());
    for cell in cells {
        if cell.is_empty() {
            nan_count += 1;
            values.push(f64::NAN);
            continue;
        }
        match cell.parse::<f64>() {
            Ok(v) if v.is_nan() => {
                nan_count += 1;
                values.push(v);
            }
            Ok(v) => values.push(v),
            Err(_) => {
                non_numeric = true;
                values.push(f64::NAN);
            }
        }
    }
    ColumnProfile {
        nan_count,
        non_numeric,
        values,
    }
}

/// Validate the resolved columns, collecting every violation found.
///
/// Returns `(is_valid, violations)`. Missing required columns and an empty
/// table short-circuit with a single message; otherwise all NaN, dtype, and
/// domain violations are reported together. NaN cells are excluded from the
/// domain comparisons (they are already reported as NaN counts).
#[must_use]
pub fn validate(table: &Table, cols: &ResolvedColumns) -> (bool, Vec<String>) {
    let mut errors = Vec::new();

    let required = [&cols.energy, &cols.ks, &cols.dose_rate];
    let missing: Vec<&str> = required
        .iter()
        .filter(|c| !table.has_column(c))
        .map(|c| c.as_str())
        .collect();
    if !missing.is_empty() {
        errors.push(format!("Missing required columns: {missing:?}"));
        return (false, errors);
    }

    if table.is_empty() {
        errors.push("Dataset is empty".to_string());
        return (false, errors);
    }

    for col in required {
        let profile = profile_column(table, col);
        if profile.nan_count > 0 {
            errors.push(format!(
                "Column '{col}' contains {} NaN values",
                profile.nan_count
            ));
        }
        if profile.non_numeric {
            errors.push(format!("Column '{col}' must be numeric"));
            continue;
        }
        let finite = profile.values.iter().filter(|v| !v.is_nan());
        if col == &cols.dose_rate {
            if finite.clone().any(|&v| v < 0.0) {
                errors.push(format!("Column '{col}' contains negative values"));
            }
        } else if finite.clone().any(|&v| v <= 0.0) {
            errors.push(format!("Column '{col}' contains non-positive values"));
        }
    }

    (errors.is_empty(), errors)
}
