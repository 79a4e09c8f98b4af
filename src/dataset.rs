// SPDX-License-Identifier: AGPL-3.0-only

//! Canonical experimental dataset.
//!
//! The loader resolves arbitrary column names onto the canonical schema,
//! validates value domains (surfacing every violation together), renames
//! the source columns, derives `dose_rate_Gy_min`, and extracts typed rows.
//! Downstream code never sees the raw column names again.
//!
//! The dataset is immutable once constructed.

use crate::error::ValidationError;
use crate::schema::{self, ColumnOverrides};
use crate::table::Table;
use std::path::Path;

/// Canonical column: beam energy in MeV.
pub const COL_ENERGY: &str = "Energy_MeV";
/// Canonical column: recombination factor.
pub const COL_KS: &str = "k_s";
/// Canonical column: dose rate in Gy/s.
pub const COL_DOSE_RATE_S: &str = "dose_rate_Gy_s";
/// Canonical column: dose rate in Gy/min (derived if absent).
pub const COL_DOSE_RATE_MIN: &str = "dose_rate_Gy_min";

/// One validated experimental measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataPoint {
    /// Beam energy (MeV), > 0.
    pub energy_mev: f64,
    /// Measured recombination factor, > 0.
    pub k_s: f64,
    /// Dose rate (Gy/s), >= 0.
    pub dose_rate_gy_s: f64,
    /// Dose rate (Gy/min), `dose_rate_gy_s * 60`.
    pub dose_rate_gy_min: f64,
}

/// Resolved, validated, canonicalized experimental dataset.
#[derive(Debug, Clone)]
pub struct ExperimentalDataset {
    table: Table,
    points: Vec<DataPoint>,
}

impl ExperimentalDataset {
    /// Build a canonical dataset from a raw table.
    ///
    /// Resolution picks source columns per the alias tables (explicit
    /// overrides win); validation collects every domain violation before
    /// failing; on success the table is renamed onto canonical names and
    /// `dose_rate_Gy_min` is derived if missing.
    ///
    /// # Errors
    ///
    /// [`ValidationError::SchemaResolution`] if a role cannot be resolved,
    /// [`ValidationError::DataValidation`] with the full violation list.
    pub fn from_table(
        mut table: Table,
        overrides: &ColumnOverrides,
    ) -> Result<Self, ValidationError> {
        let cols = schema::resolve_columns(&table, overrides)?;

        let (is_valid, errors) = schema::validate(&table, &cols);
        if !is_valid {
            return Err(ValidationError::DataValidation(errors));
        }

        table.rename_column(&cols.energy, COL_ENERGY);
        table.rename_column(&cols.ks, COL_KS);
        table.rename_column(&cols.dose_rate, COL_DOSE_RATE_S);

        let parse = |name: &str| -> Vec<f64> {
            table
                .column(name)
                .unwrap_or_default()
                .iter()
                .map(|c| c.parse::<f64>().unwrap_or(f64::NAN))
                .collect()
        };
        let energies = parse(COL_ENERGY);
        let ks_values = parse(COL_KS);
        let rates_s = parse(COL_DOSE_RATE_S);

        let rates_min: Vec<f64> = if table.has_column(COL_DOSE_RATE_MIN) {
            parse(COL_DOSE_RATE_MIN)
        } else {
            let derived: Vec<f64> = rates_s.iter().map(|r| r * 60.0).collect();
            table.push_column(
                COL_DOSE_RATE_MIN,
                derived.iter().map(|v| format!("{v}")).collect(),
            )?;
            derived
        };

        let points = energies
            .iter()
            .zip(&ks_values)
            .zip(rates_s.iter().zip(&rates_min))
            .map(|((&e, &k), (&rs, &rm))| DataPoint {
                energy_mev: e,
                k_s: k,
                dose_rate_gy_s: rs,
                dose_rate_gy_min: rm,
            })
            .collect();

        Ok(Self { table, points })
    }

    /// The canonical table (renamed columns, extra columns passed through).
    #[must_use]
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Typed measurement rows, in original file order.
    #[must_use]
    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    /// Number of measurements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the dataset has zero rows (never true post-validation).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Distinct energies, sorted ascending.
    #[must_use]
    pub fn distinct_energies(&self) -> Vec<f64> {
        let mut energies: Vec<f64> = self.points.iter().map(|p| p.energy_mev).collect();
        energies.sort_by(f64::total_cmp);
        energies.dedup_by(|a, b| a.to_bits() == b.to_bits());
        energies
    }
}

/// Load and canonicalize an experimental dataset from a CSV file.
///
/// Prints a resolution report (row count, column mappings, energies) on
/// success.
///
/// # Errors
///
/// [`ValidationError::DataLoad`] if the file is missing or unparseable,
/// plus the errors of [`ExperimentalDataset::from_table`].
pub fn load_experimental_data(
    path: &Path,
    overrides: &ColumnOverrides,
) -> Result<ExperimentalDataset, ValidationError> {
    let table = Table::from_csv_path(path)?;
    let resolved = schema::resolve_columns(&table, overrides)?;
    let dataset = ExperimentalDataset::from_table(table, overrides)?;

    println!("✓ Loaded {} experimental measurements", dataset.len());
    println!("  Energy column: {} → {COL_ENERGY}", resolved.energy);
    println!("  k_s column: {} → {COL_KS}", resolved.ks);
    println!("  Dose rate column: {} → {COL_DOSE_RATE_S}", resolved.dose_rate);
    println!("  Energies: {:?} MeV", dataset.distinct_energies());

    Ok(dataset)
}
