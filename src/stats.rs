// SPDX-License-Identifier: AGPL-3.0-only

//! Per-point error aggregation and output table shaping.
//!
//! Pure functions over the comparison records: summary statistics of the
//! relative error (count, mean, median, extrema, sample std) and the
//! canonical output tables for both protocols. An empty or all-sentinel
//! record set yields zeroed statistics, never a panic.

use crate::comparison::{ContinuousComparison, ContinuousRecord, InitialRecord};
use crate::dataset::ExperimentalDataset;
use crate::table::Table;

/// Canonical column subset of the clean continuous table, in order.
pub const CLEAN_COLUMNS: &[&str] = &[
    "Energy_MeV",
    "dose_rate_Gy_s",
    "k_s",
    "k_s_IonTracks",
    "difference",
    "relative_error_%",
    "absolute_error",
];

/// Compute sample mean and standard deviation (n−1 denominator).
#[must_use]
pub fn compute_mean_std(vals: &[f64]) -> (f64, f64) {
    let n = vals.len() as f64;
    if n < 1.0 {
        return (0.0, 0.0);
    }
    let mean = vals.iter().sum::<f64>() / n;
    let var = vals.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0).max(1.0);
    (mean, var.sqrt())
}

/// Median of the values; 0.0 for an empty slice.
#[must_use]
pub fn median(vals: &[f64]) -> f64 {
    if vals.is_empty() {
        return 0.0;
    }
    let mut sorted = vals.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Summary of a continuous-beam batch over its successful records.
#[derive(Debug, Clone, Copy)]
pub struct SummaryStatistics {
    /// Rows in the batch (successes + sentinels).
    pub n_total: usize,
    /// Rows with a simulated value.
    pub n_success: usize,
    /// `n_success / n_total` (0.0 for an empty batch).
    pub success_ratio: f64,
    /// Mean of `relative_error_%`.
    pub mean_rel: f64,
    /// Median of `relative_error_%`.
    pub median_rel: f64,
    /// Minimum of `relative_error_%`.
    pub min_rel: f64,
    /// Maximum of `relative_error_%`.
    pub max_rel: f64,
    /// Sample standard deviation of `relative_error_%`.
    pub std_rel: f64,
    /// Mean of `absolute_error`.
    pub mean_abs: f64,
}

impl SummaryStatistics {
    /// Aggregate the successful records of a batch (sentinels excluded
    /// from the error statistics, counted in the totals).
    #[must_use]
    pub fn from_records(records: &[ContinuousRecord]) -> Self {
        let n_total = records.len();
        let valid: Vec<&ContinuousRecord> =
            records.iter().filter(|r| r.is_success()).collect();
        let n_success = valid.len();

        if n_success == 0 {
            return Self {
                n_total,
                n_success: 0,
                success_ratio: 0.0,
                mean_rel: 0.0,
                median_rel: 0.0,
                min_rel: 0.0,
                max_rel: 0.0,
                std_rel: 0.0,
                mean_abs: 0.0,
            };
        }

        let rels: Vec<f64> = valid.iter().map(|r| r.relative_error_pct).collect();
        let abss: Vec<f64> = valid.iter().map(|r| r.absolute_error).collect();
        let (mean_rel, std_rel) = compute_mean_std(&rels);
        let (mean_abs, _) = compute_mean_std(&abss);

        Self {
            n_total,
            n_success,
            success_ratio: n_success as f64 / n_total as f64,
            mean_rel,
            median_rel: median(&rels),
            min_rel: rels.iter().copied().fold(f64::INFINITY, f64::min),
            max_rel: rels.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            std_rel,
            mean_abs,
        }
    }

    /// Print the summary in the batch report format.
    pub fn print(&self) {
        println!(
            "Number of successful calculations: {}/{}",
            self.n_success, self.n_total
        );
        if self.n_success == 0 {
            return;
        }
        println!("Mean absolute error: {:.6}", self.mean_abs);
        println!("Mean relative error: {:.3}%", self.mean_rel);
        println!("Median relative error: {:.3}%", self.median_rel);
        println!("Max relative error: {:.3}%", self.max_rel);
        println!("Min relative error: {:.3}%", self.min_rel);
        println!("Standard deviation: {:.3}%", self.std_rel);
    }
}

/// Shape the initial-recombination output table.
#[must_use]
pub fn initial_table(records: &[InitialRecord]) -> Table {
    let mut table = Table::new(
        [
            "Energy_MeV",
            "k_s_experimental",
            "k_s_IonTracks",
            "difference",
            "relative_error_%",
        ]
        .iter()
        .map(ToString::to_string)
        .collect(),
    );
    for r in records {
        // Columns match the header; push_row cannot fail here.
        let _ = table.push_row(vec![
            format!("{}", r.energy_mev),
            format!("{}", r.k_s_experimental),
            format!("{}", r.k_s_iontracks),
            format!("{}", r.difference),
            format!("{}", r.relative_error_pct),
        ]);
    }
    table
}

/// Shape the full continuous-beam output table: every original canonical
/// column plus the comparison columns, sentinel rows dropped.
#[must_use]
pub fn continuous_full_table(
    dataset: &ExperimentalDataset,
    comparison: &ContinuousComparison,
) -> Table {
    let mut table = dataset.table().clone();
    let records = &comparison.records;

    let fmt = |v: f64| {
        if v.is_nan() {
            "NaN".to_string()
        } else {
            format!("{v}")
        }
    };
    // Records are row-aligned with the dataset, so these appends line up.
    let _ = table.push_column(
        "k_s_IonTracks",
        records.iter().map(|r| fmt(r.k_s_iontracks)).collect(),
    );
    let _ = table.push_column(
        "difference",
        records.iter().map(|r| fmt(r.difference)).collect(),
    );
    let _ = table.push_column(
        "relative_error_%",
        records.iter().map(|r| fmt(r.relative_error_pct)).collect(),
    );
    let _ = table.push_column(
        "absolute_error",
        records.iter().map(|r| fmt(r.absolute_error)).collect(),
    );

    table.filter_rows(|i| records[i].is_success())
}

/// Shape the clean continuous table: the canonical column subset,
/// intersected with whatever the full table actually carries.
#[must_use]
pub fn continuous_clean_table(full: &Table) -> Table {
    full.select(CLEAN_COLUMNS)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn record(row_index: usize, k_s: f64, ks_sim: f64) -> ContinuousRecord {
        let difference = ks_sim - k_s;
        ContinuousRecord {
            row_index,
            energy_mev: 10.0,
            dose_rate_gy_s: 0.5,
            dose_rate_gy_min: 30.0,
            k_s_experimental: k_s,
            k_s_iontracks: ks_sim,
            difference,
            relative_error_pct: 100.0 * difference / k_s,
            absolute_error: difference.abs(),
        }
    }

    #[test]
    fn mean_std_of_known_values() {
        let (mean, std) = compute_mean_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((mean - 5.0).abs() < 1e-12);
        // sample std (n-1): sqrt(32/7)
        assert!((std - (32.0_f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn mean_std_empty_and_single() {
        assert_eq!(compute_mean_std(&[]), (0.0, 0.0));
        let (mean, std) = compute_mean_std(&[3.5]);
        assert!((mean - 3.5).abs() < 1e-12);
        assert!(std.abs() < 1e-12);
    }

    #[test]
    fn median_odd_and_even() {
        assert!((median(&[3.0, 1.0, 2.0]) - 2.0).abs() < 1e-12);
        assert!((median(&[4.0, 1.0, 2.0, 3.0]) - 2.5).abs() < 1e-12);
        assert!(median(&[]).abs() < 1e-12);
    }

    #[test]
    fn summary_counts_sentinels_in_total_only() {
        let records = vec![
            record(0, 0.9, 0.91),
            record(1, 0.9, f64::NAN),
            record(2, 0.9, 0.89),
        ];
        let s = SummaryStatistics::from_records(&records);
        assert_eq!(s.n_total, 3);
        assert_eq!(s.n_success, 2);
        assert!((s.success_ratio - 2.0 / 3.0).abs() < 1e-12);
        assert!(s.mean_rel.is_finite());
    }

    #[test]
    fn summary_empty_batch_is_zeroed_not_panicking() {
        let s = SummaryStatistics::from_records(&[]);
        assert_eq!(s.n_total, 0);
        assert_eq!(s.n_success, 0);
        assert!(s.success_ratio.abs() < 1e-12);
        assert!(s.mean_rel.abs() < 1e-12);

        let all_failed = vec![record(0, 0.9, f64::NAN)];
        let s = SummaryStatistics::from_records(&all_failed);
        assert_eq!(s.n_total, 1);
        assert_eq!(s.n_success, 0);
    }

    #[test]
    fn summary_extrema_and_median() {
        let records = vec![
            record(0, 1.0, 1.01), // +1%
            record(1, 1.0, 1.02), // +2%
            record(2, 1.0, 0.97), // -3%
        ];
        let s = SummaryStatistics::from_records(&records);
        assert!((s.min_rel - -3.0).abs() < 1e-9);
        assert!((s.max_rel - 2.0).abs() < 1e-9);
        assert!((s.median_rel - 1.0).abs() < 1e-9);
    }

    #[test]
    fn initial_table_has_canonical_columns() {
        let records = vec![InitialRecord {
            energy_mev: 10.0,
            k_s_experimental: 0.80,
            k_s_iontracks: 0.81,
            difference: 0.01,
            relative_error_pct: 1.25,
        }];
        let t = initial_table(&records);
        assert_eq!(
            t.columns(),
            &[
                "Energy_MeV",
                "k_s_experimental",
                "k_s_IonTracks",
                "difference",
                "relative_error_%"
            ]
        );
        assert_eq!(t.n_rows(), 1);
        assert_eq!(t.cell(0, "relative_error_%"), Some("1.25"));
    }

    #[test]
    fn clean_table_intersects_with_available_columns() {
        let full = Table::from_csv_str(
            "Energy_MeV,k_s,k_s_IonTracks,difference,relative_error_%,absolute_error,extra\n\
             10,0.9,0.91,0.01,1.1,0.01,x\n",
        )
        .unwrap();
        let clean = continuous_clean_table(&full);
        // dose_rate_Gy_s absent from the full table: dropped, not an error
        assert_eq!(
            clean.columns(),
            &[
                "Energy_MeV",
                "k_s",
                "k_s_IonTracks",
                "difference",
                "relative_error_%",
                "absolute_error"
            ]
        );
        assert!(!clean.has_column("extra"));
    }
}
