// SPDX-License-Identifier: AGPL-3.0-only

//! The two comparison protocols and their runner.
//!
//! `ComparisonRunner` binds one configuration, one canonical dataset, and
//! one simulation collaborator, then drives either or both protocols:
//!
//!   - **initial recombination** — one point-estimate call per distinct
//!     energy (ascending); a failed energy is logged and skipped; the
//!     experimental reference is the minimum `k_s` of that energy group
//!     (the lowest-dose-rate regime the point estimate targets).
//!   - **continuous beam** — one stochastic call per experimental row,
//!     dispatched on a rayon worker pool and collected by original row
//!     index. Row `i` runs with seed `base_seed + i`; a failed row becomes
//!     a NaN-sentinel record at the same index, so the record vector is
//!     always exactly row-aligned with the input dataset.
//!
//! Either phase aborts with `PhaseExhaustion` only when every point in it
//! failed. Re-running a phase overwrites its previous result.

use crate::config::ComparisonConfig;
use crate::dataset::{self, ExperimentalDataset};
use crate::error::ValidationError;
use crate::simulation::{ContinuousRequest, InitialRequest, Simulator};
use crate::stats::{self, SummaryStatistics};
use rand::Rng;
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Largest base seed drawn when none is configured.
const MAX_DRAWN_SEED: u64 = 10_000_000;

/// One initial-recombination comparison point (per distinct energy).
#[derive(Debug, Clone, Copy)]
pub struct InitialRecord {
    /// Beam energy (MeV).
    pub energy_mev: f64,
    /// Reference: minimum `k_s` among the rows at this energy.
    pub k_s_experimental: f64,
    /// Simulated recombination factor.
    pub k_s_iontracks: f64,
    /// `k_s_iontracks - k_s_experimental`.
    pub difference: f64,
    /// `100 * difference / k_s_experimental`.
    pub relative_error_pct: f64,
}

/// One continuous-beam comparison point (per experimental row).
///
/// A failed simulation leaves `k_s_iontracks` (and the derived fields) NaN;
/// the record stays at its original row index.
#[derive(Debug, Clone, Copy)]
pub struct ContinuousRecord {
    /// Original row index in the dataset.
    pub row_index: usize,
    /// Beam energy (MeV).
    pub energy_mev: f64,
    /// Dose rate (Gy/s).
    pub dose_rate_gy_s: f64,
    /// Dose rate (Gy/min) passed to the collaborator.
    pub dose_rate_gy_min: f64,
    /// Measured recombination factor.
    pub k_s_experimental: f64,
    /// Simulated recombination factor, NaN sentinel on failure.
    pub k_s_iontracks: f64,
    /// `k_s_iontracks - k_s_experimental`.
    pub difference: f64,
    /// `100 * difference / k_s_experimental`.
    pub relative_error_pct: f64,
    /// `|difference|`.
    pub absolute_error: f64,
}

impl ContinuousRecord {
    /// Whether this row's simulation produced a value.
    #[must_use]
    pub fn is_success(&self) -> bool {
        !self.k_s_iontracks.is_nan()
    }
}

/// Full continuous-beam comparison: row-aligned records plus the base seed
/// the batch actually ran with (so unseeded runs stay reproducible).
#[derive(Debug, Clone)]
pub struct ContinuousComparison {
    /// The base seed used; row `i` ran with `base_seed + i`.
    pub base_seed: u64,
    /// Whether the seed came from the configuration (false: drawn fresh).
    pub seed_was_configured: bool,
    /// One record per dataset row, in original order, sentinels included.
    pub records: Vec<ContinuousRecord>,
}

impl ContinuousComparison {
    /// Total number of rows (equals the dataset length).
    #[must_use]
    pub fn n_total(&self) -> usize {
        self.records.len()
    }

    /// Number of rows with a simulated value.
    #[must_use]
    pub fn n_success(&self) -> usize {
        self.records.iter().filter(|r| r.is_success()).count()
    }

    /// Number of sentinel rows.
    #[must_use]
    pub fn n_failed(&self) -> usize {
        self.n_total() - self.n_success()
    }

    /// Summary statistics over the successful records.
    #[must_use]
    pub fn summary(&self) -> SummaryStatistics {
        SummaryStatistics::from_records(&self.records)
    }
}

/// Optional progress callback: `(rows_done, rows_total)`.
pub type ProgressObserver<'a> = &'a (dyn Fn(usize, usize) + Sync);

fn print_progress(done: usize, total: usize) {
    let pct = 100.0 * done as f64 / total as f64;
    println!("Progress: {done}/{total} ({pct:.1}%)");
}

/// Drives the comparison protocols over one dataset and configuration.
///
/// Both inputs are immutable for the runner's lifetime; each phase stores
/// its result and overwrites it if re-run.
pub struct ComparisonRunner<S: Simulator> {
    config: ComparisonConfig,
    dataset: ExperimentalDataset,
    simulator: S,
    initial: Option<Vec<InitialRecord>>,
    continuous: Option<ContinuousComparison>,
}

impl<S: Simulator> ComparisonRunner<S> {
    /// Bind a configuration, a loaded dataset, and a simulator.
    #[must_use]
    pub fn new(config: ComparisonConfig, dataset: ExperimentalDataset, simulator: S) -> Self {
        Self {
            config,
            dataset,
            simulator,
            initial: None,
            continuous: None,
        }
    }

    /// Load the dataset named by the configuration and bind everything.
    ///
    /// # Errors
    ///
    /// Propagates dataset loading, resolution, and validation errors.
    pub fn from_config(config: ComparisonConfig, simulator: S) -> Result<Self, ValidationError> {
        let dataset = dataset::load_experimental_data(
            &config.experimental_data_path,
            &config.column_overrides(),
        )?;
        Ok(Self::new(config, dataset, simulator))
    }

    /// The bound configuration.
    #[must_use]
    pub fn config(&self) -> &ComparisonConfig {
        &self.config
    }

    /// The bound dataset.
    #[must_use]
    pub fn dataset(&self) -> &ExperimentalDataset {
        &self.dataset
    }

    /// Initial-recombination records, if that phase has run.
    #[must_use]
    pub fn initial_records(&self) -> Option<&[InitialRecord]> {
        self.initial.as_deref()
    }

    /// Continuous-beam comparison, if that phase has run.
    #[must_use]
    pub fn continuous(&self) -> Option<&ContinuousComparison> {
        self.continuous.as_ref()
    }

    /// Run the initial-recombination protocol.
    ///
    /// One point-estimate call per distinct energy, ascending. A failed
    /// energy is logged and skipped.
    ///
    /// # Errors
    ///
    /// [`ValidationError::PhaseExhaustion`] when no energy produced a
    /// result.
    pub fn run_initial_recombination(&mut self) -> Result<&[InitialRecord], ValidationError> {
        println!("\n{}", "=".repeat(70));
        println!("INITIAL RECOMBINATION COMPARISON");
        println!("{}", "=".repeat(70));

        let sim_config = &self.config.simulation;
        let energies = self.dataset.distinct_energies();

        let mut records = Vec::with_capacity(energies.len());
        for &energy_mev in &energies {
            println!("Calculating for {energy_mev} MeV...");
            let req = InitialRequest::from_config(sim_config, energy_mev);
            let result = match self.simulator.ks_initial(&req) {
                Ok(r) => r,
                Err(e) => {
                    eprintln!("  Error for {energy_mev} MeV: {e}");
                    continue;
                }
            };

            // Lowest dose rate best approximates the dose-rate-independent
            // regime; in this data that is the minimum k_s of the group.
            let k_s_exp = self
                .dataset
                .points()
                .iter()
                .filter(|p| p.energy_mev.to_bits() == energy_mev.to_bits())
                .map(|p| p.k_s)
                .min_by(f64::total_cmp)
                .unwrap_or(f64::NAN);

            let difference = result.ks - k_s_exp;
            records.push(InitialRecord {
                energy_mev,
                k_s_experimental: k_s_exp,
                k_s_iontracks: result.ks,
                difference,
                relative_error_pct: 100.0 * difference / k_s_exp,
            });
        }

        if records.is_empty() {
            return Err(ValidationError::PhaseExhaustion(
                "Initial Recombination".into(),
            ));
        }

        println!("\nInitial Recombination Comparison:");
        print_initial_records(&records);

        Ok(self.initial.insert(records).as_slice())
    }

    /// Run the continuous-beam protocol with the default progress printer
    /// (about ten evenly spaced checkpoints).
    ///
    /// # Errors
    ///
    /// [`ValidationError::PhaseExhaustion`] when every row failed.
    pub fn run_continuous_beam(&mut self) -> Result<&ContinuousComparison, ValidationError> {
        self.run_continuous_beam_with(Some(&print_progress))
    }

    /// Run the continuous-beam protocol with an optional progress observer.
    ///
    /// Rows are dispatched on the rayon pool and collected by original row
    /// index, so output order never depends on completion order. Row `i`
    /// runs with seed `base_seed + i`; its failure becomes a NaN-sentinel
    /// record without cancelling sibling rows.
    ///
    /// # Errors
    ///
    /// [`ValidationError::PhaseExhaustion`] when every row failed.
    pub fn run_continuous_beam_with(
        &mut self,
        observer: Option<ProgressObserver<'_>>,
    ) -> Result<&ContinuousComparison, ValidationError> {
        println!("\n{}", "=".repeat(70));
        println!("CONTINUOUS BEAM COMPARISON (General Recombination)");
        println!("{}", "=".repeat(70));
        println!("WARNING: This may take several minutes...");

        let sim_config = &self.config.simulation;
        let (base_seed, seed_was_configured) = match sim_config.seed {
            Some(s) => (s, true),
            None => (rand::thread_rng().gen_range(1..=MAX_DRAWN_SEED), false),
        };
        if seed_was_configured {
            println!("Base seed: {base_seed}");
        } else {
            println!("Base seed: {base_seed} (drawn fresh; set `seed` to reproduce this run)");
        }

        let points = self.dataset.points();
        let total = points.len();
        let checkpoint = (total / 10).max(1);
        let done = AtomicUsize::new(0);
        let simulator = &self.simulator;

        let records: Vec<ContinuousRecord> = points
            .par_iter()
            .enumerate()
            .map(|(idx, point)| {
                let req = ContinuousRequest::from_config(
                    sim_config,
                    point.energy_mev,
                    point.dose_rate_gy_min,
                    base_seed + idx as u64,
                );
                let ks_sim = match simulator.continuous_beam(&req) {
                    Ok(r) => r.ks_iontracks,
                    Err(e) => {
                        eprintln!("  Error for row {idx}: {e}");
                        f64::NAN
                    }
                };

                let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                if let Some(obs) = observer {
                    if finished % checkpoint == 0 || finished == total {
                        obs(finished, total);
                    }
                }

                let difference = ks_sim - point.k_s;
                ContinuousRecord {
                    row_index: idx,
                    energy_mev: point.energy_mev,
                    dose_rate_gy_s: point.dose_rate_gy_s,
                    dose_rate_gy_min: point.dose_rate_gy_min,
                    k_s_experimental: point.k_s,
                    k_s_iontracks: ks_sim,
                    difference,
                    relative_error_pct: 100.0 * difference / point.k_s,
                    absolute_error: difference.abs(),
                }
            })
            .collect();

        let comparison = ContinuousComparison {
            base_seed,
            seed_was_configured,
            records,
        };
        if comparison.n_success() == 0 {
            return Err(ValidationError::PhaseExhaustion("Continuous Beam".into()));
        }

        println!("\nContinuous Beam Comparison Summary:");
        comparison.summary().print();

        Ok(&*self.continuous.insert(comparison))
    }

    /// Run the phases the configuration asks for, initial first.
    ///
    /// # Errors
    ///
    /// Propagates the first fatal phase error; results of phases that
    /// already completed remain available for saving.
    pub fn run_all(&mut self) -> Result<(), ValidationError> {
        if self.config.compare_initial_recombination {
            self.run_initial_recombination()?;
        }
        if self.config.compare_continuous_beam {
            self.run_continuous_beam()?;
        }
        Ok(())
    }

    /// Write the output tables for every phase that has run.
    ///
    /// Initial: `comparison_initial.csv`. Continuous:
    /// `comparison_continuous.csv` (original columns + comparison columns,
    /// sentinel rows dropped) and `comparison_continuous_clean.csv` (the
    /// canonical column subset).
    ///
    /// # Errors
    ///
    /// [`ValidationError::DataLoad`] on directory creation or write
    /// failure.
    pub fn save_results(&self) -> Result<(), ValidationError> {
        println!("\n{}", "=".repeat(70));
        println!("SAVING RESULTS");
        println!("{}", "=".repeat(70));

        let out_dir = &self.config.output_dir;
        std::fs::create_dir_all(out_dir).map_err(|e| {
            ValidationError::DataLoad(format!("create {}: {e}", out_dir.display()))
        })?;

        if let Some(records) = self.initial.as_deref() {
            if !records.is_empty() {
                let path = out_dir.join("comparison_initial.csv");
                stats::initial_table(records).write_csv(&path)?;
                println!("✓ Saved: {}", path.display());
            }
        }

        if let Some(comparison) = &self.continuous {
            if comparison.n_success() > 0 {
                let full = stats::continuous_full_table(&self.dataset, comparison);
                let path = out_dir.join("comparison_continuous.csv");
                full.write_csv(&path)?;
                println!("✓ Saved: {}", path.display());

                let clean = stats::continuous_clean_table(&full);
                let path_clean = out_dir.join("comparison_continuous_clean.csv");
                clean.write_csv(&path_clean)?;
                println!("✓ Saved: {}", path_clean.display());
            }
        }

        println!("\nAll results saved in: {}", out_dir.display());
        Ok(())
    }
}

fn print_initial_records(records: &[InitialRecord]) {
    println!(
        "{:>12} {:>18} {:>15} {:>12} {:>18}",
        "Energy_MeV", "k_s_experimental", "k_s_IonTracks", "difference", "relative_error_%"
    );
    for r in records {
        println!(
            "{:>12.3} {:>18.6} {:>15.6} {:>+12.6} {:>18.3}",
            r.energy_mev,
            r.k_s_experimental,
            r.k_s_iontracks,
            r.difference,
            r.relative_error_pct
        );
    }
}
