// SPDX-License-Identifier: AGPL-3.0-only

//! Integration tests: the full comparison pipeline with stub simulators.
//!
//! Exercises both protocols end-to-end across module boundaries: dataset
//! construction, the runner, partial-failure handling, seeding, and the
//! shaped output tables.

use iontracks_validation::comparison::ComparisonRunner;
use iontracks_validation::config::ComparisonConfig;
use iontracks_validation::dataset::ExperimentalDataset;
use iontracks_validation::schema::ColumnOverrides;
use iontracks_validation::simulation::{
    ContinuousRequest, ContinuousResult, InitialRequest, InitialResult, SimulationFailure,
    Simulator,
};
use iontracks_validation::stats::{continuous_clean_table, continuous_full_table};
use iontracks_validation::table::Table;
use std::sync::{Arc, Mutex};

/// Two energies, three dose-rate rows each.
const TWO_ENERGY_CSV: &str = "\
Energy_MeV,k_s,dose_rate_Gy_s
10.0,0.95,0.5
10.0,0.90,1.0
10.0,0.80,2.0
20.0,0.97,0.5
20.0,0.93,1.0
20.0,0.85,2.0
";

fn two_energy_dataset() -> ExperimentalDataset {
    let table = Table::from_csv_str(TWO_ENERGY_CSV).expect("test CSV parses");
    ExperimentalDataset::from_table(table, &ColumnOverrides::default()).expect("valid dataset")
}

fn config_json(seed: u64) -> ComparisonConfig {
    serde_json::from_str(&format!(
        r#"{{"experimental_data_path": "unused.csv", "simulation": {{"seed": {seed}}}}}"#
    ))
    .expect("test config parses")
}

/// Stub: fixed initial ks per energy, continuous ks = experimental + 0.01,
/// with injected failures at chosen row indices.
struct ScriptedSimulator {
    initial_ks_10_mev: f64,
    fail_row_indices: Vec<usize>,
    continuous_calls: Arc<Mutex<Vec<(f64, f64, u64)>>>,
}

impl ScriptedSimulator {
    fn new(initial_ks_10_mev: f64, fail_row_indices: Vec<usize>) -> Self {
        Self {
            initial_ks_10_mev,
            fail_row_indices,
            continuous_calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Handle on the call log that survives moving the stub into a runner.
    fn call_log(&self) -> Arc<Mutex<Vec<(f64, f64, u64)>>> {
        Arc::clone(&self.continuous_calls)
    }
}

impl Simulator for ScriptedSimulator {
    fn ks_initial(&self, req: &InitialRequest) -> Result<InitialResult, SimulationFailure> {
        let ks = if (req.e_mev_u - 10.0).abs() < 1e-9 {
            self.initial_ks_10_mev
        } else {
            0.86
        };
        Ok(InitialResult {
            e_mev_u: req.e_mev_u,
            ks,
        })
    }

    fn continuous_beam(
        &self,
        req: &ContinuousRequest,
    ) -> Result<ContinuousResult, SimulationFailure> {
        self.continuous_calls
            .lock()
            .expect("lock")
            .push((req.e_mev_u, req.doserate_gy_min, req.seed));
        let row_index = (req.seed - 1000) as usize;
        if self.fail_row_indices.contains(&row_index) {
            return Err(SimulationFailure(format!("injected failure at row {row_index}")));
        }
        Ok(ContinuousResult {
            e_mev_u: req.e_mev_u,
            ks_iontracks: 0.9,
        })
    }
}

#[test]
fn initial_scenario_two_energies_three_rates() {
    // References must be the minimum k_s of each group: 0.80 and 0.85.
    let sim = ScriptedSimulator::new(0.81, vec![]);
    let mut runner = ComparisonRunner::new(config_json(1000), two_energy_dataset(), sim);
    let records = runner
        .run_initial_recombination()
        .expect("phase should succeed");

    assert_eq!(records.len(), 2);
    assert!((records[0].energy_mev - 10.0).abs() < 1e-12);
    assert!((records[0].k_s_experimental - 0.80).abs() < 1e-12);
    assert!((records[1].k_s_experimental - 0.85).abs() < 1e-12);

    // Stub ks = 0.81 for 10 MeV: difference 0.01, relative error ~1.25%.
    assert!((records[0].difference - 0.01).abs() < 1e-9);
    assert!((records[0].relative_error_pct - 1.25).abs() < 1e-6);
}

#[test]
fn error_identities_hold_for_every_record() {
    let sim = ScriptedSimulator::new(0.81, vec![]);
    let mut runner = ComparisonRunner::new(config_json(1000), two_energy_dataset(), sim);
    runner.run_initial_recombination().expect("initial phase");
    runner
        .run_continuous_beam_with(None)
        .expect("continuous phase");

    for r in runner.initial_records().expect("initial ran") {
        assert!((r.difference - (r.k_s_iontracks - r.k_s_experimental)).abs() < 1e-15);
        let expected_rel = 100.0 * r.difference / r.k_s_experimental;
        assert!((r.relative_error_pct - expected_rel).abs() < 1e-12);
        // simulated = experimental + difference round-trips
        assert!((r.k_s_experimental + r.difference - r.k_s_iontracks).abs() < 1e-15);
    }
    for r in runner
        .continuous()
        .expect("continuous ran")
        .records
        .iter()
        .filter(|r| r.is_success())
    {
        assert!((r.difference - (r.k_s_iontracks - r.k_s_experimental)).abs() < 1e-15);
        assert!((r.absolute_error - r.difference.abs()).abs() < 1e-15);
    }
}

#[test]
fn continuous_scenario_six_rows_one_injected_failure() {
    // Failure at row 3: full record set keeps 6 aligned rows with a NaN
    // sentinel at index 3; clean table has 5 rows; summary reports 5/6.
    let sim = ScriptedSimulator::new(0.81, vec![3]);
    let dataset = two_energy_dataset();
    let mut runner = ComparisonRunner::new(config_json(1000), dataset, sim);
    let comparison = runner
        .run_continuous_beam_with(None)
        .expect("phase succeeds with one failed row");

    assert_eq!(comparison.n_total(), 6);
    assert_eq!(comparison.n_success(), 5);
    assert!(comparison.records[3].k_s_iontracks.is_nan());
    assert!(comparison.records[3].difference.is_nan());
    // Sentinel row still carries its experimental fields.
    assert!((comparison.records[3].energy_mev - 20.0).abs() < 1e-12);
    for (i, r) in comparison.records.iter().enumerate() {
        assert_eq!(r.row_index, i, "row alignment must survive failures");
    }

    let summary = comparison.summary();
    assert_eq!(summary.n_success, 5);
    assert_eq!(summary.n_total, 6);
    assert!((summary.success_ratio - 5.0 / 6.0).abs() < 1e-12);

    let full = continuous_full_table(runner.dataset(), runner.continuous().expect("ran"));
    assert_eq!(full.n_rows(), 5, "sentinel rows dropped from the table");
    let clean = continuous_clean_table(&full);
    assert_eq!(clean.n_rows(), 5);
    assert_eq!(
        clean.columns(),
        &[
            "Energy_MeV",
            "dose_rate_Gy_s",
            "k_s",
            "k_s_IonTracks",
            "difference",
            "relative_error_%",
            "absolute_error"
        ]
    );
}

#[test]
fn per_row_seeds_are_base_plus_index_under_parallel_dispatch() {
    let sim = ScriptedSimulator::new(0.81, vec![]);
    let log = sim.call_log();
    let mut runner = ComparisonRunner::new(config_json(1000), two_energy_dataset(), sim);
    runner.run_continuous_beam_with(None).expect("phase");

    let calls = log.lock().expect("lock").clone();
    assert_eq!(calls.len(), 6);
    let mut seeds: Vec<u64> = calls.iter().map(|(_, _, s)| *s).collect();
    seeds.sort_unstable();
    assert_eq!(seeds, vec![1000, 1001, 1002, 1003, 1004, 1005]);

    // The seed determines the row, so each call must carry that row's
    // energy and dose rate regardless of execution order.
    for &(e_mev_u, doserate_gy_min, seed) in &calls {
        let row = (seed - 1000) as usize;
        let point = runner.dataset().points()[row];
        assert!((e_mev_u - point.energy_mev).abs() < 1e-12);
        assert!((doserate_gy_min - point.dose_rate_gy_min).abs() < 1e-12);
    }
}

#[test]
fn phase_order_is_independent() {
    let sim = ScriptedSimulator::new(0.81, vec![]);
    let mut runner = ComparisonRunner::new(config_json(1000), two_energy_dataset(), sim);
    // Continuous first, then initial: both phases succeed either way.
    runner.run_continuous_beam_with(None).expect("continuous");
    runner.run_initial_recombination().expect("initial");
    assert!(runner.initial_records().is_some());
    assert!(runner.continuous().is_some());
}

#[test]
fn end_to_end_save_produces_all_three_tables() {
    let out_dir = std::env::temp_dir().join("iontracks_integration_save");
    std::fs::remove_dir_all(&out_dir).ok();

    let mut config = config_json(1000);
    config.output_dir = out_dir.clone();
    let sim = ScriptedSimulator::new(0.81, vec![3]);
    let mut runner = ComparisonRunner::new(config, two_energy_dataset(), sim);
    runner.run_all().expect("both phases");
    runner.save_results().expect("save");

    let initial_csv =
        std::fs::read_to_string(out_dir.join("comparison_initial.csv")).expect("initial table");
    assert_eq!(initial_csv.lines().count(), 3, "header + two energies");

    let clean_csv = std::fs::read_to_string(out_dir.join("comparison_continuous_clean.csv"))
        .expect("clean table");
    assert_eq!(clean_csv.lines().count(), 6, "header + five successes");

    std::fs::remove_dir_all(&out_dir).ok();
}
