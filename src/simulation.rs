// SPDX-License-Identifier: AGPL-3.0-only

//! Simulation collaborator interface.
//!
//! The comparison protocols consume the simulation through the
//! [`Simulator`] trait with plain parameter and result structs, so a
//! production track-structure engine and a deterministic test stub are
//! interchangeable.
//!
//! [`AnalyticReference`] is a built-in first-order stand-in (Boag-style
//! volume recombination plus a track-density term) that lets the CLI run
//! without the external engine. Its stochastic path draws seeded jitter,
//! so a given seed always reproduces the same value.

use crate::config::{Backend, RddModel, SimulationConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;

/// Parameters for one point-estimate (initial recombination) call.
#[derive(Debug, Clone)]
pub struct InitialRequest {
    /// Beam energy (MeV/u).
    pub e_mev_u: f64,
    /// Chamber voltage (V).
    pub voltage_v: f64,
    /// Electrode gap (cm).
    pub electrode_gap_cm: f64,
    /// Beam particle identifier.
    pub particle: String,
    /// Radial dose distribution model.
    pub rdd_model: RddModel,
    /// Spatial grid resolution (µm).
    pub grid_size_um: f64,
    /// Track core radius (nm).
    pub a0_nm: f64,
    /// Apply the beta correction.
    pub use_beta: bool,
    /// Debug output flag (passed through).
    pub debug: bool,
    /// Plot flag (passed through).
    pub show_plot: bool,
}

impl InitialRequest {
    /// Build a request for one energy from the shared configuration.
    #[must_use]
    pub fn from_config(sim: &SimulationConfig, e_mev_u: f64) -> Self {
        Self {
            e_mev_u,
            voltage_v: sim.voltage_v,
            electrode_gap_cm: sim.electrode_gap_cm,
            particle: sim.particle.clone(),
            rdd_model: sim.rdd_model,
            grid_size_um: sim.grid_size_um,
            a0_nm: sim.a0_nm,
            use_beta: sim.use_beta,
            debug: sim.debug,
            show_plot: sim.show_plot,
        }
    }
}

/// Parameters for one stochastic (continuous beam) call.
#[derive(Debug, Clone)]
pub struct ContinuousRequest {
    /// Beam energy (MeV/u).
    pub e_mev_u: f64,
    /// Chamber voltage (V).
    pub voltage_v: f64,
    /// Dose rate (Gy/min).
    pub doserate_gy_min: f64,
    /// Electrode gap (cm).
    pub electrode_gap_cm: f64,
    /// Beam particle identifier.
    pub particle: String,
    /// Spatial grid resolution (µm).
    pub grid_size_um: f64,
    /// Execution backend.
    pub backend: Backend,
    /// Print-parameters flag (passed through).
    pub print_parameters: bool,
    /// Plot flag (passed through).
    pub show_plot: bool,
    /// Seed for this call's random stream.
    pub seed: u64,
}

impl ContinuousRequest {
    /// Build a request for one experimental row from the shared
    /// configuration, the row's dose rate, and its resolved seed.
    #[must_use]
    pub fn from_config(
        sim: &SimulationConfig,
        e_mev_u: f64,
        doserate_gy_min: f64,
        seed: u64,
    ) -> Self {
        Self {
            e_mev_u,
            voltage_v: sim.voltage_v,
            doserate_gy_min,
            electrode_gap_cm: sim.electrode_gap_cm,
            particle: sim.particle.clone(),
            grid_size_um: sim.grid_size_um,
            backend: sim.backend,
            print_parameters: sim.print_parameters,
            show_plot: sim.show_plot,
            seed,
        }
    }
}

/// Point-estimate result: recombination factor at one energy.
#[derive(Debug, Clone, Copy)]
pub struct InitialResult {
    /// Energy the result was computed for (MeV/u).
    pub e_mev_u: f64,
    /// Simulated recombination factor.
    pub ks: f64,
}

/// Stochastic result: recombination factor for one dose-rate point.
#[derive(Debug, Clone, Copy)]
pub struct ContinuousResult {
    /// Energy the result was computed for (MeV/u).
    pub e_mev_u: f64,
    /// Simulated recombination factor.
    pub ks_iontracks: f64,
}

/// Opaque cause of a single failed simulation call.
#[derive(Debug, Clone)]
pub struct SimulationFailure(pub String);

impl fmt::Display for SimulationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for SimulationFailure {}

/// The simulation collaborator: two operations, both fallible per call.
pub trait Simulator: Sync {
    /// Point-estimate initial-recombination factor for one energy.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationFailure`] on invalid physical parameters or an
    /// engine-side failure.
    fn ks_initial(&self, req: &InitialRequest) -> Result<InitialResult, SimulationFailure>;

    /// Stochastic continuous-beam recombination factor for one row.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationFailure`] on invalid physical parameters or an
    /// engine-side failure.
    fn continuous_beam(
        &self,
        req: &ContinuousRequest,
    ) -> Result<ContinuousResult, SimulationFailure>;
}

/// Coarse Boag-style volume recombination coefficient (cm⁻⁴ V² min Gy⁻¹).
const VOLUME_COEFF: f64 = 5.0e6;

/// Track-density term scale at the 10 MeV / 200 V / 0.2 cm reference point.
const TRACK_COEFF: f64 = 0.02;

/// Relative width of the stochastic jitter band.
const JITTER: f64 = 1.0e-3;

/// First-order analytic recombination model.
///
/// Not a track-structure simulation; a smooth, monotone stand-in with the
/// right qualitative behavior (collection efficiency drops with dose rate,
/// gap, and ionization density, rises with voltage and energy) so the
/// pipeline runs end-to-end without the external engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyticReference;

impl AnalyticReference {
    fn check_common(
        e_mev_u: f64,
        voltage_v: f64,
        gap_cm: f64,
        grid_um: f64,
    ) -> Result<(), SimulationFailure> {
        if e_mev_u <= 0.0 || !e_mev_u.is_finite() {
            return Err(SimulationFailure(format!("non-positive energy: {e_mev_u} MeV")));
        }
        if voltage_v <= 0.0 {
            return Err(SimulationFailure(format!("non-positive voltage: {voltage_v} V")));
        }
        if gap_cm <= 0.0 {
            return Err(SimulationFailure(format!(
                "non-positive electrode gap: {gap_cm} cm"
            )));
        }
        if grid_um <= 0.0 {
            return Err(SimulationFailure(format!(
                "non-positive grid size: {grid_um} um"
            )));
        }
        Ok(())
    }

    fn track_term(
        e_mev_u: f64,
        voltage_v: f64,
        gap_cm: f64,
        a0_nm: f64,
        rdd_model: RddModel,
        use_beta: bool,
    ) -> f64 {
        let model_factor = match rdd_model {
            RddModel::Gauss => 1.0,
            RddModel::Geiss => 1.1,
        };
        let beta_factor = if use_beta { 0.95 } else { 1.0 };
        TRACK_COEFF
            * (10.0 / e_mev_u).sqrt()
            * (gap_cm / 0.2)
            * (200.0 / voltage_v)
            * (a0_nm / 8.0)
            * model_factor
            * beta_factor
    }
}

impl Simulator for AnalyticReference {
    fn ks_initial(&self, req: &InitialRequest) -> Result<InitialResult, SimulationFailure> {
        Self::check_common(
            req.e_mev_u,
            req.voltage_v,
            req.electrode_gap_cm,
            req.grid_size_um,
        )?;
        if req.a0_nm <= 0.0 {
            return Err(SimulationFailure(format!(
                "non-positive track radius: {} nm",
                req.a0_nm
            )));
        }
        let xi = Self::track_term(
            req.e_mev_u,
            req.voltage_v,
            req.electrode_gap_cm,
            req.a0_nm,
            req.rdd_model,
            req.use_beta,
        );
        Ok(InitialResult {
            e_mev_u: req.e_mev_u,
            ks: 1.0 / (1.0 + xi),
        })
    }

    fn continuous_beam(
        &self,
        req: &ContinuousRequest,
    ) -> Result<ContinuousResult, SimulationFailure> {
        Self::check_common(
            req.e_mev_u,
            req.voltage_v,
            req.electrode_gap_cm,
            req.grid_size_um,
        )?;
        if req.doserate_gy_min < 0.0 {
            return Err(SimulationFailure(format!(
                "negative dose rate: {} Gy/min",
                req.doserate_gy_min
            )));
        }

        let xi_track = Self::track_term(
            req.e_mev_u,
            req.voltage_v,
            req.electrode_gap_cm,
            8.0,
            RddModel::Gauss,
            false,
        );
        let d4 = req.electrode_gap_cm.powi(4);
        let xi_volume =
            VOLUME_COEFF * (req.doserate_gy_min / 60.0) * d4 / (req.voltage_v * req.voltage_v);
        let ks = 1.0 / (1.0 + xi_track + xi_volume);

        let mut rng = StdRng::seed_from_u64(req.seed);
        let jitter = rng.gen_range(-JITTER..=JITTER);

        Ok(ContinuousResult {
            e_mev_u: req.e_mev_u,
            ks_iontracks: ks * (1.0 + jitter),
        })
    }
}
