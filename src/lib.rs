// SPDX-License-Identifier: AGPL-3.0-only

//! IonTracks experimental-data validation
//!
//! Compares recombination-factor measurements from ionization-chamber
//! experiments against IonTracks simulations under two protocols:
//!
//! ## Modules
//!   - `table` — minimal delimited-table support (CSV in, CSV out)
//!   - `schema` — column alias resolution and value-domain validation
//!   - `dataset` — canonical experimental dataset (resolved, validated)
//!   - `config` — simulation and comparison configuration
//!   - `simulation` — collaborator interface + analytic reference model
//!   - `comparison` — the two comparison protocols and their runner
//!   - `stats` — per-point error aggregation and output table shaping
//!   - `error` — typed errors for the whole pipeline
//!
//! ## Protocols
//!   - **Initial recombination** — one point-estimate call per distinct
//!     beam energy, compared against the lowest-`k_s` measurement of that
//!     energy group (the dose-rate-independent regime).
//!   - **Continuous beam** — one stochastic call per experimental row,
//!     seeded as `base_seed + row_index` so runs are reproducible and
//!     rows are decorrelated. Individual failures become NaN-sentinel
//!     records that preserve row alignment.
//!
//! Run: `cargo run --release --bin run_comparison config.json`

pub mod comparison;
pub mod config;
pub mod dataset;
pub mod error;
pub mod schema;
pub mod simulation;
pub mod stats;
pub mod table;
