// ─────────────────────────────────────────────────────────────────────
// SCPN Co-Simulation — Core
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Field solver participant for a partitioned co-simulation.
//!
//! Data: region, field_store, material, export, restart
//! Solver side: requests, solver, adapter, process_solver
//! Orchestrator side: orchestrator, wire, json_orchestrator, driver

pub mod adapter;
pub mod driver;
pub mod export;
pub mod field_store;
pub mod json_orchestrator;
pub mod material;
pub mod orchestrator;
pub mod process_solver;
pub mod region;
pub mod requests;
pub mod restart;
pub mod solver;
pub mod wire;
