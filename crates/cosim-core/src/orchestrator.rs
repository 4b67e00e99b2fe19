// ─────────────────────────────────────────────────────────────────────
// SCPN Co-Simulation — Orchestrator Interface
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Participant ↔ orchestrator boundary.
//!
//! [`ParticipantAccessors`] is the inbound surface: the only calls the
//! orchestrator may make into the participant. [`OrchestratorClient`] is the
//! outbound surface. Calls that block on the orchestrator receive the
//! accessors so a transport can serve inbound requests while it waits,
//! on the caller's thread.

use cosim_types::error::CouplingResult;
use cosim_types::state::{ParticipantInfo, PointCloud, RestartPoint, TimeStep, TransferStatus};

pub trait ParticipantAccessors {
    fn point_cloud(&self, region: &str) -> CouplingResult<PointCloud>;

    fn output_scalar(&self, region: &str, field: &str) -> CouplingResult<Vec<f64>>;

    fn set_input_scalar(&mut self, region: &str, field: &str, values: &[f64])
        -> CouplingResult<()>;

    fn restart_point(&mut self) -> CouplingResult<RestartPoint>;
}

pub trait OrchestratorClient {
    /// Handshake and accessor registration. Failure is a `Handshake` error.
    fn connect(&mut self, info: &ParticipantInfo) -> CouplingResult<()>;

    fn initialize_analysis(&mut self, accessors: &mut dyn ParticipantAccessors)
        -> CouplingResult<()>;

    fn has_more_time_steps(&mut self, accessors: &mut dyn ParticipantAccessors)
        -> CouplingResult<bool>;

    fn current_time_step(&mut self) -> CouplingResult<TimeStep>;

    fn has_more_iterations(&mut self, accessors: &mut dyn ParticipantAccessors)
        -> CouplingResult<bool>;

    /// Pull input fields; the orchestrator writes through `set_input_scalar`.
    fn update_inputs(&mut self, accessors: &mut dyn ParticipantAccessors) -> CouplingResult<()>;

    /// Push output fields; the orchestrator reads through `output_scalar`.
    fn update_outputs(
        &mut self,
        accessors: &mut dyn ParticipantAccessors,
        status: TransferStatus,
    ) -> CouplingResult<()>;

    fn report_fatal(&mut self, message: &str) -> CouplingResult<()>;

    fn disconnect(&mut self) -> CouplingResult<()>;
}
