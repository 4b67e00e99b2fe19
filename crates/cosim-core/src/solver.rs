// ─────────────────────────────────────────────────────────────────────
// SCPN Co-Simulation — Field Solver Interface
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Boundary to the external field-solving application.

use std::ops::{Deref, DerefMut};

use cosim_types::error::{CouplingError, CouplingResult};
use tracing::{info, warn};

use crate::requests::{
    AnalysisRequest, ExportRequest, MaterialEdit, ProjectRequest, SpatialDataset,
};

/// Operations the participant needs from the field solver.
///
/// Every call blocks until the solver has finished; `analyze` has no upper
/// bound on its duration.
pub trait FieldSolver {
    fn open_project(&mut self, request: &ProjectRequest) -> CouplingResult<()>;

    fn add_dataset(&mut self, dataset: &SpatialDataset) -> CouplingResult<()>;

    fn delete_dataset(&mut self, name: &str) -> CouplingResult<()>;

    fn edit_material(&mut self, edit: &MaterialEdit) -> CouplingResult<()>;

    fn analyze(&mut self, request: &AnalysisRequest) -> CouplingResult<()>;

    /// Write the requested quantity to `request.output_path`.
    fn export_field(&mut self, request: &ExportRequest) -> CouplingResult<()>;

    fn save_project(&mut self) -> CouplingResult<()>;

    /// Release the solver application.
    fn shutdown(&mut self) -> CouplingResult<()>;
}

/// Owned solver handle that shuts the solver down exactly once.
///
/// Release happens on [`SolverSession::release`] or, failing that, on drop,
/// so every exit path of the driver tears the solver down.
pub struct SolverSession<S: FieldSolver> {
    solver: S,
    released: bool,
}

impl<S: FieldSolver> SolverSession<S> {
    pub fn new(solver: S) -> Self {
        SolverSession {
            solver,
            released: false,
        }
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Shut the solver down. Later calls are no-ops.
    pub fn release(&mut self) -> CouplingResult<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        info!("shutting down field solver");
        self.solver.shutdown()
    }
}

impl<S: FieldSolver> Deref for SolverSession<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.solver
    }
}

impl<S: FieldSolver> DerefMut for SolverSession<S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.solver
    }
}

impl<S: FieldSolver> Drop for SolverSession<S> {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!(error = %e, "field solver shutdown failed");
        }
    }
}

/// Solver launched on its first call rather than at construction.
///
/// The participant hands one of these to the driver so the solver
/// application starts after the orchestrator handshake, and a failed
/// launch surfaces as an error of that first call. A solver that was
/// never launched shuts down without doing anything.
pub struct DeferredSolver<S, F> {
    launch: Option<F>,
    solver: Option<S>,
}

impl<S, F> DeferredSolver<S, F>
where
    S: FieldSolver,
    F: FnOnce() -> CouplingResult<S>,
{
    pub fn new(launch: F) -> Self {
        DeferredSolver {
            launch: Some(launch),
            solver: None,
        }
    }

    pub fn is_launched(&self) -> bool {
        self.solver.is_some()
    }

    fn solver(&mut self) -> CouplingResult<&mut S> {
        if self.solver.is_none() {
            let launch = self.launch.take().ok_or_else(|| {
                CouplingError::MissingResource("field solver launch already failed".to_string())
            })?;
            info!("launching field solver");
            self.solver = Some(launch()?);
        }
        self.solver.as_mut().ok_or_else(|| {
            CouplingError::MissingResource("field solver is not running".to_string())
        })
    }
}

impl<S, F> FieldSolver for DeferredSolver<S, F>
where
    S: FieldSolver,
    F: FnOnce() -> CouplingResult<S>,
{
    fn open_project(&mut self, request: &ProjectRequest) -> CouplingResult<()> {
        self.solver()?.open_project(request)
    }

    fn add_dataset(&mut self, dataset: &SpatialDataset) -> CouplingResult<()> {
        self.solver()?.add_dataset(dataset)
    }

    fn delete_dataset(&mut self, name: &str) -> CouplingResult<()> {
        self.solver()?.delete_dataset(name)
    }

    fn edit_material(&mut self, edit: &MaterialEdit) -> CouplingResult<()> {
        self.solver()?.edit_material(edit)
    }

    fn analyze(&mut self, request: &AnalysisRequest) -> CouplingResult<()> {
        self.solver()?.analyze(request)
    }

    fn export_field(&mut self, request: &ExportRequest) -> CouplingResult<()> {
        self.solver()?.export_field(request)
    }

    fn save_project(&mut self) -> CouplingResult<()> {
        self.solver()?.save_project()
    }

    fn shutdown(&mut self) -> CouplingResult<()> {
        self.launch = None;
        match self.solver.take() {
            Some(mut solver) => solver.shutdown(),
            None => Ok(()),
        }
    }
}
