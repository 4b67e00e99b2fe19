// ─────────────────────────────────────────────────────────────────────
// SCPN Co-Simulation — Field Solver Adapter
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! One solve cycle against the external field solver.
//!
//! Temperatures in the field store become spatial permittivity and loss
//! tangent datasets, the solver runs, and the exported loss density is
//! written back in node order. The spatial material definition is then
//! replaced by constants so the temporary datasets can be deleted.

use std::time::{Duration, Instant};

use cosim_types::config::{
    ExportConfig, MaterialModelConfig, ParticipantConfig, RegionConfig, SolverConfig,
};
use cosim_types::error::{CouplingError, CouplingResult};
use cosim_types::state::MaterialSample;
use tracing::{debug, warn};

use crate::export::{align_to_region, read_export_file};
use crate::field_store::FieldStore;
use crate::material::MaterialModel;
use crate::region::RegionRegistry;
use crate::requests::{
    build_analysis, build_constant_material_edit, build_dataset, build_export_request,
    build_material_edit,
};
use crate::solver::FieldSolver;

/// Outcome of a successful solve cycle.
#[derive(Debug, Clone)]
pub struct SolveReport {
    pub time: f64,
    pub elapsed: Duration,
    pub regions: Vec<RegionSolveSummary>,
}

#[derive(Debug, Clone)]
pub struct RegionSolveSummary {
    pub region: String,
    pub nodes: usize,
    pub min_permittivity: f64,
    pub max_loss_density: f64,
}

#[derive(Debug, Clone)]
pub struct FieldSolverAdapter {
    regions: Vec<RegionConfig>,
    model: MaterialModel,
    material: MaterialModelConfig,
    solver: SolverConfig,
    export: ExportConfig,
    input_field: String,
    output_field: String,
}

fn at_stage(stage: &'static str) -> impl Fn(CouplingError) -> CouplingError {
    move |err| match err {
        CouplingError::SolveFailed { .. } => err,
        other => CouplingError::solve_failed(stage, other),
    }
}

impl FieldSolverAdapter {
    pub fn new(config: &ParticipantConfig) -> Self {
        FieldSolverAdapter {
            regions: config.regions.clone(),
            model: MaterialModel::from(&config.material_model),
            material: config.material_model.clone(),
            solver: config.solver.clone(),
            export: config.export.clone(),
            input_field: config.fields.input.clone(),
            output_field: config.fields.output.clone(),
        }
    }

    pub fn model(&self) -> &MaterialModel {
        &self.model
    }

    /// Run one full cycle at `current_time`. Any failure is a `SolveFailed`.
    pub fn solve<S: FieldSolver + ?Sized>(
        &self,
        solver: &mut S,
        registry: &RegionRegistry,
        store: &mut FieldStore,
        current_time: f64,
    ) -> CouplingResult<SolveReport> {
        let started = Instant::now();
        let mut installed = Vec::new();

        let cycle = self.run_cycle(solver, registry, store, &mut installed);
        let regions = match cycle {
            Ok(regions) => regions,
            Err(err) => {
                if !installed.is_empty() {
                    if let Err(revert) = self.release_materials(solver, &installed) {
                        warn!(error = %revert, "could not revert spatial materials after failure");
                    }
                }
                return Err(err);
            }
        };
        self.release_materials(solver, &installed)?;

        Ok(SolveReport {
            time: current_time,
            elapsed: started.elapsed(),
            regions,
        })
    }

    fn run_cycle<S: FieldSolver + ?Sized>(
        &self,
        solver: &mut S,
        registry: &RegionRegistry,
        store: &mut FieldStore,
        installed: &mut Vec<String>,
    ) -> CouplingResult<Vec<RegionSolveSummary>> {
        let mut summaries = Vec::with_capacity(self.regions.len());

        for cfg in &self.regions {
            let region = registry.get(&cfg.name).map_err(at_stage("read temperature"))?;
            let temperatures = store
                .get(&cfg.name, &self.input_field)
                .map_err(at_stage("read temperature"))?;
            let (permittivity, loss_tangent) = self.model.sample_field(temperatures, base(cfg));

            let perm_ds = build_dataset(&cfg.permittivity_dataset(), region, permittivity.view())
                .map_err(at_stage("build dataset"))?;
            let tan_ds = build_dataset(&cfg.loss_tangent_dataset(), region, loss_tangent.view())
                .map_err(at_stage("build dataset"))?;

            for dataset in [&perm_ds, &tan_ds] {
                solver
                    .add_dataset(dataset)
                    .map_err(at_stage("install dataset"))?;
                installed.push(dataset.name.clone());
            }
            solver
                .edit_material(&build_material_edit(cfg, &self.material))
                .map_err(at_stage("install material"))?;

            debug!(
                region = %cfg.name,
                material = %cfg.material,
                nodes = region.node_count(),
                "spatial material installed"
            );
            summaries.push(RegionSolveSummary {
                region: cfg.name.clone(),
                nodes: region.node_count(),
                min_permittivity: permittivity.iter().copied().fold(f64::INFINITY, f64::min),
                max_loss_density: 0.0,
            });
        }

        solver
            .analyze(&build_analysis(&self.solver))
            .map_err(at_stage("analyze"))?;

        for (cfg, summary) in self.regions.iter().zip(summaries.iter_mut()) {
            let values = self.export_region(solver, registry, cfg)?;
            summary.max_loss_density = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            store
                .set(&cfg.name, &self.output_field, &values)
                .map_err(at_stage("store output"))?;
        }
        Ok(summaries)
    }

    fn export_region<S: FieldSolver + ?Sized>(
        &self,
        solver: &mut S,
        registry: &RegionRegistry,
        cfg: &RegionConfig,
    ) -> CouplingResult<Vec<f64>> {
        let region = registry.get(&cfg.name).map_err(at_stage("export"))?;
        let output_path = cfg.export_path();
        if output_path.exists() {
            std::fs::remove_file(&output_path).map_err(|e| {
                CouplingError::solve_failed("export", format!("{}: {e}", output_path.display()))
            })?;
        }

        let request = build_export_request(&self.solver, &cfg.points_path(), &output_path);
        solver.export_field(&request).map_err(at_stage("export"))?;

        let rows = read_export_file(&output_path).map_err(at_stage("read export"))?;
        let values = align_to_region(
            &rows,
            region,
            self.export.verify_coordinates,
            self.export.coordinate_tolerance,
        )
        .map_err(at_stage("read export"))?;
        debug!(region = %cfg.name, rows = rows.len(), "export read");
        Ok(values)
    }

    /// Swap spatial materials for constants, persist, then drop the datasets.
    fn release_materials<S: FieldSolver + ?Sized>(
        &self,
        solver: &mut S,
        installed: &[String],
    ) -> CouplingResult<()> {
        for cfg in &self.regions {
            solver
                .edit_material(&build_constant_material_edit(cfg, base(cfg), &self.material))
                .map_err(at_stage("revert material"))?;
        }
        solver.save_project().map_err(at_stage("save project"))?;
        for name in installed {
            solver
                .delete_dataset(name)
                .map_err(at_stage("delete dataset"))?;
        }
        Ok(())
    }
}

fn base(cfg: &RegionConfig) -> MaterialSample {
    MaterialSample::new(cfg.permittivity_init, cfg.loss_tangent_init)
}
