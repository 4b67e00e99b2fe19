// ─────────────────────────────────────────────────────────────────────
// SCPN Co-Simulation — Solver Requests
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Typed requests consumed by [`crate::solver::FieldSolver`].
//!
//! Each solver operation gets one plain struct and one builder, so the
//! solver's ad hoc command layout stays behind the bridge.

use std::path::{Path, PathBuf};

use cosim_types::config::{MaterialModelConfig, RegionConfig, SolverConfig};
use cosim_types::error::{CouplingError, CouplingResult};
use cosim_types::state::{MaterialSample, Region};
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

/// Project to open once per session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRequest {
    pub path: PathBuf,
    pub name: String,
    pub interactive: bool,
}

/// Coordinate-indexed scalar dataset, coordinates in meters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialDataset {
    pub name: String,
    pub points: Vec<DatasetPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DatasetPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub value: f64,
}

/// Source of a dielectric property in a material definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PropertySource {
    Constant(f64),
    /// Closest-point lookup into a project dataset.
    Dataset(String),
}

impl PropertySource {
    /// Expression string understood by the solver's material editor.
    pub fn expression(&self) -> String {
        match self {
            PropertySource::Constant(v) => format!("{v}"),
            PropertySource::Dataset(name) => format!("clp(${name},X,Y,Z)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialEdit {
    pub material: String,
    pub permittivity: PropertySource,
    pub loss_tangent: PropertySource,
    pub permeability: f64,
    pub conductivity: f64,
    pub thermal_conductivity: f64,
    pub mass_density: f64,
    pub specific_heat: f64,
    pub youngs_modulus: f64,
    pub poissons_ratio: f64,
    pub thermal_expansion_coefficient: f64,
}

impl MaterialEdit {
    pub fn references_dataset(&self) -> bool {
        matches!(self.permittivity, PropertySource::Dataset(_))
            || matches!(self.loss_tangent, PropertySource::Dataset(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub design: String,
    pub setup: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRequest {
    /// Named field expression evaluated at the points.
    pub quantity: String,
    pub output_path: PathBuf,
    pub points_path: PathBuf,
    pub solution: String,
    pub variables: Vec<(String, String)>,
    pub include_points: bool,
    pub reference_cs: String,
    pub points_in_si: bool,
    pub field_in_reference_cs: bool,
}

pub fn build_project_request(solver: &SolverConfig, interactive: bool) -> ProjectRequest {
    ProjectRequest {
        path: solver.project_file.clone(),
        name: solver.project_name.clone(),
        interactive,
    }
}

/// Pair each node coordinate with its value, in node order.
pub fn build_dataset(
    name: &str,
    region: &Region,
    values: ArrayView1<'_, f64>,
) -> CouplingResult<SpatialDataset> {
    if values.len() != region.node_count() {
        return Err(CouplingError::DimensionMismatch {
            context: format!("dataset '{name}' for region '{}'", region.name()),
            expected: region.node_count(),
            actual: values.len(),
        });
    }
    let points = region
        .nodes()
        .zip(values.iter())
        .map(|(node, &value)| DatasetPoint {
            x: node.position[0],
            y: node.position[1],
            z: node.position[2],
            value,
        })
        .collect();
    Ok(SpatialDataset {
        name: name.to_string(),
        points,
    })
}

/// Material edit pointing both dielectric properties at the region's datasets.
pub fn build_material_edit(region: &RegionConfig, model: &MaterialModelConfig) -> MaterialEdit {
    material_edit(
        &region.material,
        PropertySource::Dataset(region.permittivity_dataset()),
        PropertySource::Dataset(region.loss_tangent_dataset()),
        model,
    )
}

/// Material edit with constant properties, releasing any dataset reference.
pub fn build_constant_material_edit(
    region: &RegionConfig,
    sample: MaterialSample,
    model: &MaterialModelConfig,
) -> MaterialEdit {
    material_edit(
        &region.material,
        PropertySource::Constant(sample.permittivity),
        PropertySource::Constant(sample.loss_tangent),
        model,
    )
}

fn material_edit(
    material: &str,
    permittivity: PropertySource,
    loss_tangent: PropertySource,
    model: &MaterialModelConfig,
) -> MaterialEdit {
    MaterialEdit {
        material: material.to_string(),
        permittivity,
        loss_tangent,
        permeability: model.permeability,
        conductivity: model.conductivity,
        thermal_conductivity: model.thermal_conductivity,
        mass_density: model.mass_density,
        specific_heat: model.specific_heat,
        youngs_modulus: model.youngs_modulus,
        poissons_ratio: model.poissons_ratio,
        thermal_expansion_coefficient: model.thermal_expansion_coefficient,
    }
}

pub fn build_analysis(solver: &SolverConfig) -> AnalysisRequest {
    AnalysisRequest {
        design: solver.design.clone(),
        setup: solver.setup.clone(),
    }
}

/// Export of the configured quantity at the region's own sample points.
pub fn build_export_request(
    solver: &SolverConfig,
    points_path: &Path,
    output_path: &Path,
) -> ExportRequest {
    ExportRequest {
        quantity: solver.quantity.clone(),
        output_path: output_path.to_path_buf(),
        points_path: points_path.to_path_buf(),
        solution: solver.solution.clone(),
        variables: vec![
            ("Freq".to_string(), solver.frequency.clone()),
            ("Phase".to_string(), solver.phase.clone()),
            ("offset".to_string(), solver.offset.clone()),
        ],
        include_points: true,
        reference_cs: "Global".to_string(),
        points_in_si: true,
        field_in_reference_cs: false,
    }
}
