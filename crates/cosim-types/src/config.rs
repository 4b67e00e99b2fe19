// ─────────────────────────────────────────────────────────────────────
// SCPN Co-Simulation — Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{
    INITIAL_LOSS_DENSITY, INITIAL_TEMPERATURE, LOSS_DENSITY_FIELD, LOSS_TANGENT_FLOOR,
    MATERIAL_LOWER_TEMPERATURE, MATERIAL_UPPER_TEMPERATURE, PERMITTIVITY_FLOOR,
    TEMPERATURE_FIELD,
};
use crate::error::{CouplingError, CouplingResult};

/// Startup configuration handed to the driver.
/// Host, port and name identify the orchestrator endpoint and this participant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
    /// Restart token to resume from; empty for a fresh run.
    #[serde(default)]
    pub restart: String,
    /// Keep the solver user interface visible.
    #[serde(default)]
    pub interactive: bool,
    /// Dump every field after each solve.
    #[serde(default)]
    pub verbose_print: bool,
}

impl ConnectionConfig {
    /// Transcript file the orchestrator redirects participant output to.
    pub fn transcript_filename(&self) -> String {
        format!("{}.stdout", self.name)
    }

    pub fn restart_token(&self) -> Option<&str> {
        let token = self.restart.trim();
        (!token.is_empty()).then_some(token)
    }
}

/// Model-level participant setup.
/// Every field defaults to the two-die dielectric model, so a config file is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantConfig {
    #[serde(default = "default_regions")]
    pub regions: Vec<RegionConfig>,
    #[serde(default)]
    pub material_model: MaterialModelConfig,
    #[serde(default)]
    pub fields: FieldConfig,
    #[serde(default)]
    pub solver: SolverConfig,
    #[serde(default)]
    pub export: ExportConfig,
    /// Directory for restart snapshots. When absent the restart token is constant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restart_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionConfig {
    pub name: String,
    /// Solver-side material assigned to this region.
    pub material: String,
    pub permittivity_init: f64,
    pub loss_tangent_init: f64,
    /// Point source; defaults to `<name>.pts`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points_file: Option<PathBuf>,
    /// Derived-field export target; defaults to `<name>.fld`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_file: Option<PathBuf>,
}

impl RegionConfig {
    pub fn new(name: &str, material: &str, permittivity_init: f64, loss_tangent_init: f64) -> Self {
        RegionConfig {
            name: name.to_string(),
            material: material.to_string(),
            permittivity_init,
            loss_tangent_init,
            points_file: None,
            export_file: None,
        }
    }

    pub fn points_path(&self) -> PathBuf {
        self.points_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{}.pts", self.name)))
    }

    pub fn export_path(&self) -> PathBuf {
        self.export_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{}.fld", self.name)))
    }

    pub fn permittivity_dataset(&self) -> String {
        format!("ds{}Perm", self.name)
    }

    pub fn loss_tangent_dataset(&self) -> String {
        format!("ds{}Tangent", self.name)
    }
}

fn default_regions() -> Vec<RegionConfig> {
    vec![
        RegionConfig::new("Die1", "die1", 2.4, 4e-8),
        RegionConfig::new("Die2", "die2", 3.2, 5e-8),
    ]
}

/// Temperature → dielectric property ramp plus static material properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialModelConfig {
    pub lower_temperature: f64,
    pub upper_temperature: f64,
    pub permittivity_floor: f64,
    pub loss_tangent_floor: f64,
    pub permeability: f64,
    pub conductivity: f64,
    pub thermal_conductivity: f64,
    pub mass_density: f64,
    pub specific_heat: f64,
    pub youngs_modulus: f64,
    pub poissons_ratio: f64,
    pub thermal_expansion_coefficient: f64,
}

impl Default for MaterialModelConfig {
    fn default() -> Self {
        MaterialModelConfig {
            lower_temperature: MATERIAL_LOWER_TEMPERATURE,
            upper_temperature: MATERIAL_UPPER_TEMPERATURE,
            permittivity_floor: PERMITTIVITY_FLOOR,
            loss_tangent_floor: LOSS_TANGENT_FLOOR,
            permeability: 0.999991,
            conductivity: 0.0,
            thermal_conductivity: 237.5,
            mass_density: 2689.0,
            specific_heat: 951.0,
            youngs_modulus: 69e9,
            poissons_ratio: 0.31,
            thermal_expansion_coefficient: 2.33e-5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    pub input: String,
    pub input_initial: f64,
    pub output: String,
    pub output_initial: f64,
}

impl Default for FieldConfig {
    fn default() -> Self {
        FieldConfig {
            input: TEMPERATURE_FIELD.to_string(),
            input_initial: INITIAL_TEMPERATURE,
            output: LOSS_DENSITY_FIELD.to_string(),
            output_initial: INITIAL_LOSS_DENSITY,
        }
    }
}

/// Field solver project, analysis and bridge process settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub project_file: PathBuf,
    pub project_name: String,
    pub design: String,
    pub setup: String,
    pub solution: String,
    /// Named field expression exported per region.
    pub quantity: String,
    pub frequency: String,
    pub phase: String,
    pub offset: String,
    /// Bridge process command line (program followed by arguments).
    pub command: Vec<String>,
    /// Environment variable that must point at the solver installation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_env: Option<String>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            project_file: PathBuf::from("Tee.aedt"),
            project_name: "Tee".to_string(),
            design: "TeeModel".to_string(),
            setup: "Setup1".to_string(),
            solution: "Setup1 : LastAdaptive".to_string(),
            quantity: "Volume_Loss_Density".to_string(),
            frequency: "10GHz".to_string(),
            phase: "0deg".to_string(),
            offset: "0in".to_string(),
            command: vec!["field-solver-bridge".to_string()],
            install_env: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Check that exported row coordinates match node coordinates.
    pub verify_coordinates: bool,
    /// Relative tolerance for the coordinate check (absolute below 1 m).
    pub coordinate_tolerance: f64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            verify_coordinates: true,
            coordinate_tolerance: 1e-9,
        }
    }
}

impl Default for ParticipantConfig {
    fn default() -> Self {
        ParticipantConfig {
            regions: default_regions(),
            material_model: MaterialModelConfig::default(),
            fields: FieldConfig::default(),
            solver: SolverConfig::default(),
            export: ExportConfig::default(),
            restart_dir: None,
        }
    }
}

impl ParticipantConfig {
    /// Load from JSON file and validate.
    pub fn from_file(path: impl AsRef<Path>) -> CouplingResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            CouplingError::MissingResource(format!("config {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CouplingResult<()> {
        if self.regions.is_empty() {
            return Err(CouplingError::ConfigError(
                "at least one region is required".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for region in &self.regions {
            if region.name.trim().is_empty() {
                return Err(CouplingError::ConfigError(
                    "region name must not be empty".to_string(),
                ));
            }
            if !seen.insert(region.name.as_str()) {
                return Err(CouplingError::ConfigError(format!(
                    "duplicate region '{}'",
                    region.name
                )));
            }
            if !region.permittivity_init.is_finite() || !region.loss_tangent_init.is_finite() {
                return Err(CouplingError::ConfigError(format!(
                    "region '{}' material constants must be finite",
                    region.name
                )));
            }
        }

        let model = &self.material_model;
        if !model.lower_temperature.is_finite()
            || !model.upper_temperature.is_finite()
            || model.lower_temperature >= model.upper_temperature
        {
            return Err(CouplingError::ConfigError(format!(
                "material ramp bounds invalid: lower={}, upper={}",
                model.lower_temperature, model.upper_temperature
            )));
        }
        if !model.permittivity_floor.is_finite() || !model.loss_tangent_floor.is_finite() {
            return Err(CouplingError::ConfigError(
                "material floors must be finite".to_string(),
            ));
        }
        if self.fields.input == self.fields.output {
            return Err(CouplingError::ConfigError(format!(
                "input and output field share the name '{}'",
                self.fields.input
            )));
        }
        if self.solver.command.is_empty() {
            return Err(CouplingError::ConfigError(
                "solver bridge command must not be empty".to_string(),
            ));
        }
        if !self.export.coordinate_tolerance.is_finite() || self.export.coordinate_tolerance < 0.0
        {
            return Err(CouplingError::ConfigError(
                "export coordinate tolerance must be finite and >= 0".to_string(),
            ));
        }
        Ok(())
    }
}
