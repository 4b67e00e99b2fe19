// ─────────────────────────────────────────────────────────────────────
// SCPN Co-Simulation — Constants
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
/// Field pulled from the orchestrator every iteration (K).
pub const TEMPERATURE_FIELD: &str = "Temperature";

/// Field pushed to the orchestrator after every solve (W/m^3).
pub const LOSS_DENSITY_FIELD: &str = "Loss Density";

/// Initial temperature of every node before the first input transfer (K).
pub const INITIAL_TEMPERATURE: f64 = 300.0;

/// Initial loss density before the seeding solve.
pub const INITIAL_LOSS_DENSITY: f64 = 0.0;

/// Below this temperature the dielectric keeps its base properties (K).
pub const MATERIAL_LOWER_TEMPERATURE: f64 = 300.0;

/// Above this temperature the dielectric sits at its floor properties (K).
pub const MATERIAL_UPPER_TEMPERATURE: f64 = 400.0;

/// Relative permittivity floor reached at the upper temperature.
pub const PERMITTIVITY_FLOOR: f64 = 1.0;

/// Dielectric loss tangent floor reached at the upper temperature.
pub const LOSS_TANGENT_FLOOR: f64 = 1e-9;

/// Restart token handed out when no snapshot directory is configured.
pub const CONSTANT_RESTART_TOKEN: &str = "1";

/// Build identification sent with the participant handshake.
pub const BUILD_INFO: &str = "Field Solver Participant";

/// Column (0-based) of the scalar value in a derived-field export row.
pub const EXPORT_VALUE_COLUMN: usize = 3;
