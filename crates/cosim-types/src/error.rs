// ─────────────────────────────────────────────────────────────────────
// SCPN Co-Simulation — Error Types
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CouplingError {
    #[error("Missing resource: {0}")]
    MissingResource(String),

    #[error("Malformed input in {source_name} at line {line}: {message}")]
    MalformedInput {
        source_name: String,
        line: usize,
        message: String,
    },

    #[error("Dimension mismatch for {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    #[error("Field '{field}' already declared for region '{region}'")]
    DuplicateField { region: String, field: String },

    #[error("Solve failed during {stage}: {message}")]
    SolveFailed { stage: &'static str, message: String },

    #[error("Orchestrator handshake failed: {0}")]
    Handshake(String),

    #[error("Orchestrator protocol violation: {0}")]
    OrchestratorProtocol(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CouplingError {
    /// Wrap any failure raised while talking to the field solver.
    pub fn solve_failed(stage: &'static str, err: impl std::fmt::Display) -> Self {
        CouplingError::SolveFailed {
            stage,
            message: err.to_string(),
        }
    }

    /// The exchange protocol has no local recovery: every error ends the run.
    pub fn is_fatal(&self) -> bool {
        true
    }

    /// Whether the orchestrator link is usable for a fatal-error report.
    pub fn orchestrator_reachable(&self) -> bool {
        !matches!(self, CouplingError::Handshake(_))
    }
}

pub type CouplingResult<T> = Result<T, CouplingError>;
