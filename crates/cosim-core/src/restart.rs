// ─────────────────────────────────────────────────────────────────────
// SCPN Co-Simulation — Restart Points
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Restart tokens and field-store snapshots.
//!
//! Without a snapshot directory every restart request yields the same
//! constant token. With one, each request persists the current fields as
//! `restart-<n>.json` and yields `n`.

use std::path::{Path, PathBuf};

use cosim_types::constants::CONSTANT_RESTART_TOKEN;
use cosim_types::error::{CouplingError, CouplingResult};
use cosim_types::state::RestartPoint;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::field_store::FieldStore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSnapshot {
    pub region: String,
    pub field: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestartSnapshot {
    pub token: String,
    pub fields: Vec<FieldSnapshot>,
}

#[derive(Debug, Clone, Default)]
pub struct RestartStore {
    dir: Option<PathBuf>,
    created: u64,
}

impl RestartStore {
    pub fn new(dir: Option<PathBuf>) -> Self {
        RestartStore { dir, created: 0 }
    }

    fn snapshot_path(dir: &Path, token: &str) -> PathBuf {
        dir.join(format!("restart-{token}.json"))
    }

    pub fn create(&mut self, store: &FieldStore) -> CouplingResult<RestartPoint> {
        let Some(dir) = &self.dir else {
            return Ok(RestartPoint(CONSTANT_RESTART_TOKEN.to_string()));
        };
        std::fs::create_dir_all(dir)?;
        let token = (self.created + 1).to_string();
        let snapshot = RestartSnapshot {
            token: token.clone(),
            fields: store
                .iter()
                .map(|(region, field, values)| FieldSnapshot {
                    region: region.to_string(),
                    field: field.to_string(),
                    values: values.to_vec(),
                })
                .collect(),
        };
        let path = Self::snapshot_path(dir, &token);
        std::fs::write(&path, serde_json::to_string(&snapshot)?)?;
        self.created += 1;
        info!(token = %token, path = %path.display(), "restart point written");
        Ok(RestartPoint(token))
    }

    /// Load snapshot `token` back into declared fields.
    ///
    /// Tokens issued without a snapshot directory carry no data and restore nothing.
    pub fn restore(&mut self, token: &str, store: &mut FieldStore) -> CouplingResult<usize> {
        let Some(dir) = &self.dir else {
            return Ok(0);
        };
        let path = Self::snapshot_path(dir, token);
        if !path.is_file() {
            return Err(CouplingError::MissingResource(format!(
                "restart snapshot not found: {}",
                path.display()
            )));
        }
        let snapshot: RestartSnapshot = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        for field in &snapshot.fields {
            store.set(&field.region, &field.field, &field.values)?;
        }
        if let Ok(n) = token.parse::<u64>() {
            self.created = self.created.max(n);
        }
        info!(token, fields = snapshot.fields.len(), "restart point restored");
        Ok(snapshot.fields.len())
    }
}
