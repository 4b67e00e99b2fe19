// ─────────────────────────────────────────────────────────────────────
// SCPN Co-Simulation — State
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// One sample node of a region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub id: u64,
    pub position: [f64; 3],
}

/// Named spatial domain with a fixed, ordered node set.
///
/// Node ids are dense and contiguous from 0 in load order, so `ids[i] == i`
/// and `coords.row(i)` is the position of node `i`.
#[derive(Debug, Clone)]
pub struct Region {
    name: String,
    ids: Array1<u64>,
    coords: Array2<f64>, // [n, 3]
}

impl Region {
    pub fn from_points(name: impl Into<String>, points: &[[f64; 3]]) -> Self {
        let n = points.len();
        let ids = Array1::from_iter(0..n as u64);
        let coords = Array2::from_shape_fn((n, 3), |(i, k)| points[i][k]);
        Region {
            name: name.into(),
            ids,
            coords,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn node_count(&self) -> usize {
        self.ids.len()
    }

    pub fn ids(&self) -> ArrayView1<'_, u64> {
        self.ids.view()
    }

    pub fn coords(&self) -> &Array2<f64> {
        &self.coords
    }

    pub fn position(&self, index: usize) -> Option<[f64; 3]> {
        if index >= self.node_count() {
            return None;
        }
        let row = self.coords.row(index);
        Some([row[0], row[1], row[2]])
    }

    pub fn nodes(&self) -> impl Iterator<Item = Node> + '_ {
        self.ids.iter().zip(self.coords.rows()).map(|(&id, row)| Node {
            id,
            position: [row[0], row[1], row[2]],
        })
    }

    /// Copy of ids and coordinates in node order, as exposed to the orchestrator.
    pub fn point_cloud(&self) -> PointCloud {
        PointCloud {
            region: self.name.clone(),
            ids: self.ids.to_vec(),
            coords: self.nodes().map(|n| n.position).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointCloud {
    pub region: String,
    pub ids: Vec<u64>,
    pub coords: Vec<[f64; 3]>,
}

/// Coupling time step handed out by the orchestrator (seconds).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeStep {
    pub start_time: f64,
    pub step_size: f64,
}

impl TimeStep {
    /// Time at which the solve for this step is evaluated.
    pub fn end_time(&self) -> f64 {
        self.start_time + self.step_size
    }
}

/// Opaque checkpoint token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RestartPoint(pub String);

impl RestartPoint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RestartPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-node dielectric properties derived from temperature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaterialSample {
    pub permittivity: f64,
    pub loss_tangent: f64,
}

impl MaterialSample {
    pub fn new(permittivity: f64, loss_tangent: f64) -> Self {
        MaterialSample {
            permittivity,
            loss_tangent,
        }
    }
}

/// Completeness flag attached to an output transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    Complete,
    Incomplete,
}

/// Accessor callbacks a participant registers with the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessorKind {
    PointCloud,
    OutputScalar,
    InputScalar,
    RestartPoint,
}

impl AccessorKind {
    pub const ALL: [AccessorKind; 4] = [
        AccessorKind::PointCloud,
        AccessorKind::OutputScalar,
        AccessorKind::InputScalar,
        AccessorKind::RestartPoint,
    ];
}

/// Identity sent with the orchestrator handshake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantInfo {
    pub name: String,
    pub build_info: String,
    pub transcript_filename: String,
    pub accessors: Vec<AccessorKind>,
    pub regions: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_ids_follow_load_order() {
        let region = Region::from_points("A", &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]]);
        assert_eq!(region.node_count(), 3);
        assert_eq!(region.ids().to_vec(), vec![0, 1, 2]);
        assert_eq!(region.coords().shape(), &[3, 3]);
        assert_eq!(region.position(2), Some([2.0, 0.0, 0.0]));
        assert_eq!(region.position(3), None);
    }

    #[test]
    fn test_point_cloud_is_a_copy_in_node_order() {
        let region = Region::from_points("A", &[[0.5, 1.0, 1.5], [2.0, 2.5, 3.0]]);
        let cloud = region.point_cloud();
        assert_eq!(cloud.region, "A");
        assert_eq!(cloud.ids, vec![0, 1]);
        assert_eq!(cloud.coords[1], [2.0, 2.5, 3.0]);
    }

    #[test]
    fn test_empty_region() {
        let region = Region::from_points("empty", &[]);
        assert_eq!(region.node_count(), 0);
        assert_eq!(region.nodes().count(), 0);
    }

    #[test]
    fn test_time_step_end_time() {
        let ts = TimeStep {
            start_time: 1.5,
            step_size: 0.25,
        };
        assert!((ts.end_time() - 1.75).abs() < 1e-15);
    }

    #[test]
    fn test_restart_point_serializes_as_plain_string() {
        let json = serde_json::to_string(&RestartPoint("7".into())).unwrap();
        assert_eq!(json, "\"7\"");
    }
}
