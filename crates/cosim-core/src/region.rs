// ─────────────────────────────────────────────────────────────────────
// SCPN Co-Simulation — Region Registry
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Region registry: node identity and coordinates per region.
//!
//! Point sources are plain text, one whitespace-separated `x y z` triple
//! per line, no header. The 0-based line index becomes the node id.
//! Regions are append-only and never change after load.

use std::path::Path;

use cosim_types::error::{CouplingError, CouplingResult};
use cosim_types::state::{PointCloud, Region};
use tracing::debug;

/// Parse a point source into coordinates in line order.
pub fn parse_points(source_name: &str, text: &str) -> CouplingResult<Vec<[f64; 3]>> {
    // An empty source is a region without nodes.
    let body = text.trim_end();
    if body.is_empty() {
        return Ok(Vec::new());
    }

    let mut points = Vec::new();
    for (index, line) in body.lines().enumerate() {
        let malformed = |message: String| CouplingError::MalformedInput {
            source_name: source_name.to_string(),
            line: index + 1,
            message,
        };
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 3 {
            return Err(malformed(format!(
                "expected 3 coordinates, found {}",
                fields.len()
            )));
        }
        let mut xyz = [0.0; 3];
        for (slot, field) in xyz.iter_mut().zip(&fields) {
            let value = field
                .parse::<f64>()
                .map_err(|e| malformed(format!("'{field}': {e}")))?;
            if !value.is_finite() {
                return Err(malformed(format!("non-finite coordinate '{field}'")));
            }
            *slot = value;
        }
        points.push(xyz);
    }
    Ok(points)
}

/// All regions known to the participant, in load order.
#[derive(Debug, Clone, Default)]
pub struct RegionRegistry {
    regions: Vec<Region>,
}

impl RegionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a region from its point file.
    pub fn load(&mut self, name: &str, path: impl AsRef<Path>) -> CouplingResult<&Region> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(CouplingError::MissingResource(format!(
                "point source for region '{name}' not found: {}",
                path.display()
            )));
        }
        let text = std::fs::read_to_string(path)?;
        let points = parse_points(&path.display().to_string(), &text)?;
        debug!(region = name, nodes = points.len(), path = %path.display(), "region loaded");
        self.insert(Region::from_points(name, &points))
    }

    /// Register an already-built region. Names are unique.
    pub fn insert(&mut self, region: Region) -> CouplingResult<&Region> {
        if self.contains(region.name()) {
            return Err(CouplingError::ConfigError(format!(
                "region '{}' loaded twice",
                region.name()
            )));
        }
        self.regions.push(region);
        Ok(&self.regions[self.regions.len() - 1])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.regions.iter().any(|r| r.name() == name)
    }

    pub fn get(&self, name: &str) -> CouplingResult<&Region> {
        self.regions
            .iter()
            .find(|r| r.name() == name)
            .ok_or_else(|| CouplingError::MissingResource(format!("unknown region '{name}'")))
    }

    pub fn point_cloud(&self, name: &str) -> CouplingResult<PointCloud> {
        Ok(self.get(name)?.point_cloud())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.regions.iter().map(|r| r.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}
