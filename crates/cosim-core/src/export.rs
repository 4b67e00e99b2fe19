// ─────────────────────────────────────────────────────────────────────
// SCPN Co-Simulation — Derived-Field Export Import
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Import routines for solver field exports.
//!
//! An export is a text table: one header line (discarded), then one row per
//! sample point with whitespace-separated columns. Columns 1-3 are the
//! sample coordinates, column 4 is the exported scalar.

use std::path::Path;

use cosim_types::constants::EXPORT_VALUE_COLUMN;
use cosim_types::error::{CouplingError, CouplingResult};
use cosim_types::state::Region;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportRow {
    pub position: [f64; 3],
    pub value: f64,
}

pub fn parse_export_table(source_name: &str, text: &str) -> CouplingResult<Vec<ExportRow>> {
    let mut lines = text.trim_end().lines();
    if lines.next().is_none() {
        return Err(CouplingError::MalformedInput {
            source_name: source_name.to_string(),
            line: 0,
            message: "export is empty".into(),
        });
    }

    let mut rows = Vec::new();
    // Line numbers are 1-based and the header is line 1.
    for (offset, line) in lines.enumerate() {
        let line_no = offset + 2;
        let malformed = |message: String| CouplingError::MalformedInput {
            source_name: source_name.to_string(),
            line: line_no,
            message,
        };
        let cols: Vec<&str> = line.split_whitespace().collect();
        if cols.len() <= EXPORT_VALUE_COLUMN {
            return Err(malformed(format!(
                "expected at least {} columns, found {}",
                EXPORT_VALUE_COLUMN + 1,
                cols.len()
            )));
        }
        let parse = |idx: usize| {
            let value = cols[idx]
                .parse::<f64>()
                .map_err(|e| malformed(format!("column {}: '{}': {e}", idx + 1, cols[idx])))?;
            if !value.is_finite() {
                return Err(malformed(format!(
                    "column {}: non-finite value '{}'",
                    idx + 1,
                    cols[idx]
                )));
            }
            Ok(value)
        };
        rows.push(ExportRow {
            position: [parse(0)?, parse(1)?, parse(2)?],
            value: parse(EXPORT_VALUE_COLUMN)?,
        });
    }
    Ok(rows)
}

pub fn read_export_file(path: &Path) -> CouplingResult<Vec<ExportRow>> {
    if !path.is_file() {
        return Err(CouplingError::MissingResource(format!(
            "export file not produced: {}",
            path.display()
        )));
    }
    let text = std::fs::read_to_string(path)?;
    parse_export_table(&path.display().to_string(), &text)
}

/// Exported values in node order.
///
/// Rows are matched to nodes by position in the table. With `verify` set,
/// each row's coordinates must also match its node within `tolerance`
/// (relative, absolute below unit magnitude).
pub fn align_to_region(
    rows: &[ExportRow],
    region: &Region,
    verify: bool,
    tolerance: f64,
) -> CouplingResult<Vec<f64>> {
    if rows.len() != region.node_count() {
        return Err(CouplingError::DimensionMismatch {
            context: format!("export rows for region '{}'", region.name()),
            expected: region.node_count(),
            actual: rows.len(),
        });
    }
    if verify {
        for (row, node) in rows.iter().zip(region.nodes()) {
            let scale = node
                .position
                .iter()
                .fold(1.0_f64, |acc, c| acc.max(c.abs()));
            let off = row
                .position
                .iter()
                .zip(node.position.iter())
                .map(|(a, b)| (a - b).abs())
                .fold(0.0_f64, f64::max);
            if !(off <= tolerance * scale) {
                return Err(CouplingError::MalformedInput {
                    source_name: format!("export for region '{}'", region.name()),
                    line: node.id as usize + 2,
                    message: format!(
                        "row at ({}, {}, {}) does not match node {} at ({}, {}, {})",
                        row.position[0],
                        row.position[1],
                        row.position[2],
                        node.id,
                        node.position[0],
                        node.position[1],
                        node.position[2],
                    ),
                });
            }
        }
    }
    Ok(rows.iter().map(|r| r.value).collect())
}
