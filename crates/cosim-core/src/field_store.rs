// ─────────────────────────────────────────────────────────────────────
// SCPN Co-Simulation — Field Store
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Per-region, per-field scalar arrays.
//!
//! A field is sized to its region's node count when declared and is only
//! ever overwritten in place afterwards.

use std::collections::BTreeMap;

use cosim_types::error::{CouplingError, CouplingResult};
use cosim_types::state::Region;
use ndarray::{Array1, ArrayView1};

type FieldKey = (String, String);

#[derive(Debug, Clone, Default)]
pub struct FieldStore {
    fields: BTreeMap<FieldKey, Array1<f64>>,
}

impl FieldStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a field filled with `initial_value`, one entry per node.
    pub fn declare_field(
        &mut self,
        region: &Region,
        field: &str,
        initial_value: f64,
    ) -> CouplingResult<()> {
        let key = (region.name().to_string(), field.to_string());
        if self.fields.contains_key(&key) {
            return Err(CouplingError::DuplicateField {
                region: key.0,
                field: key.1,
            });
        }
        self.fields
            .insert(key, Array1::from_elem(region.node_count(), initial_value));
        Ok(())
    }

    pub fn contains(&self, region: &str, field: &str) -> bool {
        self.fields
            .contains_key(&(region.to_string(), field.to_string()))
    }

    pub fn get(&self, region: &str, field: &str) -> CouplingResult<ArrayView1<'_, f64>> {
        self.fields
            .get(&(region.to_string(), field.to_string()))
            .map(|values| values.view())
            .ok_or_else(|| unknown_field(region, field))
    }

    /// Overwrite a field in place. Length must equal the declared length.
    pub fn set(&mut self, region: &str, field: &str, values: &[f64]) -> CouplingResult<()> {
        let target = self
            .fields
            .get_mut(&(region.to_string(), field.to_string()))
            .ok_or_else(|| unknown_field(region, field))?;
        if target.len() != values.len() {
            return Err(CouplingError::DimensionMismatch {
                context: format!("field '{field}' of region '{region}'"),
                expected: target.len(),
                actual: values.len(),
            });
        }
        target
            .iter_mut()
            .zip(values)
            .for_each(|(dst, &src)| *dst = src);
        Ok(())
    }

    /// All fields as `(region, field, values)`, sorted by region then field.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, ArrayView1<'_, f64>)> {
        self.fields
            .iter()
            .map(|((region, field), values)| (region.as_str(), field.as_str(), values.view()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn unknown_field(region: &str, field: &str) -> CouplingError {
    CouplingError::MissingResource(format!(
        "field '{field}' not declared for region '{region}'"
    ))
}
