// ─────────────────────────────────────────────────────────────────────
// SCPN Co-Simulation — Material Interpolation Model
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Temperature-dependent dielectric model.
//!
//! Below the lower bound the base properties hold, above the upper bound the
//! floor properties hold, and in between both quantities ramp linearly.

use cosim_types::config::MaterialModelConfig;
use cosim_types::constants::{
    LOSS_TANGENT_FLOOR, MATERIAL_LOWER_TEMPERATURE, MATERIAL_UPPER_TEMPERATURE,
    PERMITTIVITY_FLOOR,
};
use cosim_types::state::MaterialSample;
use ndarray::{Array1, ArrayView1};

/// Ramp with default bounds (300 K → 400 K) and floors (1.0, 1e-9).
pub fn interpolate(temperature: f64, p_init: f64, t_init: f64) -> MaterialSample {
    interpolate_with_floor(
        temperature,
        p_init,
        t_init,
        PERMITTIVITY_FLOOR,
        LOSS_TANGENT_FLOOR,
    )
}

pub fn interpolate_with_floor(
    temperature: f64,
    p_init: f64,
    t_init: f64,
    p_floor: f64,
    loss_floor: f64,
) -> MaterialSample {
    MaterialModel {
        lower_temperature: MATERIAL_LOWER_TEMPERATURE,
        upper_temperature: MATERIAL_UPPER_TEMPERATURE,
        floor: MaterialSample::new(p_floor, loss_floor),
    }
    .sample(temperature, MaterialSample::new(p_init, t_init))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialModel {
    pub lower_temperature: f64,
    pub upper_temperature: f64,
    pub floor: MaterialSample,
}

impl Default for MaterialModel {
    fn default() -> Self {
        MaterialModel {
            lower_temperature: MATERIAL_LOWER_TEMPERATURE,
            upper_temperature: MATERIAL_UPPER_TEMPERATURE,
            floor: MaterialSample::new(PERMITTIVITY_FLOOR, LOSS_TANGENT_FLOOR),
        }
    }
}

impl From<&MaterialModelConfig> for MaterialModel {
    fn from(cfg: &MaterialModelConfig) -> Self {
        MaterialModel {
            lower_temperature: cfg.lower_temperature,
            upper_temperature: cfg.upper_temperature,
            floor: MaterialSample::new(cfg.permittivity_floor, cfg.loss_tangent_floor),
        }
    }
}

impl MaterialModel {
    /// Properties at `temperature` for a material with `base` properties.
    ///
    /// Total over f64: NaN and anything below the ramp map to `base`,
    /// +inf and anything above it map to the floor.
    pub fn sample(&self, temperature: f64, base: MaterialSample) -> MaterialSample {
        if temperature.is_nan() || temperature < self.lower_temperature {
            return base;
        }
        if temperature >= self.upper_temperature {
            return self.floor;
        }
        let frac =
            (temperature - self.lower_temperature) / (self.upper_temperature - self.lower_temperature);
        MaterialSample {
            permittivity: base.permittivity + (self.floor.permittivity - base.permittivity) * frac,
            loss_tangent: base.loss_tangent + (self.floor.loss_tangent - base.loss_tangent) * frac,
        }
    }

    /// Node-by-node properties for one region, in node order.
    pub fn sample_field(
        &self,
        temperatures: ArrayView1<'_, f64>,
        base: MaterialSample,
    ) -> (Array1<f64>, Array1<f64>) {
        let samples: Vec<MaterialSample> =
            temperatures.iter().map(|&t| self.sample(t, base)).collect();
        let permittivity = samples.iter().map(|s| s.permittivity).collect();
        let loss_tangent = samples.iter().map(|s| s.loss_tangent).collect();
        (permittivity, loss_tangent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_below_lower_bound_keeps_base() {
        let s = interpolate(250.0, 2.4, 4e-8);
        assert_eq!(s, MaterialSample::new(2.4, 4e-8));
        let s = interpolate(f64::NEG_INFINITY, 2.4, 4e-8);
        assert_eq!(s, MaterialSample::new(2.4, 4e-8));
    }

    #[test]
    fn test_lower_bound_is_exact() {
        assert_eq!(interpolate(300.0, 3.2, 5e-8), MaterialSample::new(3.2, 5e-8));
    }

    #[test]
    fn test_upper_bound_and_above_hit_floor_exactly() {
        assert_eq!(interpolate(400.0, 3.2, 5e-8), MaterialSample::new(1.0, 1e-9));
        assert_eq!(interpolate(1.0e4, 3.2, 5e-8), MaterialSample::new(1.0, 1e-9));
        assert_eq!(
            interpolate(f64::INFINITY, 3.2, 5e-8),
            MaterialSample::new(1.0, 1e-9)
        );
    }

    #[test]
    fn test_midpoint_is_mean() {
        let s = interpolate(350.0, 2.4, 4e-8);
        assert!((s.permittivity - (2.4 + 1.0) / 2.0).abs() < 1e-12);
        assert!((s.loss_tangent - (4e-8 + 1e-9) / 2.0).abs() < 1e-20);
    }

    #[test]
    fn test_nan_maps_to_base() {
        assert_eq!(interpolate(f64::NAN, 2.4, 4e-8), MaterialSample::new(2.4, 4e-8));
    }

    #[test]
    fn test_custom_floor() {
        let s = interpolate_with_floor(375.0, 5.0, 1e-3, 2.0, 1e-4);
        assert!((s.permittivity - (5.0 - 3.0 * 0.75)).abs() < 1e-12);
        assert!((s.loss_tangent - (1e-3 - 9e-4 * 0.75)).abs() < 1e-15);
    }

    #[test]
    fn test_sample_field_keeps_node_order() {
        let model = MaterialModel::default();
        let temps = array![250.0, 350.0, 450.0];
        let (perm, tan) = model.sample_field(temps.view(), MaterialSample::new(3.0, 1e-7));
        assert_eq!(perm.len(), 3);
        assert_eq!(perm[0], 3.0);
        assert!((perm[1] - 2.0).abs() < 1e-12);
        assert_eq!(perm[2], 1.0);
        assert_eq!(tan[0], 1e-7);
        assert_eq!(tan[2], 1e-9);
    }

    #[test]
    fn test_model_from_config() {
        let cfg = MaterialModelConfig {
            upper_temperature: 500.0,
            ..MaterialModelConfig::default()
        };
        let model = MaterialModel::from(&cfg);
        let s = model.sample(400.0, MaterialSample::new(3.0, 1e-7));
        assert!((s.permittivity - 2.0).abs() < 1e-12);
    }
}
