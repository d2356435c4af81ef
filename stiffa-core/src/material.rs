//! Material and cross-section properties.
//!
//! Isotropic linear elastic materials only. Bars read the cross-section
//! area from [`Section`], plane elements read the thickness.

use crate::error::{Error, Result};
use nalgebra::Matrix3;

/// Material properties for structural analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Young's modulus (Pa).
    pub youngs_modulus: f64,
    /// Poisson's ratio (dimensionless).
    pub poissons_ratio: f64,
    /// Mass density (kg/m³); without it self-weight loads are zero.
    pub density: Option<f64>,
}

impl Material {
    /// Create a new isotropic linear elastic material.
    ///
    /// # Errors
    ///
    /// Returns error if E <= 0 or ν is outside (-1, 0.5).
    pub fn new(youngs_modulus: f64, poissons_ratio: f64) -> Result<Self> {
        if youngs_modulus <= 0.0 {
            return Err(Error::InvalidMaterial(
                "Young's modulus must be positive".into(),
            ));
        }
        if poissons_ratio <= -1.0 || poissons_ratio >= 0.5 {
            return Err(Error::InvalidMaterial(
                "Poisson's ratio must be in range (-1, 0.5)".into(),
            ));
        }
        Ok(Self {
            youngs_modulus,
            poissons_ratio,
            density: None,
        })
    }

    /// Create a material with density specified.
    pub fn with_density(mut self, density: f64) -> Result<Self> {
        if density <= 0.0 {
            return Err(Error::InvalidMaterial("Density must be positive".into()));
        }
        self.density = Some(density);
        Ok(self)
    }

    /// Density, zero when not specified.
    pub fn density_or_zero(&self) -> f64 {
        self.density.unwrap_or(0.0)
    }

    /// Shear modulus G = E / (2(1 + ν)).
    pub fn shear_modulus(&self) -> f64 {
        self.youngs_modulus / (2.0 * (1.0 + self.poissons_ratio))
    }

    /// Plane stress constitutive matrix (for 2D elements).
    ///
    /// Returns a 3x3 matrix for [σ_xx, σ_yy, τ_xy] = D * [ε_xx, ε_yy, γ_xy].
    pub fn constitutive_plane_stress(&self) -> Matrix3<f64> {
        let e = self.youngs_modulus;
        let nu = self.poissons_ratio;

        let factor = e / (1.0 - nu * nu);

        Matrix3::new(
            factor,         factor * nu, 0.0,
            factor * nu,    factor,      0.0,
            0.0,            0.0,         factor * (1.0 - nu) / 2.0,
        )
    }
}

/// Common material presets.
impl Material {
    /// Structural steel (E = 200 GPa, ν = 0.3, ρ = 7850 kg/m³).
    pub fn steel() -> Self {
        Self {
            youngs_modulus: 200e9,
            poissons_ratio: 0.3,
            density: Some(7850.0),
        }
    }
}

/// Geometric section properties.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Section {
    /// Cross-section area for bars (m²).
    pub area: f64,
    /// Out-of-plane thickness for plane elements (m).
    pub thickness: f64,
}

impl Section {
    pub fn new(area: f64, thickness: f64) -> Result<Self> {
        if area <= 0.0 || thickness <= 0.0 {
            return Err(Error::InvalidMaterial(
                "Section area and thickness must be positive".into(),
            ));
        }
        Ok(Self { area, thickness })
    }
}

impl Default for Section {
    /// 1 cm² bars, unit thickness plates.
    fn default() -> Self {
        Self {
            area: 1.0e-4,
            thickness: 1.0,
        }
    }
}
