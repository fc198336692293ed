//! # Unit Types
//!
//! Type-safe wrappers for the units a worm drive calculation mixes. They
//! are plain f64 newtypes so JSON stays clean (just numbers).
//!
//! ## SI-mm Units
//!
//! Worm drive data sheets use a mixed millimetre system:
//! - Length: millimetres (mm)
//! - Force: newtons (N)
//! - Torque: newton-metres (N·m)
//! - Stress: megapascals (MPa = N/mm²)
//! - Elastic modulus: gigapascals (GPa)
//! - Angle: degrees at the boundary, radians inside formulas
//!
//! ## Example
//!
//! ```rust
//! use worm_core::units::{Degrees, Radians, Gigapascals, Megapascals};
//!
//! let alpha: Radians = Degrees(180.0).into();
//! assert!((alpha.0 - std::f64::consts::PI).abs() < 1e-12);
//!
//! let e: Megapascals = Gigapascals(2.0).into();
//! assert_eq!(e.0, 2000.0);
//! ```

use serde::{Deserialize, Serialize};
use std::ops::Mul;

// ============================================================================
// Angle Units
// ============================================================================

/// Angle in degrees
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Degrees(pub f64);

/// Angle in radians
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Radians(pub f64);

impl From<Degrees> for Radians {
    fn from(deg: Degrees) -> Self {
        Radians(deg.0.to_radians())
    }
}

impl From<Radians> for Degrees {
    fn from(rad: Radians) -> Self {
        Degrees(rad.0.to_degrees())
    }
}

// ============================================================================
// Length, Force and Torque Units
// ============================================================================

/// Length in millimetres
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Millimeters(pub f64);

/// Force in newtons
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Newtons(pub f64);

/// Torque in newton-metres
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NewtonMeters(pub f64);

impl NewtonMeters {
    /// Tangential force at a pitch diameter: F = T / r.
    ///
    /// Torque is in N·m and the diameter in mm, hence the factor 1000.
    /// A non-positive diameter yields zero force.
    pub fn tangential_force(self, pitch_diameter: Millimeters) -> Newtons {
        if pitch_diameter.0 > 0.0 {
            Newtons(self.0 * 1000.0 / (0.5 * pitch_diameter.0))
        } else {
            Newtons(0.0)
        }
    }
}

impl Mul<f64> for NewtonMeters {
    type Output = NewtonMeters;
    fn mul(self, rhs: f64) -> Self::Output {
        NewtonMeters(self.0 * rhs)
    }
}

// ============================================================================
// Stress / Modulus Units
// ============================================================================

/// Stress in megapascals (N/mm²)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Megapascals(pub f64);

/// Modulus in gigapascals
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Gigapascals(pub f64);

impl From<Gigapascals> for Megapascals {
    fn from(gpa: Gigapascals) -> Self {
        Megapascals(gpa.0 * 1000.0)
    }
}

impl From<Megapascals> for Gigapascals {
    fn from(mpa: Megapascals) -> Self {
        Gigapascals(mpa.0 / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_angle_conversion() {
        let rad: Radians = Degrees(20.0).into();
        assert!((rad.0 - 0.349_065_850_4).abs() < 1e-9);
        let back: Degrees = rad.into();
        assert!((back.0 - 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_modulus_conversion() {
        let mpa: Megapascals = Gigapascals(210.0).into();
        assert_eq!(mpa.0, 210_000.0);
        let gpa: Gigapascals = Megapascals(3500.0).into();
        assert!((gpa.0 - 3.5).abs() < 1e-12);
    }

    #[test]
    fn test_tangential_force() {
        // 6 N·m on a 25 mm pitch diameter: 6000 / 12.5 = 480 N
        let f = NewtonMeters(6.0).tangential_force(Millimeters(25.0));
        assert!((f.0 - 480.0).abs() < 1e-9);
        assert_eq!(NewtonMeters(6.0).tangential_force(Millimeters(0.0)).0, 0.0);
    }

    #[test]
    fn test_serde_transparent() {
        let json = serde_json::to_string(&Millimeters(75.0)).unwrap();
        assert_eq!(json, "75.0");
    }
}
