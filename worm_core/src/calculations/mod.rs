//! # Worm Drive Calculations
//!
//! The calculation pipeline, one stage per module:
//!
//! - [`geometry`] - dependent dimensions and lead angle
//! - [`cycle`] - phase sweep of stresses, torque and efficiency
//! - [`fatigue`] - safety factors and Miner damage from S-N data
//! - [`result`] - the assembled [`CycleResult`]
//!
//! Every stage is a pure function and total over its inputs: degenerate
//! values give zeroed or `None` outputs rather than errors. Only
//! [`calculate`] checks invariants, once, before running the stages.
//!
//! ## Example
//!
//! ```rust
//! use worm_core::calculations::calculate;
//! use worm_core::input::InputSet;
//! use worm_core::materials::{WheelMaterial, WormMaterial};
//!
//! let result = calculate(&InputSet::default(), &WormMaterial::default(), &WheelMaterial::default())?;
//! assert_eq!(result.phi.len(), 720);
//! assert_eq!(result.meta.z2, 50);
//! // no S-N data on the default wheel card
//! assert!(result.meta.SF_root.is_none());
//! # Ok::<(), worm_core::errors::CalcError>(())
//! ```

pub mod cycle;
pub mod fatigue;
pub mod geometry;
pub mod result;

use tracing::info;

use crate::errors::CalcResult;
use crate::input::InputSet;
use crate::materials::{equivalent_modulus, interpolate_modulus, WheelMaterial, WormMaterial};

// Re-export commonly used types
pub use cycle::{CycleBaseline, MeshCycle};
pub use fatigue::FatigueResult;
pub use geometry::{CenterDistanceFit, Geometry, GeometryParams};
pub use result::{CycleResult, MetaValue, ResultMeta};

/// Run one full worm-drive computation.
///
/// # Errors
///
/// `InvalidInput` when `inputs` violates an invariant
/// (see [`InputSet::validate`]).
pub fn calculate(
    inputs: &InputSet,
    worm: &WormMaterial,
    wheel: &WheelMaterial,
) -> CalcResult<CycleResult> {
    inputs.validate()?;

    let geometry = geometry::resolve(&GeometryParams::from(inputs));

    let e_wheel = interpolate_modulus(wheel, inputs.temp_c);
    let e_prime = equivalent_modulus(worm.e(), worm.nu(), e_wheel, wheel.nu());

    let cycle = cycle::simulate(inputs, &geometry, e_prime);
    let fatigue = fatigue::evaluate(inputs, &cycle, wheel);

    info!(
        worm = worm.display_name(),
        wheel = wheel.display_name(),
        temp_c = inputs.temp_c,
        e_wheel_gpa = e_wheel.0,
        damage_root = fatigue.damage_root,
        "calculation complete"
    );

    Ok(result::assemble(inputs, &geometry, e_prime, cycle, &fatigue))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_rejects_invalid_inputs() {
        let inputs = InputSet {
            steps: 0,
            ..InputSet::default()
        };
        let err = calculate(&inputs, &WormMaterial::default(), &WheelMaterial::default()).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");

        let inputs = InputSet {
            mn_mm: 0.0,
            ..InputSet::default()
        };
        assert!(calculate(&inputs, &WormMaterial::default(), &WheelMaterial::default()).is_err());
    }

    #[test]
    fn test_calculate_default_materials() {
        let result =
            calculate(&InputSet::default(), &WormMaterial::default(), &WheelMaterial::default())
                .unwrap();
        let expected = equivalent_modulus(
            crate::units::Gigapascals(210.0),
            0.3,
            crate::units::Gigapascals(2.0),
            0.4,
        );
        assert!((result.meta.Eprime_GPa - expected.0).abs() < 1e-12);
        assert_eq!(result.meta.damage_root, 0.0);
        assert_eq!(result.meta.SF_contact, None);
    }

    #[test]
    fn test_calculate_huge_thread_count() {
        let mut raw = crate::input::RawInputs::with_defaults();
        raw.set("z1", "5e18");
        raw.set("steps", "4");
        let inputs = InputSet::parse(&raw).unwrap();
        assert!(inputs.validate().is_ok());

        let result = calculate(&inputs, &WormMaterial::default(), &WheelMaterial::default()).unwrap();
        assert_eq!(result.phi.len(), 4);
        assert_eq!(result.meta.z1, 5_000_000_000_000_000_000);

        let inputs = InputSet {
            z1: i64::MAX,
            steps: 4,
            ..InputSet::default()
        };
        let result = calculate(&inputs, &WormMaterial::default(), &WheelMaterial::default()).unwrap();
        assert_eq!(result.t2_nm.len(), 4);
    }
}
