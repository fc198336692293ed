//! # Fatigue Evaluation
//!
//! Safety factors of the wheel against its S-N allowables at the design
//! life, and a Miner damage proxy for the root.
//!
//! ## Design life
//!
//! ```text
//! N_life = n1 · 60 · life_h / i          (wheel load cycles)
//! ```
//!
//! ## Damage proxy
//!
//! The root stress trace is treated as a single sinusoid with amplitude
//! `σa = ½·(max σF − min σF)`. Every worm revolution engages the wheel z1
//! times, so `n = n1 · 60 · life_h · z1` cycles are applied. The allowable
//! cycle count comes from inverting the root S-N curve (stress → log10 N):
//!
//! ```text
//! D = n / N_allow(σa)
//! ```
//!
//! Amplitudes below the lowest tabulated stress do not extrapolate; they
//! contribute no damage. D < 1 reads as "life target met" but nothing here
//! enforces it.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::cycle::{peak, trough, MeshCycle};
use crate::input::InputSet;
use crate::materials::{interp, interpolate_allowable, CurvePoint, WheelMaterial};

/// Damage reported when the inverted S-N curve yields no positive life
pub const DAMAGE_SATURATED: f64 = 999.0;

/// Fatigue figures of one computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FatigueResult {
    /// Root safety factor, `None` without root S-N data
    pub sf_root: Option<f64>,
    /// Contact safety factor, `None` without contact S-N data
    pub sf_contact: Option<f64>,
    /// Miner damage of the root
    pub damage_root: f64,
    /// Wheel design-life cycles
    pub n_life: f64,
    /// Root stress amplitude used for the damage proxy (MPa)
    pub sigma_amp_mpa: f64,
    /// Applied cycles used for the damage proxy
    pub applied_cycles: f64,
}

impl FatigueResult {
    /// Whether the damage proxy stays below 1. Advisory only.
    pub fn life_target_met(&self) -> bool {
        self.damage_root < 1.0
    }
}

/// Wheel load cycles over the design life.
pub fn design_life_cycles(n1_rpm: f64, life_h: f64, ratio: f64) -> f64 {
    n1_rpm * 60.0 * life_h / ratio
}

/// Allowable stress at `n_life` divided by the peak stress.
///
/// Lives below one cycle are looked up at one cycle. `None` when the curve
/// is empty, the allowable is zero, or the peak is not positive.
pub fn safety_factor(curve: &[CurvePoint], n_life: f64, peak_mpa: f64) -> Option<f64> {
    let allowable = interpolate_allowable(curve, n_life.max(1.0))?;
    if allowable.0 == 0.0 || allowable.0.is_nan() || peak_mpa.is_nan() || peak_mpa <= 0.0 {
        return None;
    }
    Some(allowable.0 / peak_mpa)
}

/// Cycles to failure at a stress amplitude, read backwards off an S-N curve.
///
/// `None` when the amplitude lies below the lowest tabulated stress or no
/// point with positive N exists. Above the highest stress the shortest
/// tabulated life is returned.
pub fn cycles_to_failure(curve: &[CurvePoint], stress_mpa: f64) -> Option<f64> {
    let mut points: Vec<CurvePoint> = curve.iter().copied().filter(|p| p[0] > 0.0).collect();
    // descending by stress, then flipped: ascending with tied stresses reversed
    points.sort_by(|a, b| b[1].total_cmp(&a[1]));
    points.reverse();

    let lowest = points.first()?[1];
    if stress_mpa < lowest {
        return None;
    }

    let inverse: Vec<(f64, f64)> = points.iter().map(|p| (p[1], p[0].log10())).collect();
    interp(stress_mpa, &inverse).map(|log_n| 10f64.powf(log_n))
}

/// Miner damage of `applied_cycles` at a constant amplitude.
///
/// Zero without curve data, for a non-positive amplitude, or for an
/// amplitude below the curve.
pub fn miner_damage(curve: &[CurvePoint], sigma_amp_mpa: f64, applied_cycles: f64) -> f64 {
    if curve.is_empty() || sigma_amp_mpa.is_nan() || sigma_amp_mpa <= 0.0 {
        return 0.0;
    }
    match cycles_to_failure(curve, sigma_amp_mpa) {
        Some(n_allow) if n_allow > 0.0 => applied_cycles / n_allow,
        Some(_) => DAMAGE_SATURATED,
        None => 0.0,
    }
}

/// Evaluate safety factors and damage for one simulated mesh cycle.
pub fn evaluate(inputs: &InputSet, cycle: &MeshCycle, wheel: &WheelMaterial) -> FatigueResult {
    let n_life = design_life_cycles(inputs.n1_rpm, inputs.life_h, inputs.ratio);
    let root_curve = &wheel.sn.root_allow;
    let contact_curve = &wheel.sn.contact_allow;

    let sigma_max = peak(&cycle.sigma_root_mpa);
    let sigma_min = trough(&cycle.sigma_root_mpa);
    let p_max = peak(&cycle.p_contact_mpa);

    let sf_root = sigma_max.and_then(|s| safety_factor(root_curve, n_life, s));
    let sf_contact = p_max.and_then(|p| safety_factor(contact_curve, n_life, p));

    let sigma_amp_mpa = match (sigma_max, sigma_min) {
        (Some(hi), Some(lo)) => 0.5 * (hi - lo),
        _ => 0.0,
    };
    let applied_cycles = inputs.n1_rpm * 60.0 * inputs.life_h * inputs.z1 as f64;
    let damage_root = miner_damage(root_curve, sigma_amp_mpa, applied_cycles);

    debug!(
        n_life,
        ?sf_root,
        ?sf_contact,
        sigma_amp_mpa,
        damage_root,
        "evaluated fatigue"
    );

    FatigueResult {
        sf_root,
        sf_contact,
        damage_root,
        n_life,
        sigma_amp_mpa,
        applied_cycles,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::cycle::simulate;
    use crate::calculations::geometry::{resolve, GeometryParams};
    use crate::units::Gigapascals;

    fn root_curve() -> Vec<CurvePoint> {
        vec![[1e4, 60.0], [1e6, 40.0], [1e8, 20.0]]
    }

    fn wheel_with_sn(root: Vec<CurvePoint>, contact: Vec<CurvePoint>) -> WheelMaterial {
        let mut wheel = WheelMaterial::default();
        wheel.sn.root_allow = root;
        wheel.sn.contact_allow = contact;
        wheel
    }

    fn run(inputs: &InputSet, wheel: &WheelMaterial) -> FatigueResult {
        let geometry = resolve(&GeometryParams::from(inputs));
        let cycle = simulate(inputs, &geometry, Gigapascals(4.0));
        evaluate(inputs, &cycle, wheel)
    }

    #[test]
    fn test_design_life_cycles() {
        // 3000 rpm, 3000 h, i = 25
        assert_eq!(design_life_cycles(3000.0, 3000.0, 25.0), 21_600_000.0);
    }

    #[test]
    fn test_safety_factor() {
        let curve = root_curve();
        let sf = safety_factor(&curve, 1e6, 20.0).unwrap();
        assert!((sf - 2.0).abs() < 1e-12);
        // life below one cycle is looked up at N = 1, clamped to the first point
        let sf = safety_factor(&curve, 0.0, 30.0).unwrap();
        assert!((sf - 2.0).abs() < 1e-12);

        assert_eq!(safety_factor(&curve, 1e6, 0.0), None);
        assert_eq!(safety_factor(&[], 1e6, 20.0), None);
        assert_eq!(safety_factor(&[[1e6, 0.0]], 1e6, 20.0), None);
    }

    #[test]
    fn test_cycles_to_failure() {
        let curve = root_curve();
        let n = cycles_to_failure(&curve, 40.0).unwrap();
        assert!((n.log10() - 6.0).abs() < 1e-12);
        // halfway between 40 and 60 MPa is halfway in log N
        let n = cycles_to_failure(&curve, 50.0).unwrap();
        assert!((n.log10() - 5.0).abs() < 1e-12);
        // above the table: shortest life
        let n = cycles_to_failure(&curve, 500.0).unwrap();
        assert!((n.log10() - 4.0).abs() < 1e-12);
        // below the table: no failure predicted
        assert_eq!(cycles_to_failure(&curve, 10.0), None);
        assert_eq!(cycles_to_failure(&[], 10.0), None);
    }

    #[test]
    fn test_cycles_to_failure_unsorted_curve() {
        let shuffled = vec![[1e8, 20.0], [1e4, 60.0], [1e6, 40.0]];
        let a = cycles_to_failure(&shuffled, 33.0).unwrap();
        let b = cycles_to_failure(&root_curve(), 33.0).unwrap();
        assert!((a - b).abs() / b < 1e-12);
    }

    #[test]
    fn test_miner_damage() {
        let curve = root_curve();
        let d = miner_damage(&curve, 40.0, 5e5);
        assert!((d - 0.5).abs() < 1e-9);
        // amplitude under the floor
        assert_eq!(miner_damage(&curve, 5.0, 1e12), 0.0);
        assert_eq!(miner_damage(&curve, 0.0, 1e12), 0.0);
        assert_eq!(miner_damage(&[], 40.0, 1e12), 0.0);
    }

    #[test]
    fn test_missing_root_data_gives_no_sf() {
        let inputs = InputSet::default();
        let wheel = wheel_with_sn(vec![], vec![[1e6, 80.0], [1e8, 50.0]]);
        let result = run(&inputs, &wheel);
        assert_eq!(result.sf_root, None);
        assert_eq!(result.damage_root, 0.0);
        assert!(result.sf_contact.is_some());
        assert!(result.life_target_met());
    }

    #[test]
    fn test_damage_monotonic_in_life() {
        // low allowables so the amplitude of the reference drive sits on the curve
        let wheel = wheel_with_sn(vec![[1e5, 4.0], [1e7, 2.0], [1e9, 0.5]], vec![]);
        let mut previous = 0.0;
        for life_h in [100.0, 1000.0, 3000.0, 20000.0] {
            let inputs = InputSet {
                life_h,
                ..InputSet::default()
            };
            let result = run(&inputs, &wheel);
            assert!(result.damage_root >= previous);
            previous = result.damage_root;
        }
        assert!(previous > 0.0);
    }

    #[test]
    fn test_applied_cycles_scale_with_threads() {
        let inputs = InputSet {
            z1: 3,
            ..InputSet::default()
        };
        let result = run(&inputs, &WheelMaterial::default());
        assert_eq!(result.applied_cycles, 3000.0 * 60.0 * 3000.0 * 3.0);
        assert_eq!(result.sf_contact, None);
    }
}
