//! # Mesh-Cycle Simulation
//!
//! Sweeps one mesh cycle (φ from 0 to 2π, half-open) and evaluates contact
//! stress, root stress, output torque, efficiency and a contact-number
//! indicator at every phase sample.
//!
//! This is a trend model. Each quantity is a closed-form baseline modulated
//! by low-order harmonics of the thread count z1 to mimic mesh-stiffness
//! ripple; it is not a tooth-contact or FE solution.
//!
//! ## Baselines
//!
//! ```text
//! η0      = [cos αn − μ/tan γ] / [cos αn + μ·tan γ]     clamped to [0.3, 0.98]
//! T2      = T1 · i · η0
//! Fn      = T1·1000 / (0.5·d1)                          (N, T1 in N·m, d1 in mm)
//! ρeq     = 0.5·d1·sin αn                               (1.0 mm when d1 ≤ 0)
//! p       = 0.418·√(Fn·KA·KV·KHβ·E'·1000 / (ρeq·b))      (0 when ρeq·b ≤ 0)
//! σF      = Fn·KA·KV·KFβ·YF / (b·mn),  YF = 2.2          (0 when b·mn ≤ 0)
//! ```
//!
//! ## Phase modulation (x = z1·φ)
//!
//! ```text
//! Nc(φ) = 1 + 0.15·sin x + 0.08·cos 2x
//! η(φ)  = η0 · (1 − 0.015·(1 − cos x))
//! T2(φ) = T2 · (1 + 0.04·sin x + 0.02·sin 2x)
//! p(φ)  = p  · (1 + 0.06·sin x + 0.03·cos 2x)
//! σF(φ) = σF · (1 + 0.08·sin x + 0.04·cos 2x)
//! ```

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::geometry::Geometry;
use crate::input::InputSet;
use crate::units::{Gigapascals, Millimeters, NewtonMeters, Radians};

/// Lower clamp of the base efficiency
pub const ETA0_MIN: f64 = 0.3;
/// Upper clamp of the base efficiency
pub const ETA0_MAX: f64 = 0.98;
/// Root form factor used by the Lewis-style proxy
pub const FORM_FACTOR_YF: f64 = 2.2;
/// Hertz line-contact coefficient
pub const HERTZ_COEFFICIENT: f64 = 0.418;
/// Equivalent curvature radius used when the worm pitch diameter is not positive (mm)
pub const FALLBACK_RHO_EQ_MM: f64 = 1.0;

/// Scalar baselines of one mesh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CycleBaseline {
    /// Base efficiency η0
    pub eta0: f64,
    /// Base output torque (N·m)
    pub t2_base_nm: f64,
    /// Normal force at the worm pitch circle (N)
    pub fn_base_n: f64,
    /// Equivalent radius of curvature (mm)
    pub rho_eq_mm: f64,
    /// Contact load factor KA·KV·KHβ
    pub k_h: f64,
    /// Root load factor KA·KV·KFβ
    pub k_f: f64,
    /// Contact stress before phase modulation (MPa)
    pub p_base_mpa: f64,
    /// Root stress before phase modulation (MPa)
    pub sigma_base_mpa: f64,
}

/// Per-phase traces of one mesh cycle, all of length `steps`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshCycle {
    pub phi: Vec<f64>,
    pub p_contact_mpa: Vec<f64>,
    pub sigma_root_mpa: Vec<f64>,
    pub t2_nm: Vec<f64>,
    pub eta: Vec<f64>,
    pub nc_proxy: Vec<f64>,
    pub baseline: CycleBaseline,
}

/// `steps` equally spaced phase angles covering [0, 2π).
///
/// The first sample is 0 and the last is (steps − 1)/steps · 2π.
pub fn phase_sweep(steps: usize) -> Vec<f64> {
    if steps == 0 {
        return Vec::new();
    }
    let step = 2.0 * PI / steps as f64;
    (0..steps).map(|i| i as f64 * step).collect()
}

/// Base efficiency η0 of the worm drive with the worm driving.
///
/// A NaN quotient collapses to the lower clamp.
pub fn base_efficiency(alpha_n: Radians, mu: f64, gamma: Radians) -> f64 {
    let cos_a = alpha_n.0.cos();
    let tan_g = gamma.0.tan();

    let eta0 = efficiency_quotient(cos_a - mu / tan_g, cos_a + mu * tan_g);
    if eta0.is_nan() {
        return ETA0_MIN;
    }
    eta0.clamp(ETA0_MIN, ETA0_MAX)
}

/// Unclamped η0 quotient.
///
/// An exactly zero denominator is replaced by 1, so the quotient degrades to
/// the bare numerator. This keeps the function total; the value is not a
/// physical efficiency.
fn efficiency_quotient(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        numerator
    } else {
        numerator / denominator
    }
}

/// Compute the scalar baselines of a mesh cycle.
pub fn baseline(inputs: &InputSet, geometry: &Geometry, e_prime: Gigapascals) -> CycleBaseline {
    let alpha_n = inputs.alpha_n();
    let d1 = geometry.d1_mm;
    let b = inputs.b_mm;
    let mn = inputs.mn_mm;

    let eta0 = base_efficiency(alpha_n, inputs.mu, geometry.gamma);
    let t2_base_nm = (NewtonMeters(inputs.t1_nm) * inputs.ratio * eta0).0;

    let fn_base_n = NewtonMeters(inputs.t1_nm).tangential_force(Millimeters(d1)).0;
    let rho_eq_mm = if d1 > 0.0 {
        0.5 * d1 * alpha_n.0.sin()
    } else {
        FALLBACK_RHO_EQ_MM
    };

    let k_h = inputs.ka * inputs.kv * inputs.khb;
    let k_f = inputs.ka * inputs.kv * inputs.kfb;

    // E' is in GPa; the factor 1000 brings it to MPa.
    let p_base_mpa = if rho_eq_mm * b > 0.0 {
        HERTZ_COEFFICIENT * (fn_base_n * k_h * e_prime.0 * 1000.0 / (rho_eq_mm * b)).sqrt()
    } else {
        0.0
    };

    let sigma_base_mpa = if b * mn > 0.0 {
        (fn_base_n * k_f * FORM_FACTOR_YF) / (b * mn)
    } else {
        0.0
    };

    CycleBaseline {
        eta0,
        t2_base_nm,
        fn_base_n,
        rho_eq_mm,
        k_h,
        k_f,
        p_base_mpa,
        sigma_base_mpa,
    }
}

/// Run the phase sweep.
///
/// Total for any input: degenerate geometry gives zero stresses, never an
/// error. A non-positive `steps` gives empty traces.
pub fn simulate(inputs: &InputSet, geometry: &Geometry, e_prime: Gigapascals) -> MeshCycle {
    let base = baseline(inputs, geometry, e_prime);
    let steps = usize::try_from(inputs.steps).unwrap_or(0);
    let phi = phase_sweep(steps);

    let z1 = geometry.z1 as f64;
    let z1_double = 2.0 * z1;

    let mut cycle = MeshCycle {
        phi: Vec::with_capacity(steps),
        p_contact_mpa: Vec::with_capacity(steps),
        sigma_root_mpa: Vec::with_capacity(steps),
        t2_nm: Vec::with_capacity(steps),
        eta: Vec::with_capacity(steps),
        nc_proxy: Vec::with_capacity(steps),
        baseline: base,
    };

    for &angle in &phi {
        let x = z1 * angle;
        let x2 = z1_double * angle;
        let (sin_x, cos_x) = (x.sin(), x.cos());
        let (sin_2x, cos_2x) = (x2.sin(), x2.cos());

        cycle.nc_proxy.push(1.0 + 0.15 * sin_x + 0.08 * cos_2x);
        cycle.eta.push(base.eta0 * (1.0 - 0.015 * (1.0 - cos_x)));
        cycle.t2_nm.push(base.t2_base_nm * (1.0 + 0.04 * sin_x + 0.02 * sin_2x));
        cycle.p_contact_mpa.push(base.p_base_mpa * (1.0 + 0.06 * sin_x + 0.03 * cos_2x));
        cycle.sigma_root_mpa.push(base.sigma_base_mpa * (1.0 + 0.08 * sin_x + 0.04 * cos_2x));
    }
    cycle.phi = phi;

    debug!(
        steps,
        eta0 = base.eta0,
        p_base_mpa = base.p_base_mpa,
        sigma_base_mpa = base.sigma_base_mpa,
        "simulated mesh cycle"
    );

    cycle
}

/// Largest finite value of a trace, `None` when there is none
pub fn peak(values: &[f64]) -> Option<f64> {
    values.iter().copied().filter(|v| !v.is_nan()).reduce(f64::max)
}

/// Smallest finite value of a trace, `None` when there is none
pub fn trough(values: &[f64]) -> Option<f64> {
    values.iter().copied().filter(|v| !v.is_nan()).reduce(f64::min)
}
