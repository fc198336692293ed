//! # Worm Pair Geometry
//!
//! Derives every dependent dimension of a worm/wheel pair from the
//! independent parameters (threads, module, diameter factor, profile shifts,
//! ratio, optional target centre distance).
//!
//! ## Formulas
//!
//! ```text
//! z2  = round(ratio · z1)
//! d1  = (q + 2·x1)·mn        da1 = d1 + 2·mn         df1 = d1 − 2.4·mn
//! d2  = (z2 + 2·x2)·mn       da2 = d2 + 2·mn·(1+x2)  df2 = d2 − 2·mn·(1.2−x2)
//! a   = 0.5·(d1 + d2)
//! γ   = atan2(z1·mn, d1)     (5° when d1 ≤ 0)
//! ```
//!
//! The resolver is total: a zero or negative module gives degenerate but
//! finite dimensions. Callers that need a physically meaningful pair validate
//! `mn > 0` first (see [`InputSet::validate`](crate::input::InputSet::validate)).
//!
//! ## Example
//!
//! ```rust
//! use worm_core::calculations::geometry::{resolve, GeometryParams};
//!
//! let geom = resolve(&GeometryParams {
//!     z1: 2, mn_mm: 2.5, q: 10.0, x1: 0.0, x2: 0.0, ratio: 25.0, a_target_mm: None,
//! });
//! assert_eq!(geom.z2, 50);
//! assert!((geom.a_calc_mm - 75.0).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{CalcError, CalcResult};
use crate::input::InputSet;
use crate::units::{Degrees, Radians};

/// Lead angle used when the worm pitch diameter is not positive.
pub const FALLBACK_LEAD_ANGLE_DEG: f64 = 5.0;

/// The independent geometry parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeometryParams {
    pub z1: i64,
    pub mn_mm: f64,
    pub q: f64,
    pub x1: f64,
    pub x2: f64,
    pub ratio: f64,
    pub a_target_mm: Option<f64>,
}

impl From<&InputSet> for GeometryParams {
    fn from(inputs: &InputSet) -> Self {
        GeometryParams {
            z1: inputs.z1,
            mn_mm: inputs.mn_mm,
            q: inputs.q,
            x1: inputs.x1,
            x2: inputs.x2,
            ratio: inputs.ratio,
            a_target_mm: inputs.a_target_mm,
        }
    }
}

/// Derived worm pair dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    /// Worm threads
    pub z1: i64,
    /// Wheel teeth
    pub z2: i64,
    /// Worm pitch diameter (mm)
    pub d1_mm: f64,
    /// Worm tip diameter (mm)
    pub da1_mm: f64,
    /// Worm root diameter (mm)
    pub df1_mm: f64,
    /// Wheel pitch diameter (mm)
    pub d2_mm: f64,
    /// Wheel tip diameter (mm)
    pub da2_mm: f64,
    /// Wheel root diameter (mm)
    pub df2_mm: f64,
    /// Working centre distance: the target when given, else the calculated one (mm)
    pub a_mm: f64,
    /// Centre distance from the pitch diameters (mm)
    pub a_calc_mm: f64,
    pub a_target_mm: Option<f64>,
    /// a_target − a_calc, only when a target is given (mm)
    pub delta_a_mm: Option<f64>,
    /// Worm lead angle
    pub gamma: Radians,
}

impl Geometry {
    /// Lead angle in degrees
    pub fn gamma_deg(&self) -> f64 {
        Degrees::from(self.gamma).0
    }
}

/// Number of wheel teeth for a ratio.
///
/// Halfway cases round away from zero (12.5 → 13).
pub fn wheel_teeth(ratio: f64, z1: i64) -> i64 {
    (ratio * z1 as f64).round() as i64
}

/// Resolve the dependent geometry.
pub fn resolve(params: &GeometryParams) -> Geometry {
    let GeometryParams {
        z1,
        mn_mm: mn,
        q,
        x1,
        x2,
        ratio,
        a_target_mm,
    } = *params;

    let z2 = wheel_teeth(ratio, z1);

    let d1 = (q + 2.0 * x1) * mn;
    let da1 = d1 + 2.0 * mn;
    let df1 = d1 - 2.4 * mn;

    let d2 = (z2 as f64 + 2.0 * x2) * mn;
    let da2 = d2 + 2.0 * mn * (1.0 + x2);
    let df2 = d2 - 2.0 * mn * (1.2 - x2);

    let a_calc = 0.5 * (d1 + d2);
    let a_mm = a_target_mm.unwrap_or(a_calc);
    let delta_a_mm = a_target_mm.map(|a| a - a_calc);

    let gamma = if d1 > 0.0 {
        Radians((z1 as f64 * mn).atan2(d1))
    } else {
        Degrees(FALLBACK_LEAD_ANGLE_DEG).into()
    };

    debug!(z2, d1, d2, a_calc, gamma_rad = gamma.0, "resolved worm pair geometry");

    Geometry {
        z1,
        z2,
        d1_mm: d1,
        da1_mm: da1,
        df1_mm: df1,
        d2_mm: d2,
        da2_mm: da2,
        df2_mm: df2,
        a_mm,
        a_calc_mm: a_calc,
        a_target_mm,
        delta_a_mm,
        gamma,
    }
}

/// Suggested change to hit (or define) a centre distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum CenterDistanceFit {
    /// No target was set: the calculated centre distance becomes the target.
    SuggestTarget { a_target_mm: f64 },
    /// A target was set: the wheel profile shift that makes a_calc equal it.
    SuggestWheelShift { x2: f64 },
}

/// Fit the centre distance to the profile shifts, or the other way round.
///
/// Without a target this proposes `a = 0.5·mn·(q + z2 + 2·(x1+x2))`. With a
/// target it solves `a_target = 0.5·mn·(q + z2 + 2·(x1+x2))` for x2.
pub fn fit_center_distance(params: &GeometryParams) -> CalcResult<CenterDistanceFit> {
    let z2 = wheel_teeth(params.ratio, params.z1) as f64;
    let mn = params.mn_mm;

    match params.a_target_mm {
        None => Ok(CenterDistanceFit::SuggestTarget {
            a_target_mm: 0.5 * mn * (params.q + z2 + 2.0 * (params.x1 + params.x2)),
        }),
        Some(a_target) => {
            if mn.is_nan() || mn <= 0.0 {
                return Err(CalcError::invalid_input(
                    "mn_mm",
                    mn.to_string(),
                    "Module must be positive to solve for the wheel profile shift",
                ));
            }
            let xsum_needed = a_target / mn - 0.5 * (params.q + z2);
            Ok(CenterDistanceFit::SuggestWheelShift {
                x2: xsum_needed - params.x1,
            })
        }
    }
}
