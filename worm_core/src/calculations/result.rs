//! # Cycle Result
//!
//! The single output object of a computation: the per-phase traces plus a
//! flat [`ResultMeta`] of every derived scalar. Field names on the wire are
//! fixed (`p_contact_MPa`, `Eprime_GPa`, ...) since plotting and export read
//! them by key. Nullable meta fields serialize as `null`.

use std::f64::consts::PI;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::cycle::MeshCycle;
use super::fatigue::FatigueResult;
use super::geometry::Geometry;
use crate::input::InputSet;
use crate::units::Gigapascals;

/// Traces over one mesh cycle plus derived scalars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleResult {
    /// Phase samples in [0, 2π) (rad)
    pub phi: Vec<f64>,
    #[serde(rename = "p_contact_MPa")]
    pub p_contact_mpa: Vec<f64>,
    #[serde(rename = "sigma_root_MPa")]
    pub sigma_root_mpa: Vec<f64>,
    #[serde(rename = "T2_Nm")]
    pub t2_nm: Vec<f64>,
    pub eta: Vec<f64>,
    #[serde(rename = "Nc_proxy")]
    pub nc_proxy: Vec<f64>,
    pub meta: ResultMeta,
}

impl CycleResult {
    /// Number of phase samples
    pub fn steps(&self) -> usize {
        self.phi.len()
    }

    /// Phase samples in degrees
    pub fn phi_deg(&self) -> Vec<f64> {
        self.phi.iter().map(|p| p * 180.0 / PI).collect()
    }
}

/// Scalar results of a computation.
///
/// `SF_root` and `SF_contact` are `None` when the wheel card lacks the S-N
/// data to compute them. `a_target_mm` and `delta_a_mm` are `None` when no
/// target centre distance was given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(non_snake_case)]
pub struct ResultMeta {
    pub z1: i64,
    pub z2: i64,
    pub d1_mm: f64,
    pub da1_mm: f64,
    pub df1_mm: f64,
    pub d2_mm: f64,
    pub da2_mm: f64,
    pub df2_mm: f64,
    pub a_mm: f64,
    pub a_calc_mm: f64,
    pub a_target_mm: Option<f64>,
    pub delta_a_mm: Option<f64>,
    pub x1: f64,
    pub x2: f64,
    pub gamma_deg: f64,
    pub eta0: f64,
    pub Eprime_GPa: f64,
    pub KA: f64,
    pub KV: f64,
    pub KHb: f64,
    pub KFb: f64,
    pub SF_root: Option<f64>,
    pub SF_contact: Option<f64>,
    pub damage_root: f64,
    pub N_life: f64,
    pub Fn_base_N: f64,
    pub rho_eq_mm: f64,
}

/// One meta value, typed the way it is reported.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetaValue {
    Int(i64),
    Float(f64),
    Null,
}

impl From<Option<f64>> for MetaValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(MetaValue::Null, MetaValue::Float)
    }
}

impl MetaValue {
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            MetaValue::Int(v) => Some(v as f64),
            MetaValue::Float(v) => Some(v),
            MetaValue::Null => None,
        }
    }
}

impl fmt::Display for MetaValue {
    /// Integers plainly, floats with a trailing `.0` when integral, absent
    /// values as `None`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            MetaValue::Int(v) => write!(f, "{}", v),
            MetaValue::Float(v) => f.write_str(&crate::export::format_float(v)),
            MetaValue::Null => f.write_str("None"),
        }
    }
}

impl ResultMeta {
    /// All entries as `(key, value)` in reporting order.
    pub fn entries(&self) -> Vec<(&'static str, MetaValue)> {
        use MetaValue::{Float, Int};
        vec![
            ("z1", Int(self.z1)),
            ("z2", Int(self.z2)),
            ("d1_mm", Float(self.d1_mm)),
            ("da1_mm", Float(self.da1_mm)),
            ("df1_mm", Float(self.df1_mm)),
            ("d2_mm", Float(self.d2_mm)),
            ("da2_mm", Float(self.da2_mm)),
            ("df2_mm", Float(self.df2_mm)),
            ("a_mm", Float(self.a_mm)),
            ("a_calc_mm", Float(self.a_calc_mm)),
            ("a_target_mm", self.a_target_mm.into()),
            ("delta_a_mm", self.delta_a_mm.into()),
            ("x1", Float(self.x1)),
            ("x2", Float(self.x2)),
            ("gamma_deg", Float(self.gamma_deg)),
            ("eta0", Float(self.eta0)),
            ("Eprime_GPa", Float(self.Eprime_GPa)),
            ("KA", Float(self.KA)),
            ("KV", Float(self.KV)),
            ("KHb", Float(self.KHb)),
            ("KFb", Float(self.KFb)),
            ("SF_root", self.SF_root.into()),
            ("SF_contact", self.SF_contact.into()),
            ("damage_root", Float(self.damage_root)),
            ("N_life", Float(self.N_life)),
            ("Fn_base_N", Float(self.Fn_base_N)),
            ("rho_eq_mm", Float(self.rho_eq_mm)),
        ]
    }

    /// Look up one entry by key
    pub fn get(&self, key: &str) -> Option<MetaValue> {
        self.entries()
            .into_iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }
}

/// Package the outputs of every stage into one result.
pub fn assemble(
    inputs: &InputSet,
    geometry: &Geometry,
    e_prime: Gigapascals,
    cycle: MeshCycle,
    fatigue: &FatigueResult,
) -> CycleResult {
    let base = cycle.baseline;
    let meta = ResultMeta {
        z1: geometry.z1,
        z2: geometry.z2,
        d1_mm: geometry.d1_mm,
        da1_mm: geometry.da1_mm,
        df1_mm: geometry.df1_mm,
        d2_mm: geometry.d2_mm,
        da2_mm: geometry.da2_mm,
        df2_mm: geometry.df2_mm,
        a_mm: geometry.a_mm,
        a_calc_mm: geometry.a_calc_mm,
        a_target_mm: geometry.a_target_mm,
        delta_a_mm: geometry.delta_a_mm,
        x1: inputs.x1,
        x2: inputs.x2,
        gamma_deg: geometry.gamma_deg(),
        eta0: base.eta0,
        Eprime_GPa: e_prime.0,
        KA: inputs.ka,
        KV: inputs.kv,
        KHb: inputs.khb,
        KFb: inputs.kfb,
        SF_root: fatigue.sf_root,
        SF_contact: fatigue.sf_contact,
        damage_root: fatigue.damage_root,
        N_life: fatigue.n_life,
        Fn_base_N: base.fn_base_n,
        rho_eq_mm: base.rho_eq_mm,
    };

    CycleResult {
        phi: cycle.phi,
        p_contact_mpa: cycle.p_contact_mpa,
        sigma_root_mpa: cycle.sigma_root_mpa,
        t2_nm: cycle.t2_nm,
        eta: cycle.eta,
        nc_proxy: cycle.nc_proxy,
        meta,
    }
}
