//! # Material Cards
//!
//! Material descriptions for the two members of a worm drive:
//!
//! - **Worm** ([`WormMaterial`]): a metal, constant elastic constants plus
//!   strength values for reference.
//! - **Wheel** ([`WheelMaterial`]): a polymer, temperature-dependent modulus
//!   and S-N fatigue data.
//!
//! Cards are plain values. They are read by the calculation and never
//! mutated by it; editing a card ([`WheelMaterial::with_card_edits`])
//! produces a new one. Keys the calculation does not know about are kept in
//! `extra` so a card survives a load/save round trip unchanged.
//!
//! ## JSON Format
//!
//! ```json
//! {
//!   "name": "PA66 (modified, draft)",
//!   "elastic_T": { "points_C_GPa": [[23, 3.0], [80, 1.8], [120, 1.2]] },
//!   "nu": 0.4,
//!   "SN": {
//!     "table": [ { "temp_C": 80, "N": 1e6, "contact_MPa": 60, "root_MPa": 35 } ],
//!     "contact_allow_MPa_vs_N": [[1e6, 60]],
//!     "root_allow_MPa_vs_N": [[1e6, 35]]
//!   }
//! }
//! ```

pub mod library;
pub mod properties;

pub use library::{MaterialKind, MaterialLibrary};
pub use properties::{equivalent_modulus, interp, interpolate_allowable, interpolate_modulus};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{CalcError, CalcResult};
use crate::units::Gigapascals;

/// Worm elastic modulus when the card has none (steel)
pub const DEFAULT_WORM_E_GPA: f64 = 210.0;
/// Worm Poisson ratio when the card has none
pub const DEFAULT_WORM_NU: f64 = 0.3;
/// Wheel flat modulus when the card has neither E(T) points nor E
pub const DEFAULT_WHEEL_E_GPA: f64 = 2.0;
/// Wheel Poisson ratio when the card has none
pub const DEFAULT_WHEEL_NU: f64 = 0.4;

/// Default S-N row cycle count when a table row omits `N`
const DEFAULT_SN_ROW_N: f64 = 1e6;

/// A `[key, value]` pair as stored on disk: `[temp_C, E_GPa]` or `[N, MPa]`.
pub type CurvePoint = [f64; 2];

/// Isotropic elastic constants.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElasticConstants {
    /// Young's modulus (GPa)
    #[serde(rename = "E_GPa", default, skip_serializing_if = "Option::is_none")]
    pub e_gpa: Option<f64>,
    /// Poisson ratio
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nu: Option<f64>,
}

/// Worm (metal) material card.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WormMaterial {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard: Option<String>,
    #[serde(default)]
    pub elastic: ElasticConstants,
    /// 0.2% proof stress (MPa)
    #[serde(rename = "Rp02_MPa", default, skip_serializing_if = "Option::is_none")]
    pub rp02_mpa: Option<f64>,
    /// Tensile strength (MPa)
    #[serde(rename = "Rm_MPa", default, skip_serializing_if = "Option::is_none")]
    pub rm_mpa: Option<f64>,
    /// Surface hardness (HRC)
    #[serde(rename = "HRC", default, skip_serializing_if = "Option::is_none")]
    pub hrc: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Unrecognised keys, preserved verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WormMaterial {
    /// Elastic modulus, 210 GPa when unspecified
    pub fn e(&self) -> Gigapascals {
        Gigapascals(self.elastic.e_gpa.unwrap_or(DEFAULT_WORM_E_GPA))
    }

    /// Poisson ratio, 0.3 when unspecified
    pub fn nu(&self) -> f64 {
        self.elastic.nu.unwrap_or(DEFAULT_WORM_NU)
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed worm material")
    }
}

/// Modulus-vs-temperature points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElasticTemperature {
    /// `[temp_C, E_GPa]` pairs
    #[serde(rename = "points_C_GPa", default)]
    pub points: Vec<CurvePoint>,
}

/// One row of the per-temperature S-N table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnRow {
    /// Test temperature (°C). Rows without one belong to the reference temperature.
    #[serde(rename = "temp_C", default, skip_serializing_if = "Option::is_none")]
    pub temp_c: Option<f64>,
    /// Cycle count
    #[serde(rename = "N", default = "default_sn_row_n")]
    pub n: f64,
    /// Allowable contact stress at N (MPa), 0 = not tabulated
    #[serde(rename = "contact_MPa", default)]
    pub contact_mpa: f64,
    /// Allowable root stress at N (MPa), 0 = not tabulated
    #[serde(rename = "root_MPa", default)]
    pub root_mpa: f64,
}

fn default_sn_row_n() -> f64 {
    DEFAULT_SN_ROW_N
}

impl SnRow {
    pub fn new(temp_c: f64, n: f64, contact_mpa: f64, root_mpa: f64) -> Self {
        SnRow {
            temp_c: Some(temp_c),
            n,
            contact_mpa,
            root_mpa,
        }
    }
}

/// Wheel S-N data.
///
/// `table` is the authoritative per-temperature source. The two flat
/// allow-vs-N lists are the slice at one temperature and are what the
/// safety-factor and damage lookups read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnData {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub table: Vec<SnRow>,
    /// `[N, MPa]` allowable contact stress
    #[serde(rename = "contact_allow_MPa_vs_N", default)]
    pub contact_allow: Vec<CurvePoint>,
    /// `[N, MPa]` allowable root stress
    #[serde(rename = "root_allow_MPa_vs_N", default)]
    pub root_allow: Vec<CurvePoint>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Wheel (polymer) material card.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WheelMaterial {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard: Option<String>,
    /// Flat modulus, used only when `elastic_T` has no points
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elastic: Option<ElasticConstants>,
    #[serde(rename = "elastic_T", default)]
    pub elastic_t: ElasticTemperature,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nu: Option<f64>,
    #[serde(rename = "SN", default)]
    pub sn: SnData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WheelMaterial {
    /// Poisson ratio, 0.4 when unspecified
    pub fn nu(&self) -> f64 {
        self.nu.unwrap_or(DEFAULT_WHEEL_NU)
    }

    /// Flat modulus fallback, 2.0 GPa when unspecified
    pub fn flat_e(&self) -> Gigapascals {
        Gigapascals(
            self.elastic
                .as_ref()
                .and_then(|e| e.e_gpa)
                .unwrap_or(DEFAULT_WHEEL_E_GPA),
        )
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed wheel material")
    }

    /// The S-N table as editable rows.
    ///
    /// Returns the stored table with missing temperatures set to
    /// `reference_temp_c`. A card that only carries the flat allow-vs-N lists
    /// gets one row per distinct N across both lists, at the reference
    /// temperature, with 0 where a list has no entry for that N.
    pub fn sn_rows(&self, reference_temp_c: f64) -> Vec<SnRow> {
        if !self.sn.table.is_empty() {
            return self
                .sn
                .table
                .iter()
                .map(|row| SnRow {
                    temp_c: Some(row.temp_c.unwrap_or(reference_temp_c)),
                    ..*row
                })
                .collect();
        }

        let mut contact = self.sn.contact_allow.clone();
        let mut root = self.sn.root_allow.clone();
        contact.sort_by(|a, b| a[0].total_cmp(&b[0]));
        root.sort_by(|a, b| a[0].total_cmp(&b[0]));

        let mut all_n: Vec<f64> = contact.iter().chain(root.iter()).map(|p| p[0]).collect();
        all_n.sort_by(f64::total_cmp);
        all_n.dedup();

        all_n
            .into_iter()
            .map(|n| {
                let lookup = |list: &[CurvePoint]| {
                    list.iter().find(|p| p[0] == n).map(|p| p[1]).unwrap_or(0.0)
                };
                SnRow::new(reference_temp_c, n, lookup(&contact), lookup(&root))
            })
            .collect()
    }

    /// Apply edited modulus points and S-N rows, returning a new card.
    ///
    /// The table is stored sorted by (temp_C, N). The flat allow-vs-N lists
    /// are rebuilt from the rows at the tabulated temperature nearest
    /// `reference_temp_c`, keeping only positive stresses. With no rows the
    /// flat lists are left as they were.
    pub fn with_card_edits(
        &self,
        modulus_points: Vec<CurvePoint>,
        rows: &[SnRow],
        reference_temp_c: f64,
    ) -> WheelMaterial {
        let mut table: Vec<SnRow> = rows
            .iter()
            .map(|row| SnRow {
                temp_c: Some(row.temp_c.unwrap_or(reference_temp_c)),
                ..*row
            })
            .collect();
        table.sort_by(|a, b| {
            let ta = a.temp_c.unwrap_or(reference_temp_c);
            let tb = b.temp_c.unwrap_or(reference_temp_c);
            ta.total_cmp(&tb).then(a.n.total_cmp(&b.n))
        });

        let mut card = self.clone();
        card.elastic_t = ElasticTemperature {
            points: modulus_points,
        };

        let nearest = table
            .iter()
            .filter_map(|row| row.temp_c)
            .min_by(|a, b| (a - reference_temp_c).abs().total_cmp(&(b - reference_temp_c).abs()));

        if let Some(t_pick) = nearest {
            let same_t = || {
                table
                    .iter()
                    .filter(move |row| row.temp_c.is_some_and(|t| (t - t_pick).abs() < 1e-9))
            };
            card.sn.contact_allow = same_t()
                .filter(|row| row.contact_mpa > 0.0)
                .map(|row| [row.n, row.contact_mpa])
                .collect();
            card.sn.root_allow = same_t()
                .filter(|row| row.root_mpa > 0.0)
                .map(|row| [row.n, row.root_mpa])
                .collect();
        }

        card.sn.table = table;
        card
    }
}

/// Parse modulus points typed as `temp:E` pairs, e.g. `"23:3.0, 80:1.8"`.
///
/// Fragments without a ':' are skipped. A fragment with a ':' but a
/// non-numeric side is an error naming the fragment.
pub fn parse_modulus_points(text: &str) -> CalcResult<Vec<CurvePoint>> {
    let mut points = Vec::new();
    for part in text.split(',') {
        let part = part.trim();
        let Some((temp, e)) = part.split_once(':') else {
            continue;
        };
        let parse = |s: &str| s.trim().parse::<f64>().ok();
        match (parse(temp), parse(e)) {
            (Some(t), Some(e)) => points.push([t, e]),
            _ => {
                return Err(CalcError::invalid_input(
                    "points_C_GPa",
                    part,
                    "Expected temp:E_GPa",
                ))
            }
        }
    }
    Ok(points)
}

/// Render modulus points as `temp:E` pairs with whole-degree temperatures.
pub fn format_modulus_points(points: &[CurvePoint]) -> String {
    points
        .iter()
        .map(|p| format!("{}:{}", p[0].trunc() as i64, p[1]))
        .collect::<Vec<_>>()
        .join(",")
}
