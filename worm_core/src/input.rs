//! # Drive Inputs
//!
//! The calculation boundary. A form (GUI, CLI, JSON file) supplies a flat
//! map of string values, [`RawInputs`]. It is parsed exactly once into a
//! typed [`InputSet`] with an explicit default per field; nothing downstream
//! re-parses strings.
//!
//! Two parse policies are offered:
//!
//! - [`InputSet::from_raw`] is lenient: a missing, blank or unparsable value
//!   falls back to the field default and the substitution is recorded.
//! - [`InputSet::parse`] is strict: missing or blank still means default, but
//!   an unparsable value is an [`CalcError::InvalidInput`].
//!
//! ## Example
//!
//! ```rust
//! use worm_core::input::{InputSet, RawInputs};
//!
//! let mut raw = RawInputs::new();
//! raw.set("T1_Nm", "8.5");
//! raw.set("z1", "3");
//!
//! let parsed = InputSet::from_raw(&raw);
//! assert_eq!(parsed.inputs.z1, 3);
//! assert_eq!(parsed.inputs.ratio, 25.0); // default
//! assert!(parsed.coercions.is_empty());
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::{CalcError, CalcResult};
use crate::units::{Degrees, Radians};

/// Raw string-valued inputs exactly as a form supplies them.
///
/// Keys are the parameter names (`T1_Nm`, `mn_mm`, ...). Values are kept as
/// the user typed them so they can be echoed back in exports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawInputs(BTreeMap<String, String>);

impl RawInputs {
    /// Create an empty input map
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw inputs pre-filled with every field default, as a fresh form shows them.
    pub fn with_defaults() -> Self {
        let mut raw = Self::new();
        for field in FIELDS {
            raw.set(field.key, field.default_text());
        }
        raw.set(A_TARGET_KEY, "");
        raw
    }

    /// Set (or replace) one value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Look up one value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Iterate over `(key, value)` pairs: form fields in form order, then
    /// any other keys sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        let form = FORM_ORDER
            .iter()
            .filter_map(move |key| self.0.get_key_value(*key));
        let extra = self
            .0
            .iter()
            .filter(|(key, _)| !FORM_ORDER.contains(&key.as_str()));
        form.chain(extra).map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Build from a JSON object whose values are strings, numbers or null.
    pub fn from_json_str(text: &str) -> CalcResult<Self> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        let object = value
            .as_object()
            .ok_or_else(|| CalcError::serialization("Input document must be a JSON object"))?;

        let mut raw = Self::new();
        for (key, value) in object {
            let text = match value {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Null => String::new(),
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                other => {
                    return Err(CalcError::invalid_input(
                        key.clone(),
                        other.to_string(),
                        "Expected a string or number",
                    ))
                }
            };
            raw.set(key.clone(), text);
        }
        Ok(raw)
    }

    /// Build from a TOML table of `key = value` pairs.
    pub fn from_toml_str(text: &str) -> CalcResult<Self> {
        let table: toml::Table =
            toml::from_str(text).map_err(|e| CalcError::serialization(e.to_string()))?;

        let mut raw = Self::new();
        for (key, value) in table {
            let text = match value {
                toml::Value::String(s) => s,
                toml::Value::Integer(i) => i.to_string(),
                toml::Value::Float(f) => f.to_string(),
                toml::Value::Boolean(b) => b.to_string(),
                other => {
                    return Err(CalcError::invalid_input(
                        key,
                        other.to_string(),
                        "Expected a string or number",
                    ))
                }
            };
            raw.set(key, text);
        }
        Ok(raw)
    }
}

impl FromIterator<(String, String)> for RawInputs {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        RawInputs(iter.into_iter().collect())
    }
}

/// A field name with its default, as shown on the input form.
struct Field {
    key: &'static str,
    default: f64,
}

impl Field {
    fn default_text(&self) -> String {
        self.default.to_string()
    }
}

const A_TARGET_KEY: &str = "a_target_mm";
const CROSS_ANGLE_KEY: &str = "cross_angle_deg";

/// Keys in the order the input form lays them out
static FORM_ORDER: [&str; 21] = [
    "T1_Nm",
    "n1_rpm",
    "ratio",
    "z1",
    "mn_mm",
    "q",
    "x1",
    "x2",
    A_TARGET_KEY,
    "b_mm",
    "alpha_n_deg",
    CROSS_ANGLE_KEY,
    "rho_f_mm",
    "mu",
    "KA",
    "KV",
    "KHb",
    "KFb",
    "temp_C",
    "life_h",
    "steps",
];

const FIELDS: [Field; 20] = [
    Field { key: "T1_Nm", default: 6.0 },
    Field { key: "n1_rpm", default: 3000.0 },
    Field { key: "ratio", default: 25.0 },
    Field { key: "z1", default: 2.0 },
    Field { key: "mn_mm", default: 2.5 },
    Field { key: "q", default: 10.0 },
    Field { key: "x1", default: 0.0 },
    Field { key: "x2", default: 0.0 },
    Field { key: "b_mm", default: 18.0 },
    Field { key: "alpha_n_deg", default: 20.0 },
    Field { key: "mu", default: 0.06 },
    Field { key: "KA", default: 1.10 },
    Field { key: "KV", default: 1.05 },
    Field { key: "KHb", default: 1.00 },
    Field { key: "KFb", default: 1.00 },
    Field { key: "temp_C", default: 80.0 },
    Field { key: "life_h", default: 3000.0 },
    Field { key: "steps", default: 720.0 },
    Field { key: "rho_f_mm", default: 0.6 },
    Field { key: "cross_angle_deg", default: 90.0 },
];

fn default_for(key: &str) -> f64 {
    FIELDS
        .iter()
        .find(|f| f.key == key)
        .map(|f| f.default)
        .unwrap_or(0.0)
}

/// A default substituted for an unparsable value by the lenient parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputCoercion {
    pub field: String,
    pub raw_value: String,
    /// `None` when an optional field was left unset instead
    pub used_default: Option<f64>,
}

/// Lenient parse outcome: the typed inputs plus any substitutions made.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedInputs {
    pub inputs: InputSet,
    pub coercions: Vec<InputCoercion>,
}

/// Typed, validated-once drive inputs.
///
/// ## JSON Example
///
/// ```json
/// {
///   "t1_nm": 6.0, "n1_rpm": 3000.0, "ratio": 25.0, "z1": 2,
///   "mn_mm": 2.5, "q": 10.0, "x1": 0.0, "x2": 0.0, "a_target_mm": null,
///   "b_mm": 18.0, "alpha_n_deg": 20.0, "mu": 0.06,
///   "ka": 1.1, "kv": 1.05, "khb": 1.0, "kfb": 1.0,
///   "temp_c": 80.0, "life_h": 3000.0, "steps": 720,
///   "rho_f_mm": 0.6, "cross_angle_deg": 90.0
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSet {
    /// Input (worm) torque T1 in N·m
    pub t1_nm: f64,
    /// Worm speed n1 in rpm
    pub n1_rpm: f64,
    /// Transmission ratio i
    pub ratio: f64,
    /// Number of worm threads (starts)
    pub z1: i64,
    /// Normal module in mm
    pub mn_mm: f64,
    /// Worm diameter factor q
    pub q: f64,
    /// Worm profile shift coefficient
    pub x1: f64,
    /// Wheel profile shift coefficient
    pub x2: f64,
    /// Target centre distance in mm (None = use calculated)
    pub a_target_mm: Option<f64>,
    /// Face width in mm
    pub b_mm: f64,
    /// Normal pressure angle in degrees
    pub alpha_n_deg: f64,
    /// Coefficient of friction
    pub mu: f64,
    /// Application factor
    pub ka: f64,
    /// Dynamic factor
    pub kv: f64,
    /// Face load factor (contact)
    pub khb: f64,
    /// Face load factor (root)
    pub kfb: f64,
    /// Operating temperature in °C
    pub temp_c: f64,
    /// Design life in hours
    pub life_h: f64,
    /// Number of phase samples over one mesh cycle
    pub steps: i64,
    /// Root fillet radius in mm. Accepted and echoed, not used by the stress proxies.
    pub rho_f_mm: f64,
    /// Shaft crossing angle in degrees. Accepted and echoed, not used.
    pub cross_angle_deg: f64,
}

impl Default for InputSet {
    fn default() -> Self {
        InputSet::from_raw(&RawInputs::new()).inputs
    }
}

/// Parse policy shared by the lenient and strict constructors.
///
/// Every read yields a value. In strict mode an unparsable value is also
/// recorded as an error, and the first one is reported.
struct Reader<'a> {
    raw: &'a RawInputs,
    strict: bool,
    coercions: Vec<InputCoercion>,
    errors: Vec<CalcError>,
}

impl<'a> Reader<'a> {
    fn new(raw: &'a RawInputs, strict: bool) -> Self {
        Reader {
            raw,
            strict,
            coercions: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn reject(&mut self, key: &str, text: &str, default: Option<f64>) {
        if self.strict {
            self.errors.push(CalcError::invalid_input(key, text, "Not a number"));
            return;
        }
        warn!(field = key, value = text, ?default, "unparsable input, using default");
        self.coercions.push(InputCoercion {
            field: key.to_string(),
            raw_value: text.to_string(),
            used_default: default,
        });
    }

    fn number(&mut self, key: &str) -> f64 {
        let default = default_for(key);
        let text = match self.raw.get(key).map(str::trim) {
            None | Some("") => return default,
            Some(text) => text,
        };
        parse_number(text).unwrap_or_else(|| {
            self.reject(key, text, Some(default));
            default
        })
    }

    /// Integers are read as floats and truncated toward zero, so "2.0" and "2.7" both give 2.
    fn integer(&mut self, key: &str) -> i64 {
        self.number(key).trunc() as i64
    }

    fn optional(&mut self, key: &str) -> Option<f64> {
        let text = match self.raw.get(key).map(str::trim) {
            None | Some("") => return None,
            Some(text) => text,
        };
        let value = parse_number(text);
        if value.is_none() {
            self.reject(key, text, None);
        }
        value
    }

    fn read(mut self) -> (ParsedInputs, Vec<CalcError>) {
        let inputs = InputSet {
            t1_nm: self.number("T1_Nm"),
            n1_rpm: self.number("n1_rpm"),
            ratio: self.number("ratio"),
            z1: self.integer("z1"),
            mn_mm: self.number("mn_mm"),
            q: self.number("q"),
            x1: self.number("x1"),
            x2: self.number("x2"),
            a_target_mm: self.optional(A_TARGET_KEY),
            b_mm: self.number("b_mm"),
            alpha_n_deg: self.number("alpha_n_deg"),
            mu: self.number("mu"),
            ka: self.number("KA"),
            kv: self.number("KV"),
            khb: self.number("KHb"),
            kfb: self.number("KFb"),
            temp_c: self.number("temp_C"),
            life_h: self.number("life_h"),
            steps: self.integer("steps"),
            rho_f_mm: self.number("rho_f_mm"),
            cross_angle_deg: self.number(CROSS_ANGLE_KEY),
        };
        let parsed = ParsedInputs {
            inputs,
            coercions: self.coercions,
        };
        (parsed, self.errors)
    }
}

/// Parse a float the way a form field is typed: surrounding whitespace is
/// ignored, "inf"/"nan" spellings are accepted like any float literal.
fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok()
}

impl InputSet {
    /// Lenient parse. Never fails.
    pub fn from_raw(raw: &RawInputs) -> ParsedInputs {
        Reader::new(raw, false).read().0
    }

    /// Strict parse: unparsable values are reported instead of defaulted.
    pub fn parse(raw: &RawInputs) -> CalcResult<InputSet> {
        let (parsed, errors) = Reader::new(raw, true).read();
        match errors.into_iter().next() {
            Some(error) => Err(error),
            None => Ok(parsed.inputs),
        }
    }

    /// Normal pressure angle in radians
    pub fn alpha_n(&self) -> Radians {
        Degrees(self.alpha_n_deg).into()
    }

    /// Validate the invariants the full calculation relies on.
    ///
    /// z1 ≥ 1, mn > 0, steps ≥ 1, ratio > 0 and every value finite.
    pub fn validate(&self) -> CalcResult<()> {
        if self.z1 < 1 {
            return Err(CalcError::invalid_input(
                "z1",
                self.z1.to_string(),
                "Worm needs at least one thread",
            ));
        }
        if self.steps < 1 {
            return Err(CalcError::invalid_input(
                "steps",
                self.steps.to_string(),
                "Need at least one phase sample",
            ));
        }
        if self.mn_mm.is_nan() || self.mn_mm <= 0.0 {
            return Err(CalcError::invalid_input(
                "mn_mm",
                self.mn_mm.to_string(),
                "Module must be positive",
            ));
        }
        if self.ratio.is_nan() || self.ratio <= 0.0 {
            return Err(CalcError::invalid_input(
                "ratio",
                self.ratio.to_string(),
                "Ratio must be positive",
            ));
        }

        let finite = [
            ("T1_Nm", self.t1_nm),
            ("n1_rpm", self.n1_rpm),
            ("ratio", self.ratio),
            ("mn_mm", self.mn_mm),
            ("q", self.q),
            ("x1", self.x1),
            ("x2", self.x2),
            ("b_mm", self.b_mm),
            ("alpha_n_deg", self.alpha_n_deg),
            ("mu", self.mu),
            ("KA", self.ka),
            ("KV", self.kv),
            ("KHb", self.khb),
            ("KFb", self.kfb),
            ("temp_C", self.temp_c),
            ("life_h", self.life_h),
        ];
        for (field, value) in finite {
            if !value.is_finite() {
                return Err(CalcError::invalid_input(field, value.to_string(), "Value must be finite"));
            }
        }
        if let Some(a) = self.a_target_mm {
            if !a.is_finite() {
                return Err(CalcError::invalid_input(A_TARGET_KEY, a.to_string(), "Value must be finite"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_form() {
        let inputs = InputSet::default();
        assert_eq!(inputs.t1_nm, 6.0);
        assert_eq!(inputs.n1_rpm, 3000.0);
        assert_eq!(inputs.z1, 2);
        assert_eq!(inputs.steps, 720);
        assert_eq!(inputs.ka, 1.10);
        assert_eq!(inputs.a_target_mm, None);
        assert!(inputs.validate().is_ok());
    }

    #[test]
    fn test_lenient_parse_substitutes_default() {
        let mut raw = RawInputs::new();
        raw.set("ratio", "abc");
        raw.set("mu", " 0.08 ");
        let parsed = InputSet::from_raw(&raw);
        assert_eq!(parsed.inputs.ratio, 25.0);
        assert_eq!(parsed.inputs.mu, 0.08);
        assert_eq!(parsed.coercions.len(), 1);
        assert_eq!(parsed.coercions[0].field, "ratio");
        assert_eq!(parsed.coercions[0].raw_value, "abc");
    }

    #[test]
    fn test_strict_parse_names_field() {
        let mut raw = RawInputs::new();
        raw.set("ratio", "abc");
        match InputSet::parse(&raw) {
            Err(CalcError::InvalidInput { field, value, .. }) => {
                assert_eq!(field, "ratio");
                assert_eq!(value, "abc");
            }
            other => panic!("expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_values_use_defaults() {
        let mut raw = RawInputs::new();
        raw.set("b_mm", "   ");
        raw.set("a_target_mm", "");
        let inputs = InputSet::parse(&raw).unwrap();
        assert_eq!(inputs.b_mm, 18.0);
        assert_eq!(inputs.a_target_mm, None);
    }

    #[test]
    fn test_integer_fields_truncate() {
        let mut raw = RawInputs::new();
        raw.set("z1", "2.9");
        raw.set("steps", "360.0");
        let inputs = InputSet::parse(&raw).unwrap();
        assert_eq!(inputs.z1, 2);
        assert_eq!(inputs.steps, 360);
    }

    #[test]
    fn test_a_target_parsed() {
        let mut raw = RawInputs::new();
        raw.set("a_target_mm", "76.5");
        let inputs = InputSet::parse(&raw).unwrap();
        assert_eq!(inputs.a_target_mm, Some(76.5));
    }

    #[test]
    fn test_validate_rejects_invariant_violations() {
        let mut inputs = InputSet::default();
        inputs.z1 = 0;
        assert!(inputs.validate().is_err());

        let mut inputs = InputSet::default();
        inputs.steps = 0;
        assert!(inputs.validate().is_err());

        let mut inputs = InputSet::default();
        inputs.mn_mm = 0.0;
        assert!(inputs.validate().is_err());

        let mut inputs = InputSet::default();
        inputs.ratio = -1.0;
        assert!(inputs.validate().is_err());

        let mut inputs = InputSet::default();
        inputs.t1_nm = f64::INFINITY;
        assert!(inputs.validate().is_err());
    }

    #[test]
    fn test_raw_from_json_accepts_numbers_and_strings() {
        let raw = RawInputs::from_json_str(r#"{"T1_Nm": 7.5, "z1": "1", "a_target_mm": null}"#).unwrap();
        assert_eq!(raw.get("T1_Nm"), Some("7.5"));
        assert_eq!(raw.get("z1"), Some("1"));
        assert_eq!(raw.get("a_target_mm"), Some(""));

        assert!(RawInputs::from_json_str("[1, 2]").is_err());
    }

    #[test]
    fn test_raw_from_toml() {
        let raw = RawInputs::from_toml_str("T1_Nm = 7.5\nz1 = 1\nmn_mm = \"3.0\"\n").unwrap();
        let inputs = InputSet::parse(&raw).unwrap();
        assert_eq!(inputs.t1_nm, 7.5);
        assert_eq!(inputs.z1, 1);
        assert_eq!(inputs.mn_mm, 3.0);
    }

    #[test]
    fn test_with_defaults_parses_to_default() {
        let raw = RawInputs::with_defaults();
        assert_eq!(raw.get("a_target_mm"), Some(""));
        let inputs = InputSet::parse(&raw).unwrap();
        assert_eq!(inputs, InputSet::default());
    }

    #[test]
    fn test_iter_follows_form_order() {
        let mut raw = RawInputs::with_defaults();
        raw.set("zeta", "1");
        raw.set("Aux", "2");
        let keys: Vec<&str> = raw.iter().map(|(k, _)| k).collect();

        assert_eq!(keys.len(), 23);
        assert_eq!(&keys[..4], ["T1_Nm", "n1_rpm", "ratio", "z1"]);
        assert_eq!(keys[8], "a_target_mm");
        assert_eq!(keys[11], "cross_angle_deg");
        assert_eq!(keys[20], "steps");
        assert_eq!(&keys[21..], ["Aux", "zeta"]);
    }

    #[test]
    fn test_iter_skips_absent_form_keys() {
        let raw: RawInputs = [("steps", "4"), ("mu", "0.1"), ("T1_Nm", "5")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let pairs: Vec<(&str, &str)> = raw.iter().collect();
        assert_eq!(pairs, vec![("T1_Nm", "5"), ("mu", "0.1"), ("steps", "4")]);
    }
}
