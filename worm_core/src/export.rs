//! # Tabular Export
//!
//! Flattens a [`CycleResult`] and the raw inputs it came from into three
//! named sheets:
//!
//! | Sheet          | Columns                                                               |
//! |----------------|-----------------------------------------------------------------------|
//! | `Cycle Curves` | phi_rad, phi_deg, p_contact_MPa, sigma_root_MPa, T2_Nm, eta, Nc_proxy |
//! | `Meta`         | Key, Value (one row per [`ResultMeta`](crate::calculations::ResultMeta) entry) |
//! | `Inputs`       | Key, Value (raw input strings as entered)                              |
//!
//! Sheets are written as one CSV file each. The full result can also be
//! written as pretty JSON.
//!
//! Numbers are rendered in shortest round-trip form. Integral floats keep a
//! trailing `.0`, very large or very small magnitudes switch to exponent
//! form (`1e-05`, `2.5e+16`), and absent values read `None`.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::calculations::CycleResult;
use crate::errors::{CalcError, CalcResult};
use crate::input::RawInputs;

/// Name of the per-phase sheet
pub const CYCLE_SHEET: &str = "Cycle Curves";
/// Name of the derived-scalars sheet
pub const META_SHEET: &str = "Meta";
/// Name of the raw-inputs sheet
pub const INPUTS_SHEET: &str = "Inputs";

/// Column headers of the per-phase sheet
pub const CYCLE_HEADERS: [&str; 7] = [
    "phi_rad",
    "phi_deg",
    "p_contact_MPa",
    "sigma_root_MPa",
    "T2_Nm",
    "eta",
    "Nc_proxy",
];

const KEY_VALUE_HEADERS: [&str; 2] = ["Key", "Value"];

/// One named sheet of string cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    fn new(name: &str, headers: &[&str]) -> Self {
        Table {
            name: name.to_string(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// File name used by [`ExportTables::write_csv_dir`]: lower-case,
    /// spaces to underscores.
    pub fn file_name(&self) -> String {
        format!("{}.csv", self.name.to_lowercase().replace(' ', "_"))
    }

    /// Write the sheet as CSV, header row first.
    pub fn write_csv<W: Write>(&self, writer: W) -> CalcResult<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(&self.headers)?;
        for row in &self.rows {
            csv_writer.write_record(row)?;
        }
        csv_writer
            .flush()
            .map_err(|e| CalcError::serialization(format!("CSV flush failed: {}", e)))?;
        Ok(())
    }
}

/// The three export sheets of one computation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportTables {
    pub cycle_curves: Table,
    pub meta: Table,
    pub inputs: Table,
}

impl ExportTables {
    /// Build the sheets from the raw inputs and the result they produced.
    pub fn build(raw_inputs: &RawInputs, result: &CycleResult) -> Self {
        let mut cycle_curves = Table::new(CYCLE_SHEET, &CYCLE_HEADERS);
        let phi_deg = result.phi_deg();
        for i in 0..result.steps() {
            cycle_curves.rows.push(
                [
                    result.phi[i],
                    phi_deg[i],
                    result.p_contact_mpa[i],
                    result.sigma_root_mpa[i],
                    result.t2_nm[i],
                    result.eta[i],
                    result.nc_proxy[i],
                ]
                .iter()
                .map(|&v| format_float(v))
                .collect(),
            );
        }

        let mut meta = Table::new(META_SHEET, &KEY_VALUE_HEADERS);
        for (key, value) in result.meta.entries() {
            meta.rows.push(vec![key.to_string(), value.to_string()]);
        }

        let mut inputs = Table::new(INPUTS_SHEET, &KEY_VALUE_HEADERS);
        for (key, value) in raw_inputs.iter() {
            inputs.rows.push(vec![key.to_string(), value.to_string()]);
        }

        ExportTables {
            cycle_curves,
            meta,
            inputs,
        }
    }

    /// Sheets in workbook order
    pub fn tables(&self) -> [&Table; 3] {
        [&self.cycle_curves, &self.meta, &self.inputs]
    }

    /// Write one CSV per sheet into `dir` (created if missing).
    ///
    /// Returns the written paths in sheet order.
    pub fn write_csv_dir(&self, dir: &Path) -> CalcResult<Vec<PathBuf>> {
        create_dir(dir)?;

        let mut written = Vec::with_capacity(3);
        for table in self.tables() {
            let path = dir.join(table.file_name());
            let file = File::create(&path).map_err(|e| {
                CalcError::file_error("create", path.display().to_string(), e.to_string())
            })?;
            table.write_csv(file)?;
            written.push(path);
        }

        info!(dir = %dir.display(), files = written.len(), "exported CSV sheets");
        Ok(written)
    }
}

/// Write the full result as pretty JSON.
pub fn write_result_json(result: &CycleResult, path: &Path) -> CalcResult<()> {
    if let Some(parent) = path.parent() {
        create_dir(parent)?;
    }
    let json = serde_json::to_string_pretty(result)?;
    fs::write(path, json).map_err(|e| {
        CalcError::file_error("write", path.display().to_string(), e.to_string())
    })?;
    info!(path = %path.display(), "exported result JSON");
    Ok(())
}

fn create_dir(dir: &Path) -> CalcResult<()> {
    if dir.as_os_str().is_empty() {
        return Ok(());
    }
    fs::create_dir_all(dir).map_err(|e| {
        CalcError::file_error("create directory", dir.display().to_string(), e.to_string())
    })
}

/// Render a float in shortest round-trip form.
///
/// Decimal notation for decimal exponents in [-4, 16), with `.0` appended to
/// integral values; exponent notation with a signed, at least two digit
/// exponent otherwise. `nan`, `inf` and `-inf` are spelled out.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0.0" } else { "0.0" }.to_string();
    }

    // `{:e}` gives the shortest round-trip digits, e.g. "1.5e-7"
    let scientific = format!("{:e}", value);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (scientific.as_str(), 0),
    };

    if (-4..16).contains(&exponent) {
        let plain = value.to_string();
        if plain.contains('.') {
            plain
        } else {
            format!("{}.0", plain)
        }
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exponent.abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::calculate;
    use crate::input::InputSet;
    use crate::materials::{WheelMaterial, WormMaterial};
    use tempfile::TempDir;

    fn reference() -> (RawInputs, CycleResult) {
        let mut raw = RawInputs::with_defaults();
        raw.set("steps", "36");
        let inputs = InputSet::from_raw(&raw).inputs;
        let result =
            calculate(&inputs, &WormMaterial::default(), &WheelMaterial::default()).unwrap();
        (raw, result)
    }

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(25.0), "25.0");
        assert_eq!(format_float(-3.0), "-3.0");
        assert_eq!(format_float(0.06), "0.06");
        assert_eq!(format_float(0.0001), "0.0001");
        assert_eq!(format_float(0.00001), "1e-05");
        assert_eq!(format_float(1.5e-7), "1.5e-07");
        assert_eq!(format_float(1e15), "1000000000000000.0");
        assert_eq!(format_float(1e16), "1e+16");
        assert_eq!(format_float(2.5e20), "2.5e+20");
        assert_eq!(format_float(21_600_000.0), "21600000.0");
        assert_eq!(format_float(0.0), "0.0");
        assert_eq!(format_float(f64::NAN), "nan");
        assert_eq!(format_float(f64::NEG_INFINITY), "-inf");
    }

    #[test]
    fn test_cycle_sheet_shape() {
        let (raw, result) = reference();
        let tables = ExportTables::build(&raw, &result);
        let curves = &tables.cycle_curves;
        assert_eq!(curves.name, "Cycle Curves");
        assert_eq!(curves.headers, CYCLE_HEADERS);
        assert_eq!(curves.rows.len(), 36);
        assert!(curves.rows.iter().all(|r| r.len() == 7));
        assert_eq!(curves.rows[0][0], "0.0");
        assert_eq!(curves.rows[0][1], "0.0");
    }

    #[test]
    fn test_meta_and_inputs_sheets() {
        let (raw, result) = reference();
        let tables = ExportTables::build(&raw, &result);

        assert_eq!(tables.meta.headers, vec!["Key", "Value"]);
        assert_eq!(tables.meta.rows.len(), 27);
        assert_eq!(tables.meta.rows[0], vec!["z1", "2"]);
        assert_eq!(tables.meta.rows[1], vec!["z2", "50"]);
        assert_eq!(tables.meta.rows[2], vec!["d1_mm", "25.0"]);
        let sf_root = tables.meta.rows.iter().find(|r| r[0] == "SF_root").unwrap();
        assert_eq!(sf_root[1], "None");

        assert_eq!(tables.inputs.rows.len(), raw.len());
        assert_eq!(tables.inputs.rows[0][0], "T1_Nm");
        assert_eq!(tables.inputs.rows[1][0], "n1_rpm");
        assert_eq!(tables.inputs.rows.last().unwrap()[0], "steps");
        let steps = tables.inputs.rows.iter().find(|r| r[0] == "steps").unwrap();
        assert_eq!(steps[1], "36");
    }

    #[test]
    fn test_write_csv_dir() {
        let (raw, result) = reference();
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("export");
        let written = ExportTables::build(&raw, &result).write_csv_dir(&out).unwrap();

        let names: Vec<_> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["cycle_curves.csv", "meta.csv", "inputs.csv"]);

        let mut reader = csv::Reader::from_path(out.join("cycle_curves.csv")).unwrap();
        assert_eq!(reader.headers().unwrap().len(), 7);
        assert_eq!(reader.records().count(), 36);
    }

    #[test]
    fn test_write_result_json() {
        let (_, result) = reference();
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("result.json");
        write_result_json(&result, &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["phi"].as_array().unwrap().len(), 36);
        assert!(value["meta"]["SF_contact"].is_null());
    }
}
