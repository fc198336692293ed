//! # Wormcalc CLI
//!
//! Headless front end for `worm_core`: assembles the inputs from a file and
//! `--set` overrides, loads the two material cards from a library directory,
//! runs the calculation and prints the fatigue summary (or the full result
//! as JSON). Logs go to stderr, controlled by `RUST_LOG`.
//!
//! ```text
//! wormcalc run --set T1_Nm=8 --set temp_C=60 --export-dir out/
//! wormcalc run --inputs drive.toml --wheel PA66_modified_draft.json --json
//! wormcalc materials list
//! wormcalc materials import --kind wheel ~/cards/PA46.json
//! wormcalc fit-center --set a_target_mm=80
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{info, warn};

use worm_core::calculations::geometry::{fit_center_distance, CenterDistanceFit, GeometryParams};
use worm_core::calculations::calculate;
use worm_core::export::{write_result_json, ExportTables};
use worm_core::input::{InputSet, RawInputs};
use worm_core::materials::{parse_modulus_points, MaterialKind, MaterialLibrary, WheelMaterial};
use worm_core::report::FatigueSummary;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "wormcalc")]
#[command(about = "Worm-gear drive calculator: mesh-cycle stresses, efficiency and fatigue")]
#[command(version)]
struct CliArgs {
    /// Material library root (contains metals/ and polymers/)
    #[arg(long, global = true, env = "WORMCALC_MATERIALS_DIR", default_value = "materials")]
    materials_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one calculation and print the fatigue summary
    Run(RunArgs),

    /// Suggest a centre distance, or the wheel profile shift that hits a_target_mm
    FitCenter(InputArgs),

    /// Inspect or extend the material library
    Materials {
        #[command(subcommand)]
        command: MaterialsCommand,
    },
}

#[derive(Args, Debug)]
struct InputArgs {
    /// JSON or TOML file of input values (keys as in the form: T1_Nm, mn_mm, ...)
    #[arg(long, value_name = "FILE")]
    inputs: Option<PathBuf>,

    /// Override one input, e.g. --set T1_Nm=8.5 (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    overrides: Vec<(String, String)>,

    /// Reject unparsable values instead of falling back to defaults
    #[arg(long)]
    strict: bool,
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Worm card file name under metals/ (default: 37CrS4.json or first listed)
    #[arg(long)]
    worm: Option<String>,

    /// Wheel card file name under polymers/ (default: PA66_modified_draft.json or first listed)
    #[arg(long)]
    wheel: Option<String>,

    /// Replace the wheel E(T) points for this run, e.g. "20:3.0, 80:1.8"
    #[arg(long, value_name = "POINTS")]
    modulus_points: Option<String>,

    /// Write cycle_curves.csv, meta.csv, inputs.csv and result.json here
    #[arg(long, value_name = "DIR")]
    export_dir: Option<PathBuf>,

    /// Print the full result as JSON instead of the summary
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum MaterialsCommand {
    /// List the cards in the library
    List,

    /// Copy an external card into the library
    Import {
        /// Which member the card describes
        #[arg(long, value_enum)]
        kind: CardKind,

        /// Path of the card to import
        path: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CardKind {
    Worm,
    Wheel,
}

fn parse_key_value(text: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = text
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", text))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{}'", text));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

// ============================================================================
// Inputs
// ============================================================================

/// Form defaults, overlaid by the inputs file, overlaid by `--set`.
fn load_raw_inputs(args: &InputArgs) -> Result<RawInputs> {
    let mut raw = RawInputs::with_defaults();

    if let Some(path) = &args.inputs {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read inputs file {}", path.display()))?;
        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        let from_file = if is_toml {
            RawInputs::from_toml_str(&text)
        } else {
            RawInputs::from_json_str(&text)
        }
        .with_context(|| format!("Failed to parse inputs file {}", path.display()))?;

        for (key, value) in from_file.iter() {
            raw.set(key, value);
        }
    }

    for (key, value) in &args.overrides {
        raw.set(key.as_str(), value.as_str());
    }
    Ok(raw)
}

fn typed_inputs(raw: &RawInputs, strict: bool) -> Result<InputSet> {
    if strict {
        return InputSet::parse(raw).context("Invalid inputs");
    }
    let parsed = InputSet::from_raw(raw);
    if !parsed.coercions.is_empty() {
        warn!(count = parsed.coercions.len(), "some inputs were replaced by defaults");
    }
    Ok(parsed.inputs)
}

// ============================================================================
// Commands
// ============================================================================

fn open_library(dir: &Path) -> Result<MaterialLibrary> {
    MaterialLibrary::open(dir)
        .with_context(|| format!("Failed to open material library at {}", dir.display()))
}

fn run(library_dir: &Path, args: &RunArgs) -> Result<()> {
    let raw = load_raw_inputs(&args.input)?;
    let inputs = typed_inputs(&raw, args.input.strict)?;

    let library = open_library(library_dir)?;
    let worm_name = match &args.worm {
        Some(name) => name.clone(),
        None => library.default_worm_name()?,
    };
    let wheel_name = match &args.wheel {
        Some(name) => name.clone(),
        None => library.default_wheel_name()?,
    };
    let worm = library
        .load_worm(&worm_name)
        .with_context(|| format!("Failed to load worm card {}", worm_name))?;
    let mut wheel = library
        .load_wheel(&wheel_name)
        .with_context(|| format!("Failed to load wheel card {}", wheel_name))?;

    if let Some(text) = &args.modulus_points {
        wheel = edited_wheel(&wheel, text, inputs.temp_c)?;
    }

    info!(worm = %worm_name, wheel = %wheel_name, "running calculation");
    let result = calculate(&inputs, &worm, &wheel)?;

    if let Some(dir) = &args.export_dir {
        let written = ExportTables::build(&raw, &result).write_csv_dir(dir)?;
        write_result_json(&result, &dir.join("result.json"))?;
        info!(dir = %dir.display(), files = written.len() + 1, "export complete");
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("Worm:  {}", worm.display_name());
        println!("Wheel: {}", wheel.display_name());
        println!();
        print!("{}", FatigueSummary::from_result(&result).render_text());
    }
    Ok(())
}

/// The wheel card with its E(T) points replaced. The S-N table is carried
/// over as rows at the run temperature.
fn edited_wheel(wheel: &WheelMaterial, points_text: &str, temp_c: f64) -> Result<WheelMaterial> {
    let points = parse_modulus_points(points_text).context("Invalid --modulus-points")?;
    if points.is_empty() {
        bail!("--modulus-points contains no TEMP:E pairs");
    }
    let rows = wheel.sn_rows(temp_c);
    Ok(wheel.with_card_edits(points, &rows, temp_c))
}

fn fit_center(args: &InputArgs) -> Result<()> {
    let raw = load_raw_inputs(args)?;
    let inputs = typed_inputs(&raw, args.strict)?;

    match fit_center_distance(&GeometryParams::from(&inputs))? {
        CenterDistanceFit::SuggestTarget { a_target_mm } => {
            println!("a_target_mm = {:.3}", a_target_mm);
        }
        CenterDistanceFit::SuggestWheelShift { x2 } => {
            println!("x2 = {:.4}", x2);
        }
    }
    Ok(())
}

fn materials(library_dir: &Path, command: &MaterialsCommand) -> Result<()> {
    let library = open_library(library_dir)?;
    match command {
        MaterialsCommand::List => {
            for kind in [MaterialKind::Metal, MaterialKind::Polymer] {
                let default = library.default_card_name(kind).ok();
                println!("{}/", kind.subdir());
                for name in library.list(kind)? {
                    let marker = if default.as_deref() == Some(name.as_str()) { "*" } else { " " };
                    println!("  {} {}", marker, name);
                }
            }
        }
        MaterialsCommand::Import { kind, path } => {
            let stored = match kind {
                CardKind::Worm => library.import_worm(path),
                CardKind::Wheel => library.import_wheel(path),
            }
            .map_err(|e| anyhow!("Import of {} failed: {}", path.display(), e))?;
            println!("Imported {}", stored);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();

    match &args.command {
        Command::Run(run_args) => run(&args.materials_dir, run_args),
        Command::FitCenter(input_args) => fit_center(input_args),
        Command::Materials { command } => materials(&args.materials_dir, command),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("T1_Nm = 8.5").unwrap(),
            ("T1_Nm".to_string(), "8.5".to_string())
        );
        assert_eq!(
            parse_key_value("a_target_mm=").unwrap(),
            ("a_target_mm".to_string(), String::new())
        );
        assert!(parse_key_value("T1_Nm").is_err());
        assert!(parse_key_value("=3").is_err());
    }

    #[test]
    fn test_overrides_win_over_defaults() {
        let args = InputArgs {
            inputs: None,
            overrides: vec![("z1".to_string(), "3".to_string())],
            strict: false,
        };
        let raw = load_raw_inputs(&args).unwrap();
        let inputs = typed_inputs(&raw, false).unwrap();
        assert_eq!(inputs.z1, 3);
        assert_eq!(inputs.ratio, 25.0);
    }

    #[test]
    fn test_strict_rejects_garbage() {
        let args = InputArgs {
            inputs: None,
            overrides: vec![("mu".to_string(), "abc".to_string())],
            strict: true,
        };
        let raw = load_raw_inputs(&args).unwrap();
        assert!(typed_inputs(&raw, true).is_err());
        assert_eq!(typed_inputs(&raw, false).unwrap().mu, 0.06);
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        CliArgs::command().debug_assert();
    }
}
