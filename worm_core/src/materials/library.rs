//! # Material Library
//!
//! Flat-file store of material cards. A library is a directory with two
//! subdirectories:
//!
//! ```text
//! materials/
//! ├── metals/     worm cards (*.json)
//! └── polymers/   wheel cards (*.json)
//! ```
//!
//! Cards are addressed by file name (`"37CrS4.json"`). Importing a card
//! copies it into the library with an atomic write: serialize, write to a
//! `.tmp` sibling, fsync, rename.
//!
//! ## Example
//!
//! ```rust,no_run
//! use worm_core::materials::MaterialLibrary;
//! use std::path::Path;
//!
//! let library = MaterialLibrary::open(Path::new("materials"))?;
//! let worm = library.load_worm(&library.default_worm_name()?)?;
//! let wheel = library.load_wheel("PA66_modified_draft.json")?;
//! # Ok::<(), worm_core::errors::CalcError>(())
//! ```

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use super::{WheelMaterial, WormMaterial};
use crate::errors::{CalcError, CalcResult};

/// Worm card preferred when no selection is made
pub const PREFERRED_WORM_CARD: &str = "37CrS4.json";
/// Wheel card preferred when no selection is made
pub const PREFERRED_WHEEL_CARD: &str = "PA66_modified_draft.json";

/// Which member a card describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialKind {
    /// Worm material, stored under `metals/`
    Metal,
    /// Wheel material, stored under `polymers/`
    Polymer,
}

impl MaterialKind {
    /// Library subdirectory for this kind
    pub fn subdir(&self) -> &'static str {
        match self {
            MaterialKind::Metal => "metals",
            MaterialKind::Polymer => "polymers",
        }
    }

    fn preferred_card(&self) -> &'static str {
        match self {
            MaterialKind::Metal => PREFERRED_WORM_CARD,
            MaterialKind::Polymer => PREFERRED_WHEEL_CARD,
        }
    }
}

/// A directory of worm and wheel material cards.
#[derive(Debug, Clone)]
pub struct MaterialLibrary {
    root: PathBuf,
}

impl MaterialLibrary {
    /// Open a library rooted at `root`.
    ///
    /// Fails if `root` is not a directory. Missing subdirectories just list
    /// as empty.
    pub fn open(root: &Path) -> CalcResult<Self> {
        if !root.is_dir() {
            return Err(CalcError::file_error(
                "open library",
                root.display().to_string(),
                "not a directory",
            ));
        }
        Ok(MaterialLibrary {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn dir(&self, kind: MaterialKind) -> PathBuf {
        self.root.join(kind.subdir())
    }

    /// File names of all `*.json` cards of one kind, sorted.
    pub fn list(&self, kind: MaterialKind) -> CalcResult<Vec<String>> {
        let dir = self.dir(kind);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&dir).map_err(|e| {
            CalcError::file_error("list", dir.display().to_string(), e.to_string())
        })?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                CalcError::file_error("list", dir.display().to_string(), e.to_string())
            })?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.to_lowercase().ends_with(".json") {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    /// The card to use when nothing is selected: the preferred card if
    /// present, otherwise the first listed.
    pub fn default_card_name(&self, kind: MaterialKind) -> CalcResult<String> {
        let names = self.list(kind)?;
        if names.iter().any(|n| n == kind.preferred_card()) {
            return Ok(kind.preferred_card().to_string());
        }
        names
            .into_iter()
            .next()
            .ok_or_else(|| CalcError::material_not_found(format!("any card in {}", kind.subdir())))
    }

    pub fn default_worm_name(&self) -> CalcResult<String> {
        self.default_card_name(MaterialKind::Metal)
    }

    pub fn default_wheel_name(&self) -> CalcResult<String> {
        self.default_card_name(MaterialKind::Polymer)
    }

    fn card_path(&self, kind: MaterialKind, name: &str) -> CalcResult<PathBuf> {
        let path = self.dir(kind).join(name);
        if !path.is_file() {
            return Err(CalcError::material_not_found(name));
        }
        Ok(path)
    }

    /// Load a worm card by file name
    pub fn load_worm(&self, name: &str) -> CalcResult<WormMaterial> {
        load_card_file(&self.card_path(MaterialKind::Metal, name)?)
    }

    /// Load a wheel card by file name
    pub fn load_wheel(&self, name: &str) -> CalcResult<WheelMaterial> {
        load_card_file(&self.card_path(MaterialKind::Polymer, name)?)
    }

    /// Copy an external worm card into the library. Returns the stored name.
    pub fn import_worm(&self, source: &Path) -> CalcResult<String> {
        let card: WormMaterial = load_card_file(source)?;
        self.store(MaterialKind::Metal, source, &card)
    }

    /// Copy an external wheel card into the library. Returns the stored name.
    pub fn import_wheel(&self, source: &Path) -> CalcResult<String> {
        let card: WheelMaterial = load_card_file(source)?;
        self.store(MaterialKind::Polymer, source, &card)
    }

    fn store<T: Serialize>(&self, kind: MaterialKind, source: &Path, card: &T) -> CalcResult<String> {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                CalcError::file_error("import", source.display().to_string(), "no file name")
            })?;

        let dir = self.dir(kind);
        fs::create_dir_all(&dir).map_err(|e| {
            CalcError::file_error("create directory", dir.display().to_string(), e.to_string())
        })?;

        save_card_file(card, &dir.join(&name))?;
        info!(card = %name, kind = kind.subdir(), "imported material card");
        Ok(name)
    }
}

/// Read and parse one card file.
pub fn load_card_file<T: DeserializeOwned>(path: &Path) -> CalcResult<T> {
    let contents = fs::read_to_string(path).map_err(|e| {
        CalcError::file_error("read", path.display().to_string(), e.to_string())
    })?;

    debug!(path = %path.display(), "loaded material card");
    serde_json::from_str(&contents).map_err(|e| CalcError::SerializationError {
        reason: format!("Invalid material card {}: {}", path.display(), e),
    })
}

/// Write one card file atomically (temp file, fsync, rename).
pub fn save_card_file<T: Serialize>(card: &T, path: &Path) -> CalcResult<()> {
    let json = serde_json::to_string_pretty(card)?;

    let tmp_path = path.with_extension("json.tmp");

    let mut tmp_file = File::create(&tmp_path).map_err(|e| {
        CalcError::file_error("create temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    let written = write_and_replace(&mut tmp_file, json.as_bytes(), &tmp_path, path);
    if written.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    written
}

/// Write, sync and move the temp file over `path`.
fn write_and_replace(tmp_file: &mut File, bytes: &[u8], tmp_path: &Path, path: &Path) -> CalcResult<()> {
    tmp_file.write_all(bytes).map_err(|e| {
        CalcError::file_error("write temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.sync_all().map_err(|e| {
        CalcError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    fs::rename(tmp_path, path).map_err(|e| {
        CalcError::file_error("rename to final", path.display().to_string(), e.to_string())
    })
}
