//! # worm_core - Worm Drive Calculation Engine
//!
//! `worm_core` computes the geometry, mesh-cycle traces and fatigue figures
//! of a steel worm driving a polymer wheel. Every computation takes a typed
//! input set plus two material cards and returns one serializable result.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: Pure functions that take input and return results
//! - **JSON-First**: Inputs, material cards and results implement Serialize/Deserialize
//! - **Total**: Degenerate numbers give zeroed or `None` outputs, not errors
//! - **Rich Errors**: Structured error types where errors do occur (parsing, files)
//!
//! ## Quick Start
//!
//! ```rust
//! use worm_core::calculations::calculate;
//! use worm_core::input::{InputSet, RawInputs};
//! use worm_core::materials::{WheelMaterial, WormMaterial};
//!
//! let mut raw = RawInputs::with_defaults();
//! raw.set("T1_Nm", "8.5");
//! let inputs = InputSet::parse(&raw)?;
//!
//! let result = calculate(&inputs, &WormMaterial::default(), &WheelMaterial::default())?;
//! println!("η0 = {:.3}", result.meta.eta0);
//! # Ok::<(), worm_core::errors::CalcError>(())
//! ```
//!
//! ## Modules
//!
//! - [`input`] - Raw string inputs, typed input set, defaults
//! - [`calculations`] - Geometry, mesh-cycle simulation, fatigue, result assembly
//! - [`materials`] - Material cards, property lookups and the card library
//! - [`export`] - Tabular (CSV) and JSON export
//! - [`report`] - Fatigue summary for display
//! - [`units`] - Type-safe unit wrappers
//! - [`errors`] - Structured error types

pub mod calculations;
pub mod errors;
pub mod export;
pub mod input;
pub mod materials;
pub mod report;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use calculations::{calculate, CycleResult, ResultMeta};
pub use errors::{CalcError, CalcResult};
pub use input::{InputSet, RawInputs};
pub use materials::{MaterialLibrary, WheelMaterial, WormMaterial};
