//! Provides input/output for the plate-related file formats.
//!
//! Templates, plate-reader results and the protein catalog share the [`traits::PlateFile`]
//! interface; the interaction exports are write-only and live in [`export`].

pub mod catalog;
pub mod export;
pub mod results;
pub mod template;
pub mod traits;
