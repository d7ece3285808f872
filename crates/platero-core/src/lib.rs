//! # Platero Core Library
//!
//! Plate layout, template generation and result interpretation for protein-protein
//! interaction screens run on 96-well microplates.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`WellAddress`, `PlateGrid`, storage and
//!   screen plates, interaction records), the protein catalog snapshot and the file formats
//!   (templates, plate-reader results, catalog, exports).
//!
//! - **[`engine`]: The Logic Core.** Interpretation of raw reads through a template, symmetry
//!   validation of mirrored plate halves, normalization against negative controls, Z-scores and
//!   aggregation of many plates into a crosstab.
//!
//! - **[`workflows`]: The Public API.** Complete procedures built from the two layers below:
//!   generating storage and screen templates for batches, and processing a directory of
//!   results into the exported interaction tables.

pub mod core;
pub mod engine;
pub mod workflows;
