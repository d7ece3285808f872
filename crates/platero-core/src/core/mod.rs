//! # Core Module
//!
//! Data models and file formats shared by every stage of a screen.
//!
//! ## Overview
//!
//! A screen starts from batches of proteins listed in the catalog. Each batch is laid out on
//! storage plates, and pairs of batches are combined into screen plates whose templates tell
//! the operator (and later the interpreter) what every well contains.
//!
//! ## Architecture
//!
//! - **Well Grid** ([`plate`]) - Well addresses, control groups and the 8x12 `PlateGrid`
//! - **Proteins** ([`protein`]) - Protein identities and the read-only catalog snapshot
//! - **Storage Plates** ([`storage`]) - Prey (mirrored halves) and bait (one column each) layouts
//! - **Screen Plates** ([`screen`]) - Bait x prey slots with fixed control wells
//! - **Interactions** ([`interaction`]) - Interpreted records, interaction keys and crosstabs
//! - **Naming** ([`naming`]) - Batch and plate names, file name convention
//! - **File I/O** ([`io`]) - Template, results, catalog and export formats

pub mod interaction;
pub mod io;
pub mod naming;
pub mod plate;
pub mod protein;
pub mod screen;
pub mod storage;
