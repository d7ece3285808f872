//! # Engine Module
//!
//! Turns raw plate-reader measurements into scored interactions.
//!
//! ## Overview
//!
//! Every results file is read at the timepoint named by its template and goes through the
//! same per-plate stages before the plates are merged:
//!
//! 1. [`interpret`] - raw reads mapped through the template into interaction records and
//!    negative-control reads
//! 2. [`symmetry`] - mirrored-half invariants of the plate
//! 3. [`normalize`] - division by the control-group mean and per-plate Z-scores
//! 4. [`aggregate`] - merge of all plates, global Z-scores, duplicate detection, crosstab and
//!    threshold-filtered variants
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Processing and screen-generation settings with builders
//! - **Progress Monitoring** ([`progress`]) - Progress events for front-ends
//! - **Error Handling** ([`error`]) - The error taxonomy shared by all stages

pub mod aggregate;
pub mod config;
pub mod error;
pub mod interpret;
pub mod normalize;
pub mod progress;
pub mod symmetry;
