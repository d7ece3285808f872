//! # Workflows Module
//!
//! High-level entry points combining the `core` and `engine` layers.
//!
//! ## Overview
//!
//! - **Template Generation** ([`generate`]) - Storage templates for a batch and screen
//!   templates for bait/prey batch pairs
//! - **Results Processing** ([`process`]) - Discovery of results/template pairs, per-plate
//!   interpretation, merge and export of the interaction tables

pub mod generate;
pub mod process;
