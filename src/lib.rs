//! PLE Dashboard - examination results loader, normalizer & analysis
//!
//! Loads the PLE results sheet, normalizes it to the canonical schema and computes dashboard aggregates.

pub mod config;
pub mod data;
pub mod stats;
