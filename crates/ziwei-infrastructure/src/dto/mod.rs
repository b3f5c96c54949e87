//! Wire shapes of external collaborators.
//!
//! These types mirror the ephemeris's JSON output and are converted into
//! `ziwei_core::chart` types at the boundary so they never reach the core.

mod astrolabe;

pub use astrolabe::{AstrolabeDto, DecadalDto, PalaceDto, StarDto};
