//! Domain core of the Ziwei chart pipeline.
//!
//! Birth input, the chart model and its ephemeris seam, the canonical tree
//! serializer, session state and shared configuration/error types. No I/O
//! lives here; adapters are in `ziwei-infrastructure` and
//! `ziwei-interaction`.

pub mod birth;
pub mod chart;
pub mod config;
pub mod error;
pub mod prompt;
pub mod session;
pub mod time_branch;
pub mod tree;

// Re-export common error type
pub use error::{Result, ZiweiError};

pub use birth::{BirthInput, Gender};
pub use chart::{Chart, Ephemeris, compute_chart};
pub use tree::render_tree;
