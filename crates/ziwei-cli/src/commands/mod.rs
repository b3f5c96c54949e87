pub mod analyze;
pub mod chart;
pub mod context;
pub mod output;
pub mod probe;
pub mod repl;
pub mod text;
