//! Run engine for sous
//!
//! Wraps the convergence engine with the terminal workflow:
//! 1. Previewing - dry run and diff display
//! 2. Confirming - prompt before touching the system
//! 3. Converging - real run with progress and report

pub mod differ;
pub mod executor;

pub use executor::{ExecuteOptions, execute, print_json};
