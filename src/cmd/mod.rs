//! CLI command implementations.
//!
//! | Module | Commands handled |
//! |--------|------------------|
//! | `test` | `Test`           |


pub use test::{cmd_test, current_project_dir};
