pub mod report;

pub use report::{TestRunUI, print_error, print_unknown_command};

#[cfg(test)]
pub(crate) use report::testing;
