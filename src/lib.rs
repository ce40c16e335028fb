pub mod client;
pub mod config;
pub mod errors;
pub mod orchestrator;
pub mod poll;
pub mod relay;
pub mod telemetry;
pub mod tracker;
pub mod ui;
