pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod input;
pub mod models;
pub mod rate_limit;
pub mod report;
pub mod store;
pub mod validation;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
