mod scan;

pub mod cli;
pub mod compare;
pub mod compiler;
pub mod config;
pub mod corpus;
pub mod css;
pub mod error;
pub mod extract;
pub mod hash;
pub mod report;
pub mod runner;
pub mod sanitize;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
