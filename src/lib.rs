pub mod analyzer;
pub mod cli;
pub mod config;
pub mod errors;
pub mod github;
pub mod pipeline;
pub mod report;
pub mod scanner;
pub mod session;
pub mod types;
