pub mod app;
pub mod cli;
pub mod config;
pub mod import;
pub mod report;
pub mod sync;
