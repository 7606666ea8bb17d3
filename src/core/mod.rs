pub mod clients;
pub mod config;
pub mod error;
pub mod error_log;
pub mod formatter;
pub mod models;
pub mod process;
pub mod query;
pub mod report;
