pub mod catalog;
pub mod config;
pub mod grade;
pub mod output;
pub mod report;
pub mod scoring;
pub mod telemetry;
