pub mod config;
pub mod downstream;
pub mod producer;
pub mod report;
pub mod state;
