pub mod config;
pub mod execution;
pub mod ingestion;
pub mod models;
pub mod polymarket;
pub mod services;
