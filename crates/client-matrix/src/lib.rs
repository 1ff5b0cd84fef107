pub mod access;
pub mod assessment;
pub mod clients;
pub mod config;
pub mod error;
pub mod http;
pub mod import;
pub mod matrices;
pub mod repository;
pub mod scoring;
pub mod storage;
pub mod telemetry;
