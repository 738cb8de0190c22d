// Sensor telemetry query core + HTTP surface. Library for tests and the binary.

pub mod config;
pub mod error;
pub mod models;
pub mod ranges;
pub mod routes;
pub mod sensors;
pub mod telemetry_repo;
pub mod version;
