pub mod commands;
pub mod config;
pub mod k8s;
pub mod reconcile;
pub mod scheme;
pub mod telemetry;
