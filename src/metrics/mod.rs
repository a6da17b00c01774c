//! Metrics Module
//!
//! Handles request metrics collection and Prometheus export.

pub mod collector;

pub use collector::Metrics;
