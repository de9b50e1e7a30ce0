//! Prometheus metrics for the war-room service

pub mod collector;

pub use collector::MetricsCollector;
