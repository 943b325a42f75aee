//! Scenevault - personal media library processor
//!
//! This library crate exposes the core functionality for integration testing.

pub mod config;
pub mod generate;
pub mod probe;
pub mod queue;
pub mod scanner;
pub mod store;
pub mod streaming;
