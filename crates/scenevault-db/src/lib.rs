//! Scenevault-DB: SQLite persistence for the scene library.
//!
//! This crate provides:
//!
//! - **Pool**: r2d2-backed SQLite connection pooling
//! - **Migrations**: embedded schema migrations run at pool init
//! - **Models**: Rust structs matching the database schema
//! - **Queries**: typed query functions for scenes, queue items, images, and
//!   markers

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
