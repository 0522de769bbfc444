//! # attache-core
//!
//! Core types and utilities for Attache.
//!
//! This crate provides the foundational building blocks used across all other crates:
//! - Common error types and the validation error collection
//! - The content model handed to data stores
//! - Configuration types

pub mod config;
pub mod content;
pub mod error;

pub use config::*;
pub use content::*;
pub use error::*;
