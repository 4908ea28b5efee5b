//! # Joinery Support
//!
//! Shared utilities for the Joinery DI crates.
//!
//! This crate provides:
//! - Text rendering for error messages
//! - Type-name shortening used to derive identifiers from Rust types

pub mod rendering;
