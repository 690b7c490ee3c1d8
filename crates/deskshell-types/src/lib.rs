//! Foundation types for deskshell.
//!
//! This crate holds the types shared by every deskshell crate: the error
//! type and the TOML-backed shell configuration.

pub mod config;
pub mod error;
