//! Xata CLI - Command-line interface for Xata databases.
//!
//! This crate provides the `xata` binary: pushing and pulling schema
//! migrations between a local `.xata/migrations` directory and a branch,
//! and dumping the branch schema.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;
