//! # recall-cli
//!
//! Command-line interface for the Recall memory layer.
//!
//! ## Commands
//!
//! - `recall init`: Create the storage location
//! - `recall remember` / `recall record`: Append memories and conversations
//! - `recall search` / `recall prompt`: Inspect ranking and the composed payload
//! - `recall ask`: Answer a query with (or without) memory
//! - `recall seed`: Load the demo profile
//! - `recall stats` / `recall clear` / `recall config`

pub mod commands;

pub use commands::Cli;
