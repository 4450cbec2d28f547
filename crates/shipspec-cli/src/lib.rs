//! shipspec CLI library.
//!
//! Command handlers, terminal styling and progress rendering for the
//! `shipspec` binary.

pub mod commands;
pub mod output;
pub mod terminal;
