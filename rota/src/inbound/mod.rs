//! Inbound adapters that translate user input into domain service calls
//! while keeping terminal details at the edge.
//!
//! The interactive shell lives under [`cli`].

pub mod cli;
