//! Platform-agnostic messaging abstractions.
//!
//! The Discord adapter implements [`port::MessagingPort`]; everything in the core
//! talks to the platform through it.

pub mod port;
pub mod types;
