//! Core routing + handler logic for the DM relay bot.
//!
//! This crate is platform-agnostic. Discord lives behind
//! [`messaging::port::MessagingPort`], implemented in the adapter crate.

pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod logging;
pub mod messaging;
pub mod router;

pub use errors::{Error, Result};
