//! Core domain + relay pipeline for the translation relay bot.
//!
//! This crate is intentionally framework-agnostic. Telegram and OpenAI live
//! behind ports (traits) implemented in adapter crates.

pub mod aggregator;
pub mod chunking;
pub mod config;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod media;
pub mod messaging;
pub mod notices;
pub mod pipeline;
pub mod router;
pub mod security;
pub mod services;

#[cfg(test)]
pub(crate) mod testing;

pub use errors::{Error, Failure, Result};
