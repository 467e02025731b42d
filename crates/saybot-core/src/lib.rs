//! Core domain + application logic for the completion-relay Telegram bot.
//!
//! This crate is intentionally framework-agnostic. Telegram and the OpenAI
//! Responses API live behind ports (traits) implemented in adapter crates.

pub mod access;
pub mod commands;
pub mod completion;
pub mod config;
pub mod conversation;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod messaging;
pub mod relay;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use errors::{Error, Result};
