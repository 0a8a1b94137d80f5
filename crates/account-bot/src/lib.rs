//! Telegram account manager bot.
//!
//! Registers external messaging accounts through a conversational flow:
//! phone number → one-time code → optional two-factor password, persisting
//! the authenticated session for reuse.

pub mod commands;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod keyboards;
