//! Core domain + application logic for the saucery Discord bot.
//!
//! This crate is intentionally framework-agnostic. Discord lives behind
//! ports (traits) implemented in the serenity adapter crate; the Pixiv,
//! Twitter and SauceNAO upstreams are plain HTTP clients owned here.

pub mod builder;
pub mod config;
pub mod control;
pub mod domain;
pub mod errors;
pub mod fetch;
pub mod logging;
pub mod matcher;
pub mod pagination;
pub mod payload;
pub mod relay;

pub use errors::{Error, Result};
