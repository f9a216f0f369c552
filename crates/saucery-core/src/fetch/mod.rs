//! Content fetchers, one per supported platform.

pub mod pixiv;
pub mod saucenao;
pub mod twitter;
