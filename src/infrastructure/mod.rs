//! Infrastructure layer - Cache stores, client repositories and logging

pub mod cache;
pub mod client;
pub mod logging;
