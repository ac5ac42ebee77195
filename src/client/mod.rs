// File: ./src/client/mod.rs
pub mod core;
pub mod redirect;

pub use crate::client::core::ConfluenceClient;
