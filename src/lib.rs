// Crate root library declaration and module exports.
pub mod cli;
pub mod client;
pub mod config;
pub mod logging;
pub mod model;
pub mod render;
pub mod schedule;
pub mod server;
