//! fileserve - Concurrent static file server
//!
//! Core library for the HTTP codec, connection handling and listener.

pub mod config;
pub mod fs;
pub mod http;
pub mod server;
