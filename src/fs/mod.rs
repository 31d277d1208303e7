//! Filesystem access for the served site.
//!
//! The connection handler never touches paths directly; it asks the
//! [`Resolver`] for a file's attributes and where to open it.

pub mod resolver;

pub use resolver::{FileInfo, Resolver};
