//! Library crate for netscan-console: a single-flight client for a remote scanning service.
pub mod backend;
pub mod controller;
pub mod error;
pub mod presenter;
pub mod request;
pub mod reveal;
pub mod server;
pub mod types;
pub mod validate;
