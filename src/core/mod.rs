//! Core module containing shared infrastructure components.
//!
//! This module provides the foundational building blocks for the server,
//! including error handling, configuration, and server lifecycle management.

pub mod config;
pub mod error;
pub mod server;

pub use config::Config;
pub use error::{Error, Result};
pub use server::FhirServer;
