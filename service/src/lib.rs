//! Service-level infrastructure: command line / environment configuration and
//! console logging setup.

pub mod config;
pub mod logging;
