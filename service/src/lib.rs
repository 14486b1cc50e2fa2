//! Infrastructure concerns shared by every other crate: command line and
//! environment configuration, and global logger setup.

pub mod config;
pub mod logging;
