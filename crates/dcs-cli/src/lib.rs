//! Library components of the `dcs` command-line front end.

pub mod config;
pub mod logging;
