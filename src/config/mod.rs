//! Client configuration module
//! Handles loading the config file and environment overrides

pub mod config;

pub use config::{ClientConfig, ProxyConfig};
