//! esm-lists - client for the ArcSight ESM Active List REST service

pub mod cli;
pub mod config;
pub mod envelope;
pub mod error;
pub mod session;
pub mod transport;

pub use config::{ClientConfig, ProxyConfig};
pub use error::{Error, Result};
pub use session::{ActiveLists, ColumnPolicy, Entry};
pub use transport::{Reply, Transport};
