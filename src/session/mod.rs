//! Active List session management

pub mod client;
pub mod entries;

pub use client::ActiveLists;
pub use entries::{decode_entries, encode_entries, ColumnPolicy, Entry};
