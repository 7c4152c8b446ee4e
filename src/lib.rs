//! Parley - Line-Oriented TCP Chat Relay
//!
//! A text chat relay written in Rust.
//!
//! ## Features
//!
//! - Concurrent client connections, one task per connection
//! - Insertion-ordered, concurrency-safe participant registry
//! - Bounded broadcast dispatch pool decoupling fan-out from read loops
//! - Swappable user-facing strings (English and Portuguese)
//! - Thin terminal client with local help/clear commands

pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod protocol;
pub mod server;

pub use config::Config;
pub use error::{ChatError, Result};
