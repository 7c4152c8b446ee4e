//! Chat server: accept loop, per-connection handlers, and the shared
//! participant registry.

pub mod connection;
pub mod handler;
pub mod listener;
pub mod registry;

pub use connection::{Connection, ConnectionWriter};
pub use handler::ConnectionHandler;
pub use listener::ChatServer;
pub use registry::{Participant, Registry};
