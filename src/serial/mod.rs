pub mod connection;
pub mod ingest;
pub mod simulator;
pub mod source;

pub use connection::Connection;
