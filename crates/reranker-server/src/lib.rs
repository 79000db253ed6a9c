pub mod config;
pub mod http;
pub mod server;

pub use config::{ConfigError, ServerConfig};
pub use server::RerankServer;
